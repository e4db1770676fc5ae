//! # Signing Protocol
//!
//! Produces and verifies detached SECP256K1 signatures over the canonical
//! message encoding, and packages them into the envelope the chain client
//! accepts for submission.
//!
//! The signed payload is never the message bytes themselves but their
//! content-addressed digest (see [`crate::crypto::hash`]); the signature
//! wire layout is fixed at 65 bytes: `R(32) || S(32) || recovery id(1)`.
//! Other tools depend on that exact byte order.
//!
//! Verification recovers the public key from the signature and digest, then
//! checks the signature against the recovered key. A structurally valid
//! signature that simply does not match returns `Ok(false)`; malformed
//! input (wrong lengths, undecodable text, broken CBOR) is an error. The
//! distinction is part of the API contract: "this signature is wrong" and
//! "this input is garbage" are different answers.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use secp256k1::{Message as SecpMessage, PublicKey, RecoveryId, SecretKey, Signature};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::bytes::{ByteInput, ByteInputError};
use crate::crypto::hash::message_digest;
use crate::crypto::keys::{KeyError, PrivateKey};
use crate::message::{Message, MessageError};

/// Wire length of a detached signature: `R || S || recovery id`.
pub const SIGNATURE_LENGTH: usize = 65;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced by the signing protocol.
#[derive(Debug, Error)]
pub enum SigningError {
    /// The message failed to validate or encode.
    #[error(transparent)]
    Message(#[from] MessageError),

    /// Private key normalization failed.
    #[error(transparent)]
    Key(#[from] KeyError),

    /// Textual signature or message input failed to decode.
    #[error(transparent)]
    Input(#[from] ByteInputError),

    /// The signature is not exactly 65 bytes once decoded.
    #[error("invalid signature length: expected 65 bytes, got {got}")]
    InvalidSignatureLength {
        /// Number of bytes actually provided.
        got: usize,
    },

    /// The curve library rejected the signature or recovery id.
    #[error("secp256k1 failure: {0:?}")]
    Secp256k1(secp256k1::Error),

    /// The submission envelope failed to render as JSON.
    #[error("envelope serialization failed: {0}")]
    Envelope(#[from] serde_json::Error),
}

impl From<secp256k1::Error> for SigningError {
    fn from(err: secp256k1::Error) -> Self {
        SigningError::Secp256k1(err)
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// A message in either of the shapes the signing operations accept: the
/// structured type, or its already-canonical bytes (raw or hex text).
///
/// Resolved to canonical bytes exactly once, at the API boundary.
#[derive(Debug, Clone)]
pub enum MessageInput {
    /// A structured message; canonical bytes are produced by the codec.
    Structured(Message),
    /// Already-serialized canonical bytes.
    Serialized(ByteInput),
}

impl MessageInput {
    fn into_canonical_bytes(self) -> Result<Vec<u8>, SigningError> {
        match self {
            MessageInput::Structured(message) => Ok(message.serialize_raw()?),
            MessageInput::Serialized(input) => Ok(input.into_bytes()?),
        }
    }
}

impl From<&Message> for MessageInput {
    fn from(message: &Message) -> Self {
        MessageInput::Structured(message.clone())
    }
}

impl From<Message> for MessageInput {
    fn from(message: Message) -> Self {
        MessageInput::Structured(message)
    }
}

impl From<&str> for MessageInput {
    /// Serialized messages given as text are hex; the base64 sniffing rule
    /// applies to signatures and keys only.
    fn from(hex_text: &str) -> Self {
        MessageInput::Serialized(ByteInput::Hex(hex_text.to_string()))
    }
}

impl From<&[u8]> for MessageInput {
    fn from(bytes: &[u8]) -> Self {
        MessageInput::Serialized(ByteInput::Raw(bytes.to_vec()))
    }
}

impl From<Vec<u8>> for MessageInput {
    fn from(bytes: Vec<u8>) -> Self {
        MessageInput::Serialized(ByteInput::Raw(bytes))
    }
}

// ---------------------------------------------------------------------------
// Signed messages
// ---------------------------------------------------------------------------

/// Signature scheme tag carried alongside signature bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureType {
    /// Deterministic ECDSA over secp256k1. Wire code 1.
    Secp256k1,
}

impl SignatureType {
    /// The integer code used on the wire.
    pub fn code(self) -> u8 {
        match self {
            SignatureType::Secp256k1 => 1,
        }
    }
}

impl Serialize for SignatureType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for SignatureType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            1 => Ok(SignatureType::Secp256k1),
            other => Err(serde::de::Error::custom(format!(
                "unknown signature type code {other}"
            ))),
        }
    }
}

/// A signature as it travels next to a structured message: base64 text
/// plus its scheme tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSignature {
    /// Base64 of the 65 signature bytes.
    pub data: String,
    /// Signature scheme.
    #[serde(rename = "type")]
    pub signature_type: SignatureType,
}

/// A structured message together with its signature. Only produced by
/// [`sign`]; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMessage {
    /// The message that was signed.
    pub message: Message,
    /// The detached signature over the message's canonical bytes.
    pub signature: MessageSignature,
}

// ---------------------------------------------------------------------------
// Submission envelope
// ---------------------------------------------------------------------------

/// The JSON envelope shape the chain client expects for submission:
/// capitalized field names, base64 signature data, integer scheme code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireSignedMessage {
    /// The signed message, capitalized field names.
    #[serde(rename = "Message")]
    pub message: WireMessage,
    /// The signature, capitalized field names.
    #[serde(rename = "Signature")]
    pub signature: WireSignature,
}

/// Message half of the submission envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "GasLimit")]
    pub gas_limit: u64,
    #[serde(rename = "GasPrice")]
    pub gas_price: String,
    #[serde(rename = "Method")]
    pub method: u64,
    #[serde(rename = "Nonce")]
    pub nonce: u64,
    #[serde(rename = "Params")]
    pub params: String,
    #[serde(rename = "To")]
    pub to: String,
    #[serde(rename = "Value")]
    pub value: String,
}

/// Signature half of the submission envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireSignature {
    #[serde(rename = "Data")]
    pub data: String,
    #[serde(rename = "Type")]
    pub signature_type: u8,
}

impl From<&SignedMessage> for WireSignedMessage {
    fn from(signed: &SignedMessage) -> Self {
        WireSignedMessage {
            message: WireMessage {
                from: signed.message.from.clone(),
                gas_limit: signed.message.gas_limit,
                gas_price: signed.message.gas_price.clone(),
                method: signed.message.method,
                nonce: signed.message.nonce,
                params: signed.message.params.clone(),
                to: signed.message.to.clone(),
                value: signed.message.value.clone(),
            },
            signature: WireSignature {
                data: signed.signature.data.clone(),
                signature_type: signed.signature.signature_type.code(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Signs a message (structured or already-canonical bytes) and returns the
/// raw 65-byte `R || S || recovery id` signature.
pub fn sign_raw(
    message: impl Into<MessageInput>,
    private_key: &PrivateKey,
) -> Result<[u8; SIGNATURE_LENGTH], SigningError> {
    let canonical = message.into().into_canonical_bytes()?;
    let digest = message_digest(&canonical);
    trace!(message_bytes = canonical.len(), "signing message digest");

    let secret = SecretKey::parse(private_key.as_bytes()).map_err(KeyError::from)?;
    let (signature, recovery_id) = secp256k1::sign(&SecpMessage::parse(&digest), &secret);

    let mut out = [0u8; SIGNATURE_LENGTH];
    out[..64].copy_from_slice(&signature.serialize());
    out[64] = recovery_id.serialize();
    Ok(out)
}

/// Signs a structured message and wraps the result in a [`SignedMessage`].
///
/// Taking `&Message` (not bytes) is deliberate: the envelope must always
/// carry the structured message next to its signature. Pre-serialized
/// messages go through [`sign_raw`].
pub fn sign(message: &Message, private_key: &PrivateKey) -> Result<SignedMessage, SigningError> {
    let signature = sign_raw(message, private_key)?;
    Ok(SignedMessage {
        message: message.clone(),
        signature: MessageSignature {
            data: BASE64.encode(signature),
            signature_type: SignatureType::Secp256k1,
        },
    })
}

/// Signs a structured message and renders the submission envelope as JSON.
pub fn sign_to_wire_format(
    message: &Message,
    private_key: &PrivateKey,
) -> Result<String, SigningError> {
    let signed = sign(message, private_key)?;
    Ok(serde_json::to_string(&WireSignedMessage::from(&signed))?)
}

/// Verifies a detached signature against a message.
///
/// The signature is accepted as raw 65 bytes or as hex/base64 text
/// (trailing `=` means base64); the message as a structured value, hex
/// text, or raw canonical bytes. Returns `Ok(false)` for a well-formed
/// signature that does not match, and an error for malformed input.
pub fn verify(
    signature: impl Into<ByteInput>,
    message: impl Into<MessageInput>,
) -> Result<bool, SigningError> {
    let signature_bytes = signature.into().into_bytes()?;
    if signature_bytes.len() != SIGNATURE_LENGTH {
        return Err(SigningError::InvalidSignatureLength {
            got: signature_bytes.len(),
        });
    }

    let canonical = message.into().into_canonical_bytes()?;
    let digest = SecpMessage::parse(&message_digest(&canonical));

    let parsed = Signature::parse_standard_slice(&signature_bytes[..64])?;
    let recovery_id = RecoveryId::parse(signature_bytes[64])?;
    let recovered: PublicKey = secp256k1::recover(&digest, &parsed, &recovery_id)?;

    let valid = secp256k1::verify(&digest, &parsed, &recovered);
    trace!(valid, "verified detached signature");
    Ok(valid)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
