//! # Byte Input Normalization
//!
//! Private keys, signatures, and serialized messages arrive from callers in
//! three textual/binary shapes: hex strings, base64 strings, and raw bytes.
//! Instead of re-sniffing the format at every call site, the crate models
//! the shape as an explicit tagged union that is resolved into a canonical
//! byte buffer exactly once, at the API boundary.
//!
//! ## Format detection
//!
//! Where a caller hands over text without saying which encoding it is, the
//! rule is: a trailing `=` padding character means base64, anything else is
//! hex. This is unambiguous because the hex alphabet (`0-9a-fA-F`) cannot
//! produce a trailing `=`, and the 32- and 65-byte values this crate deals
//! in always pad when base64-encoded (32 % 3 != 0 and 65 % 3 != 0). The
//! rule lives in [`ByteInput::detect`] and nowhere else.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use thiserror::Error;

/// Errors produced while resolving a [`ByteInput`] to raw bytes.
#[derive(Debug, Error)]
pub enum ByteInputError {
    /// The input claimed to be hex but did not decode.
    #[error("invalid hex input: {0}")]
    Hex(#[from] hex::FromHexError),

    /// The input claimed to be base64 but did not decode.
    #[error("invalid base64 input: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A byte buffer in one of the three shapes the public API accepts.
///
/// Construct it explicitly when the caller knows the encoding, or use
/// [`ByteInput::detect`] for the documented sniffing rule. Either way,
/// [`ByteInput::into_bytes`] is the single place where text becomes bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByteInput {
    /// Hex-encoded text (no `0x` prefix).
    Hex(String),
    /// Standard-alphabet base64 text, padded.
    Base64(String),
    /// Already-raw bytes. Resolution is a no-op.
    Raw(Vec<u8>),
}

impl ByteInput {
    /// Classifies untagged text: trailing `=` padding means base64,
    /// otherwise hex.
    pub fn detect(text: &str) -> Self {
        if text.ends_with('=') {
            ByteInput::Base64(text.to_string())
        } else {
            ByteInput::Hex(text.to_string())
        }
    }

    /// Resolves the input to a canonical byte buffer.
    pub fn into_bytes(self) -> Result<Vec<u8>, ByteInputError> {
        match self {
            ByteInput::Hex(text) => Ok(hex::decode(text)?),
            ByteInput::Base64(text) => Ok(BASE64.decode(text)?),
            ByteInput::Raw(bytes) => Ok(bytes),
        }
    }
}

impl From<&str> for ByteInput {
    fn from(text: &str) -> Self {
        ByteInput::detect(text)
    }
}

impl From<Vec<u8>> for ByteInput {
    fn from(bytes: Vec<u8>) -> Self {
        ByteInput::Raw(bytes)
    }
}

impl From<&[u8]> for ByteInput {
    fn from(bytes: &[u8]) -> Self {
        ByteInput::Raw(bytes.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
