//! Message type and its validating constructor.
//!
//! A [`Message`] is the unsigned transaction of the Meridian format. The
//! struct itself is plain data with the lowercase wire names clients use;
//! [`MessageBuilder`] is the single validating constructor: every field
//! constraint is checked atomically at `build()`, and either a fully valid
//! message or a typed error comes back. Nothing partially constructed ever
//! escapes.
//!
//! Messages can also arrive through serde (JSON from a wallet frontend),
//! which bypasses the builder; the codec therefore re-runs the same
//! validation before encoding anything.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::{Address, AddressError};
use crate::bytes::ByteInputError;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced while constructing, encoding, or decoding a [`Message`].
#[derive(Debug, Error)]
pub enum MessageError {
    /// A required field is absent (builder) or empty (validation).
    #[error("`{0}` is a required field")]
    MissingField(&'static str),

    /// A field is present but holds the wrong kind of value.
    #[error("`{field}` must be {expected}")]
    InvalidFieldType {
        /// Wire name of the offending field.
        field: &'static str,
        /// What the field is required to hold.
        expected: &'static str,
    },

    /// Decode-time: the leading version element is an integer other than 0.
    #[error("unsupported transaction version {0}")]
    UnsupportedVersion(i128),

    /// Decode-time: the canonical array holds fewer elements than the
    /// format defines.
    #[error("encoded transaction has {got} fields, expected {expected}")]
    MissingFields {
        /// Number of elements the format defines.
        expected: usize,
        /// Number of elements actually decoded.
        got: usize,
    },

    /// Decode-time: the top-level value is not an array at all.
    #[error("encoded transaction is not an array")]
    NotAnArray,

    /// An embedded address failed to encode or decode.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// The canonical binary encoding failed to read or write.
    #[error("cbor codec failure: {0}")]
    Cbor(#[from] serde_cbor::Error),

    /// The textual input (hex) failed to resolve to bytes.
    #[error(transparent)]
    Input(#[from] ByteInputError),
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// An unsigned Meridian message.
///
/// `value` and `gas_price` are arbitrary-precision unsigned integers kept
/// as decimal strings, exactly as they travel in client JSON; the codec
/// converts them to their canonical byte form. Serde names follow the
/// client wire shape (`gasprice`, `gaslimit`).
///
/// # Examples
///
/// ```
/// use meridian_signer::message::MessageBuilder;
///
/// let message = MessageBuilder::new()
///     .to("t17uoq6tp427uzv7fztkbsnn64iwotfrristwpryy")
///     .from("t1b4zd6ryj5dsnwda5jtjxj6ptkia5e35s52ox7ka")
///     .nonce(1)
///     .value("100000")
///     .gas_price("2500")
///     .gas_limit(25000)
///     .method(0)
///     .build()
///     .unwrap();
/// assert_eq!(message.value, "100000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Recipient address, checksummed string form.
    pub to: String,
    /// Sender address, checksummed string form.
    pub from: String,
    /// Sender sequence number.
    pub nonce: u64,
    /// Transferred amount, decimal string.
    pub value: String,
    /// Gas price, decimal string.
    #[serde(rename = "gasprice")]
    pub gas_price: String,
    /// Gas limit.
    #[serde(rename = "gaslimit")]
    pub gas_limit: u64,
    /// Method number of the call (0 is a plain transfer).
    pub method: u64,
    /// Opaque call parameters, rendered as text. Empty for transfers.
    #[serde(default)]
    pub params: String,
}

/// Validated, codec-ready projections of a message's string fields.
pub(crate) struct CanonicalFields {
    pub(crate) to: Address,
    pub(crate) from: Address,
    pub(crate) value: BigUint,
    pub(crate) gas_price: BigUint,
}

/// Checks every field constraint and resolves the string fields into their
/// canonical representations. All-or-nothing: the first violation aborts
/// the whole validation and nothing is encoded.
pub(crate) fn canonical_fields(message: &Message) -> Result<CanonicalFields, MessageError> {
    if message.to.is_empty() {
        return Err(MessageError::MissingField("to"));
    }
    if message.from.is_empty() {
        return Err(MessageError::MissingField("from"));
    }
    if message.value.is_empty() {
        return Err(MessageError::MissingField("value"));
    }
    if message.gas_price.is_empty() {
        return Err(MessageError::MissingField("gasprice"));
    }

    let (to, _) = Address::from_string(&message.to)?;
    let (from, _) = Address::from_string(&message.from)?;

    let value = BigUint::parse_bytes(message.value.as_bytes(), 10).ok_or(
        MessageError::InvalidFieldType {
            field: "value",
            expected: "an unsigned decimal string",
        },
    )?;
    let gas_price = BigUint::parse_bytes(message.gas_price.as_bytes(), 10).ok_or(
        MessageError::InvalidFieldType {
            field: "gasprice",
            expected: "an unsigned decimal string",
        },
    )?;

    Ok(CanonicalFields {
        to,
        from,
        value,
        gas_price,
    })
}

// ---------------------------------------------------------------------------
// MessageBuilder
// ---------------------------------------------------------------------------

/// Validating constructor for [`Message`].
///
/// All seven logical fields are required; `params` defaults to empty.
/// `build()` reports the first unset field as [`MessageError::MissingField`]
/// and then runs full field validation, so a successfully built message is
/// always encodable.
#[derive(Debug, Default)]
pub struct MessageBuilder {
    to: Option<String>,
    from: Option<String>,
    nonce: Option<u64>,
    value: Option<String>,
    gas_price: Option<String>,
    gas_limit: Option<u64>,
    method: Option<u64>,
    params: Option<String>,
}

impl MessageBuilder {
    /// Creates a builder with no fields set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the recipient address.
    pub fn to(mut self, to: &str) -> Self {
        self.to = Some(to.to_string());
        self
    }

    /// Sets the sender address.
    pub fn from(mut self, from: &str) -> Self {
        self.from = Some(from.to_string());
        self
    }

    /// Sets the sender nonce.
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Sets the transferred amount as a decimal string.
    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    /// Sets the gas price as a decimal string.
    pub fn gas_price(mut self, gas_price: &str) -> Self {
        self.gas_price = Some(gas_price.to_string());
        self
    }

    /// Sets the gas limit.
    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    /// Sets the method number.
    pub fn method(mut self, method: u64) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the call parameters.
    pub fn params(mut self, params: &str) -> Self {
        self.params = Some(params.to_string());
        self
    }

    /// Validates every field and produces the message, or the first typed
    /// violation. Nothing partial is ever returned.
    pub fn build(self) -> Result<Message, MessageError> {
        let message = Message {
            to: self.to.ok_or(MessageError::MissingField("to"))?,
            from: self.from.ok_or(MessageError::MissingField("from"))?,
            nonce: self.nonce.ok_or(MessageError::MissingField("nonce"))?,
            value: self.value.ok_or(MessageError::MissingField("value"))?,
            gas_price: self
                .gas_price
                .ok_or(MessageError::MissingField("gasprice"))?,
            gas_limit: self
                .gas_limit
                .ok_or(MessageError::MissingField("gaslimit"))?,
            method: self.method.ok_or(MessageError::MissingField("method"))?,
            params: self.params.unwrap_or_default(),
        };

        canonical_fields(&message)?;
        Ok(message)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_builder() -> MessageBuilder {
        MessageBuilder::new()
            .to("t17uoq6tp427uzv7fztkbsnn64iwotfrristwpryy")
            .from("t1b4zd6ryj5dsnwda5jtjxj6ptkia5e35s52ox7ka")
            .nonce(1)
            .value("100000")
            .gas_price("2500")
            .gas_limit(25000)
            .method(0)
    }

    #[test]
    fn complete_builder_produces_message() {
        let message = complete_builder().build().unwrap();
        assert_eq!(message.nonce, 1);
        assert_eq!(message.params, "");
    }

    #[test]
    fn each_missing_field_is_reported_by_name() {
        let cases: Vec<(MessageBuilder, &str)> = vec![
            (
                MessageBuilder::new()
                    .from("t1b4zd6ryj5dsnwda5jtjxj6ptkia5e35s52ox7ka")
                    .nonce(1)
                    .value("1")
                    .gas_price("1")
                    .gas_limit(1)
                    .method(0),
                "to",
            ),
            (
                MessageBuilder::new()
                    .to("t17uoq6tp427uzv7fztkbsnn64iwotfrristwpryy")
                    .nonce(1)
                    .value("1")
                    .gas_price("1")
                    .gas_limit(1)
                    .method(0),
                "from",
            ),
            (
                MessageBuilder::new()
                    .to("t17uoq6tp427uzv7fztkbsnn64iwotfrristwpryy")
                    .from("t1b4zd6ryj5dsnwda5jtjxj6ptkia5e35s52ox7ka")
                    .nonce(1)
                    .gas_price("1")
                    .gas_limit(1)
                    .method(0),
                "value",
            ),
        ];

        for (builder, field) in cases {
            match builder.build().unwrap_err() {
                MessageError::MissingField(name) => assert_eq!(name, field),
                other => panic!("expected MissingField, got {other:?}"),
            }
        }
    }

    #[test]
    fn non_decimal_value_is_a_field_type_error() {
        let err = complete_builder().value("1.5e18").build().unwrap_err();
        assert!(matches!(
            err,
            MessageError::InvalidFieldType { field: "value", .. }
        ));
    }

    #[test]
    fn negative_value_is_a_field_type_error() {
        let err = complete_builder().value("-1").build().unwrap_err();
        assert!(matches!(
            err,
            MessageError::InvalidFieldType { field: "value", .. }
        ));
    }

    #[test]
    fn bad_address_surfaces_as_address_error() {
        let err = complete_builder()
            .to("t17uoq6tp427uzv7fztkbsnn64iwotfrristwpryz")
            .build()
            .unwrap_err();
        assert!(matches!(err, MessageError::Address(_)));
    }

    #[test]
    fn empty_value_is_missing_not_invalid() {
        let err = complete_builder().value("").build().unwrap_err();
        assert!(matches!(err, MessageError::MissingField("value")));
    }

    #[test]
    fn value_beyond_u64_is_accepted() {
        // value/gas_price are arbitrary precision; u64 limits do not apply.
        let message = complete_builder()
            .value("340282366920938463463374607431768211456")
            .build()
            .unwrap();
        assert_eq!(message.value.len(), 39);
    }

    #[test]
    fn json_roundtrip_uses_wire_names() {
        let message = complete_builder().params("").build().unwrap();
        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("\"gasprice\""));
        assert!(json.contains("\"gaslimit\""));
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, message);
    }

    #[test]
    fn json_without_params_defaults_to_empty() {
        let json = r#"{
            "to": "t17uoq6tp427uzv7fztkbsnn64iwotfrristwpryy",
            "from": "t1b4zd6ryj5dsnwda5jtjxj6ptkia5e35s52ox7ka",
            "nonce": 1,
            "value": "100000",
            "gasprice": "2500",
            "gaslimit": 25000,
            "method": 0
        }"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert_eq!(message.params, "");
    }
}
