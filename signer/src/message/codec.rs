//! Canonical binary codec for [`Message`].
//!
//! The wire form is a single CBOR array of exactly nine elements in fixed
//! order:
//!
//! ```text
//! [ 0, to_bytes, from_bytes, nonce, value_bytes, gasprice_bytes,
//!   gaslimit, method, params_bytes ]
//! ```
//!
//! Element 0 is the format version tag. Addresses are embedded in their
//! binary form (protocol byte plus payload). `nonce`, `gaslimit`, and
//! `method` are CBOR unsigned integers; `value` and `gasprice` are byte
//! strings holding the big-integer encoding described below.
//!
//! ## Big-integer bytes
//!
//! Zero encodes as the empty byte string. Any other value encodes as a
//! `0x00` sign prefix followed by the minimal big-endian magnitude (no
//! leading zero byte inside the magnitude). Decoding interprets whatever
//! bytes are present as a big-endian unsigned integer, so over-long
//! encodings are accepted and reproduce their value faithfully; minimality
//! is enforced on encode only. That asymmetry is part of the wire contract.

use num_bigint::BigUint;
use num_traits::Zero;
use serde_cbor::Value;

use crate::address::{Address, Network};
use crate::bytes::ByteInput;
use crate::message::types::{canonical_fields, Message, MessageError};

/// Number of elements in the canonical array.
pub const MESSAGE_FIELDS: usize = 9;

/// The version tag every canonical encoding starts with.
pub const FORMAT_VERSION: i128 = 0;

impl Message {
    /// Encodes the message into its canonical bytes.
    ///
    /// Field validation runs first and is all-or-nothing; encoding only
    /// starts once every field has been resolved.
    pub fn serialize_raw(&self) -> Result<Vec<u8>, MessageError> {
        let fields = canonical_fields(self)?;

        let array = Value::Array(vec![
            Value::Integer(FORMAT_VERSION),
            Value::Bytes(fields.to.to_bytes()),
            Value::Bytes(fields.from.to_bytes()),
            Value::Integer(i128::from(self.nonce)),
            Value::Bytes(bigint_to_bytes(&fields.value)),
            Value::Bytes(bigint_to_bytes(&fields.gas_price)),
            Value::Integer(i128::from(self.gas_limit)),
            Value::Integer(i128::from(self.method)),
            Value::Bytes(self.params.as_bytes().to_vec()),
        ]);

        Ok(serde_cbor::to_vec(&array)?)
    }

    /// Lowercase hex projection of [`Message::serialize_raw`].
    pub fn serialize(&self) -> Result<String, MessageError> {
        Ok(hex::encode(self.serialize_raw()?))
    }

    /// Decodes canonical bytes (or their hex projection) back into a
    /// message, rendering the embedded addresses for `network`.
    ///
    /// A version tag other than 0, a short array, or any element of the
    /// wrong kind invalidates the whole message; no partial result is
    /// returned.
    pub fn parse(input: impl Into<ByteInput>, network: Network) -> Result<Message, MessageError> {
        let data = input.into().into_bytes()?;
        let decoded: Value = serde_cbor::from_slice(&data)?;

        let Value::Array(elements) = decoded else {
            return Err(MessageError::NotAnArray);
        };

        match elements.first() {
            None => {
                return Err(MessageError::MissingFields {
                    expected: MESSAGE_FIELDS,
                    got: 0,
                })
            }
            Some(Value::Integer(version)) if *version == FORMAT_VERSION => {}
            Some(Value::Integer(version)) => {
                return Err(MessageError::UnsupportedVersion(*version))
            }
            Some(_) => {
                return Err(MessageError::InvalidFieldType {
                    field: "version",
                    expected: "an unsigned integer",
                })
            }
        }

        if elements.len() < MESSAGE_FIELDS {
            return Err(MessageError::MissingFields {
                expected: MESSAGE_FIELDS,
                got: elements.len(),
            });
        }

        let to = address_element(&elements[1], "to", network)?;
        let from = address_element(&elements[2], "from", network)?;
        let nonce = uint_element(&elements[3], "nonce")?;
        let value = bigint_element(&elements[4], "value")?;
        let gas_price = bigint_element(&elements[5], "gasprice")?;
        let gas_limit = uint_element(&elements[6], "gaslimit")?;
        let method = uint_element(&elements[7], "method")?;
        let params = text_element(&elements[8], "params")?;

        Ok(Message {
            to,
            from,
            nonce,
            value,
            gas_price,
            gas_limit,
            method,
            params,
        })
    }
}

/// Big-integer canonical bytes: empty for zero, otherwise a `0x00` sign
/// prefix plus the minimal big-endian magnitude.
fn bigint_to_bytes(value: &BigUint) -> Vec<u8> {
    if value.is_zero() {
        return Vec::new();
    }
    let magnitude = value.to_bytes_be();
    let mut bytes = Vec::with_capacity(1 + magnitude.len());
    bytes.push(0x00);
    bytes.extend_from_slice(&magnitude);
    bytes
}

/// Big-endian interpretation of a big-integer byte field. The empty byte
/// string is zero; leading zero bytes are value-neutral.
fn bytes_to_decimal(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        "0".to_string()
    } else {
        BigUint::from_bytes_be(bytes).to_str_radix(10)
    }
}

fn address_element(
    element: &Value,
    field: &'static str,
    network: Network,
) -> Result<String, MessageError> {
    let Value::Bytes(bytes) = element else {
        return Err(MessageError::InvalidFieldType {
            field,
            expected: "an address byte string",
        });
    };
    Ok(Address::from_bytes(bytes)?.to_string(network))
}

fn uint_element(element: &Value, field: &'static str) -> Result<u64, MessageError> {
    let type_error = MessageError::InvalidFieldType {
        field,
        expected: "an unsigned integer",
    };
    match element {
        Value::Integer(n) if *n >= 0 => u64::try_from(*n).map_err(|_| type_error),
        _ => Err(type_error),
    }
}

fn bigint_element(element: &Value, field: &'static str) -> Result<String, MessageError> {
    let Value::Bytes(bytes) = element else {
        return Err(MessageError::InvalidFieldType {
            field,
            expected: "a byte string",
        });
    };
    Ok(bytes_to_decimal(bytes))
}

fn text_element(element: &Value, field: &'static str) -> Result<String, MessageError> {
    let Value::Bytes(bytes) = element else {
        return Err(MessageError::InvalidFieldType {
            field,
            expected: "a byte string",
        });
    };
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
