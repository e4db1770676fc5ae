//! # Message Module
//!
//! The unsigned transaction type of the Meridian format and its canonical
//! binary codec.
//!
//! ```text
//! types.rs — Message + MessageBuilder (atomic field validation)
//! codec.rs — canonical 9-element CBOR array encode/decode
//! ```
//!
//! The codec is the consensus-critical surface: the byte sequence
//! [`Message::serialize_raw`] produces is what gets digested and signed,
//! so it must be reproducible bit for bit across implementations.

pub mod codec;
pub mod types;

pub use codec::{FORMAT_VERSION, MESSAGE_FIELDS};
pub use types::{Message, MessageBuilder, MessageError};
