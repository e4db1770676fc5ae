// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Meridian Signer
//!
//! Transaction codec and signing pipeline for the Meridian native message
//! format: canonical binary encoding and decoding of messages, checksummed
//! address codecs, content-addressed signing digests, and detached
//! SECP256K1 signatures, byte-exact with the chain's consensus format.
//!
//! Intended consumers are wallets, command-line signing tools, and
//! hardware-signing bridges; everything here is deliberately free of I/O,
//! storage, and network concerns.
//!
//! ## Architecture
//!
//! - **address** — binary and checksummed-string address codecs.
//! - **crypto** — BLAKE2b digests, key derivation, key normalization.
//! - **message** — the message type, its validating builder, and the
//!   canonical CBOR codec.
//! - **signing** — sign / verify over the signing digest, plus the
//!   submission envelope.
//! - **bytes** — the one place hex/base64/raw input shapes get resolved.
//!
//! ## Concurrency
//!
//! Every operation is a pure, synchronous transformation over immutable
//! inputs. There is no shared state anywhere in the crate, so every
//! function is safe to call from any number of threads without locking.
//!
//! ## Example
//!
//! ```
//! use meridian_signer::address::Network;
//! use meridian_signer::crypto::keys::key_derive;
//! use meridian_signer::message::{Message, MessageBuilder};
//! use meridian_signer::signing::{sign_raw, verify};
//!
//! let key = key_derive(
//!     "equip will roof matter pink blind book anxiety banner elbow sun young",
//!     "m/44'/461'/0/0/0",
//!     "",
//! )
//! .unwrap();
//!
//! let message = MessageBuilder::new()
//!     .to("t17uoq6tp427uzv7fztkbsnn64iwotfrristwpryy")
//!     .from("t1d2xrzcslx7xlbbylc5c3d5lvandqw4iwl6epxba")
//!     .nonce(1)
//!     .value("100000")
//!     .gas_price("2500")
//!     .gas_limit(25000)
//!     .method(0)
//!     .build()
//!     .unwrap();
//!
//! let signature = sign_raw(&message, key.private_key()).unwrap();
//! assert!(verify(signature.as_slice(), &message).unwrap());
//!
//! // The canonical bytes round-trip through the codec.
//! let parsed = Message::parse(
//!     message.serialize().unwrap().as_str(),
//!     Network::Testnet,
//! )
//! .unwrap();
//! assert_eq!(parsed, message);
//! ```

pub mod address;
pub mod bytes;
pub mod crypto;
pub mod message;
pub mod signing;

pub use address::{Address, AddressError, Network, Protocol};
pub use bytes::{ByteInput, ByteInputError};
pub use crypto::keys::{
    generate_mnemonic, key_derive, key_derive_from_seed, key_recover, ExtendedKey, KeyError,
    PrivateKey,
};
pub use message::{Message, MessageBuilder, MessageError};
pub use signing::{
    sign, sign_raw, sign_to_wire_format, verify, MessageInput, MessageSignature, SignedMessage,
    SigningError, WireSignedMessage,
};
