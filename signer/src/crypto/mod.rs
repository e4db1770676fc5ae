//! # Cryptographic Building Blocks
//!
//! Thin, typed wrappers around the audited primitives the message format
//! is defined over: BLAKE2b (parameterized by output length) for hashing
//! and digests, SECP256K1 for keys, BIP39/BIP32 for derivation. Nothing in
//! here invents cryptography; everything delegates to the underlying
//! crates and pins the parameters the chain requires.

pub mod hash;
pub mod keys;

pub use hash::{blake2b_160, blake2b_256, message_cid, message_digest};
pub use keys::{
    generate_mnemonic, key_derive, key_derive_from_seed, key_recover, ExtendedKey, KeyError,
    PrivateKey,
};
