//! # Hashing & Signing Digests
//!
//! BLAKE2b is the only hash primitive in the Meridian message format,
//! parameterized by output length: 32 bytes for content hashing, 20 bytes
//! for public-key payloads, 4 bytes for address checksums.
//!
//! The signing digest is deliberately two-stage:
//!
//! ```text
//! cid    = CID_PREFIX || blake2b-256(message_bytes)
//! digest = blake2b-256(cid)
//! ```
//!
//! Signing the content-identifier wrapper rather than the message bytes is
//! a consensus requirement: it makes the signed digest line up with the
//! chain's content-addressing scheme, so a signature commits to the same
//! identifier the network uses to refer to the message.

use blake2b_simd::Params;

/// Multiformat prefix for a message content identifier:
/// CIDv1, dag-cbor codec, blake2b-256 multihash, 32-byte digest.
pub const CID_PREFIX: [u8; 6] = [0x01, 0x71, 0xa0, 0xe4, 0x02, 0x20];

/// Length of the signing digest in bytes.
pub const DIGEST_LENGTH: usize = 32;

/// 32-byte BLAKE2b digest.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let hash = Params::new().hash_length(32).hash(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(hash.as_bytes());
    out
}

/// 20-byte BLAKE2b digest. Used to derive address payloads from
/// uncompressed SECP256K1 public keys.
pub fn blake2b_160(data: &[u8]) -> [u8; 20] {
    let hash = Params::new().hash_length(20).hash(data);
    let mut out = [0u8; 20];
    out.copy_from_slice(hash.as_bytes());
    out
}

/// 4-byte BLAKE2b digest. The address codec's checksum function.
pub fn blake2b_checksum(data: &[u8]) -> [u8; 4] {
    let hash = Params::new().hash_length(4).hash(data);
    let mut out = [0u8; 4];
    out.copy_from_slice(hash.as_bytes());
    out
}

/// Content identifier of a canonically serialized message:
/// [`CID_PREFIX`] followed by the 32-byte BLAKE2b hash of the bytes.
pub fn message_cid(message: &[u8]) -> Vec<u8> {
    let mut cid = Vec::with_capacity(CID_PREFIX.len() + 32);
    cid.extend_from_slice(&CID_PREFIX);
    cid.extend_from_slice(&blake2b_256(message));
    cid
}

/// The 32-byte digest a signature is produced over:
/// `blake2b-256(message_cid(message))`.
pub fn message_digest(message: &[u8]) -> [u8; DIGEST_LENGTH] {
    blake2b_256(&message_cid(message))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
