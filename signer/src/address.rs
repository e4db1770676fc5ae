//! # Address Codec
//!
//! Meridian addresses exist in two representations:
//!
//! - **Binary**: `protocol_byte || payload`, the form embedded in the
//!   canonical message encoding. Carries no network information.
//! - **String**: `<network char><protocol digit><base32 payload+checksum>`,
//!   the checksummed human-readable form (`f...` mainnet, `t...` testnet).
//!
//! Because the binary form carries no network marker, rendering an address
//! as a string takes the network as an explicit parameter. That lets a
//! message decoded from canonical bytes be displayed for either network
//! without re-deriving anything.
//!
//! Protocol 0 (actor id) addresses are special-cased the way the chain
//! defines them: the string body is the decimal actor id with no checksum,
//! and the binary payload is the unsigned-LEB128 encoding of the id.
//!
//! ## Validation split
//!
//! The string decoder validates the checksum and protocol indicator but not
//! payload lengths; the binary decoder validates protocol indicator and
//! payload lengths but has no checksum to check. This split mirrors the
//! reference implementation byte for byte, including its BLS length
//! constant (see [`BLS_PAYLOAD_LEN`]).

use std::sync::LazyLock;

use data_encoding::{Encoding, Specification};
use thiserror::Error;

use crate::crypto::hash::{blake2b_160, blake2b_checksum};

/// Payload length for SECP256K1 and actor-hash addresses.
pub const PAYLOAD_HASH_LEN: usize = 20;

/// Payload length the binary decoder enforces for BLS addresses.
/// This is the reference implementation's constant, kept verbatim.
pub const BLS_PAYLOAD_LEN: usize = 46;

/// Address checksum length in bytes.
pub const CHECKSUM_LEN: usize = 4;

/// Lowercase RFC 4648 base32 without padding, the address string alphabet.
static ADDRESS_BASE32: LazyLock<Encoding> = LazyLock::new(|| {
    let mut spec = Specification::new();
    spec.symbols.push_str("abcdefghijklmnopqrstuvwxyz234567");
    spec.encoding().expect("static base32 specification is valid")
});

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced by the address codec. All are terminal: no partially
/// decoded address is ever returned.
#[derive(Debug, Error)]
pub enum AddressError {
    /// The protocol indicator byte/digit is not one of `0..=3`.
    #[error("unknown address protocol indicator")]
    UnknownProtocolIndicator,

    /// The payload length does not match what the protocol requires.
    #[error("invalid payload length {got} for protocol {protocol:?}")]
    InvalidPayloadLength {
        /// Protocol the payload was decoded under.
        protocol: Protocol,
        /// Number of payload bytes actually present.
        got: usize,
    },

    /// The recomputed checksum does not match the encoded one.
    #[error("address checksum mismatch")]
    InvalidChecksum,

    /// The leading network character is neither `f` nor `t`.
    #[error("unknown network prefix `{0}`")]
    UnknownNetworkPrefix(char),

    /// The string is too short to contain a network char, protocol digit,
    /// and checksum.
    #[error("address string too short")]
    TooShort,

    /// The base32 body did not decode under the address alphabet.
    #[error("invalid base32 payload: {0}")]
    Base32(#[from] data_encoding::DecodeError),

    /// An actor id that is not a valid decimal u64 / LEB128 sequence.
    #[error("invalid actor id")]
    InvalidActorId,
}

// ---------------------------------------------------------------------------
// Network & Protocol
// ---------------------------------------------------------------------------

/// The network an address string is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    /// Addresses prefixed with `f`.
    Mainnet,
    /// Addresses prefixed with `t`.
    Testnet,
}

impl Network {
    /// The leading character of address strings on this network.
    pub fn prefix(self) -> char {
        match self {
            Network::Mainnet => 'f',
            Network::Testnet => 't',
        }
    }

    /// Maps a leading address character back to its network.
    pub fn from_prefix(c: char) -> Result<Self, AddressError> {
        match c {
            'f' => Ok(Network::Mainnet),
            't' => Ok(Network::Testnet),
            other => Err(AddressError::UnknownNetworkPrefix(other)),
        }
    }
}

/// Address protocol indicator: which key/derivation scheme the payload
/// belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Actor id address; payload is the LEB128-encoded id.
    Id = 0,
    /// SECP256K1 key address; payload is a 20-byte public key hash.
    Secp256k1 = 1,
    /// Actor-hash address; payload is a 20-byte hash.
    Actor = 2,
    /// BLS key address.
    Bls = 3,
}

impl Protocol {
    /// Decodes a protocol indicator byte.
    pub fn from_byte(byte: u8) -> Result<Self, AddressError> {
        match byte {
            0 => Ok(Protocol::Id),
            1 => Ok(Protocol::Secp256k1),
            2 => Ok(Protocol::Actor),
            3 => Ok(Protocol::Bls),
            _ => Err(AddressError::UnknownProtocolIndicator),
        }
    }

    /// Decodes the protocol digit of an address string.
    pub fn from_digit(digit: char) -> Result<Self, AddressError> {
        match digit {
            '0' => Ok(Protocol::Id),
            '1' => Ok(Protocol::Secp256k1),
            '2' => Ok(Protocol::Actor),
            '3' => Ok(Protocol::Bls),
            _ => Err(AddressError::UnknownProtocolIndicator),
        }
    }

    /// The indicator byte used in the binary representation.
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A validated Meridian address: protocol indicator plus raw payload.
///
/// Fields are private so every `Address` in existence went through one of
/// the validating constructors; rendering therefore cannot fail.
///
/// # Examples
///
/// ```
/// use meridian_signer::address::{Address, Network, Protocol};
///
/// let (addr, network) =
///     Address::from_string("t17uoq6tp427uzv7fztkbsnn64iwotfrristwpryy").unwrap();
/// assert_eq!(network, Network::Testnet);
/// assert_eq!(addr.protocol(), Protocol::Secp256k1);
///
/// // The same payload renders for either network.
/// assert!(addr.to_string(Network::Mainnet).starts_with("f1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    protocol: Protocol,
    payload: Vec<u8>,
}

impl Address {
    /// Decodes a checksummed address string. Returns the address together
    /// with the network the string was rendered for.
    ///
    /// Checksum coverage is `protocol_byte || payload`. Payload lengths are
    /// not validated on this path; that is the binary decoder's job.
    pub fn from_string(s: &str) -> Result<(Self, Network), AddressError> {
        let mut chars = s.chars();
        let network_char = chars.next().ok_or(AddressError::TooShort)?;
        let protocol_digit = chars.next().ok_or(AddressError::TooShort)?;

        let network = Network::from_prefix(network_char)?;
        let protocol = Protocol::from_digit(protocol_digit)?;
        let body = &s[2..];

        if protocol == Protocol::Id {
            let id: u64 = body.parse().map_err(|_| AddressError::InvalidActorId)?;
            return Ok((
                Address {
                    protocol,
                    payload: leb128_encode(id),
                },
                network,
            ));
        }

        let decoded = ADDRESS_BASE32.decode(body.as_bytes())?;
        if decoded.len() < CHECKSUM_LEN {
            return Err(AddressError::TooShort);
        }

        let (payload, checksum) = decoded.split_at(decoded.len() - CHECKSUM_LEN);
        let mut coverage = Vec::with_capacity(1 + payload.len());
        coverage.push(protocol.as_byte());
        coverage.extend_from_slice(payload);
        if blake2b_checksum(&coverage) != checksum {
            return Err(AddressError::InvalidChecksum);
        }

        Ok((
            Address {
                protocol,
                payload: payload.to_vec(),
            },
            network,
        ))
    }

    /// Decodes the binary representation: `bytes[0]` is the protocol
    /// indicator, the rest is the payload.
    ///
    /// SECP256K1 and actor-hash payloads must be exactly
    /// [`PAYLOAD_HASH_LEN`] bytes; BLS payloads exactly [`BLS_PAYLOAD_LEN`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AddressError> {
        let (&indicator, payload) = bytes.split_first().ok_or(AddressError::TooShort)?;
        let protocol = Protocol::from_byte(indicator)?;

        match protocol {
            Protocol::Id => {
                leb128_decode(payload).ok_or(AddressError::InvalidActorId)?;
            }
            Protocol::Secp256k1 | Protocol::Actor => {
                if payload.len() != PAYLOAD_HASH_LEN {
                    return Err(AddressError::InvalidPayloadLength {
                        protocol,
                        got: payload.len(),
                    });
                }
            }
            Protocol::Bls => {
                if payload.len() != BLS_PAYLOAD_LEN {
                    return Err(AddressError::InvalidPayloadLength {
                        protocol,
                        got: payload.len(),
                    });
                }
            }
        }

        Ok(Address {
            protocol,
            payload: payload.to_vec(),
        })
    }

    /// Derives a SECP256K1 address from an uncompressed (65-byte) public
    /// key by hashing it down to a 20-byte payload.
    pub fn from_public_key(uncompressed_public_key: &[u8]) -> Self {
        Address {
            protocol: Protocol::Secp256k1,
            payload: payload_from_public_key(uncompressed_public_key).to_vec(),
        }
    }

    /// Renders the checksummed string form under the given network.
    pub fn to_string(&self, network: Network) -> String {
        if self.protocol == Protocol::Id {
            let id = leb128_decode(&self.payload).expect("actor id validated at construction");
            return format!("{}0{}", network.prefix(), id);
        }

        let mut coverage = Vec::with_capacity(1 + self.payload.len());
        coverage.push(self.protocol.as_byte());
        coverage.extend_from_slice(&self.payload);
        let checksum = blake2b_checksum(&coverage);

        let mut body = self.payload.clone();
        body.extend_from_slice(&checksum);

        format!(
            "{}{}{}",
            network.prefix(),
            self.protocol.as_byte(),
            ADDRESS_BASE32.encode(&body)
        )
    }

    /// The binary representation: protocol byte followed by the payload.
    /// Exact inverse of [`Address::from_bytes`].
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + self.payload.len());
        bytes.push(self.protocol.as_byte());
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// The address protocol.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// The raw payload, without the protocol indicator.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Hashes an uncompressed SECP256K1 public key down to the 20-byte payload
/// of its protocol-1 address.
pub fn payload_from_public_key(uncompressed_public_key: &[u8]) -> [u8; PAYLOAD_HASH_LEN] {
    blake2b_160(uncompressed_public_key)
}

// ---------------------------------------------------------------------------
// LEB128 (actor id payloads)
// ---------------------------------------------------------------------------

fn leb128_encode(mut value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(10);
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

fn leb128_decode(bytes: &[u8]) -> Option<u64> {
    let mut value: u64 = 0;
    let mut shift = 0u32;
    let mut iter = bytes.iter().peekable();
    while let Some(&byte) = iter.next() {
        let chunk = u64::from(byte & 0x7f);
        if shift >= 64 || (shift == 63 && chunk > 1) {
            return None;
        }
        value |= chunk << shift;
        if byte & 0x80 == 0 {
            // Continuation bit clear: this must have been the last byte.
            return if iter.peek().is_none() { Some(value) } else { None };
        }
        shift += 7;
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // Address vectors from the reference implementation's test suite.
    const SECP_ADDR: &str = "t17uoq6tp427uzv7fztkbsnn64iwotfrristwpryy";
    const SECP_ADDR_BYTES: &str = "01fd1d0f4dfcd7e99afcb99a8326b7dc459d32c628";

    #[test]
    fn decode_string_known_vector() {
        let (addr, network) = Address::from_string(SECP_ADDR).unwrap();
        assert_eq!(network, Network::Testnet);
        assert_eq!(addr.protocol(), Protocol::Secp256k1);
        assert_eq!(hex::encode(addr.to_bytes()), SECP_ADDR_BYTES);
    }

    #[test]
    fn decode_bytes_known_vector() {
        let bytes = hex::decode(SECP_ADDR_BYTES).unwrap();
        let addr = Address::from_bytes(&bytes).unwrap();
        assert_eq!(addr.to_string(Network::Testnet), SECP_ADDR);
    }

    #[test]
    fn string_roundtrip_reference_addresses() {
        for s in [
            "t17uoq6tp427uzv7fztkbsnn64iwotfrristwpryy",
            "t1b4zd6ryj5dsnwda5jtjxj6ptkia5e35s52ox7ka",
            "t1d2xrzcslx7xlbbylc5c3d5lvandqw4iwl6epxba",
            "t1gsu6clgzpcrjxclicnsva5bty3r65hnkqpd4jaq",
            "t2oajfrgjjllncvbxx4shzbxy3nnegsrnnk3tq2tq",
        ] {
            let (addr, network) = Address::from_string(s).unwrap();
            assert_eq!(addr.to_string(network), s);
        }
    }

    #[test]
    fn actor_hash_vector_decodes_to_known_payload() {
        let (addr, _) = Address::from_string("t2oajfrgjjllncvbxx4shzbxy3nnegsrnnk3tq2tq").unwrap();
        assert_eq!(addr.protocol(), Protocol::Actor);
        assert_eq!(
            hex::encode(addr.payload()),
            "70125899295ada2a86f7e48f90df1b6b486945ad"
        );
    }

    #[test]
    fn same_payload_renders_for_both_networks() {
        let (addr, _) = Address::from_string(SECP_ADDR).unwrap();
        let mainnet = addr.to_string(Network::Mainnet);
        assert_eq!(mainnet, format!("f{}", &SECP_ADDR[1..]));
        let (roundtrip, network) = Address::from_string(&mainnet).unwrap();
        assert_eq!(network, Network::Mainnet);
        assert_eq!(roundtrip, addr);
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        // Flip the final character (checksum territory) to another symbol
        // of the alphabet so only the checksum comparison can fail.
        let mut corrupted = SECP_ADDR.to_string();
        corrupted.pop();
        corrupted.push('z');
        let err = Address::from_string(&corrupted).unwrap_err();
        assert!(matches!(err, AddressError::InvalidChecksum));
    }

    #[test]
    fn corrupted_payload_is_rejected() {
        // Payload corruption also surfaces as a checksum mismatch.
        let mut corrupted = SECP_ADDR.to_string();
        let replacement = if &corrupted[5..6] == "q" { "p" } else { "q" };
        corrupted.replace_range(5..6, replacement);
        let err = Address::from_string(&corrupted).unwrap_err();
        assert!(matches!(err, AddressError::InvalidChecksum));
    }

    #[test]
    fn unknown_protocol_digit_is_rejected() {
        let err = Address::from_string("t47uoq6tp427uzv7fztkbsnn64iwotfrristwpryy").unwrap_err();
        assert!(matches!(err, AddressError::UnknownProtocolIndicator));
    }

    #[test]
    fn unknown_protocol_byte_is_rejected() {
        let mut bytes = hex::decode(SECP_ADDR_BYTES).unwrap();
        bytes[0] = 4;
        let err = Address::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, AddressError::UnknownProtocolIndicator));
    }

    #[test]
    fn unknown_network_prefix_is_rejected() {
        let err = Address::from_string("x17uoq6tp427uzv7fztkbsnn64iwotfrristwpryy").unwrap_err();
        assert!(matches!(err, AddressError::UnknownNetworkPrefix('x')));
    }

    #[test]
    fn secp_payload_must_be_twenty_bytes() {
        let mut bytes = hex::decode(SECP_ADDR_BYTES).unwrap();
        bytes.pop();
        let err = Address::from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            AddressError::InvalidPayloadLength {
                protocol: Protocol::Secp256k1,
                got: 19,
            }
        ));
    }

    #[test]
    fn bls_payload_length_uses_reference_constant() {
        let ok = [vec![3u8], vec![0xab; BLS_PAYLOAD_LEN]].concat();
        assert!(Address::from_bytes(&ok).is_ok());

        // A real 48-byte BLS public key payload is rejected, exactly as the
        // reference implementation rejects it.
        let real_key_len = [vec![3u8], vec![0xab; 48]].concat();
        let err = Address::from_bytes(&real_key_len).unwrap_err();
        assert!(matches!(
            err,
            AddressError::InvalidPayloadLength {
                protocol: Protocol::Bls,
                got: 48,
            }
        ));
    }

    #[test]
    fn string_decoder_does_not_length_check() {
        // An 8-byte protocol-1 payload with a valid checksum decodes on the
        // string path; only the binary path enforces lengths.
        let payload = [0x11u8; 8];
        let addr = Address {
            protocol: Protocol::Secp256k1,
            payload: payload.to_vec(),
        };
        let s = addr.to_string(Network::Testnet);
        let (decoded, _) = Address::from_string(&s).unwrap();
        assert_eq!(decoded.payload(), payload);
    }

    #[test]
    fn actor_id_roundtrips_string_and_bytes() {
        let (addr, network) = Address::from_string("t01004").unwrap();
        assert_eq!(addr.protocol(), Protocol::Id);
        assert_eq!(addr.to_bytes(), vec![0x00, 0xec, 0x07]);
        assert_eq!(addr.to_string(network), "t01004");

        let small = Address::from_bytes(&[0x00, 0x01]).unwrap();
        assert_eq!(small.to_string(Network::Testnet), "t01");
    }

    #[test]
    fn actor_id_rejects_non_decimal_body() {
        let err = Address::from_string("t0notanumber").unwrap_err();
        assert!(matches!(err, AddressError::InvalidActorId));
    }

    #[test]
    fn actor_id_rejects_dangling_leb128() {
        // Continuation bit set on the final byte.
        let err = Address::from_bytes(&[0x00, 0x80]).unwrap_err();
        assert!(matches!(err, AddressError::InvalidActorId));
    }

    #[test]
    fn public_key_payload_is_twenty_bytes() {
        let fake_key = [0x04u8; 65];
        assert_eq!(payload_from_public_key(&fake_key).len(), PAYLOAD_HASH_LEN);
    }

    #[test]
    fn empty_input_is_too_short() {
        assert!(matches!(
            Address::from_bytes(&[]).unwrap_err(),
            AddressError::TooShort
        ));
        assert!(matches!(
            Address::from_string("").unwrap_err(),
            AddressError::TooShort
        ));
    }
}
