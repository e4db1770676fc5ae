//! # Key Management
//!
//! SECP256K1 private keys and the BIP39/BIP32 derivation pipeline that
//! produces them from a mnemonic:
//!
//! ```text
//! mnemonic -> seed (BIP39) -> master key (HMAC-SHA512)
//!          -> child keys along the derivation path -> ExtendedKey
//! ```
//!
//! The third element of the derivation path selects the network: a coin
//! type of `1` designates testnet, anything else mainnet.
//!
//! ## Handling key material
//!
//! [`PrivateKey`] zeroizes its bytes on drop and redacts them from `Debug`
//! output. Key bytes are never logged; derivation logs carry only the path
//! and network flag.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bip39::{Language, Mnemonic, MnemonicType, Seed};
use hmac::{Hmac, Mac};
use secp256k1::{PublicKey, SecretKey};
use sha2::Sha512;
use thiserror::Error;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::address::{Address, Network};
use crate::bytes::{ByteInput, ByteInputError};

/// SECP256K1 private keys are exactly this many bytes.
pub const PRIVATE_KEY_LENGTH: usize = 32;

/// Length of an uncompressed SECP256K1 public key (`0x04 || X || Y`).
pub const PUBLIC_KEY_LENGTH: usize = 65;

const HARDENED_OFFSET: u32 = 0x8000_0000;
const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

type HmacSha512 = Hmac<Sha512>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced by key normalization and derivation.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The key material is not exactly 32 bytes once decoded.
    #[error("invalid private key length: expected 32 bytes, got {got}")]
    InvalidPrivateKeyLength {
        /// Number of bytes actually provided.
        got: usize,
    },

    /// The mnemonic phrase failed BIP39 validation.
    #[error("invalid mnemonic phrase: {0}")]
    InvalidMnemonic(String),

    /// The derivation path is not of the form `m/44'/461'/0/0/0`.
    #[error("invalid derivation path `{0}`")]
    InvalidPath(String),

    /// The curve library rejected key material (zero scalar, overflow,
    /// or a failed child-key tweak).
    #[error("secp256k1 rejected the key material: {0:?}")]
    Secp256k1(secp256k1::Error),

    /// Textual key input failed to decode.
    #[error(transparent)]
    Input(#[from] ByteInputError),
}

impl From<secp256k1::Error> for KeyError {
    fn from(err: secp256k1::Error) -> Self {
        KeyError::Secp256k1(err)
    }
}

// ---------------------------------------------------------------------------
// PrivateKey
// ---------------------------------------------------------------------------

/// A 32-byte SECP256K1 private key, normalized once at the API boundary.
///
/// Accepts hex text, base64 text (detected by the trailing-`=` rule), or
/// raw bytes; anything that does not resolve to exactly 32 bytes is
/// rejected with [`KeyError::InvalidPrivateKeyLength`].
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey([u8; PRIVATE_KEY_LENGTH]);

impl PrivateKey {
    /// Wraps exactly 32 raw bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let array: [u8; PRIVATE_KEY_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| KeyError::InvalidPrivateKeyLength { got: bytes.len() })?;
        Ok(PrivateKey(array))
    }

    /// Normalizes hex or base64 text into a key.
    pub fn from_text(text: &str) -> Result<Self, KeyError> {
        let bytes = ByteInput::detect(text).into_bytes()?;
        Self::from_slice(&bytes)
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; PRIVATE_KEY_LENGTH] {
        &self.0
    }

    /// Base64 rendering, the form wallet exports usually carry.
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }
}

impl TryFrom<&str> for PrivateKey {
    type Error = KeyError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        Self::from_text(text)
    }
}

impl TryFrom<&[u8]> for PrivateKey {
    type Error = KeyError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(bytes)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key material never reaches Debug output, not even truncated.
        f.write_str("PrivateKey(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// ExtendedKey
// ---------------------------------------------------------------------------

/// A private key together with its derived public key and the network it
/// was derived for.
///
/// # Examples
///
/// ```
/// use meridian_signer::crypto::keys::key_derive;
///
/// let key = key_derive(
///     "equip will roof matter pink blind book anxiety banner elbow sun young",
///     "m/44'/461'/0/0/0",
///     "",
/// )
/// .unwrap();
/// assert!(key.address().starts_with("f1"));
/// ```
#[derive(Clone)]
pub struct ExtendedKey {
    private_key: PrivateKey,
    public_key: [u8; PUBLIC_KEY_LENGTH],
    testnet: bool,
}

impl ExtendedKey {
    /// Validates the key against the curve and derives its public half.
    pub fn new(private_key: PrivateKey, testnet: bool) -> Result<Self, KeyError> {
        let secret = SecretKey::parse(private_key.as_bytes())?;
        let public_key = PublicKey::from_secret_key(&secret).serialize();
        Ok(ExtendedKey {
            private_key,
            public_key,
            testnet,
        })
    }

    /// The private key.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// The uncompressed public key (`0x04 || X || Y`).
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.public_key
    }

    /// The network this key was derived for.
    pub fn network(&self) -> Network {
        if self.testnet {
            Network::Testnet
        } else {
            Network::Mainnet
        }
    }

    /// The checksummed SECP256K1 address of the public key, rendered for
    /// this key's network.
    pub fn address(&self) -> String {
        Address::from_public_key(&self.public_key).to_string(self.network())
    }
}

impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// Generates a fresh 24-word English mnemonic (256 bits of entropy).
pub fn generate_mnemonic() -> String {
    Mnemonic::new(MnemonicType::Words24, Language::English).into_phrase()
}

/// Derives a key from a mnemonic phrase, derivation path, and optional
/// password (empty string for none).
pub fn key_derive(mnemonic: &str, path: &str, password: &str) -> Result<ExtendedKey, KeyError> {
    let mnemonic = Mnemonic::from_phrase(mnemonic, Language::English)
        .map_err(|e| KeyError::InvalidMnemonic(e.to_string()))?;
    let seed = Seed::new(&mnemonic, password);
    key_derive_from_seed(seed.as_bytes(), path)
}

/// Derives a key from a raw BIP39 seed and derivation path.
pub fn key_derive_from_seed(seed: &[u8], path: &str) -> Result<ExtendedKey, KeyError> {
    let indices = parse_path(path)?;
    let secret = derive_secret_key(seed, &indices)?;
    let testnet = path_designates_testnet(path);
    debug!(path, testnet, "derived child key");
    ExtendedKey::new(PrivateKey(secret.serialize()), testnet)
}

/// Rebuilds the public key and address for existing key material.
pub fn key_recover(private_key: &PrivateKey, testnet: bool) -> Result<ExtendedKey, KeyError> {
    ExtendedKey::new(private_key.clone(), testnet)
}

/// The third path element is the coin type; a value of `1` designates
/// testnet.
fn path_designates_testnet(path: &str) -> bool {
    path.split('/')
        .nth(2)
        .map(|component| component.trim_end_matches(['\'', 'h']) == "1")
        .unwrap_or(false)
}

fn parse_path(path: &str) -> Result<Vec<u32>, KeyError> {
    let invalid = || KeyError::InvalidPath(path.to_string());

    let mut components = path.split('/');
    if !matches!(components.next(), Some("m") | Some("M")) {
        return Err(invalid());
    }

    let mut indices = Vec::new();
    for component in components {
        let (digits, hardened) = match component
            .strip_suffix('\'')
            .or_else(|| component.strip_suffix('h'))
        {
            Some(rest) => (rest, true),
            None => (component, false),
        };
        let index: u32 = digits.parse().map_err(|_| invalid())?;
        if index >= HARDENED_OFFSET {
            return Err(invalid());
        }
        indices.push(if hardened {
            index | HARDENED_OFFSET
        } else {
            index
        });
    }
    Ok(indices)
}

fn hmac_sha512(key: &[u8], data: &[u8]) -> [u8; 64] {
    let mut mac = HmacSha512::new_from_slice(key).expect("hmac accepts keys of any length");
    mac.update(data);
    let digest = mac.finalize().into_bytes();
    let mut out = [0u8; 64];
    out.copy_from_slice(&digest);
    out
}

/// Standard BIP32 derivation: master key from the seed, then one
/// scalar-tweak step per path component. Hardened components commit to the
/// parent private key, normal components to the compressed public key.
fn derive_secret_key(seed: &[u8], indices: &[u32]) -> Result<SecretKey, KeyError> {
    let master = hmac_sha512(MASTER_HMAC_KEY, seed);
    let mut secret = SecretKey::parse_slice(&master[..32])?;
    let mut chain_code = [0u8; 32];
    chain_code.copy_from_slice(&master[32..]);

    for &index in indices {
        let mut data = Vec::with_capacity(37);
        if index >= HARDENED_OFFSET {
            data.push(0x00);
            data.extend_from_slice(&secret.serialize());
        } else {
            data.extend_from_slice(&PublicKey::from_secret_key(&secret).serialize_compressed());
        }
        data.extend_from_slice(&index.to_be_bytes());

        let step = hmac_sha512(&chain_code, &data);
        let mut child = SecretKey::parse_slice(&step[..32])?;
        child.tweak_add_assign(&secret)?;
        secret = child;
        chain_code.copy_from_slice(&step[32..]);
        data.zeroize();
    }

    Ok(secret)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // Reference key-derivation vectors.
    const MNEMONIC: &str = "equip will roof matter pink blind book anxiety banner elbow sun young";
    const DERIVED_KEY_B64: &str = "8VcW07ADswS4BV2cxi5rnIadVsyTDDhY1NfDH19T8Uo=";
    const MAINNET_ADDRESS: &str = "f1d2xrzcslx7xlbbylc5c3d5lvandqw4iwl6epxba";
    const TESTNET_ADDRESS: &str = "t1d2xrzcslx7xlbbylc5c3d5lvandqw4iwl6epxba";

    #[test]
    fn generated_mnemonic_has_24_words() {
        let phrase = generate_mnemonic();
        assert_eq!(phrase.split_ascii_whitespace().count(), 24);
    }

    #[test]
    fn derive_reference_vector() {
        let key = key_derive(MNEMONIC, "m/44'/461'/0/0/0", "").unwrap();
        assert_eq!(key.private_key().to_base64(), DERIVED_KEY_B64);
        assert_eq!(key.network(), Network::Mainnet);
        assert_eq!(key.address(), MAINNET_ADDRESS);
    }

    #[test]
    fn derive_with_password_changes_the_key() {
        let without = key_derive(MNEMONIC, "m/44'/461'/0/0/0", "").unwrap();
        let with = key_derive(MNEMONIC, "m/44'/461'/0/0/0", "password").unwrap();
        assert_ne!(
            without.private_key().to_base64(),
            with.private_key().to_base64()
        );
    }

    #[test]
    fn derive_from_seed_matches_mnemonic_path() {
        let mnemonic = Mnemonic::from_phrase(MNEMONIC, Language::English).unwrap();
        let seed = Seed::new(&mnemonic, "");
        let from_seed = key_derive_from_seed(seed.as_bytes(), "m/44'/461'/0/0/0").unwrap();
        assert_eq!(from_seed.private_key().to_base64(), DERIVED_KEY_B64);
    }

    #[test]
    fn recover_rebuilds_both_network_renderings() {
        let key = PrivateKey::from_text(DERIVED_KEY_B64).unwrap();

        let mainnet = key_recover(&key, false).unwrap();
        assert_eq!(mainnet.address(), MAINNET_ADDRESS);
        assert_eq!(mainnet.private_key().to_base64(), DERIVED_KEY_B64);

        let testnet = key_recover(&key, true).unwrap();
        assert_eq!(testnet.address(), TESTNET_ADDRESS);
    }

    #[test]
    fn coin_type_one_designates_testnet() {
        let testnet = key_derive(MNEMONIC, "m/44'/1'/0/0/0", "").unwrap();
        assert_eq!(testnet.network(), Network::Testnet);
        assert!(testnet.address().starts_with("t1"));

        let mainnet = key_derive(MNEMONIC, "m/44'/461'/0/0/0", "").unwrap();
        assert_eq!(mainnet.network(), Network::Mainnet);
    }

    #[test]
    fn private_key_accepts_hex_and_base64() {
        let from_b64 = PrivateKey::from_text(DERIVED_KEY_B64).unwrap();
        let from_hex = PrivateKey::from_text(&hex::encode(from_b64.as_bytes())).unwrap();
        assert_eq!(from_b64.as_bytes(), from_hex.as_bytes());
    }

    #[test]
    fn wrong_key_length_is_rejected() {
        let err = PrivateKey::from_slice(&[0u8; 31]).unwrap_err();
        assert!(matches!(
            err,
            KeyError::InvalidPrivateKeyLength { got: 31 }
        ));
    }

    #[test]
    fn zero_key_is_rejected_by_the_curve() {
        let key = PrivateKey::from_slice(&[0u8; 32]).unwrap();
        let err = key_recover(&key, false).unwrap_err();
        assert!(matches!(err, KeyError::Secp256k1(_)));
    }

    #[test]
    fn invalid_mnemonic_is_rejected() {
        let err = key_derive("not a mnemonic", "m/44'/461'/0/0/0", "").unwrap_err();
        assert!(matches!(err, KeyError::InvalidMnemonic(_)));
    }

    #[test]
    fn invalid_paths_are_rejected() {
        for path in ["", "44'/461'/0/0/0", "m/abc/0", "m/44'/461'/0/x/0"] {
            let err = key_derive(MNEMONIC, path, "").unwrap_err();
            assert!(matches!(err, KeyError::InvalidPath(_)), "path: {path}");
        }
    }

    #[test]
    fn debug_output_redacts_key_material() {
        let key = PrivateKey::from_text(DERIVED_KEY_B64).unwrap();
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("8VcW"));
        assert!(rendered.contains("redacted"));
    }
}
