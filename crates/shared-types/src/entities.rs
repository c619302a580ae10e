//! # Core Domain Entities
//!
//! Primitive units of the storage network data model.
//!
//! ## Clusters
//!
//! - **Content addressing**: `Hash`, hex wire helpers
//! - **Identity**: `Address` (Ethereum-style 20-byte account address)
//! - **Revisioning**: `Nonce` (monotonic per-provider filesystem counter)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ParseError;

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// A 65-byte recoverable ECDSA signature (`r ∥ s ∥ v`).
pub type RecoverableSignature = [u8; 65];

/// The atomic hashing unit: every stored part is a whole number of
/// 8192-byte blocks.
pub const BLOCK_SIZE: usize = 8192;

/// One gibibyte, the unit of the configured storage limit.
pub const GIB_BYTES: u64 = 1024 * 1024 * 1024;

// =============================================================================
// ADDRESS
// =============================================================================

/// A 20-byte Ethereum-style account address.
///
/// Wire form is `0x` followed by 40 hex digits; rendering is always
/// lowercase, parsing accepts any case (comparison is on the raw bytes, so
/// checksummed input is accepted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Parse from the `0x`-prefixed wire form.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| ParseError::InvalidAddress(s.to_string()))?;
        if digits.len() != 40 {
            return Err(ParseError::InvalidAddress(s.to_string()));
        }
        let bytes = hex::decode(digits).map_err(|_| ParseError::InvalidAddress(s.to_string()))?;
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&bytes);
        Ok(Self(addr))
    }

    /// The raw 20 bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.to_string()
    }
}

// =============================================================================
// NONCE
// =============================================================================

/// Monotonic per-provider filesystem revision counter, `1..=u32::MAX`.
///
/// Transmitted as decimal text; committed into signature digests as a
/// big-endian 32-byte value (`to_bytes32`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Nonce(u32);

impl Nonce {
    /// Construct from a raw counter value. Zero is not a valid revision.
    pub fn new(value: u32) -> Result<Self, ParseError> {
        if value == 0 {
            return Err(ParseError::InvalidNonce("0".to_string()));
        }
        Ok(Self(value))
    }

    /// Parse the decimal wire form.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        let value: u32 = s
            .trim()
            .parse()
            .map_err(|_| ParseError::InvalidNonce(s.to_string()))?;
        Self::new(value)
    }

    /// The raw counter value.
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Big-endian 32-byte encoding, zero-left-padded. This is the exact
    /// byte layout appended to commitment digests.
    pub fn to_bytes32(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[28..].copy_from_slice(&self.0.to_be_bytes());
        out
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// HEX WIRE HELPERS
// =============================================================================

/// Parse a 64-hex-digit hash (an optional `0x` prefix is tolerated).
pub fn parse_hash_hex(s: &str) -> Result<Hash, ParseError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(digits).map_err(|_| ParseError::InvalidHex {
        what: "hash",
        input: s.to_string(),
    })?;
    bytes.try_into().map_err(|_| ParseError::BadLength {
        what: "hash",
        expected: 32,
        got: digits.len() / 2,
    })
}

/// Lowercase hex form of a hash, as used for part filenames and `fs` lists.
pub fn hash_to_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Parse a 130-hex-digit recoverable signature.
pub fn parse_signature_hex(s: &str) -> Result<RecoverableSignature, ParseError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(digits).map_err(|_| ParseError::InvalidHex {
        what: "signature",
        input: s.to_string(),
    })?;
    bytes.try_into().map_err(|_| ParseError::BadLength {
        what: "signature",
        expected: 65,
        got: digits.len() / 2,
    })
}
