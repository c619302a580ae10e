//! Crypto error catalogue.

use thiserror::Error;

/// Errors from hashing, tree construction and signature handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Part payload is empty or not a whole number of 8192-byte blocks.
    #[error("part payload of {len} bytes is not a whole number of 8192-byte blocks")]
    UnalignedPart {
        /// Offending payload length.
        len: usize,
    },

    /// A Merkle root was requested over an empty leaf set.
    #[error("cannot build a merkle tree over zero leaves")]
    EmptyLeafSet,

    /// The recovery byte is not one of 0, 1, 27, 28.
    #[error("invalid signature recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// Signature scalars failed to parse (zero, out of range, malformed).
    #[error("invalid signature format")]
    InvalidSignature,

    /// Public-key recovery failed for the given digest/signature pair.
    #[error("signer recovery failed")]
    RecoveryFailed,

    /// Signing-key bytes are not a valid secp256k1 scalar.
    #[error("invalid signing key")]
    InvalidSigningKey,

    /// The signing operation itself failed.
    #[error("signing failed")]
    SigningFailed,
}
