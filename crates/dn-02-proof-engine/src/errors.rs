//! Proof engine error catalogue.

use dn_01_sp_store::StoreError;
use shared_crypto::CryptoError;
use thiserror::Error;

use crate::ports::ChainError;

/// Why a proof round for one provider produced no submission.
#[derive(Debug, Error)]
pub enum ProofError {
    /// Reading the record or part blob failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Hashing or tree construction failed (e.g. a truncated blob).
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// The chain collaborator failed; retried next tick.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// The contract's selector does not fit the provider's current data.
    /// The engine skips the round rather than guess a replacement.
    #[error("challenge index {index} out of range ({available} available)")]
    ChallengeOutOfRange {
        /// Index the contract dictated.
        index: usize,
        /// What the provider actually has.
        available: usize,
    },

    /// The part's root is not a leaf of the declared filesystem tree, so
    /// no path to the attested root exists.
    #[error("part {0} is not referenced by the declared filesystem")]
    PartNotInFilesystem(String),

    /// The stored record cannot back a proof (empty tree, undecodable
    /// signature).
    #[error("malformed filesystem record: {0}")]
    MalformedRecord(String),
}
