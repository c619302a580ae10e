//! # Proof Engine (dn-02)
//!
//! Periodic proof-of-storage generation. A background loop walks every
//! provider directory, asks the on-chain contract which part and which
//! 8 KiB block it must prove this round, rebuilds the merkle path from that
//! block up through the part subtree into the provider's filesystem root,
//! and submits the path together with the raw block bytes (the contract
//! verifies by rehashing).
//!
//! ## Architecture
//!
//! The chain is reached only through ports ([`ports::ProofContract`],
//! [`ports::NodeRegistry`]); the concrete JSON-RPC client and ABI bindings
//! are external collaborators. The in-memory adapter in [`adapters`] backs
//! tests and offline operation.
//!
//! Challenge derivation is on-chain logic: the engine consumes the
//! `(part_index, block_index)` selector verbatim and skips the round when
//! it is out of range; it never re-derives a selector locally.

pub mod adapters;
pub mod engine;
pub mod errors;
pub mod ports;
pub mod proof;

pub use adapters::InMemoryChain;
pub use engine::ProofEngine;
pub use errors::ProofError;
pub use ports::{ChainError, NodeRegistry, PeerNode, ProofContract, ProofSubmission, StorageChallenge};
pub use proof::{build_storage_proof, StorageProof};
