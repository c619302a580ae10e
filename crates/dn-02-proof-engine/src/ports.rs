//! Outbound ports to the chain.
//!
//! The node talks to two contracts: the proof-of-storage contract (reward
//! challenges and proof submission) and the node-registry NFT (peer
//! discovery for overflow forwarding). Both are opaque collaborators behind
//! these traits; adapters decide transport.

use std::fmt;

use async_trait::async_trait;
use shared_types::{Address, Hash};
use thiserror::Error;

/// Failure talking to a chain collaborator. Never fatal: the proof loop
/// logs and retries on its next tick, and overflow forwarding falls back to
/// the next peer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// Transport-level failure (endpoint down, timeout).
    #[error("chain provider unreachable: {0}")]
    Unreachable(String),

    /// The call was delivered and rejected.
    #[error("chain call failed: {0}")]
    CallFailed(String),
}

/// The selector dictating which slice of stored data must be proven:
/// opaque output of the contract's reward-info call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageChallenge {
    /// Index into the provider's sorted part list.
    pub part_index: usize,
    /// Index of the 8 KiB block within that part.
    pub block_index: usize,
}

/// One proof-of-storage submission, mirroring the contract's `SendProof`
/// argument list.
#[derive(Debug, Clone)]
pub struct ProofSubmission {
    /// The submitting node account.
    pub node_address: Address,
    /// Chain height the proof was built at.
    pub block_number: u64,
    /// The root the merkle path commits to (its final element).
    pub proof_root: Hash,
    /// Submission time, unix seconds.
    pub timestamp: u64,
    /// The provider's signature over the filesystem-root commitment.
    pub signed_fs_root: Vec<u8>,
    /// The challenged 8 KiB block, in the clear.
    pub block_bytes: Vec<u8>,
    /// Sibling-pair merkle path from the block to the filesystem root.
    pub proof: Vec<Hash>,
}

/// A storage node registered in the on-chain NFT registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerNode {
    /// IPv4 address, network byte order.
    pub ip: [u8; 4],
    /// Gateway port.
    pub port: u16,
}

impl fmt::Display for PeerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}:{}",
            self.ip[0], self.ip[1], self.ip[2], self.ip[3], self.port
        )
    }
}

/// The proof-of-storage contract.
#[async_trait]
pub trait ProofContract: Send + Sync {
    /// The current challenge for a provider, or `None` when the contract
    /// has nothing to ask of this node for that provider this round.
    async fn challenge(&self, provider: &Address) -> Result<Option<StorageChallenge>, ChainError>;

    /// Current chain height.
    async fn block_number(&self) -> Result<u64, ChainError>;

    /// Submit a proof; returns the reward delta credited for it.
    async fn send_proof(&self, submission: ProofSubmission) -> Result<u64, ChainError>;
}

/// The node-registry NFT contract.
#[async_trait]
pub trait NodeRegistry: Send + Sync {
    /// Number of registered nodes.
    async fn total_supply(&self) -> Result<u64, ChainError>;

    /// Registered node by token id, `0..total_supply`.
    async fn node_by_id(&self, id: u64) -> Result<PeerNode, ChainError>;
}
