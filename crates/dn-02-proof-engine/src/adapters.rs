//! In-memory chain adapter.
//!
//! Backs tests and offline operation. With no challenges and no peers
//! configured the node runs self-contained: the proof loop idles and
//! overflow forwarding finds no candidates.
//!
//! State lives behind `tokio::sync::Mutex` like every other lock in this
//! tree; a chain adapter must never be able to panic the runtime it runs
//! on. Registry slots are optional so a token that resolves to nothing
//! (a garbage on-chain record) can be scripted and surfaces as a
//! [`ChainError`], exactly as a real registry lookup failure would.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use shared_types::Address;
use tokio::sync::Mutex;

use crate::ports::{
    ChainError, NodeRegistry, PeerNode, ProofContract, ProofSubmission, StorageChallenge,
};

/// Scriptable stand-in for both contracts.
pub struct InMemoryChain {
    challenges: Mutex<HashMap<Address, StorageChallenge>>,
    submissions: Mutex<Vec<ProofSubmission>>,
    peers: Mutex<Vec<Option<PeerNode>>>,
    block_number: AtomicU64,
    reward_per_proof: u64,
}

impl InMemoryChain {
    /// New adapter crediting `reward_per_proof` per accepted submission.
    pub fn new(reward_per_proof: u64) -> Self {
        Self {
            challenges: Mutex::new(HashMap::new()),
            submissions: Mutex::new(Vec::new()),
            peers: Mutex::new(Vec::new()),
            block_number: AtomicU64::new(1),
            reward_per_proof,
        }
    }

    /// Script the next challenge for a provider.
    pub async fn set_challenge(&self, provider: Address, challenge: StorageChallenge) {
        self.challenges.lock().await.insert(provider, challenge);
    }

    /// Register a peer in the simulated NFT registry.
    pub async fn add_peer(&self, peer: PeerNode) {
        self.peers.lock().await.push(Some(peer));
    }

    /// Register a token whose node record cannot be resolved. It counts
    /// toward `total_supply`, and looking it up fails.
    pub async fn add_unresolvable_node(&self) {
        self.peers.lock().await.push(None);
    }

    /// Everything submitted so far.
    pub async fn submissions(&self) -> Vec<ProofSubmission> {
        self.submissions.lock().await.clone()
    }

    /// Advance the simulated chain height.
    pub fn advance_block(&self) {
        self.block_number.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProofContract for InMemoryChain {
    async fn challenge(
        &self,
        provider: &Address,
    ) -> Result<Option<StorageChallenge>, ChainError> {
        Ok(self.challenges.lock().await.get(provider).copied())
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        Ok(self.block_number.load(Ordering::SeqCst))
    }

    async fn send_proof(&self, submission: ProofSubmission) -> Result<u64, ChainError> {
        self.submissions.lock().await.push(submission);
        Ok(self.reward_per_proof)
    }
}

#[async_trait]
impl NodeRegistry for InMemoryChain {
    async fn total_supply(&self) -> Result<u64, ChainError> {
        Ok(self.peers.lock().await.len() as u64)
    }

    async fn node_by_id(&self, id: u64) -> Result<PeerNode, ChainError> {
        self.peers
            .lock()
            .await
            .get(id as usize)
            .copied()
            .flatten()
            .ok_or_else(|| ChainError::CallFailed(format!("no resolvable node with id {id}")))
    }
}
