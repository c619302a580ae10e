//! The background proof loop.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dn_01_sp_store::{SpStore, StoreError};
use shared_types::Address;
use tracing::{debug, info, warn};

use crate::errors::ProofError;
use crate::ports::{ProofContract, ProofSubmission};
use crate::proof::build_storage_proof;

/// Walks every provider directory on a fixed cadence and submits one proof
/// per challenged provider. Chain failures are logged and retried on the
/// next tick; they never take the node down.
pub struct ProofEngine {
    store: Arc<SpStore>,
    contract: Arc<dyn ProofContract>,
    node_address: Address,
    tick_interval: Duration,
}

impl ProofEngine {
    /// Wire the engine to its store and contract.
    pub fn new(
        store: Arc<SpStore>,
        contract: Arc<dyn ProofContract>,
        node_address: Address,
        tick_interval: Duration,
    ) -> Self {
        Self {
            store,
            contract,
            node_address,
            tick_interval,
        }
    }

    /// Run forever. The caller owns the task handle and aborts it on
    /// shutdown.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    /// One full pass over all provider directories.
    pub async fn tick(&self) {
        let providers = match self.store.provider_dirs() {
            Ok(providers) => providers,
            Err(e) => {
                warn!(error = %e, "cannot enumerate provider directories");
                return;
            }
        };

        for provider in providers {
            match self.prove_provider(&provider).await {
                Ok(Some(reward)) => {
                    info!(provider = %provider, reward, "proof of storage accepted");
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(provider = %provider, error = %e, "proof round failed; will retry");
                }
            }
        }
    }

    /// Prove one provider's challenged block, if the contract asks for one.
    /// Returns the reward delta on submission, `None` when this round had
    /// nothing to prove.
    pub async fn prove_provider(&self, provider: &Address) -> Result<Option<u64>, ProofError> {
        let record = match self.store.load_record(provider) {
            Ok(record) => record,
            // A directory without a record (mid-upload) is skipped quietly.
            Err(StoreError::RecordNotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let Some(challenge) = self.contract.challenge(provider).await? else {
            return Ok(None);
        };

        let parts = self.store.part_names(provider)?;
        let Some(part_name) = parts.get(challenge.part_index) else {
            // The selector is chain truth; an index we cannot serve is
            // skipped, never substituted.
            debug!(
                provider = %provider,
                part_index = challenge.part_index,
                parts = parts.len(),
                "challenge targets a part this node does not hold"
            );
            return Ok(None);
        };

        let part_bytes = self.store.read_part(provider, part_name)?;
        let storage_proof = build_storage_proof(&record, &part_bytes, challenge.block_index)?;

        let signed_fs_root =
            hex::decode(record.signed_fs_root.trim_start_matches("0x")).map_err(|e| {
                ProofError::MalformedRecord(format!("undecodable signed root: {e}"))
            })?;

        let submission = ProofSubmission {
            node_address: self.node_address,
            block_number: self.contract.block_number().await?,
            proof_root: storage_proof.proof_root,
            timestamp: unix_now(),
            signed_fs_root,
            block_bytes: storage_proof.block_bytes,
            proof: storage_proof.proof,
        };

        let reward = self.contract.send_proof(submission).await?;
        Ok(Some(reward))
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
