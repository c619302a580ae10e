//! Durable node configuration.
//!
//! The config file doubles as the quota ledger: `UsedStorageSpace` is the
//! only mutable numeric state in the node and is read-modify-written under
//! the quota lock (see [`crate::quota`]).

use std::path::Path;

use serde::{Deserialize, Serialize};
use shared_types::GIB_BYTES;

use crate::errors::StoreError;
use crate::fsio;

/// `config/config.json`, field names fixed by the wire/disk format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Storage limit in GiB.
    #[serde(rename = "StorageLimit")]
    pub storage_limit_gib: u64,

    /// Bytes currently accounted to stored parts.
    #[serde(rename = "UsedStorageSpace")]
    pub used_storage_space: u64,

    /// Externally reachable IP address of this node.
    #[serde(rename = "IpAddress")]
    pub ip_address: String,

    /// HTTP port the gateway listens on.
    #[serde(rename = "HTTPPort")]
    pub http_port: u16,

    /// Endpoint of the chain client this node submits proofs through.
    #[serde(rename = "ChnClntAddr")]
    pub chain_client_addr: String,

    /// Address of the node-registry NFT contract.
    #[serde(rename = "NFT")]
    pub node_registry_addr: String,

    /// Whether the operator opted into log shipping.
    #[serde(rename = "AgreeSendLogs")]
    pub agree_send_logs: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            storage_limit_gib: 1,
            used_storage_space: 0,
            ip_address: "127.0.0.1".to_string(),
            http_port: 8081,
            chain_client_addr: String::new(),
            node_registry_addr: String::new(),
            agree_send_logs: false,
        }
    }
}

impl NodeConfig {
    /// The configured limit in bytes.
    pub fn limit_bytes(&self) -> u64 {
        self.storage_limit_gib.saturating_mul(GIB_BYTES)
    }

    /// The gateway endpoint in `ip:port` form.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.ip_address, self.http_port)
    }

    /// Load from disk.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let bytes = std::fs::read(path).map_err(|e| StoreError::io(path, e))?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Load from disk, falling back to (and persisting) defaults when the
    /// file does not exist yet.
    pub fn load_or_init(path: &Path) -> Result<Self, StoreError> {
        if path.exists() {
            return Self::load(path);
        }
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }

    /// Persist atomically.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(self).map_err(|e| StoreError::Corrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        fsio::write_atomic(path, &bytes)
    }
}
