//! Shared application state for the gateway.

use std::sync::Arc;
use std::time::Duration;

use dn_01_sp_store::{QuotaAccountant, SpStore};
use dn_02_proof_engine::NodeRegistry;

/// State every handler sees.
#[derive(Clone)]
pub struct AppState {
    /// Provider records and part blobs.
    pub store: Arc<SpStore>,
    /// Durable byte-budget gate.
    pub quota: Arc<QuotaAccountant>,
    /// On-chain node registry, for overflow forwarding.
    pub registry: Arc<dyn NodeRegistry>,
    /// This node's own `ip:port`, so forwarding can skip itself and a
    /// successful local copy can name itself in the response.
    pub self_endpoint: String,
    /// Outbound client for peer probes and forwards.
    pub http: reqwest::Client,
}

impl AppState {
    /// Wire the gateway state.
    pub fn new(
        store: Arc<SpStore>,
        quota: Arc<QuotaAccountant>,
        registry: Arc<dyn NodeRegistry>,
        self_endpoint: String,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to initialize outbound HTTP client");
        Self {
            store,
            quota,
            registry,
            self_endpoint,
            http,
        }
    }
}
