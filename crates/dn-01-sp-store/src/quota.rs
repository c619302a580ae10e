//! Durable quota accounting.
//!
//! Reservation and rollback both re-read the config under the quota lock,
//! mutate `UsedStorageSpace`, and persist before returning; the counter on
//! disk is therefore always the last committed value. A crash between a
//! reservation and its rollback leaves the counter inflated; the startup
//! [`QuotaAccountant::reconcile`] walk repairs that by re-deriving the
//! counter from the blobs actually on disk.

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::NodeConfig;
use crate::errors::StoreError;
use crate::layout::NodePaths;
use crate::store::SpStore;

/// Reserve/rollback gate around the durable byte budget.
pub struct QuotaAccountant {
    paths: NodePaths,
    lock: Mutex<()>,
}

impl QuotaAccountant {
    /// Bind the accountant to a node layout.
    pub fn new(paths: NodePaths) -> Self {
        Self {
            paths,
            lock: Mutex::new(()),
        }
    }

    /// Reserve `incoming` bytes. Rejects with [`StoreError::Overflow`] when
    /// the new total would exceed `StorageLimit · 2³⁰`; otherwise the new
    /// total is persisted before returning.
    pub async fn reserve(&self, incoming: u64) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;

        let path = self.paths.config_file();
        let mut config = NodeConfig::load(&path)?;
        let limit = config.limit_bytes();
        let new_total = config.used_storage_space.saturating_add(incoming);

        if new_total > limit {
            return Err(StoreError::Overflow {
                used: config.used_storage_space,
                incoming,
                limit,
            });
        }

        config.used_storage_space = new_total;
        config.save(&path)
    }

    /// Roll back a reservation after a failed upload.
    pub async fn release(&self, bytes: u64) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;

        let path = self.paths.config_file();
        let mut config = NodeConfig::load(&path)?;
        config.used_storage_space = config.used_storage_space.saturating_sub(bytes);
        config.save(&path)
    }

    /// Bytes currently accounted.
    pub async fn used(&self) -> Result<u64, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(NodeConfig::load(&self.paths.config_file())?.used_storage_space)
    }

    /// Re-derive `UsedStorageSpace` from the part blobs on disk and persist
    /// the corrected value. Run at startup, before traffic.
    pub async fn reconcile(&self, store: &SpStore) -> Result<u64, StoreError> {
        let _guard = self.lock.lock().await;

        let mut total: u64 = 0;
        for sp in store.provider_dirs()? {
            for part_name in store.part_names(&sp)? {
                let path = store.part_path(&sp, &part_name);
                match std::fs::metadata(&path) {
                    Ok(meta) => total = total.saturating_add(meta.len()),
                    Err(e) => warn!(part = %part_name, error = %e, "skipping unreadable part"),
                }
            }
        }

        let path = self.paths.config_file();
        let mut config = NodeConfig::load(&path)?;
        if config.used_storage_space != total {
            info!(
                recorded = config.used_storage_space,
                actual = total,
                "reconciling quota counter against disk"
            );
            config.used_storage_space = total;
            config.save(&path)?;
        }
        Ok(total)
    }
}
