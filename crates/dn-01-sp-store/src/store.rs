//! Provider record and part-blob persistence.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use shared_types::Address;
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::StoreError;
use crate::fsio;
use crate::layout::{NodePaths, SP_FS_FILE};
use crate::metadata::SpFsRecord;

/// Disk-backed store of provider records and part blobs.
///
/// One instance per node account. Mutating a provider's record requires
/// holding that provider's lock (see [`SpStore::lock`]); reading records or
/// serving blobs does not.
pub struct SpStore {
    paths: NodePaths,
    locks: DashMap<Address, Arc<Mutex<()>>>,
}

impl SpStore {
    /// Bind a store to a node layout.
    pub fn new(paths: NodePaths) -> Self {
        Self {
            paths,
            locks: DashMap::new(),
        }
    }

    /// The layout this store writes into.
    pub fn paths(&self) -> &NodePaths {
        &self.paths
    }

    /// The write lock for one provider. Callers hold it across
    /// load-check-write sequences on the record; it is never held across a
    /// network call.
    pub fn lock(&self, sp: &Address) -> Arc<Mutex<()>> {
        self.locks
            .entry(*sp)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    // =========================================================================
    // RECORDS
    // =========================================================================

    /// Whether the provider has a record on this node.
    pub fn record_exists(&self, sp: &Address) -> bool {
        self.paths.sp_record_file(sp).exists()
    }

    /// Load a provider's filesystem record.
    pub fn load_record(&self, sp: &Address) -> Result<SpFsRecord, StoreError> {
        let path = self.paths.sp_record_file(sp);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::RecordNotFound(sp.to_string()))
            }
            Err(e) => return Err(StoreError::io(&path, e)),
        };
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Replace a provider's record atomically. The caller holds the
    /// provider lock.
    pub fn write_record(&self, sp: &Address, record: &SpFsRecord) -> Result<(), StoreError> {
        let path = self.paths.sp_record_file(sp);
        let bytes = serde_json::to_vec_pretty(record).map_err(|e| StoreError::Corrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        fsio::write_atomic(&path, &bytes)?;
        debug!(provider = %sp, nonce = %record.nonce, "filesystem record replaced");
        Ok(())
    }

    // =========================================================================
    // PART BLOBS
    // =========================================================================

    /// Absolute path of a part blob (whether or not it exists).
    pub fn part_path(&self, sp: &Address, part_name: &str) -> PathBuf {
        self.paths.part_file(sp, part_name)
    }

    /// Whether the named part blob is on disk.
    pub fn part_exists(&self, sp: &Address, part_name: &str) -> bool {
        self.part_path(sp, part_name).is_file()
    }

    /// Write a part blob: create, write, sync, close. No lock is taken: the name is
    /// a content hash, so a concurrent identical write is harmless.
    pub fn write_part(
        &self,
        sp: &Address,
        part_name: &str,
        bytes: &[u8],
    ) -> Result<(), StoreError> {
        fsio::write_durable(&self.part_path(sp, part_name), bytes)
    }

    /// Read a part blob fully into memory.
    pub fn read_part(&self, sp: &Address, part_name: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.part_path(sp, part_name);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::PartNotFound(part_name.to_string()))
            }
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    /// Rename a part blob (re-keying during a copy upload).
    pub fn rename_part(
        &self,
        sp: &Address,
        old_name: &str,
        new_name: &str,
    ) -> Result<(), StoreError> {
        let from = self.part_path(sp, old_name);
        let to = self.part_path(sp, new_name);
        std::fs::rename(&from, &to).map_err(|e| StoreError::io(&from, e))
    }

    /// Delete a part blob; deleting an absent blob is not an error
    /// (rollback paths race the cleaner).
    pub fn delete_part(&self, sp: &Address, part_name: &str) -> Result<(), StoreError> {
        let path = self.part_path(sp, part_name);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    // =========================================================================
    // ENUMERATION
    // =========================================================================

    /// All provider directories under `storage/`, by parsed address.
    /// Entries that are not address-named directories are skipped.
    pub fn provider_dirs(&self) -> Result<Vec<Address>, StoreError> {
        let dir = self.paths.storage_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut providers = Vec::new();
        let entries = std::fs::read_dir(&dir).map_err(|e| StoreError::io(&dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&dir, e))?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Ok(address) = Address::parse(&entry.file_name().to_string_lossy()) {
                providers.push(address);
            }
        }
        providers.sort();
        Ok(providers)
    }

    /// Names of all part blobs a provider currently has on disk (the record
    /// file is excluded; only 64-hex-digit names qualify).
    pub fn part_names(&self, sp: &Address) -> Result<Vec<String>, StoreError> {
        let dir = self.paths.sp_dir(sp);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        let entries = std::fs::read_dir(&dir).map_err(|e| StoreError::io(&dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&dir, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name == SP_FS_FILE {
                continue;
            }
            if name.len() == 64 && name.bytes().all(|b| b.is_ascii_hexdigit()) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}
