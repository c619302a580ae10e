//! Low-level durable file writes.

use std::io::Write;
use std::path::Path;

use crate::errors::StoreError;

/// Replace `path` atomically: write a sibling temp file, fsync it, rename
/// over the target. Readers see either the old or the new content, never a
/// torn write.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let temp_path = path.with_extension("tmp");
    let mut file = std::fs::File::create(&temp_path).map_err(|e| StoreError::io(&temp_path, e))?;
    file.write_all(bytes)
        .map_err(|e| StoreError::io(&temp_path, e))?;
    file.sync_all().map_err(|e| StoreError::io(&temp_path, e))?;
    drop(file);

    std::fs::rename(&temp_path, path).map_err(|e| StoreError::io(path, e))
}

/// Create-write-sync-close at the final path. Used for part blobs, whose
/// content-hash names make a concurrent duplicate write byte-identical.
pub(crate) fn write_durable(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }

    let mut file = std::fs::File::create(path).map_err(|e| StoreError::io(path, e))?;
    file.write_all(bytes).map_err(|e| StoreError::io(path, e))?;
    file.sync_all().map_err(|e| StoreError::io(path, e))
}
