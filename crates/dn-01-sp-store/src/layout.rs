//! Filesystem layout of a node account directory.

use std::path::{Path, PathBuf};

use shared_types::Address;

use crate::errors::StoreError;

/// Name of the per-provider filesystem record file.
pub const SP_FS_FILE: &str = "spFs.json";

/// Name of the node config file under the config directory.
pub const CONFIG_FILE: &str = "config.json";

/// Path builder for one node account's on-disk tree.
#[derive(Debug, Clone)]
pub struct NodePaths {
    accounts_root: PathBuf,
    node_address: Address,
}

impl NodePaths {
    /// Bind a layout to an accounts root and a node address.
    pub fn new<P: AsRef<Path>>(accounts_root: P, node_address: Address) -> Self {
        Self {
            accounts_root: accounts_root.as_ref().to_path_buf(),
            node_address,
        }
    }

    /// The node account this layout belongs to.
    pub fn node_address(&self) -> Address {
        self.node_address
    }

    /// `<accounts>/<nodeAddr>/`
    pub fn node_dir(&self) -> PathBuf {
        self.accounts_root.join(self.node_address.to_string())
    }

    /// `<accounts>/<nodeAddr>/config/config.json`
    pub fn config_file(&self) -> PathBuf {
        self.node_dir().join("config").join(CONFIG_FILE)
    }

    /// `<accounts>/<nodeAddr>/keystore/node.key`
    pub fn key_file(&self) -> PathBuf {
        self.node_dir().join("keystore").join("node.key")
    }

    /// `<accounts>/<nodeAddr>/storage/`
    pub fn storage_dir(&self) -> PathBuf {
        self.node_dir().join("storage")
    }

    /// `<accounts>/<nodeAddr>/storage/<spAddr>/`
    pub fn sp_dir(&self, sp: &Address) -> PathBuf {
        self.storage_dir().join(sp.to_string())
    }

    /// The provider's filesystem record file.
    pub fn sp_record_file(&self, sp: &Address) -> PathBuf {
        self.sp_dir(sp).join(SP_FS_FILE)
    }

    /// A part blob, addressed by its lowercase-hex name.
    pub fn part_file(&self, sp: &Address, part_name: &str) -> PathBuf {
        self.sp_dir(sp).join(part_name)
    }

    /// Create the config and storage directories if absent.
    pub fn ensure_base_dirs(&self) -> Result<(), StoreError> {
        for dir in [
            self.node_dir().join("config"),
            self.node_dir().join("keystore"),
            self.storage_dir(),
        ] {
            std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        }
        Ok(())
    }
}
