//! Node account bootstrap.
//!
//! One secp256k1 key per node, persisted as hex under the account's
//! keystore directory. Password-based keystore encryption is an external
//! concern; the runtime only needs a loadable key and the address derived
//! from it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use k256::ecdsa::SigningKey;
use shared_crypto::ecdsa::{address_from_pubkey, signing_key_from_bytes};
use shared_types::Address;
use tracing::info;

/// A loaded node identity.
pub struct NodeAccount {
    /// The node's signing key.
    pub signing_key: SigningKey,
    /// Address derived from the key.
    pub address: Address,
}

/// Load the first existing account under `accounts_root`, or create a new
/// one when none exists yet.
pub fn load_or_create(accounts_root: &Path) -> Result<NodeAccount> {
    if let Some(key_file) = find_existing_key(accounts_root)? {
        let raw = std::fs::read_to_string(&key_file)
            .with_context(|| format!("reading {}", key_file.display()))?;
        let bytes = hex::decode(raw.trim()).context("node key is not valid hex")?;
        let signing_key = signing_key_from_bytes(&bytes).context("node key is not a valid scalar")?;
        let address = address_from_pubkey(signing_key.verifying_key());
        info!(%address, "loaded node account");
        return Ok(NodeAccount {
            signing_key,
            address,
        });
    }

    let signing_key = SigningKey::random(&mut rand::thread_rng());
    let address = address_from_pubkey(signing_key.verifying_key());

    let keystore_dir = accounts_root.join(address.to_string()).join("keystore");
    std::fs::create_dir_all(&keystore_dir)
        .with_context(|| format!("creating {}", keystore_dir.display()))?;
    let key_file = keystore_dir.join("node.key");
    std::fs::write(&key_file, hex::encode(signing_key.to_bytes()))
        .with_context(|| format!("writing {}", key_file.display()))?;

    info!(%address, "created new node account");
    Ok(NodeAccount {
        signing_key,
        address,
    })
}

/// Scan `accounts_root` for an address-named directory holding a key file.
fn find_existing_key(accounts_root: &Path) -> Result<Option<PathBuf>> {
    if !accounts_root.exists() {
        return Ok(None);
    }
    let entries = std::fs::read_dir(accounts_root)
        .with_context(|| format!("reading {}", accounts_root.display()))?;

    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if Address::parse(&name).is_err() {
            continue;
        }
        let key_file = entry.path().join("keystore").join("node.key");
        if key_file.is_file() {
            return Ok(Some(key_file));
        }
    }
    Ok(None)
}
