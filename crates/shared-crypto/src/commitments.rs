//! # Signed Commitment Digests
//!
//! A provider attests to each filesystem revision with two distinct
//! digests, both bound to the revision nonce:
//!
//! - the **root digest** commits to the Merkle root alone (sent with every
//!   upload);
//! - the **tree digest** commits to the exact membership list (sent with
//!   filesystem updates, where the replacement list itself is the payload).
//!
//! Download authorization uses a third, nonce-free digest binding a file
//! key to the provider address.

use shared_types::{Hash, Nonce};

use crate::merkle::sha256;

/// `SHA256(root ∥ nonce32)`, the upload-path attestation.
pub fn fs_root_digest(fs_root: &Hash, nonce: Nonce) -> Hash {
    let mut buf = Vec::with_capacity(64);
    buf.extend_from_slice(fs_root);
    buf.extend_from_slice(&nonce.to_bytes32());
    sha256(&buf)
}

/// `SHA256(concat(sorted fs hex strings) ∥ nonce32)`, the update-path
/// attestation over the exact membership list.
///
/// The hashes are concatenated in their lowercase-hex ASCII wire form, not
/// as raw bytes; `hashes` must already be sorted.
pub fn fs_tree_digest<'a, I>(sorted_hashes_hex: I, nonce: Nonce) -> Hash
where
    I: IntoIterator<Item = &'a str>,
{
    let mut buf = Vec::new();
    for hash_hex in sorted_hashes_hex {
        buf.extend_from_slice(hash_hex.as_bytes());
    }
    buf.extend_from_slice(&nonce.to_bytes32());
    sha256(&buf)
}

/// `SHA256(fileKey ∥ spAddress)` over the ASCII wire forms; authorizes
/// fetching one file of one provider. Anyone holding the signed URL may
/// fetch; the signature binds `(file, provider)` only.
pub fn download_digest(file_key: &str, sp_address: &str) -> Hash {
    let mut buf = Vec::with_capacity(file_key.len() + sp_address.len());
    buf.extend_from_slice(file_key.as_bytes());
    buf.extend_from_slice(sp_address.as_bytes());
    sha256(&buf)
}
