//! Filesystem replacement (`/update_fs`).
//!
//! A provider replaces its declared hash-set without moving any bytes. Two
//! signatures guard the swap: one over the membership list (this route's
//! distinguishing attestation) and one over the new root. The nonce only
//! moves forward.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use dn_01_sp_store::SpFsRecord;
use serde::Deserialize;
use shared_crypto::commitments::{fs_root_digest, fs_tree_digest};
use shared_crypto::verify_signer;
use shared_types::{parse_hash_hex, parse_signature_hex, Address, Hash, Nonce};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body, field names fixed by the wire format.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatedFsInfo {
    /// Replacement file-hash list, hex.
    #[serde(rename = "NewFs")]
    pub new_fs: Vec<String>,

    /// New revision, decimal.
    #[serde(rename = "Nonce")]
    pub nonce: String,

    /// Signature over the new root commitment, hex.
    #[serde(rename = "SignedFsRootHash")]
    pub signed_fs_root_hash: String,
}

/// `POST /update_fs/{spAddress}/{signedFsys}`
pub async fn update_fs(
    State(state): State<AppState>,
    Path((address_raw, signed_fsys_raw)): Path<(String, String)>,
    Json(body): Json<UpdatedFsInfo>,
) -> Result<StatusCode, ApiError> {
    let address = Address::parse(&address_raw)?;
    let tree_sig = parse_signature_hex(&signed_fsys_raw)?;
    let root_sig = parse_signature_hex(&body.signed_fs_root_hash)?;
    let nonce = Nonce::parse(&body.nonce)?;

    let mut new_fs: Vec<String> = body.new_fs.iter().map(|h| h.to_lowercase()).collect();
    new_fs.sort();

    let lock = state.store.lock(&address);
    let _guard = lock.lock().await;

    // Updates only revise an existing declaration.
    let current = state.store.load_record(&address)?;
    let current_nonce = current
        .nonce()
        .map_err(|e| ApiError::Io(format!("stored nonce undecodable: {e}")))?;
    if nonce < current_nonce {
        return Err(ApiError::StaleNonce {
            supplied: nonce.value(),
            current: current_nonce.value(),
        });
    }

    // Membership-list attestation, the one distinguishing this route.
    let tree_digest = fs_tree_digest(new_fs.iter().map(String::as_str), nonce);
    verify_signer(&tree_digest, &tree_sig, &address).map_err(|_| ApiError::WrongSignature)?;

    // Root attestation over the recomputed tree.
    let leaves = new_fs
        .iter()
        .map(|h| parse_hash_hex(h))
        .collect::<Result<Vec<Hash>, _>>()?;
    let (fs_root, tree) = shared_crypto::merkle::calc_root(leaves)
        .map_err(|e| ApiError::MalformedRequest(e.to_string()))?;
    let root_digest = fs_root_digest(&fs_root, nonce);
    verify_signer(&root_digest, &root_sig, &address).map_err(|_| ApiError::WrongSignature)?;

    // Part blobs stay untouched; pruning unreferenced blobs is the
    // cleaner's job, not the update path's.
    let record = SpFsRecord {
        address: address.to_string(),
        fs: new_fs,
        nonce: nonce.to_string(),
        signed_fs_root: body.signed_fs_root_hash.clone(),
        tree,
    };
    state.store.write_record(&address, &record)?;

    info!(provider = %address, nonce = %nonce, "filesystem declaration replaced");
    Ok(StatusCode::OK)
}
