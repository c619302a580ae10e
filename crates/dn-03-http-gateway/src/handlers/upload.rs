//! The upload admission pipeline.
//!
//! `/upload`, `/copy` and `/backup` share one pipeline; every hash is
//! re-derived from the received bytes before anything durable changes, and
//! any failure unwinds whatever had already moved (quota first, then blobs
//! and renames).
//!
//! Order of operations: reserve → parse → verify attestation → validate
//! parts in memory → membership check → blob commit → record commit. The
//! record is written last, so a reader never sees a record whose parts were
//! not fully validated; the transient inverse (a blob without a record) is
//! handled by downloads treating missing state as 404.

use axum::extract::{Multipart, Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use dn_01_sp_store::{SpFsRecord, StoreError};
use shared_crypto::commitments::fs_root_digest;
use shared_crypto::merkle::{block_hashes, calc_root};
use shared_crypto::verify_signer;
use shared_types::{hash_to_hex, parse_hash_hex, Hash};
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::overflow;
use crate::request::{parse_declared_size, parse_storage_request, RequestKind, StorageRequest};
use crate::state::AppState;

/// `POST /upload/{size}`: fresh upload from a provider.
pub async fn upload(
    State(state): State<AppState>,
    Path(size): Path<String>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    admit(state, RequestKind::Upload, &size, multipart).await
}

/// `POST /copy/{size}`: re-keying upload; overflows to a peer when the
/// local quota is exhausted.
pub async fn copy(
    State(state): State<AppState>,
    Path(size): Path<String>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    admit(state, RequestKind::Copy, &size, multipart).await
}

/// `POST /backup/{size}`: a peer's forwarded copy payload.
pub async fn backup(
    State(state): State<AppState>,
    Path(size): Path<String>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    admit(state, RequestKind::Backup, &size, multipart).await
}

async fn admit(
    state: AppState,
    kind: RequestKind,
    size_raw: &str,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let declared_size = parse_declared_size(size_raw)?;

    if let Err(denial) = state.quota.reserve(declared_size).await {
        return match (denial, kind) {
            (StoreError::Overflow { .. }, RequestKind::Copy) => {
                // Full nodes hand the payload to a peer instead of failing.
                let request = parse_storage_request(kind, declared_size, multipart).await?;
                overflow::forward(&state, &request).await
            }
            (denial, _) => Err(denial.into()),
        };
    }

    // Reserved from here on: every failure must give the bytes back.
    let request = match parse_storage_request(kind, declared_size, multipart).await {
        Ok(request) => request,
        Err(e) => {
            release_quota(&state, declared_size).await;
            return Err(e);
        }
    };

    if let Err(e) = commit(&state, &request).await {
        release_quota(&state, declared_size).await;
        return Err(e);
    }

    info!(
        provider = %request.address,
        parts = request.files.len(),
        bytes = declared_size,
        kind = ?kind,
        "upload admitted"
    );

    match kind {
        RequestKind::Copy => Ok(Json(
            serde_json::json!({ "node_address": state.self_endpoint }),
        )
        .into_response()),
        _ => Ok("OK".into_response()),
    }
}

async fn release_quota(state: &AppState, bytes: u64) {
    if let Err(e) = state.quota.release(bytes).await {
        // The counter stays inflated until the next startup reconcile.
        error!(bytes, error = %e, "quota rollback failed");
    }
}

/// Validate everything in memory, then mutate disk with rollback.
async fn commit(state: &AppState, request: &StorageRequest) -> Result<(), ApiError> {
    // Attestation: the declared root, bound to the nonce, signed by the
    // declared address.
    let mut sorted_fs = request.fs.clone();
    sorted_fs.sort();

    let leaves = sorted_fs
        .iter()
        .map(|h| parse_hash_hex(h))
        .collect::<Result<Vec<Hash>, _>>()?;
    let (fs_root, tree) =
        calc_root(leaves).map_err(|e| ApiError::MalformedRequest(e.to_string()))?;

    let digest = fs_root_digest(&fs_root, request.nonce);
    verify_signer(&digest, &request.fs_root_sig, &request.address)
        .map_err(|_| ApiError::WrongSignature)?;

    // A fresh upload may not silently diverge from the filesystem the
    // provider already declared; re-declare via /update_fs first.
    if request.kind == RequestKind::Upload {
        match state.store.load_record(&request.address) {
            Ok(existing) if existing.root() != Some(fs_root) => {
                return Err(ApiError::MalformedRequest(
                    "declared filesystem disagrees with the existing record".to_string(),
                ));
            }
            Ok(_) | Err(StoreError::RecordNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    // Re-derive every part name from the received bytes.
    let planned = plan_parts(request)?;

    // The uploaded file must be one of the attested file hashes.
    let mut file_leaves = planned
        .iter()
        .map(|(name, _)| parse_hash_hex(name))
        .collect::<Result<Vec<Hash>, _>>()?;
    file_leaves.sort();
    let (whole_file_hash, _) =
        calc_root(file_leaves).map_err(|e| ApiError::MalformedRequest(e.to_string()))?;
    if !sorted_fs.contains(&hash_to_hex(&whole_file_hash)) {
        return Err(ApiError::OrphanedPart);
    }

    // Disk mutations, tracked for rollback.
    let sp = request.address;
    let mut written: Vec<String> = Vec::new();
    let mut renamed: Vec<(String, String)> = Vec::new();

    let outcome = apply_mutations(
        state,
        request,
        &sorted_fs,
        tree,
        &planned,
        &mut written,
        &mut renamed,
    )
    .await;

    if outcome.is_err() {
        for name in &written {
            if let Err(e) = state.store.delete_part(&sp, name) {
                warn!(part = %name, error = %e, "rollback delete failed");
            }
        }
        for (old, new) in renamed.iter().rev() {
            if let Err(e) = state.store.rename_part(&sp, new, old) {
                warn!(part = %new, error = %e, "rollback rename failed");
            }
        }
    }
    outcome
}

/// Pair every incoming blob with the name it will be stored under,
/// re-deriving its content root on the way.
fn plan_parts(request: &StorageRequest) -> Result<Vec<(String, usize)>, ApiError> {
    let mut planned = Vec::with_capacity(request.files.len());

    for (index, part) in request.files.iter().enumerate() {
        let blocks = block_hashes(&part.bytes).map_err(|_| ApiError::WrongPart)?;
        let (content_root, _) = calc_root(blocks).map_err(|_| ApiError::WrongPart)?;
        let content_hex = hash_to_hex(&content_root);

        let final_name = match request.kind {
            RequestKind::Upload => {
                if content_hex != part.name {
                    return Err(ApiError::WrongPart);
                }
                content_hex
            }
            RequestKind::Copy | RequestKind::Backup => {
                // The blob's content root is its old name; the declared
                // filename must be the mapped new name.
                let map = request
                    .hash_map
                    .as_ref()
                    .ok_or_else(|| ApiError::MalformedRequest("missing hashes map".to_string()))?;
                match map.get(&content_hex) {
                    Some(new_name) if *new_name == part.name => part.name.clone(),
                    _ => return Err(ApiError::WrongPart),
                }
            }
        };
        planned.push((final_name, index));
    }
    Ok(planned)
}

#[allow(clippy::too_many_arguments)]
async fn apply_mutations(
    state: &AppState,
    request: &StorageRequest,
    sorted_fs: &[String],
    tree: shared_crypto::merkle::MerkleLevels,
    planned: &[(String, usize)],
    written: &mut Vec<String>,
    renamed: &mut Vec<(String, String)>,
) -> Result<(), ApiError> {
    let sp = request.address;

    // A copy re-keys blobs already on this node.
    if request.kind == RequestKind::Copy {
        if let Some(map) = &request.hash_map {
            for (old, new) in map {
                if old != new && state.store.part_exists(&sp, old) {
                    state.store.rename_part(&sp, old, new)?;
                    renamed.push((old.clone(), new.clone()));
                }
            }
        }
    }

    for (final_name, index) in planned {
        state
            .store
            .write_part(&sp, final_name, &request.files[*index].bytes)?;
        written.push(final_name.clone());
    }

    // Record last: readers only ever see fully validated state.
    let record = SpFsRecord {
        address: request.address.to_string(),
        fs: sorted_fs.to_vec(),
        nonce: request.nonce_raw.clone(),
        signed_fs_root: request.fs_root_sig_raw.clone(),
        tree,
    };

    let lock = state.store.lock(&sp);
    let _guard = lock.lock().await;
    state.store.write_record(&sp, &record)?;
    Ok(())
}
