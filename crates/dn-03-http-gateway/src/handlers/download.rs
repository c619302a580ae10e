//! Ranged part download.

use axum::extract::{Path, Request, State};
use axum::response::{IntoResponse, Response};
use shared_crypto::commitments::download_digest;
use shared_crypto::verify_signer;
use shared_types::{parse_signature_hex, Address};
use tower::util::ServiceExt;
use tower_http::services::ServeFile;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /download/{spAddress}/{fileKey}/{signature}`
///
/// The signature must recover the provider address over
/// `SHA256(fileKey ∥ spAddress)`, both in the exact form they appear in the
/// URL. It binds `(file, provider)` only; anyone holding the signed URL
/// may fetch. Range requests are honored by the file service.
pub async fn download(
    State(state): State<AppState>,
    Path((address_raw, file_key, signature_raw)): Path<(String, String, String)>,
    request: Request,
) -> Result<Response, ApiError> {
    let address = Address::parse(&address_raw)?;
    let signature = parse_signature_hex(&signature_raw)?;

    let digest = download_digest(&file_key, &address_raw);
    verify_signer(&digest, &signature, &address).map_err(|_| ApiError::WrongSignature)?;

    // Part names are 64 hex digits; anything else cannot be a blob of ours
    // (and must not escape the provider directory).
    if file_key.len() != 64 || !file_key.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ApiError::NotFound);
    }

    let path = state.store.part_path(&address, &file_key);
    if !path.is_file() {
        // Includes the transient window where a record references a blob
        // whose upload has not finished committing.
        return Err(ApiError::NotFound);
    }

    let response = ServeFile::new(path)
        .oneshot(request)
        .await
        .unwrap_or_else(|infallible| match infallible {});
    Ok(response.into_response())
}
