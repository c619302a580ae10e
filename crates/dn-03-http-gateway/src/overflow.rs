//! Peer overflow forwarding.
//!
//! When a `/copy` reservation is denied, the payload is offered to other
//! nodes from the on-chain registry: probe `GET /` for liveness, then
//! stream the original multipart body to the peer's `/backup/{size}`. The
//! first peer answering `200 "OK"` takes the data; its endpoint is
//! returned to the client.

use std::time::Duration;

use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::request::StorageRequest;
use crate::state::AppState;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Offer the request to every live registry peer in id order.
pub async fn forward(state: &AppState, request: &StorageRequest) -> Result<Response, ApiError> {
    let total = state
        .registry
        .total_supply()
        .await
        .map_err(|e| ApiError::Io(e.to_string()))?;

    for id in 0..total {
        let peer = match state.registry.node_by_id(id).await {
            Ok(peer) => peer,
            Err(e) => {
                warn!(id, error = %e, "registry lookup failed, skipping node");
                continue;
            }
        };

        let endpoint = peer.to_string();
        if endpoint == state.self_endpoint {
            continue;
        }
        let base = format!("http://{endpoint}");

        // Liveness first; an unreachable peer costs only the probe timeout.
        let probe = state
            .http
            .get(format!("{base}/"))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;
        if probe.is_err() {
            debug!(peer = %endpoint, "probe failed, trying next node");
            continue;
        }

        let response = match state
            .http
            .post(format!("{base}/backup/{}", request.declared_size))
            .multipart(build_form(request))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(peer = %endpoint, error = %e, "forward failed, trying next node");
                continue;
            }
        };

        if response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            if body == "OK" {
                return Ok(
                    Json(serde_json::json!({ "node_address": endpoint })).into_response()
                );
            }
        }
        debug!(peer = %endpoint, "peer declined the payload, trying next node");
    }

    Err(ApiError::NoPeers)
}

/// Reassemble the parsed request into the multipart form a `/backup`
/// endpoint expects, preserving every field as received.
fn build_form(request: &StorageRequest) -> Form {
    let mut form = Form::new()
        .text("address", request.address_raw.clone())
        .text("nonce", request.nonce_raw.clone())
        .text("fsRootHash", request.fs_root_sig_raw.clone());

    for fs_hash in &request.fs {
        form = form.text("fs", fs_hash.clone());
    }

    if let Some(raw) = &request.hashes_raw {
        form = form.part("hashes", Part::bytes(raw.clone()).file_name("hashes"));
    }

    for file in &request.files {
        form = form.part(
            "files",
            Part::bytes(file.bytes.to_vec()).file_name(file.name.clone()),
        );
    }
    form
}
