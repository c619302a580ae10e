//! Peer overflow scenarios: a full node hands `/copy` payloads to peers
//! from the registry.

use crate::helpers::*;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use dn_02_proof_engine::PeerNode;
use shared_crypto::merkle::{block_hashes, calc_root};
use shared_types::{hash_to_hex, BLOCK_SIZE};

/// A re-keyed copy payload: content hashes to `old`, travels under `new`.
struct CopyPayload {
    fields: Vec<FormField>,
    new_hex: String,
    size: usize,
}

fn copy_payload(sp: &Provider) -> CopyPayload {
    let content = vec![0x42u8; BLOCK_SIZE];
    let (old_root, _) = calc_root(block_hashes(&content).unwrap()).unwrap();
    let old_hex = hash_to_hex(&old_root);
    let new_hex = "f1".repeat(32);

    let fs = vec![new_hex.clone()];
    let mut fields = upload_fields(sp, &fs, 2, &[(new_hex.clone(), content.clone())]);
    let mut rename_map = std::collections::HashMap::new();
    rename_map.insert(old_hex, new_hex.clone());
    fields.push(FormField::File(
        "hashes",
        "hashes".to_string(),
        serde_json::to_vec(&rename_map).unwrap(),
    ));

    CopyPayload {
        fields,
        new_hex,
        size: content.len(),
    }
}

fn peer_node_from(endpoint: &str) -> PeerNode {
    let (ip_raw, port_raw) = endpoint.split_once(':').expect("ip:port");
    let octets: Vec<u8> = ip_raw.split('.').map(|o| o.parse().unwrap()).collect();
    PeerNode {
        ip: [octets[0], octets[1], octets[2], octets[3]],
        port: port_raw.parse().unwrap(),
    }
}

/// A peer that answers the liveness probe but refuses every backup.
fn refusing_peer() -> Router {
    Router::new()
        .route("/", get(|| async { "OK" }))
        .route(
            "/backup/:size",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "no thanks") }),
        )
}

#[tokio::test]
async fn test_copy_overflow_forwards_to_first_accepting_peer() {
    // The local node cannot hold anything.
    let full_node = test_node(0);
    let sp = provider();

    // First registry peer refuses; the second is a real node with space.
    let refusing_endpoint = spawn_server(refusing_peer()).await;
    let accepting = test_node_with_port(1, 9999);
    let accepting_endpoint = spawn_server(accepting.router.clone()).await;

    full_node
        .chain
        .add_peer(peer_node_from(&refusing_endpoint))
        .await;
    full_node
        .chain
        .add_peer(peer_node_from(&accepting_endpoint))
        .await;

    let payload = copy_payload(&sp);
    let (status, body) = post_multipart(
        &full_node.router,
        &format!("/copy/{}", payload.size),
        multipart_body(&payload.fields),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let response: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        response["node_address"].as_str().unwrap(),
        accepting_endpoint
    );

    // The accepting peer now holds the blob under its new name; the full
    // node holds nothing.
    assert!(accepting.store.part_exists(&sp.address, &payload.new_hex));
    assert!(!full_node.store.part_exists(&sp.address, &payload.new_hex));
    assert_eq!(full_node.quota.used().await.unwrap(), 0);
}

#[tokio::test]
async fn test_copy_overflow_with_no_peers_is_500() {
    let full_node = test_node(0);
    let sp = provider();

    let payload = copy_payload(&sp);
    let (status, body) = post_multipart(
        &full_node.router,
        &format!("/copy/{}", payload.size),
        multipart_body(&payload.fields),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(&body[..], b"no peers accepted the overflow");
}

#[tokio::test]
async fn test_copy_overflow_skips_dead_peers() {
    let full_node = test_node(0);
    let sp = provider();

    // A registered peer nobody listens on, then a live one.
    full_node
        .chain
        .add_peer(PeerNode { ip: [127, 0, 0, 1], port: 1 })
        .await;
    let accepting = test_node_with_port(1, 9998);
    let accepting_endpoint = spawn_server(accepting.router.clone()).await;
    full_node
        .chain
        .add_peer(peer_node_from(&accepting_endpoint))
        .await;

    let payload = copy_payload(&sp);
    let (status, body) = post_multipart(
        &full_node.router,
        &format!("/copy/{}", payload.size),
        multipart_body(&payload.fields),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let response: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        response["node_address"].as_str().unwrap(),
        accepting_endpoint
    );
}

#[tokio::test]
async fn test_copy_overflow_skips_unresolvable_registry_entries() {
    let full_node = test_node(0);
    let sp = provider();

    // Token 0 counts toward the registry's supply but resolves to no node
    // record; token 1 is a live node. The lookup failure must cost one
    // skip, not the whole forward.
    full_node.chain.add_unresolvable_node().await;
    let accepting = test_node_with_port(1, 9997);
    let accepting_endpoint = spawn_server(accepting.router.clone()).await;
    full_node
        .chain
        .add_peer(peer_node_from(&accepting_endpoint))
        .await;

    let payload = copy_payload(&sp);
    let (status, body) = post_multipart(
        &full_node.router,
        &format!("/copy/{}", payload.size),
        multipart_body(&payload.fields),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let response: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        response["node_address"].as_str().unwrap(),
        accepting_endpoint
    );
    assert!(accepting.store.part_exists(&sp.address, &payload.new_hex));
}

#[tokio::test]
async fn test_copy_within_quota_stays_local_and_renames() {
    let node = test_node(1);
    let sp = provider();

    // A blob the provider previously stored under an old key.
    let stale = vec![0x77u8; BLOCK_SIZE];
    let (stale_root, _) = calc_root(block_hashes(&stale).unwrap()).unwrap();
    let stale_old_hex = hash_to_hex(&stale_root);
    let stale_new_hex = "e2".repeat(32);
    node.store
        .write_part(&sp.address, &stale_old_hex, &stale)
        .unwrap();

    // The copy payload carries one fresh blob and re-keys the stale one.
    let content = vec![0x43u8; BLOCK_SIZE];
    let (old_root, _) = calc_root(block_hashes(&content).unwrap()).unwrap();
    let old_hex = hash_to_hex(&old_root);
    let new_hex = "e1".repeat(32);

    let fs = vec![new_hex.clone()];
    let mut fields = upload_fields(&sp, &fs, 3, &[(new_hex.clone(), content)]);
    let mut rename_map = std::collections::HashMap::new();
    rename_map.insert(old_hex, new_hex.clone());
    rename_map.insert(stale_old_hex.clone(), stale_new_hex.clone());
    fields.push(FormField::File(
        "hashes",
        "hashes".to_string(),
        serde_json::to_vec(&rename_map).unwrap(),
    ));

    let (status, body) = post_multipart(
        &node.router,
        &format!("/copy/{}", BLOCK_SIZE),
        multipart_body(&fields),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let response: serde_json::Value = serde_json::from_slice(&body).unwrap();
    // A local copy names this node itself.
    assert_eq!(response["node_address"].as_str().unwrap(), node.endpoint);

    // Fresh blob stored under the new key; stale blob re-keyed in place.
    assert!(node.store.part_exists(&sp.address, &new_hex));
    assert!(node.store.part_exists(&sp.address, &stale_new_hex));
    assert!(!node.store.part_exists(&sp.address, &stale_old_hex));
}
