//! Download scenarios: round trip, ranges, authorization.

use crate::helpers::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use shared_crypto::merkle::{block_hashes, calc_root};
use shared_types::{hash_to_hex, BLOCK_SIZE};
use tower::util::ServiceExt;

/// Upload one part and return its name.
async fn seed_part(node: &TestNode, sp: &Provider, fill: u8, blocks: usize) -> (String, Vec<u8>) {
    let part = vec![fill; BLOCK_SIZE * blocks];
    let (root, _) = calc_root(block_hashes(&part).unwrap()).unwrap();
    let part_hex = hash_to_hex(&root);
    let fs = vec![part_hex.clone()];

    let body = multipart_body(&upload_fields(sp, &fs, 1, &[(part_hex.clone(), part.clone())]));
    let (status, _) = post_multipart(&node.router, &format!("/upload/{}", part.len()), body).await;
    assert_eq!(status, StatusCode::OK);
    (part_hex, part)
}

#[tokio::test]
async fn test_upload_then_download_round_trip() {
    let node = test_node(1);
    let sp = provider();
    let (part_hex, part) = seed_part(&node, &sp, 0x00, 1).await;

    let uri = format!(
        "/download/{}/{}/{}",
        sp.address,
        part_hex,
        sp.sign_download(&part_hex)
    );
    let (status, bytes) = get_path(&node.router, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes.len(), BLOCK_SIZE);
    assert_eq!(&bytes[..], &part[..]);
}

#[tokio::test]
async fn test_range_request_honored() {
    let node = test_node(1);
    let sp = provider();
    let (part_hex, part) = seed_part(&node, &sp, 0x5A, 2).await;

    let uri = format!(
        "/download/{}/{}/{}",
        sp.address,
        part_hex,
        sp.sign_download(&part_hex)
    );
    let request = Request::builder()
        .method("GET")
        .uri(&uri)
        .header(header::RANGE, "bytes=100-199")
        .body(Body::empty())
        .unwrap();

    let response = node.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], &part[100..200]);
}

#[tokio::test]
async fn test_signature_bound_to_file_key() {
    let node = test_node(1);
    let sp = provider();
    let (first_hex, _) = seed_part(&node, &sp, 0x01, 1).await;

    // A second record revision covering another part.
    let other = vec![0x02u8; BLOCK_SIZE];
    let (other_root, _) = calc_root(block_hashes(&other).unwrap()).unwrap();
    let other_hex = hash_to_hex(&other_root);

    // Authorization for file X does not open file Y.
    let uri = format!(
        "/download/{}/{}/{}",
        sp.address,
        first_hex,
        sp.sign_download(&other_hex)
    );
    let (status, _) = get_path(&node.router, &uri).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_blob_is_transient_404() {
    let node = test_node(1);
    let sp = provider();

    // Signed correctly, but the blob never arrived.
    let ghost = "ab".repeat(32);
    let uri = format!(
        "/download/{}/{}/{}",
        sp.address,
        ghost,
        sp.sign_download(&ghost)
    );
    let (status, _) = get_path(&node.router, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_traversal_keys_never_resolve() {
    let node = test_node(1);
    let sp = provider();
    seed_part(&node, &sp, 0x03, 1).await;

    let key = "spFs.json";
    let uri = format!(
        "/download/{}/{}/{}",
        sp.address,
        key,
        sp.sign_download(key)
    );
    let (status, _) = get_path(&node.router, &uri).await;
    // Only 64-hex content names are servable.
    assert_eq!(status, StatusCode::NOT_FOUND);
}
