//! Upload admission scenarios.

use crate::helpers::*;
use axum::http::StatusCode;
use shared_crypto::merkle::{block_hashes, calc_root};
use shared_types::{hash_to_hex, Hash, BLOCK_SIZE};

/// Merkle root of a part payload, which is its canonical name.
fn part_hash(bytes: &[u8]) -> Hash {
    let (root, _) = calc_root(block_hashes(bytes).expect("aligned part")).expect("part root");
    root
}

#[tokio::test]
async fn test_single_zero_part_upload() {
    let node = test_node(1);
    let sp = provider();

    // One all-zero 8 KiB block: the part hash, file hash and filesystem
    // root are all the same digest.
    let part = vec![0u8; BLOCK_SIZE];
    let part_hex = hash_to_hex(&part_hash(&part));
    let fs = vec![part_hex.clone()];

    let body = multipart_body(&upload_fields(&sp, &fs, 1, &[(part_hex.clone(), part.clone())]));
    let (status, response) = post_multipart(&node.router, "/upload/8192", body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(&response[..], b"OK");

    // The record reflects the attestation exactly.
    let record = node.store.load_record(&sp.address).unwrap();
    assert_eq!(record.nonce, "1");
    assert_eq!(record.fs, fs);
    assert_eq!(record.tree, vec![vec![part_hash(&part)]]);
    assert_eq!(record.root(), Some(part_hash(&part)));

    // The blob landed under its content name and quota moved.
    assert_eq!(node.store.read_part(&sp.address, &part_hex).unwrap(), part);
    assert_eq!(node.quota.used().await.unwrap(), 8192);
}

#[tokio::test]
async fn test_three_part_file_with_odd_leaf_duplication() {
    let node = test_node(1);
    let sp = provider();

    let parts: Vec<Vec<u8>> = (1u8..=3).map(|b| vec![b; BLOCK_SIZE]).collect();
    let mut part_hashes: Vec<Hash> = parts.iter().map(|p| part_hash(p)).collect();
    part_hashes.sort();

    // The file root pairs [h1,h2] and [h3,h3]: odd leaf count duplicates.
    let (file_root, levels) = calc_root(part_hashes.clone()).unwrap();
    assert_eq!(levels[0].len(), 4);
    assert_eq!(levels[0][2], levels[0][3]);

    let fs = vec![hash_to_hex(&file_root)];
    let files: Vec<(String, Vec<u8>)> = parts
        .iter()
        .map(|p| (hash_to_hex(&part_hash(p)), p.clone()))
        .collect();

    let body = multipart_body(&upload_fields(&sp, &fs, 1, &files));
    let (status, _) = post_multipart(&node.router, "/upload/24576", body).await;
    assert_eq!(status, StatusCode::OK);

    let record = node.store.load_record(&sp.address).unwrap();
    assert_eq!(record.fs, fs);
    for (name, bytes) in &files {
        assert_eq!(&node.store.read_part(&sp.address, name).unwrap(), bytes);
    }
}

#[tokio::test]
async fn test_wrong_signer_rejected() {
    let node = test_node(1);
    let signer = provider();
    let imposter = provider();

    let part = vec![9u8; BLOCK_SIZE];
    let part_hex = hash_to_hex(&part_hash(&part));
    let fs = vec![part_hex.clone()];

    // Signed by one key, claiming the other's address.
    let mut fields = upload_fields(&signer, &fs, 1, &[(part_hex, part)]);
    fields[0] = FormField::Text("address", imposter.address.to_string());

    let (status, _) = post_multipart(&node.router, "/upload/8192", multipart_body(&fields)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Nothing stuck: no record, quota restored.
    assert!(node.store.load_record(&imposter.address).is_err());
    assert_eq!(node.quota.used().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unaligned_part_rejected() {
    let node = test_node(1);
    let sp = provider();

    // 8193 bytes: not a whole number of blocks.
    let part = vec![1u8; BLOCK_SIZE + 1];
    let fake_name = "ab".repeat(32);
    let fs = vec![fake_name.clone()];

    let body = multipart_body(&upload_fields(&sp, &fs, 1, &[(fake_name, part)]));
    let (status, response) = post_multipart(&node.router, "/upload/8193", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(&response[..], b"wrong part");
    assert_eq!(node.quota.used().await.unwrap(), 0);
}

#[tokio::test]
async fn test_misnamed_part_rejected() {
    let node = test_node(1);
    let sp = provider();

    let part = vec![2u8; BLOCK_SIZE];
    // Declared under a name that is not its content root.
    let wrong_name = "cd".repeat(32);
    let fs = vec![wrong_name.clone()];

    let body = multipart_body(&upload_fields(&sp, &fs, 1, &[(wrong_name, part)]));
    let (status, response) = post_multipart(&node.router, "/upload/8192", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(&response[..], b"wrong part");
}

#[tokio::test]
async fn test_orphaned_part_rejected() {
    let node = test_node(1);
    let sp = provider();

    let part = vec![3u8; BLOCK_SIZE];
    let part_hex = hash_to_hex(&part_hash(&part));
    // The declared filesystem names a different file.
    let fs = vec!["ee".repeat(32)];

    let body = multipart_body(&upload_fields(&sp, &fs, 1, &[(part_hex.clone(), part)]));
    let (status, response) = post_multipart(&node.router, "/upload/8192", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(&response[..], b"orphaned part");
    assert!(!node.store.part_exists(&sp.address, &part_hex));
    assert_eq!(node.quota.used().await.unwrap(), 0);
}

#[tokio::test]
async fn test_replayed_upload_is_idempotent_except_quota() {
    let node = test_node(1);
    let sp = provider();

    let part = vec![4u8; BLOCK_SIZE];
    let part_hex = hash_to_hex(&part_hash(&part));
    let fs = vec![part_hex.clone()];
    let files = [(part_hex.clone(), part)];

    let body = multipart_body(&upload_fields(&sp, &fs, 1, &files));
    let (first, _) = post_multipart(&node.router, "/upload/8192", body.clone()).await;
    let record_after_first = node.store.load_record(&sp.address).unwrap();

    let (second, _) = post_multipart(&node.router, "/upload/8192", body).await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);

    // On-disk state is unchanged; the quota double-reserves (the known
    // accounting leak, repaired by the startup reconcile).
    assert_eq!(node.store.load_record(&sp.address).unwrap(), record_after_first);
    assert_eq!(node.quota.used().await.unwrap(), 2 * 8192);
}

#[tokio::test]
async fn test_upload_conflicting_with_existing_record_rejected() {
    let node = test_node(1);
    let sp = provider();

    let part_a = vec![5u8; BLOCK_SIZE];
    let hex_a = hash_to_hex(&part_hash(&part_a));
    let body = multipart_body(&upload_fields(&sp, &[hex_a.clone()], 1, &[(hex_a, part_a)]));
    let (status, _) = post_multipart(&node.router, "/upload/8192", body).await;
    assert_eq!(status, StatusCode::OK);

    // A second upload declaring a different filesystem must go through
    // /update_fs first.
    let part_b = vec![6u8; BLOCK_SIZE];
    let hex_b = hash_to_hex(&part_hash(&part_b));
    let body = multipart_body(&upload_fields(&sp, &[hex_b.clone()], 1, &[(hex_b, part_b)]));
    let (status, _) = post_multipart(&node.router, "/upload/8192", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_requests_rejected() {
    let node = test_node(1);
    let sp = provider();

    let part = vec![7u8; BLOCK_SIZE];
    let part_hex = hash_to_hex(&part_hash(&part));
    let fs = vec![part_hex.clone()];

    // Zero declared size.
    let body = multipart_body(&upload_fields(&sp, &fs, 1, &[(part_hex.clone(), part.clone())]));
    let (status, _) = post_multipart(&node.router, "/upload/0", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Payload larger than the declared (and reserved) size.
    let body = multipart_body(&upload_fields(&sp, &fs, 1, &[(part_hex.clone(), part.clone())]));
    let (status, _) = post_multipart(&node.router, "/upload/100", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nonce beyond the 32-bit revision domain.
    let mut fields = upload_fields(&sp, &fs, 1, &[(part_hex, part)]);
    fields[1] = FormField::Text("nonce", "99999999999999999999999999999999999999".to_string());
    let (status, _) = post_multipart(&node.router, "/upload/8192", multipart_body(&fields)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Everything was rolled back.
    assert_eq!(node.quota.used().await.unwrap(), 0);
}

#[tokio::test]
async fn test_upload_beyond_quota_rejected() {
    let node = test_node(1);
    let sp = provider();

    let part = vec![8u8; BLOCK_SIZE];
    let part_hex = hash_to_hex(&part_hash(&part));
    let fs = vec![part_hex.clone()];

    // Declare more than the 1 GiB limit.
    let over = (1u64 << 30) + 1;
    let body = multipart_body(&upload_fields(&sp, &fs, 1, &[(part_hex, part)]));
    let (status, response) = post_multipart(&node.router, &format!("/upload/{over}"), body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(&response[..], b"insufficient storage space");
    assert_eq!(node.quota.used().await.unwrap(), 0);
}
