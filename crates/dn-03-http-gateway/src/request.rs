//! The common multipart request shape behind `/upload`, `/copy` and
//! `/backup`.

use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;
use shared_types::{parse_hash_hex, parse_signature_hex, Address, Nonce, RecoverableSignature};

use crate::error::ApiError;

/// Which admission flavor a request came in through. The pipeline is
/// shared; the kind decides how a blob's final name is derived and what a
/// quota denial means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// `/upload`: blobs are stored under their own content root.
    Upload,
    /// `/copy`: re-keying upload; denial overflows to a peer.
    Copy,
    /// `/backup`: a peer's forwarded copy payload.
    Backup,
}

impl RequestKind {
    /// Whether this flavor carries (and requires) the old→new `hashes` map.
    pub fn renames(self) -> bool {
        !matches!(self, RequestKind::Upload)
    }
}

/// One incoming part blob.
#[derive(Debug, Clone)]
pub struct IncomingPart {
    /// Declared filename: the name the blob will be stored under.
    pub name: String,
    /// Raw payload.
    pub bytes: Bytes,
}

/// A fully parsed storage request. Raw wire strings are retained alongside
/// parsed values so an overflow can forward the payload bit-for-bit.
#[derive(Debug, Clone)]
pub struct StorageRequest {
    /// Admission flavor.
    pub kind: RequestKind,
    /// The `{size}` path parameter: bytes the sender asked to reserve.
    pub declared_size: u64,
    /// Provider account.
    pub address: Address,
    /// `address` exactly as received.
    pub address_raw: String,
    /// Declared file-hash list, lowercase hex (unsorted, as received).
    pub fs: Vec<String>,
    /// Filesystem revision.
    pub nonce: Nonce,
    /// `nonce` exactly as received.
    pub nonce_raw: String,
    /// Signature over the root commitment.
    pub fs_root_sig: RecoverableSignature,
    /// `fsRootHash` exactly as received.
    pub fs_root_sig_raw: String,
    /// old-hash → new-hash rename map (`/copy`, `/backup`).
    pub hash_map: Option<HashMap<String, String>>,
    /// The `hashes` file part exactly as received, for forwarding.
    pub hashes_raw: Option<Vec<u8>>,
    /// Incoming part blobs.
    pub files: Vec<IncomingPart>,
}

/// Parse the `{size}` path segment. Zero reserves nothing and is rejected.
pub fn parse_declared_size(raw: &str) -> Result<u64, ApiError> {
    let size: u64 = raw
        .parse()
        .map_err(|_| ApiError::MalformedRequest(format!("unparsable size {raw:?}")))?;
    if size == 0 {
        return Err(ApiError::MalformedRequest("zero-size upload".to_string()));
    }
    Ok(size)
}

/// Drain the multipart stream into a [`StorageRequest`].
///
/// Unknown fields are skipped. The cumulative size of `files` payloads is
/// bounded by the declared size; anything past it is a malformed request
/// (the reservation would no longer cover the bytes).
pub async fn parse_storage_request(
    kind: RequestKind,
    declared_size: u64,
    mut multipart: Multipart,
) -> Result<StorageRequest, ApiError> {
    let mut address_raw: Option<String> = None;
    let mut fs: Vec<String> = Vec::new();
    let mut nonce_raw: Option<String> = None;
    let mut sig_raw: Option<String> = None;
    let mut hashes_raw: Option<Vec<u8>> = None;
    let mut files: Vec<IncomingPart> = Vec::new();
    let mut payload_total: u64 = 0;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::MalformedRequest(format!("bad multipart: {e}")))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("address") => {
                address_raw = Some(text(field).await?);
            }
            Some("fs") => {
                let value = text(field).await?.to_lowercase();
                parse_hash_hex(&value)?;
                fs.push(value);
            }
            Some("nonce") => {
                nonce_raw = Some(text(field).await?);
            }
            Some("fsRootHash") => {
                sig_raw = Some(text(field).await?);
            }
            Some("hashes") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::MalformedRequest(format!("bad hashes field: {e}")))?;
                hashes_raw = Some(bytes.to_vec());
            }
            Some("files") => {
                let name = field.file_name().map(str::to_lowercase).ok_or_else(|| {
                    ApiError::MalformedRequest("file part without a name".to_string())
                })?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::MalformedRequest(format!("bad file part: {e}")))?;

                payload_total = payload_total.saturating_add(bytes.len() as u64);
                if payload_total > declared_size {
                    return Err(ApiError::MalformedRequest(format!(
                        "payload exceeds declared size {declared_size}"
                    )));
                }
                files.push(IncomingPart { name, bytes });
            }
            _ => {
                // Drain and drop unrecognized fields.
                let _ = field.bytes().await;
            }
        }
    }

    let address_raw =
        address_raw.ok_or_else(|| ApiError::MalformedRequest("missing address".to_string()))?;
    let address = Address::parse(&address_raw)?;

    let nonce_raw =
        nonce_raw.ok_or_else(|| ApiError::MalformedRequest("missing nonce".to_string()))?;
    let nonce = Nonce::parse(&nonce_raw)?;

    let sig_raw =
        sig_raw.ok_or_else(|| ApiError::MalformedRequest("missing fsRootHash".to_string()))?;
    let fs_root_sig = parse_signature_hex(&sig_raw)?;

    if fs.is_empty() {
        return Err(ApiError::MalformedRequest("empty fs list".to_string()));
    }
    if files.is_empty() {
        return Err(ApiError::MalformedRequest("no file parts".to_string()));
    }

    let hash_map = match (&hashes_raw, kind.renames()) {
        (Some(raw), _) => Some(parse_hash_map(raw)?),
        (None, true) => {
            return Err(ApiError::MalformedRequest(
                "missing hashes map for rename upload".to_string(),
            ))
        }
        (None, false) => None,
    };

    Ok(StorageRequest {
        kind,
        declared_size,
        address,
        address_raw,
        fs,
        nonce,
        nonce_raw,
        fs_root_sig,
        fs_root_sig_raw: sig_raw,
        hash_map,
        hashes_raw,
        files,
    })
}

/// Decode the `hashes` file part: a JSON object of old-hash → new-hash.
pub fn parse_hash_map(raw: &[u8]) -> Result<HashMap<String, String>, ApiError> {
    let map: HashMap<String, String> = serde_json::from_slice(raw)
        .map_err(|e| ApiError::MalformedRequest(format!("undecodable hashes map: {e}")))?;

    let mut normalized = HashMap::with_capacity(map.len());
    for (old, new) in map {
        let old = old.to_lowercase();
        let new = new.to_lowercase();
        parse_hash_hex(&old)?;
        parse_hash_hex(&new)?;
        normalized.insert(old, new);
    }
    Ok(normalized)
}

async fn text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::MalformedRequest(format!("bad text field: {e}")))
}
