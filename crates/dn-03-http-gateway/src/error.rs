//! Gateway error catalogue and HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dn_01_sp_store::StoreError;
use shared_types::ParseError;
use thiserror::Error;

/// Every way a gateway request can fail, one HTTP status each.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad multipart shape, unparsable size/nonce/hex, missing fields.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// The signature does not recover the claimed address.
    #[error("wrong signature")]
    WrongSignature,

    /// A part's content does not hash to its declared name.
    #[error("wrong part")]
    WrongPart,

    /// The uploaded file is not a member of the declared filesystem.
    #[error("orphaned part")]
    OrphanedPart,

    /// The reservation would exceed the storage limit (upload/backup
    /// surface; a copy overflow is forwarded instead).
    #[error("insufficient storage space")]
    Overflow,

    /// The supplied filesystem nonce is older than the current record's.
    #[error("stale nonce: {supplied} < {current}")]
    StaleNonce {
        /// Nonce in the rejected request.
        supplied: u32,
        /// Nonce the record currently holds.
        current: u32,
    },

    /// No such provider record, part or file.
    #[error("not found")]
    NotFound,

    /// Every registry candidate was probed and none accepted the payload.
    #[error("no peers accepted the overflow")]
    NoPeers,

    /// Disk or internal failure.
    #[error("internal storage failure: {0}")]
    Io(String),
}

impl ApiError {
    /// HTTP status for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedRequest(_)
            | ApiError::WrongPart
            | ApiError::OrphanedPart
            | ApiError::Overflow
            | ApiError::StaleNonce { .. } => StatusCode::BAD_REQUEST,
            ApiError::WrongSignature => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::NoPeers | ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

impl From<ParseError> for ApiError {
    fn from(err: ParseError) -> Self {
        ApiError::MalformedRequest(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Overflow { .. } => ApiError::Overflow,
            StoreError::RecordNotFound(_) | StoreError::PartNotFound(_) => ApiError::NotFound,
            StoreError::Io { .. } | StoreError::Corrupt { .. } => ApiError::Io(err.to_string()),
        }
    }
}
