//! Store error catalogue.

use thiserror::Error;

/// Errors that can occur while persisting or reading provider state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying filesystem failure.
    #[error("i/o failure at {path}: {source}")]
    Io {
        /// Path the operation touched.
        path: String,
        /// The OS-level error.
        #[source]
        source: std::io::Error,
    },

    /// A record or config file exists but cannot be decoded.
    #[error("corrupt data at {path}: {reason}")]
    Corrupt {
        /// Path of the undecodable file.
        path: String,
        /// Decoder complaint.
        reason: String,
    },

    /// The provider has no filesystem record on this node.
    #[error("no filesystem record for provider {0}")]
    RecordNotFound(String),

    /// The named part blob is not on disk.
    #[error("part {0} not found")]
    PartNotFound(String),

    /// Reserving the incoming bytes would exceed the configured limit.
    #[error("storage limit exceeded: {used} used + {incoming} incoming > {limit} limit")]
    Overflow {
        /// Bytes accounted before this reservation.
        used: u64,
        /// Bytes the caller asked for.
        incoming: u64,
        /// Configured limit in bytes.
        limit: u64,
    },
}

impl StoreError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
