//! # HTTP Gateway (dn-03)
//!
//! The node's external interface, served CORS-open on the configured port:
//!
//! | Path | Method | Purpose |
//! |------|--------|---------|
//! | `/` | GET | liveness probe (used by peers before forwarding) |
//! | `/upload/{size}` | POST | fresh multipart upload from a provider |
//! | `/copy/{size}` | POST | re-keying upload; overflows to a peer when full |
//! | `/backup/{size}` | POST | payload forwarded by an overflowing peer |
//! | `/download/{spAddr}/{fileKey}/{sig}` | GET | ranged part download |
//! | `/update_fs/{spAddr}/{signedFsys}` | POST | nonce-guarded filesystem replacement |
//!
//! The three upload flavors run one admission pipeline over a tagged
//! request kind; they differ only in how an incoming blob's final name is
//! derived and in what a quota denial means.

pub mod error;
pub mod handlers;
pub mod overflow;
pub mod request;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
