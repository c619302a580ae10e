//! # Shared Types Crate
//!
//! This crate contains the primitive domain types every subsystem speaks:
//! 32-byte content hashes, 20-byte account addresses, and the per-provider
//! filesystem nonce, together with their wire encodings.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: all cross-subsystem primitives live here.
//! - **Wire forms are explicit**: hashes travel as lowercase hex, addresses
//!   as `0x`-prefixed hex, nonces as decimal text. Parsing is centralized so
//!   every handler rejects malformed input the same way.
//! - **No crypto here**: hashing and signatures live in `shared-crypto`.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::ParseError;
