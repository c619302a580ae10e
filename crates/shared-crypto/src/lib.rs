//! # Shared Crypto: Content Addressing & Identity Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `merkle` | SHA-256 binary tree | Part/file/filesystem content addressing, storage proofs |
//! | `ecdsa` | secp256k1 + recovery | Provider authentication, node signing |
//! | `commitments` | SHA-256 digests | Signed filesystem-root and membership attestations |
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic nonces, low-S normalization,
//!   Ethereum-style address recovery
//! - **Merkle**: odd levels duplicate their last node, so every interior
//!   node has two children and a zero sentinel can never be confused with
//!   a hashed 8 KiB block

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod commitments;
pub mod ecdsa;
pub mod errors;
pub mod merkle;

pub use commitments::{download_digest, fs_root_digest, fs_tree_digest};
pub use ecdsa::{keccak256, recover_address, sign_digest, verify_signer};
pub use errors::CryptoError;
pub use merkle::{block_hashes, calc_root, inclusion_proof, MerkleLevels};
