//! # Depot Node Test Suite
//!
//! End-to-end scenarios exercised over the real router and a temp-dir
//! backed store:
//!
//! 1. **Upload/Download round trip**: a provider uploads parts, the exact
//!    bytes come back, the on-disk record matches the attestation.
//! 2. **Filesystem updates**: nonce-guarded replacement, stale revisions
//!    rejected without state change.
//! 3. **Authentication**: mismatched signers rejected on every surface.
//! 4. **Overflow**: a full node probes registry peers and hands the
//!    payload to the first one that accepts it.
//! 5. **Proofs of storage**: the challenged block's merkle path commits
//!    to the attested filesystem root.


#[cfg(test)]
mod integration;
