//! Merkle path assembly for one challenged block.

use dn_01_sp_store::SpFsRecord;
use shared_crypto::merkle::{block_hashes, calc_root, inclusion_proof};
use shared_types::{Hash, BLOCK_SIZE};

use crate::errors::ProofError;

/// A fully assembled proof of storage for one 8 KiB block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageProof {
    /// Sibling-pair path; the final element is the filesystem root.
    pub proof: Vec<Hash>,
    /// The root the path commits to.
    pub proof_root: Hash,
    /// The challenged block, in the clear.
    pub block_bytes: Vec<u8>,
}

/// Build the path for `block_index` of a part through the part's own block
/// tree and onward through the provider's filesystem tree.
///
/// The two trees are walked as one: the part's root level is dropped from
/// the span because the same hash reappears as a leaf of the filesystem
/// tree, where the ascent continues to the attested root.
pub fn build_storage_proof(
    record: &SpFsRecord,
    part_bytes: &[u8],
    block_index: usize,
) -> Result<StorageProof, ProofError> {
    let blocks = block_hashes(part_bytes)?;
    if block_index >= blocks.len() {
        return Err(ProofError::ChallengeOutOfRange {
            index: block_index,
            available: blocks.len(),
        });
    }

    let (part_root, part_levels) = calc_root(blocks.clone())?;

    let fs_leaves = record
        .tree
        .first()
        .ok_or_else(|| ProofError::MalformedRecord("empty filesystem tree".to_string()))?;
    if !fs_leaves.contains(&part_root) {
        return Err(ProofError::PartNotInFilesystem(hex::encode(part_root)));
    }

    let mut span = part_levels[..part_levels.len() - 1].to_vec();
    span.extend(record.tree.iter().cloned());

    let proof = inclusion_proof(&blocks[block_index], &span);
    let proof_root = *proof
        .last()
        .ok_or_else(|| ProofError::MalformedRecord("empty inclusion path".to_string()))?;

    let offset = block_index * BLOCK_SIZE;
    let block_bytes = part_bytes[offset..offset + BLOCK_SIZE].to_vec();

    Ok(StorageProof {
        proof,
        proof_root,
        block_bytes,
    })
}
