//! # Merkle Kernel (SHA-256)
//!
//! The canonical content-addressing construction used everywhere in the
//! node: parts are named by the root over their 8 KiB block hashes, files by
//! the root over their sorted part hashes, and a provider's filesystem by
//! the root over its sorted file hashes.
//!
//! ## Construction
//!
//! 1. Start from an ordered level of 32-byte hashes.
//! 2. A level with an odd count greater than one duplicates its last node.
//! 3. Parents are `SHA256(left ∥ right)` over adjacent pairs.
//! 4. Repeat until a single node remains; that node is the root.
//!
//! The duplicated nodes are kept in the returned levels, so every node in a
//! non-root level has a sibling at `index ^ 1` and inclusion paths can be
//! emitted without re-deriving padding.
//!
//! Duplication (rather than zero-padding) keeps the tree binary without
//! introducing a synthetic leaf: an all-zero leaf would collide with the
//! hash position of a real all-zero 8 KiB block.

use sha2::{Digest, Sha256};
use shared_types::{Hash, BLOCK_SIZE};

use crate::errors::CryptoError;

/// All levels of a Merkle tree, leaves first, root level (`len == 1`) last.
pub type MerkleLevels = Vec<Vec<Hash>>;

/// One-shot SHA-256.
pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash an adjacent pair into its parent: `SHA256(a ∥ b)`.
fn hash_pair(a: &Hash, b: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(a);
    hasher.update(b);
    hasher.finalize().into()
}

/// Hash a part payload into its per-block digests, in byte-position order.
///
/// Block hashes are deliberately NOT sorted: the proof of storage must be
/// reconstructible in place from a block index.
pub fn block_hashes(payload: &[u8]) -> Result<Vec<Hash>, CryptoError> {
    if payload.is_empty() || payload.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::UnalignedPart {
            len: payload.len(),
        });
    }
    Ok(payload.chunks(BLOCK_SIZE).map(sha256).collect())
}

/// Build the canonical tree over an ordered leaf set.
///
/// Returns the root and the full level sequence (leaves first). A single
/// leaf is its own root and the tree is that one level.
pub fn calc_root(leaves: Vec<Hash>) -> Result<(Hash, MerkleLevels), CryptoError> {
    if leaves.is_empty() {
        return Err(CryptoError::EmptyLeafSet);
    }

    let mut levels: MerkleLevels = Vec::new();
    let mut current = leaves;

    loop {
        if current.len() > 1 && current.len() % 2 != 0 {
            // Odd-leaf duplication; the copy stays in the stored level.
            let last = current[current.len() - 1];
            current.push(last);
        }
        levels.push(current.clone());

        if current.len() == 1 {
            break;
        }
        current = current
            .chunks(2)
            .map(|pair| hash_pair(&pair[0], &pair[1]))
            .collect();
    }

    let root = levels[levels.len() - 1][0];
    Ok((root, levels))
}

/// Emit an inclusion path for `start` through concatenated tree levels.
///
/// At each level the sibling pair `(levels[i][2k], levels[i][2k+1])`
/// containing the running hash is appended and the running hash becomes
/// their parent. A level holding a single node contributes that node alone
/// and terminates the walk, so the final element of a complete path is the
/// root it commits to.
///
/// `levels` may span more than one tree: the storage proof concatenates a
/// part's block-level ascent with the filesystem-level ascent, and the walk
/// crosses from one into the other because the part root reappears as a
/// filesystem leaf.
pub fn inclusion_proof(start: &Hash, levels: &[Vec<Hash>]) -> Vec<Hash> {
    let mut proof = Vec::new();
    let mut cursor = *start;

    for level in levels {
        let Some(pos) = level.iter().position(|node| *node == cursor) else {
            break;
        };

        if level.len() == 1 {
            proof.push(level[0]);
            return proof;
        }

        let (a, b) = if pos % 2 != 0 {
            (pos - 1, pos)
        } else {
            (pos, pos + 1)
        };
        proof.push(level[a]);
        proof.push(level[b]);
        cursor = hash_pair(&level[a], &level[b]);
    }

    proof
}
