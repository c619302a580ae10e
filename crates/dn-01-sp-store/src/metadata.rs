//! The per-provider filesystem record (`spFs.json`).

use serde::{Deserialize, Serialize};
use shared_crypto::merkle::MerkleLevels;
use shared_types::{Hash, Nonce, ParseError};

/// A provider's declared filesystem, exactly as attested.
///
/// `Fs` holds the sorted file-hash list in hex; `Tree` is the canonical
/// merkle over that list with each node base64-encoded on disk; `Nonce`
/// stays in its decimal wire form and `SignedFsRoot` in hex, so the record
/// can be re-served and re-verified without re-encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpFsRecord {
    /// Provider account address, `0x`-prefixed hex.
    #[serde(rename = "Address")]
    pub address: String,

    /// Sorted file-hash list, lowercase hex.
    #[serde(rename = "Fs")]
    pub fs: Vec<String>,

    /// Filesystem revision, decimal.
    #[serde(rename = "Nonce")]
    pub nonce: String,

    /// Provider signature over the root commitment, hex.
    #[serde(rename = "SignedFsRoot")]
    pub signed_fs_root: String,

    /// Canonical merkle levels over `Fs`, leaves first.
    #[serde(rename = "Tree", with = "tree_b64")]
    pub tree: MerkleLevels,
}

impl SpFsRecord {
    /// The filesystem root: the single node of the last tree level.
    pub fn root(&self) -> Option<Hash> {
        self.tree.last().and_then(|level| level.first()).copied()
    }

    /// The revision counter in its numeric form.
    pub fn nonce(&self) -> Result<Nonce, ParseError> {
        Nonce::parse(&self.nonce)
    }
}

/// `Tree` is serialized as nested arrays of base64 strings, one string per
/// 32-byte node.
mod tree_b64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use shared_crypto::merkle::MerkleLevels;
    use shared_types::Hash;

    pub fn serialize<S: Serializer>(tree: &MerkleLevels, serializer: S) -> Result<S::Ok, S::Error> {
        let encoded: Vec<Vec<String>> = tree
            .iter()
            .map(|level| level.iter().map(|node| STANDARD.encode(node)).collect())
            .collect();
        serde::Serialize::serialize(&encoded, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<MerkleLevels, D::Error> {
        let raw: Vec<Vec<String>> = Deserialize::deserialize(deserializer)?;
        raw.into_iter()
            .map(|level| {
                level
                    .into_iter()
                    .map(|node| {
                        let bytes = STANDARD.decode(&node).map_err(D::Error::custom)?;
                        Hash::try_from(bytes.as_slice())
                            .map_err(|_| D::Error::custom("tree node is not 32 bytes"))
                    })
                    .collect()
            })
            .collect()
    }
}
