use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ark_std::{end_timer, start_timer};
use halo2_proofs::halo2curves::bn256::Fr as Fp;
use itertools::Itertools;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{PersistenceError, RegistryError, Result};
use crate::merkle_tree::{fp_to_hex, hex_to_fp, MerkleAccumulator, TreeConfig};
use crate::poseidon::FieldHasher;

/// Durable form of a [`MerkleAccumulator`].
///
/// Only `leaves` is authoritative: a tree is rebuilt by replaying them in order.
/// `root` and `levels` are checked against the replayed tree, `parents` (hashes of the complete
/// pairs of adjacent leaves) is diagnostic output kept for readers of the older file layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<usize>,
    pub leaves: Vec<String>,
    pub parents: Vec<String>,
    #[serde(default)]
    pub levels: Vec<Vec<String>>,
    pub root: String,
}

impl TreeRecord {
    pub fn from_tree(tree: &MerkleAccumulator) -> Self {
        let hasher = tree.hasher();

        let parents = tree
            .leaves()
            .iter()
            .tuples()
            .map(|(left, right)| fp_to_hex(&hasher.hash_node(*left, *right)))
            .collect();

        let levels = tree.levels()[1..]
            .iter()
            .map(|level| level.iter().map(fp_to_hex).collect::<Vec<String>>())
            .collect();

        TreeRecord {
            depth: Some(tree.depth()),
            leaves: tree.leaves().iter().map(fp_to_hex).collect(),
            parents,
            levels,
            root: fp_to_hex(&tree.root()),
        }
    }

    /// Rebuilds the tree by inserting the stored leaves into a fresh tree of the configured shape.
    ///
    /// Fails when the record does not describe a tree of that shape, or when the stored root or
    /// levels disagree with the rebuilt tree.
    pub fn restore(&self, config: TreeConfig, hasher: Arc<dyn FieldHasher>) -> Result<MerkleAccumulator> {
        if let Some(stored) = self.depth {
            if stored != config.depth() {
                return Err(PersistenceError::DepthMismatch {
                    stored,
                    configured: config.depth(),
                }
                .into());
            }
        }

        if self.leaves.len() > config.capacity() {
            return Err(malformed(format!(
                "{} leaves stored but a depth {} tree holds at most {}",
                self.leaves.len(),
                config.depth(),
                config.capacity()
            )));
        }

        let stored_root = decode(&self.root, "root")?;

        let replay_time = start_timer!(|| "replay stored leaves");

        let mut tree = config.activate(hasher);
        for (index, leaf) in self.leaves.iter().enumerate() {
            tree.insert(decode(leaf, &format!("leaf {index}"))?)?;
        }

        end_timer!(replay_time);

        if tree.root() != stored_root {
            return Err(PersistenceError::RootMismatch {
                stored: self.root.clone(),
                computed: fp_to_hex(&tree.root()),
            }
            .into());
        }

        if !self.levels.is_empty() {
            if self.levels.len() != tree.depth() {
                return Err(malformed(format!(
                    "{} levels stored for a depth {} tree",
                    self.levels.len(),
                    tree.depth()
                )));
            }

            for (level, (stored, rebuilt)) in self.levels.iter().zip(&tree.levels()[1..]).enumerate() {
                let stored = stored
                    .iter()
                    .map(|node| decode(node, "node"))
                    .collect::<Result<Vec<Fp>>>()?;
                if &stored != rebuilt {
                    return Err(malformed(format!(
                        "stored level {} does not match the rebuilt tree",
                        level + 1
                    )));
                }
            }
        }

        tracing::debug!(leaves = tree.size(), depth = tree.depth(), "restored merkle tree");

        Ok(tree)
    }
}

fn malformed(reason: String) -> RegistryError {
    PersistenceError::Malformed(reason).into()
}

fn decode(value: &str, what: &str) -> Result<Fp> {
    hex_to_fp(value, "stored value").map_err(|e| malformed(format!("{what}: {e}")))
}

/// Serializes `data` to JSON at `path`.
///
/// The data is written to a sibling temporary file, flushed to disk and renamed over `path`, so a crash
/// mid-write leaves the previous file intact.
pub fn save_to_file<P: AsRef<Path>, T: Serialize>(path: P, data: &T) -> std::result::Result<(), PersistenceError> {
    let path = path.as_ref();
    let serialized_data = serde_json::to_string_pretty(data)?;

    let tmp_path = tmp_sibling(path);
    let mut file = File::create(&tmp_path)?;
    file.write_all(serialized_data.as_bytes())?;
    file.sync_all()?;

    fs::rename(&tmp_path, path)?;
    Ok(())
}

pub fn load_from_file<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> std::result::Result<T, PersistenceError> {
    let mut file = File::open(path)?;
    let mut data = String::new();
    file.read_to_string(&mut data)?;
    let deserialized_data = serde_json::from_str(&data)?;
    Ok(deserialized_data)
}

pub(crate) fn tmp_sibling(path: &Path) -> PathBuf {
    let mut file_name = path.file_name().map(OsString::from).unwrap_or_default();
    file_name.push(".tmp");
    path.with_file_name(file_name)
}
