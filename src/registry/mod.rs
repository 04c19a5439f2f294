mod ledger;
mod persistence;
mod shared;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use halo2_proofs::halo2curves::bn256::Fr as Fp;
use num_bigint::BigUint;
use tracing::{debug, error, info, warn};

use crate::error::{RegistryError, Result};
use crate::merkle_tree::{Entry, MerkleAccumulator, MerkleProof, TreeConfig};
use crate::poseidon::FieldHasher;

pub use ledger::{FileLedger, Ledger, LedgerRecord, MemoryLedger};
pub use persistence::{load_from_file, save_to_file, TreeRecord};
pub use shared::SharedRegistry;

/// Outcome of a registration: where the identity sits in the tree and how to prove it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    pub index: usize,
    pub proof: MerkleProof,
    pub root: Fp,
    /// False when the pid was already registered and the existing index was returned.
    pub newly_registered: bool,
}

/// Owns the tree and the ledger and keeps them in step.
///
/// Registration is a lookup followed by a conditional write, so a `Registry` must not be shared
/// without a lock around it: see [`SharedRegistry`].
pub struct Registry<L: Ledger = FileLedger> {
    tree: MerkleAccumulator,
    ledger: L,
    tree_path: PathBuf,
}

impl<L: Ledger> Registry<L> {
    /// Binds the hasher and rebuilds the tree from `tree_path` when that file exists, otherwise starts empty.
    pub fn open(
        config: TreeConfig,
        hasher: Arc<dyn FieldHasher>,
        mut ledger: L,
        tree_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let tree_path = tree_path.into();

        let tree = if tree_path.exists() {
            let record: TreeRecord = load_from_file(&tree_path)?;
            let tree = record.restore(config, hasher)?;
            info!(path = %tree_path.display(), leaves = tree.size(), "loaded merkle tree");
            tree
        } else {
            info!(path = %tree_path.display(), "no merkle tree file, starting from an empty tree");
            config.activate(hasher)
        };

        // A record past the tree was never backed by a saved leaf, its pid registers again
        for record in ledger.discard_beyond(tree.size())? {
            warn!(
                pid = record.pid,
                leaf_index = record.leaf_index,
                tree_size = tree.size(),
                "discarded ledger record pointing past the persisted tree"
            );
        }

        let recorded = ledger.records()?.len();
        if recorded < tree.size() {
            warn!(
                tree_size = tree.size(),
                records = recorded,
                "persisted tree holds leaves without a ledger record"
            );
        }

        Ok(Registry {
            tree,
            ledger,
            tree_path,
        })
    }

    /// Registers a user whose public key coordinates are given as integers.
    pub fn register(
        &mut self,
        name: String,
        pid: u64,
        pub_x: &BigUint,
        pub_y: &BigUint,
    ) -> Result<Registration> {
        self.register_entry(Entry::new(name, pid, pub_x, pub_y)?)
    }

    /// Registers `entry`, or returns its existing index when its pid is already in the ledger.
    ///
    /// A new leaf is inserted and the tree is saved before the ledger record is appended, so every
    /// record points at a persisted leaf. When either write fails the insertion is undone and the error
    /// returned; the same entry can simply be registered again. A full tree yields `CapacityExceeded`
    /// and nothing is written.
    pub fn register_entry(&mut self, entry: Entry) -> Result<Registration> {
        if let Some(record) = self.ledger.find_by_pid(entry.pid())? {
            debug!(pid = record.pid, index = record.leaf_index, "user already registered");
            let proof = self.tree.generate_proof(record.leaf_index)?;

            return Ok(Registration {
                index: record.leaf_index,
                root: proof.root,
                proof,
                newly_registered: false,
            });
        }

        if self.tree.is_full() {
            return Err(RegistryError::CapacityExceeded {
                capacity: self.tree.capacity(),
            });
        }

        let leaf = entry.compute_leaf(self.tree.hasher().as_ref());
        let index = self.tree.insert(leaf)?;

        if let Err(err) = self.persist() {
            self.tree.pop();
            return Err(err);
        }

        let appended = self.ledger.append(LedgerRecord {
            name: entry.name().to_string(),
            pid: entry.pid(),
            leaf_index: index,
        });
        if let Err(err) = appended {
            self.tree.pop();
            if let Err(rollback) = self.persist() {
                // the saved tree keeps a leaf no record points at, `open` reports it
                error!(pid = entry.pid(), index, error = %rollback, "failed to roll back the saved tree");
            }
            return Err(err.into());
        }

        info!(pid = entry.pid(), index, "registered user");

        let proof = self.tree.generate_proof(index)?;
        Ok(Registration {
            index,
            root: proof.root,
            proof,
            newly_registered: true,
        })
    }

    pub fn proof_for(&self, index: usize) -> Result<MerkleProof> {
        self.tree.generate_proof(index)
    }

    /// Saves the current tree.
    pub fn persist(&self) -> Result<()> {
        save_to_file(&self.tree_path, &TreeRecord::from_tree(&self.tree))?;
        debug!(path = %self.tree_path.display(), leaves = self.tree.size(), "saved merkle tree");
        Ok(())
    }

    pub fn root(&self) -> Fp {
        self.tree.root()
    }

    pub fn size(&self) -> usize {
        self.tree.size()
    }

    pub fn capacity(&self) -> usize {
        self.tree.capacity()
    }

    pub fn records(&self) -> Result<Vec<LedgerRecord>> {
        Ok(self.ledger.records()?)
    }

    pub fn accumulator(&self) -> &MerkleAccumulator {
        &self.tree
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn tree_path(&self) -> &Path {
        &self.tree_path
    }
}
