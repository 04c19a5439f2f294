use std::fmt;
use std::sync::Arc;

use halo2_proofs::halo2curves::bn256::Fr as Fp;

use crate::error::{RegistryError, Result};
use crate::merkle_tree::utils::{verify_proof, zero_hashes};
use crate::merkle_tree::{Direction, MerkleProof, ProofStep, MAX_DEPTH, TREE_DEPTH};
use crate::poseidon::FieldHasher;

/// Shape of a tree that has not been bound to a hash function yet.
///
/// This is the only way to obtain a [`MerkleAccumulator`]: the depth is checked here, fixed for the
/// lifetime of the tree, and [`TreeConfig::activate`] binds the hasher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeConfig {
    depth: usize,
}

impl TreeConfig {
    /// Fails when the depth is outside `1..=MAX_DEPTH` or when `2^depth` leaves can't be counted in a
    /// `usize` on this target.
    pub fn new(depth: usize) -> Result<Self> {
        let addressable = u32::try_from(depth)
            .ok()
            .and_then(|shift| 1usize.checked_shl(shift))
            .is_some();
        if !(1..=MAX_DEPTH).contains(&depth) || !addressable {
            return Err(RegistryError::InvalidDepth { depth });
        }

        Ok(TreeConfig { depth })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn capacity(&self) -> usize {
        1 << self.depth
    }

    /// Binds the hash function and returns an empty tree ready for insertions.
    pub fn activate(self, hasher: Arc<dyn FieldHasher>) -> MerkleAccumulator {
        let zeros = zero_hashes(hasher.as_ref(), self.depth);

        MerkleAccumulator {
            config: self,
            hasher,
            zeros,
            nodes: vec![Vec::new(); self.depth + 1],
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig { depth: TREE_DEPTH }
    }
}

/// Append-only binary Merkle tree of fixed depth.
///
/// `nodes[l]` caches the hashes of the level `l` nodes that cover at least one occupied leaf;
/// every other slot of that level is the empty subtree hash `zeros[l]`.
pub struct MerkleAccumulator {
    config: TreeConfig,
    hasher: Arc<dyn FieldHasher>,
    zeros: Vec<Fp>,
    nodes: Vec<Vec<Fp>>,
}

impl MerkleAccumulator {
    /// Appends `leaf` at the next free index and returns that index.
    pub fn insert(&mut self, leaf: Fp) -> Result<usize> {
        let index = self.size();
        if index == self.capacity() {
            return Err(RegistryError::CapacityExceeded {
                capacity: self.capacity(),
            });
        }

        self.nodes[0].push(leaf);

        let mut current_hash = leaf;
        let mut position = index;

        for level in 0..self.depth() {
            current_hash = if position % 2 == 0 {
                self.hasher
                    .hash_node(current_hash, self.node_or_zero(level, position + 1))
            } else {
                self.hasher
                    .hash_node(self.node_or_zero(level, position - 1), current_hash)
            };
            position /= 2;

            let parents = &mut self.nodes[level + 1];
            if position < parents.len() {
                parents[position] = current_hash;
            } else {
                parents.push(current_hash);
            }
        }

        Ok(index)
    }

    /// Removes the most recently inserted leaf and restores the nodes above it, undoing the last
    /// [`insert`](Self::insert). Returns `None` on an empty tree.
    pub fn pop(&mut self) -> Option<Fp> {
        let leaf = self.nodes[0].pop()?;

        let mut position = self.size();
        for level in 0..self.depth() {
            let parent = position / 2;
            if self.nodes[level].len() <= 2 * parent {
                // no occupied node is left under this parent
                self.nodes[level + 1].truncate(parent);
            } else {
                let hash = self.hasher.hash_node(
                    self.node_or_zero(level, 2 * parent),
                    self.node_or_zero(level, 2 * parent + 1),
                );
                self.nodes[level + 1][parent] = hash;
            }
            position = parent;
        }

        Some(leaf)
    }

    pub fn root(&self) -> Fp {
        self.node_or_zero(self.depth(), 0)
    }

    /// Generates a MerkleProof for the leaf with the given index.
    pub fn generate_proof(&self, index: usize) -> Result<MerkleProof> {
        if index >= self.size() {
            return Err(RegistryError::IndexOutOfRange {
                index,
                size: self.size(),
            });
        }

        let mut path = Vec::with_capacity(self.depth());
        let mut position = index;

        for level in 0..self.depth() {
            let direction = if position % 2 == 0 {
                Direction::Right
            } else {
                Direction::Left
            };

            path.push(ProofStep {
                sibling: self.node_or_zero(level, position ^ 1),
                direction,
            });
            position /= 2;
        }

        Ok(MerkleProof {
            leaf: self.nodes[0][index],
            index,
            root: self.root(),
            path,
        })
    }

    /// Verifies a MerkleProof against the root it carries.
    pub fn verify_proof(&self, proof: &MerkleProof) -> bool {
        verify_proof(
            self.hasher.as_ref(),
            self.depth(),
            proof.leaf,
            proof.index,
            &proof.path,
            proof.root,
        )
    }

    pub fn index_of(&self, leaf: &Fp) -> Option<usize> {
        self.nodes[0].iter().position(|node| node == leaf)
    }

    pub fn config(&self) -> TreeConfig {
        self.config
    }

    pub fn depth(&self) -> usize {
        self.config.depth()
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity()
    }

    /// Number of occupied leaves.
    pub fn size(&self) -> usize {
        self.nodes[0].len()
    }

    pub fn is_full(&self) -> bool {
        self.size() == self.capacity()
    }

    pub fn leaves(&self) -> &[Fp] {
        &self.nodes[0]
    }

    pub fn leaf(&self, index: usize) -> Option<&Fp> {
        self.nodes[0].get(index)
    }

    /// Cached node hashes, from the leaves (level 0) up to the root level.
    pub fn levels(&self) -> &[Vec<Fp>] {
        &self.nodes
    }

    pub fn hasher(&self) -> &Arc<dyn FieldHasher> {
        &self.hasher
    }

    fn node_or_zero(&self, level: usize, position: usize) -> Fp {
        self.nodes[level]
            .get(position)
            .copied()
            .unwrap_or(self.zeros[level])
    }
}

impl fmt::Debug for MerkleAccumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerkleAccumulator")
            .field("depth", &self.depth())
            .field("size", &self.size())
            .field("root", &self.root())
            .finish()
    }
}
