mod accumulator;
mod entry;
mod tests;
pub mod utils;
use halo2_proofs::halo2curves::bn256::Fr as Fp;

/// Depth used when none is configured. A depth 2 tree holds 4 identities.
pub const TREE_DEPTH: usize = 2;
/// Every internal node hashes exactly two children.
pub const TREE_ARITY: usize = 2;
/// Deepest tree the accumulator accepts, i.e. at most 2^32 identities.
pub const MAX_DEPTH: usize = 32;

/// Side on which a proof sibling sits when it is recombined with the path node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// The sibling is the left operand, the path node is the right child.
    Left,
    /// The sibling is the right operand, the path node is the left child.
    Right,
}

impl Direction {
    /// Path index bit as consumed by circuits: 0 when the path node is the left child.
    pub fn path_index(&self) -> u8 {
        match self {
            Direction::Left => 1,
            Direction::Right => 0,
        }
    }

    pub fn from_path_index(bit: u8) -> Option<Self> {
        match bit {
            0 => Some(Direction::Right),
            1 => Some(Direction::Left),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProofStep {
    pub sibling: Fp,
    pub direction: Direction,
}

/// Inclusion proof for the leaf at `index`, ordered from the leaf level up to the level below the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleProof {
    pub leaf: Fp,
    pub index: usize,
    pub root: Fp,
    pub path: Vec<ProofStep>,
}

pub use accumulator::{MerkleAccumulator, TreeConfig};
pub use entry::Entry;
pub use utils::{big_uint_to_fp, fp_to_hex, hex_to_fp, verify_proof};
