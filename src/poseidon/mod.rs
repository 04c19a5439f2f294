use halo2_gadgets::poseidon::primitives::{self as poseidon, ConstantLength};
use halo2_proofs::halo2curves::bn256::Fr as Fp;

mod spec;

pub use spec::{EntrySpec, NodeSpec};

/// Number of field elements hashed into a leaf: name digest, pid, pub_x, pub_y.
pub const ENTRY_ARITY: usize = 4;

/// The field hash consumed by the Merkle tree.
///
/// The tree only ever hashes exactly two inputs (an internal node) or exactly [`ENTRY_ARITY`] inputs
/// (a leaf), so the trait exposes those two shapes rather than a variable-length hash.
/// Implementations must be deterministic.
pub trait FieldHasher: Send + Sync {
    /// Hashes a pair of children into their parent node.
    fn hash_node(&self, left: Fp, right: Fp) -> Fp;

    /// Hashes the attributes of an identity into a leaf.
    fn hash_entry(&self, inputs: [Fp; ENTRY_ARITY]) -> Fp;
}

/// Poseidon with the x^5 s-box and 8 full rounds, at width 3 for nodes and width 5 for entries.
#[derive(Debug, Default, Clone, Copy)]
pub struct Poseidon;

impl FieldHasher for Poseidon {
    fn hash_node(&self, left: Fp, right: Fp) -> Fp {
        poseidon::Hash::<Fp, NodeSpec, ConstantLength<2>, 3, 2>::init().hash([left, right])
    }

    fn hash_entry(&self, inputs: [Fp; ENTRY_ARITY]) -> Fp {
        poseidon::Hash::<Fp, EntrySpec, ConstantLength<ENTRY_ARITY>, 5, 4>::init().hash(inputs)
    }
}
