use halo2_proofs::halo2curves::bn256::Fr as Fp;

use crate::merkle_tree::{Direction, ProofStep};
use crate::poseidon::FieldHasher;

/// Folds `leaf` through `path` and checks the result against `expected_root`.
///
/// Needs no tree: a verifier holding only a proof and a published root can run it offline.
/// The path must hold exactly one step per level of a `depth` tree, otherwise an internal node could
/// pass for a leaf. The direction of every step must agree with the corresponding bit of `index`.
pub fn verify_proof<H: FieldHasher + ?Sized>(
    hasher: &H,
    depth: usize,
    leaf: Fp,
    index: usize,
    path: &[ProofStep],
    expected_root: Fp,
) -> bool {
    if path.len() != depth {
        return false;
    }

    let mut node = leaf;
    let mut position = index;

    for step in path {
        let expected_direction = if position % 2 == 0 {
            Direction::Right
        } else {
            Direction::Left
        };
        if step.direction != expected_direction {
            return false;
        }

        node = match step.direction {
            Direction::Right => hasher.hash_node(node, step.sibling),
            Direction::Left => hasher.hash_node(step.sibling, node),
        };
        position /= 2;
    }

    // an index with bits above the path length does not address a leaf of this tree
    position == 0 && node == expected_root
}
