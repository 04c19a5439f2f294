use ark_std::{end_timer, start_timer};
use halo2_proofs::halo2curves::bn256::Fr as Fp;

use crate::poseidon::FieldHasher;

/// Hashes of the all-empty subtree at each level, from the empty leaf (`0`) up to the empty root.
pub fn zero_hashes<H: FieldHasher + ?Sized>(hasher: &H, depth: usize) -> Vec<Fp> {
    let mut zeros = Vec::with_capacity(depth + 1);
    let mut current = Fp::from(0);
    zeros.push(current);

    for _ in 0..depth {
        current = hasher.hash_node(current, current);
        zeros.push(current);
    }

    zeros
}

/// Builds every level of the tree from scratch.
///
/// Level `l` holds the nodes covering at least one of the given leaves; missing right children are
/// padded with the empty subtree hash of their level.
pub fn build_levels<H: FieldHasher + ?Sized>(hasher: &H, depth: usize, leaves: &[Fp]) -> Vec<Vec<Fp>> {
    let zeros = zero_hashes(hasher, depth);

    let mut levels: Vec<Vec<Fp>> = Vec::with_capacity(depth + 1);
    levels.push(leaves.to_vec());

    let build_time = start_timer!(|| "build tree levels");

    for level in 1..=depth {
        let previous_level = &levels[level - 1];
        let current_level = previous_level
            .chunks(2)
            .map(|pair| {
                let right = pair.get(1).copied().unwrap_or(zeros[level - 1]);
                hasher.hash_node(pair[0], right)
            })
            .collect::<Vec<_>>();

        levels.push(current_level);
    }

    end_timer!(build_time);

    levels
}

/// Recomputes the root over `leaves`, padding the unoccupied slots with zero.
pub fn compute_root<H: FieldHasher + ?Sized>(hasher: &H, depth: usize, leaves: &[Fp]) -> Fp {
    let levels = build_levels(hasher, depth, leaves);
    match levels[depth].first() {
        Some(root) => *root,
        None => zero_hashes(hasher, depth)[depth],
    }
}
