//! Specifications for the width 3 (rate 2) and width 5 (rate 4) Poseidon permutations over the BN256 curve.
//! Patterned after [halo2_gadgets::poseidon::primitives::P128Pow5T3], with the round constants and MDS
//! matrices generated from the Grain LFSR instead of being hardcoded.

use std::sync::LazyLock;

use halo2_gadgets::poseidon::primitives::{generate_constants, Spec};
use halo2_proofs::arithmetic::Field;
use halo2_proofs::halo2curves::bn256::Fr as Fp;

pub(crate) type Mds<Fp, const T: usize> = [[Fp; T]; T];

type Constants<const T: usize> = (Vec<[Fp; T]>, Mds<Fp, T>, Mds<Fp, T>);

const FULL_ROUNDS: usize = 8;

static NODE_CONSTANTS: LazyLock<Constants<3>> =
    LazyLock::new(|| generate_constants::<Fp, NodeSpec, 3, 2>());

static ENTRY_CONSTANTS: LazyLock<Constants<5>> =
    LazyLock::new(|| generate_constants::<Fp, EntrySpec, 5, 4>());

/// Poseidon spec used to hash two children into their parent node.
#[derive(Debug, Clone, Copy)]
pub struct NodeSpec;

impl Spec<Fp, 3, 2> for NodeSpec {
    fn full_rounds() -> usize {
        FULL_ROUNDS
    }

    fn partial_rounds() -> usize {
        57
    }

    fn sbox(val: Fp) -> Fp {
        val.pow_vartime(&[5])
    }

    fn secure_mds() -> usize {
        0
    }

    fn constants() -> Constants<3> {
        NODE_CONSTANTS.clone()
    }
}

/// Poseidon spec used to hash the four attributes of an identity into a leaf.
#[derive(Debug, Clone, Copy)]
pub struct EntrySpec;

impl Spec<Fp, 5, 4> for EntrySpec {
    fn full_rounds() -> usize {
        FULL_ROUNDS
    }

    fn partial_rounds() -> usize {
        60
    }

    fn sbox(val: Fp) -> Fp {
        val.pow_vartime(&[5])
    }

    fn secure_mds() -> usize {
        0
    }

    fn constants() -> Constants<5> {
        ENTRY_CONSTANTS.clone()
    }
}
