#[cfg(test)]
mod test {

    use std::sync::Arc;

    use halo2_proofs::arithmetic::Field;
    use halo2_proofs::halo2curves::{bn256::Fr as Fp, group::ff::PrimeField};
    use num_bigint::ToBigUint;
    use rand::rngs::OsRng;

    use crate::error::RegistryError;
    use crate::merkle_tree::utils::{build_levels, compute_root, field_modulus, zero_hashes};
    use crate::merkle_tree::{
        verify_proof, Direction, Entry, MerkleAccumulator, TreeConfig, MAX_DEPTH,
    };
    use crate::poseidon::{FieldHasher, Poseidon};

    fn empty_tree(depth: usize) -> MerkleAccumulator {
        TreeConfig::new(depth).unwrap().activate(Arc::new(Poseidon))
    }

    fn entry(name: &str, pid: u64) -> Entry {
        Entry::new(
            name.to_string(),
            pid,
            &(1000 + pid).to_biguint().unwrap(),
            &(2000 + pid).to_biguint().unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_accumulator() {
        // create new depth 2 tree, it holds 4 users
        let mut tree = empty_tree(2);
        let hasher = Poseidon;

        let users = [entry("A", 1), entry("B", 2), entry("C", 3), entry("D", 4)];
        let leaves: Vec<Fp> = users.iter().map(|user| user.compute_leaf(&hasher)).collect();

        // users get the indices 0 to 3 in insertion order
        for (expected_index, leaf) in leaves.iter().enumerate() {
            assert_eq!(tree.insert(*leaf).unwrap(), expected_index);
        }
        assert!(tree.is_full());

        // a fifth user doesn't fit
        let extra_leaf = entry("E", 5).compute_leaf(&hasher);
        match tree.insert(extra_leaf) {
            Err(RegistryError::CapacityExceeded { capacity }) => assert_eq!(capacity, 4),
            other => panic!("expected CapacityExceeded, got {other:?}"),
        }
        assert_eq!(tree.size(), 4);

        // get proof for user 0, one step per level
        let proof = tree.generate_proof(0).unwrap();
        assert_eq!(proof.path.len(), 2);

        // should verify every registered user against the root
        for (index, leaf) in leaves.iter().enumerate() {
            let proof = tree.generate_proof(index).unwrap();
            assert_eq!(proof.leaf, *leaf);
            assert!(verify_proof(&hasher, tree.depth(), *leaf, index, &proof.path, tree.root()));
            assert!(tree.verify_proof(&proof));
        }

        // shouldn't verify a leaf that isn't in the tree
        for index in 0..4 {
            let proof = tree.generate_proof(index).unwrap();
            assert!(!verify_proof(&hasher, tree.depth(), extra_leaf, index, &proof.path, tree.root()));
        }

        // should return the index of a leaf that exists in the tree
        assert_eq!(tree.index_of(&leaves[2]), Some(2));
        assert_eq!(tree.index_of(&extra_leaf), None);
    }

    #[test]
    fn test_capacity() {
        for depth in 1..=4 {
            let mut tree = empty_tree(depth);
            let capacity = 1 << depth;

            for i in 0..capacity {
                assert_eq!(tree.insert(Fp::from(i as u64 + 1)).unwrap(), i);
            }

            assert!(matches!(
                tree.insert(Fp::from(capacity as u64 + 1)),
                Err(RegistryError::CapacityExceeded { .. })
            ));

            // a failed insertion leaves the tree untouched
            assert_eq!(tree.size(), capacity);
            assert_eq!(tree.root(), compute_root(&Poseidon, depth, tree.leaves()));
        }
    }

    #[test]
    fn test_invalid_depth() {
        assert!(matches!(
            TreeConfig::new(0),
            Err(RegistryError::InvalidDepth { depth: 0 })
        ));
        assert!(TreeConfig::new(MAX_DEPTH + 1).is_err());
        assert_eq!(TreeConfig::new(3).unwrap().capacity(), 8);

        // every accepted depth has a capacity that fits in a usize
        for depth in 1..=MAX_DEPTH {
            match TreeConfig::new(depth) {
                Ok(config) => assert_eq!(config.capacity() as u128, 1u128 << depth),
                Err(_) => assert!(depth >= usize::BITS as usize),
            }
        }
        if usize::BITS > 32 {
            assert_eq!(TreeConfig::new(MAX_DEPTH).unwrap().depth(), MAX_DEPTH);
        }
    }

    #[test]
    fn test_empty_tree() {
        let tree = empty_tree(3);
        let zeros = zero_hashes(&Poseidon, 3);

        // the root of an empty tree is the all zero root
        assert_eq!(tree.root(), zeros[3]);
        assert_eq!(tree.root(), compute_root(&Poseidon, 3, &[]));

        // no proof can be generated yet
        assert!(matches!(
            tree.generate_proof(0),
            Err(RegistryError::IndexOutOfRange { index: 0, size: 0 })
        ));
    }

    #[test]
    fn test_incremental_root_matches_recomputation() {
        let depth = 3;
        let mut tree = empty_tree(depth);
        let mut leaves = vec![];

        for _ in 0..(1 << depth) {
            let leaf = Fp::random(OsRng);
            tree.insert(leaf).unwrap();
            leaves.push(leaf);

            // the cached root and every cached level agree with a full rebuild
            assert_eq!(tree.root(), compute_root(&Poseidon, depth, &leaves));
            assert_eq!(tree.levels(), build_levels(&Poseidon, depth, &leaves).as_slice());

            // every leaf inserted so far has a valid proof against the current root
            for (index, leaf) in leaves.iter().enumerate() {
                let proof = tree.generate_proof(index).unwrap();
                assert!(verify_proof(&Poseidon, depth, *leaf, index, &proof.path, tree.root()));
            }

            // the next index isn't assigned yet
            assert!(tree.generate_proof(leaves.len()).is_err());
        }
    }

    #[test]
    fn test_pop_undoes_insert() {
        let depth = 3;
        let mut tree = empty_tree(depth);
        let leaves: Vec<Fp> = (0..(1 << depth)).map(|_| Fp::random(OsRng)).collect();
        for leaf in &leaves {
            tree.insert(*leaf).unwrap();
        }

        // popping walks back through every intermediate state
        for size in (0..leaves.len()).rev() {
            assert_eq!(tree.pop(), Some(leaves[size]));
            assert_eq!(tree.size(), size);
            assert_eq!(tree.levels(), build_levels(&Poseidon, depth, &leaves[..size]).as_slice());
            assert_eq!(tree.root(), compute_root(&Poseidon, depth, &leaves[..size]));
        }
        assert_eq!(tree.pop(), None);

        // the freed index is handed out again
        assert_eq!(tree.insert(leaves[0]).unwrap(), 0);
        assert_eq!(tree.root(), compute_root(&Poseidon, depth, &leaves[..1]));
    }

    #[test]
    fn test_zero_padding_is_explicit() {
        // a partially filled tree has the same root as a full tree padded with zero leaves
        let depth = 2;
        let mut tree = empty_tree(depth);
        tree.insert(Fp::from(7)).unwrap();
        tree.insert(Fp::from(9)).unwrap();

        let padded = [Fp::from(7), Fp::from(9), Fp::from(0), Fp::from(0)];
        assert_eq!(tree.root(), compute_root(&Poseidon, depth, &padded));
    }

    #[test]
    fn test_proof_rejection() {
        let mut tree = empty_tree(3);
        for i in 0..5u64 {
            tree.insert(Fp::from(100 + i)).unwrap();
        }
        let root = tree.root();
        let proof = tree.generate_proof(4).unwrap();
        assert!(verify_proof(&Poseidon, tree.depth(), proof.leaf, 4, &proof.path, root));

        // flipping a byte of any sibling breaks the proof
        for level in 0..proof.path.len() {
            let mut tampered = proof.clone();
            let mut repr = tampered.path[level].sibling.to_repr();
            repr.as_mut()[0] ^= 1;
            tampered.path[level].sibling = Fp::from_repr(repr).unwrap();
            assert!(!verify_proof(&Poseidon, tree.depth(), tampered.leaf, 4, &tampered.path, root));
        }

        // flipping a direction breaks the proof
        let mut tampered = proof.clone();
        tampered.path[0].direction = Direction::Left;
        assert!(!verify_proof(&Poseidon, tree.depth(), tampered.leaf, 4, &tampered.path, root));

        // claiming another index breaks the proof
        assert!(!verify_proof(&Poseidon, tree.depth(), proof.leaf, 5, &proof.path, root));
        assert!(!verify_proof(&Poseidon, tree.depth(), proof.leaf, 4 + 8, &proof.path, root));

        // a wrong root breaks the proof
        let mut tampered = proof.clone();
        tampered.root = Fp::from(0);
        assert!(!tree.verify_proof(&tampered));

        // a truncated path breaks the proof
        assert!(!verify_proof(&Poseidon, tree.depth(), proof.leaf, 4, &proof.path[..2], root));
    }

    #[test]
    fn test_internal_node_is_not_a_leaf() {
        let mut tree = empty_tree(2);
        for i in 10..14u64 {
            tree.insert(Fp::from(i)).unwrap();
        }
        let root = tree.root();
        let proof = tree.generate_proof(0).unwrap();

        // the parent of leaves 0 and 1 folds into the root through the upper half of the path
        let parent = Poseidon.hash_node(Fp::from(10), Fp::from(11));
        assert_eq!(Poseidon.hash_node(parent, proof.path[1].sibling), root);
        assert!(!verify_proof(&Poseidon, 2, parent, 0, &proof.path[1..], root));

        // the root with an empty path
        assert!(!verify_proof(&Poseidon, 2, root, 0, &[], root));

        // a longer path than the tree is deep
        let mut extended = proof.path.clone();
        extended.push(proof.path[1]);
        assert!(!verify_proof(&Poseidon, 2, proof.leaf, 0, &extended, root));

        // the same holds for proofs checked by the tree
        let mut truncated = proof.clone();
        truncated.leaf = parent;
        truncated.path.remove(0);
        assert!(!tree.verify_proof(&truncated));

        let mut empty = proof.clone();
        empty.leaf = root;
        empty.path.clear();
        assert!(!tree.verify_proof(&empty));

        assert!(tree.verify_proof(&proof));
    }

    #[test]
    fn test_stale_proof() {
        let mut tree = empty_tree(2);
        tree.insert(Fp::from(1)).unwrap();
        let proof = tree.generate_proof(0).unwrap();

        tree.insert(Fp::from(2)).unwrap();

        // the proof still verifies against the root it was issued for, not against the new one
        assert!(tree.verify_proof(&proof));
        assert!(!verify_proof(&Poseidon, tree.depth(), proof.leaf, 0, &proof.path, tree.root()));
    }

    #[test]
    fn test_direction_bits() {
        let mut tree = empty_tree(2);
        for i in 0..4u64 {
            tree.insert(Fp::from(i)).unwrap();
        }

        // index 2 = 0b10: left child at the leaf level, right child one level up
        let proof = tree.generate_proof(2).unwrap();
        let bits: Vec<u8> = proof.path.iter().map(|step| step.direction.path_index()).collect();
        assert_eq!(bits, vec![0, 1]);
        assert_eq!(proof.path[0].sibling, Fp::from(3));

        assert_eq!(Direction::from_path_index(0), Some(Direction::Right));
        assert_eq!(Direction::from_path_index(1), Some(Direction::Left));
        assert_eq!(Direction::from_path_index(2), None);
    }

    #[test]
    fn test_leaf_derivation() {
        let hasher = Poseidon;
        let leaf = entry("Alice", 42).compute_leaf(&hasher);

        // same attributes, same leaf
        assert_eq!(leaf, entry("Alice", 42).compute_leaf(&hasher));

        // one character of the name changes the leaf
        assert_ne!(leaf, entry("Alicf", 42).compute_leaf(&hasher));
        // the pid changes the leaf
        assert_ne!(leaf, entry("Alice", 43).compute_leaf(&hasher));

        // each public key coordinate changes the leaf
        let x = 1042.to_biguint().unwrap();
        let y = 2042.to_biguint().unwrap();
        let other = 7.to_biguint().unwrap();
        let with_x = Entry::new("Alice".to_string(), 42, &other, &y).unwrap();
        let with_y = Entry::new("Alice".to_string(), 42, &x, &other).unwrap();
        assert_ne!(leaf, with_x.compute_leaf(&hasher));
        assert_ne!(leaf, with_y.compute_leaf(&hasher));

        // decimal strings and big integers describe the same entry
        let from_decimal = Entry::from_decimal("Alice".to_string(), 42, "1042", "2042").unwrap();
        assert_eq!(leaf, from_decimal.compute_leaf(&hasher));

        // the name enters the hash through its digest
        let e = entry("Alice", 42);
        let expected = hasher.hash_entry([*e.name_digest(), Fp::from(42), *e.pub_x(), *e.pub_y()]);
        assert_eq!(leaf, expected);
    }

    #[test]
    fn test_leaf_rejects_out_of_field_inputs() {
        let modulus = field_modulus().clone();
        let one = 1.to_biguint().unwrap();

        let result = Entry::new("Bob".to_string(), 1, &modulus, &one);
        assert!(matches!(
            result,
            Err(RegistryError::InputOutOfField { field: "pub_x", .. })
        ));

        let result = Entry::new("Bob".to_string(), 1, &one, &(modulus + 1u32));
        assert!(matches!(
            result,
            Err(RegistryError::InputOutOfField { field: "pub_y", .. })
        ));

        let result = Entry::from_decimal("Bob".to_string(), 1, "12ab", "1");
        assert!(matches!(
            result,
            Err(RegistryError::InputOutOfField { field: "pub_x", .. })
        ));
    }

    #[test]
    fn test_long_names() {
        let hasher = Poseidon;
        let long_name = "x".repeat(10_000);
        let leaf_1 = entry(&long_name, 1).compute_leaf(&hasher);
        let leaf_2 = entry(&long_name, 1).compute_leaf(&hasher);
        assert_eq!(leaf_1, leaf_2);

        // empty and multibyte names are fine too
        assert_ne!(
            entry("", 1).compute_leaf(&hasher),
            entry("Ž", 1).compute_leaf(&hasher)
        );
    }
}
