use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use halo2_proofs::halo2curves::bn256::Fr as Fp;
use regulator::merkle_tree::{MerkleAccumulator, TreeConfig};
use regulator::poseidon::Poseidon;
use regulator::registry::TreeRecord;

const MAX_POWER: u32 = 10;
const SAMPLE_SIZE: usize = 10;

fn filled_tree(depth: usize) -> MerkleAccumulator {
    let mut tree = TreeConfig::new(depth).unwrap().activate(Arc::new(Poseidon));
    for i in 0..tree.capacity() {
        tree.insert(Fp::from(i as u64 + 1)).unwrap();
    }
    tree
}

fn insert_benchmark(_c: &mut Criterion) {
    let mut criterion = Criterion::default().sample_size(SAMPLE_SIZE);

    for depth in [4, 8, MAX_POWER as usize] {
        let bench_name = format!("fill accumulator of depth {}", depth);
        criterion.bench_function(&bench_name, |b| {
            b.iter(|| filled_tree(depth))
        });
    }
}

fn proof_benchmark(_c: &mut Criterion) {
    let mut criterion = Criterion::default().sample_size(SAMPLE_SIZE);

    let tree = filled_tree(MAX_POWER as usize);
    let proof = tree.generate_proof(tree.size() / 3).unwrap();

    criterion.bench_function("generate proof in a full tree of depth 10", |b| {
        b.iter(|| tree.generate_proof(tree.size() / 3).unwrap())
    });

    criterion.bench_function("verify proof in a full tree of depth 10", |b| {
        b.iter(|| assert!(tree.verify_proof(&proof)))
    });
}

fn replay_benchmark(_c: &mut Criterion) {
    let mut criterion = Criterion::default().sample_size(SAMPLE_SIZE);

    for i in 4..=MAX_POWER {
        let record = TreeRecord::from_tree(&filled_tree(i as usize));

        let bench_name = format!("restore tree record with 2 power of {} leaves", i);
        criterion.bench_function(&bench_name, |b| {
            b.iter(|| {
                record
                    .restore(TreeConfig::new(i as usize).unwrap(), Arc::new(Poseidon))
                    .unwrap()
            })
        });
    }
}

criterion_group!(benches, insert_benchmark, proof_benchmark, replay_benchmark);
criterion_main!(benches);
