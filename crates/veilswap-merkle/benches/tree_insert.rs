//! tree insertion benchmarks
//!
//! Usage:
//!   cargo bench -p veilswap-merkle

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use veilswap_merkle::{AuthenticatedTree, FieldElement};

fn random_leaves(n: usize) -> Vec<FieldElement> {
    let mut rng = rand::thread_rng();
    (0..n).map(|_| FieldElement::from_u128(rng.gen())).collect()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    let leaves = random_leaves(1024);

    for depth in [20u32, 31] {
        group.bench_function(BenchmarkId::new("sha256", depth), |b| {
            b.iter(|| {
                let mut tree = AuthenticatedTree::with_depth(depth).unwrap();
                for leaf in &leaves {
                    black_box(tree.insert(*leaf).unwrap());
                }
                black_box(tree.last_root())
            });
        });
    }
    group.finish();
}

fn bench_known_root(c: &mut Criterion) {
    let mut tree = AuthenticatedTree::with_depth(20).unwrap();
    for leaf in random_leaves(64) {
        tree.insert(leaf).unwrap();
    }
    let oldest = tree.roots().last().unwrap_or_default();

    c.bench_function("is_known_root/oldest", |b| {
        b.iter(|| black_box(tree.is_known_root(black_box(&oldest))))
    });
}

criterion_group!(benches, bench_insert, bench_known_root);
criterion_main!(benches);
