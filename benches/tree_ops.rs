//! Benchmarks for radix tree operations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cowtrie::RadixTree;
use std::collections::BTreeMap;
use std::ops::Bound;

fn generate_sequential_keys(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("user:{:08}", i)).collect()
}

fn generate_path_keys(n: usize) -> Vec<String> {
    // Tenant segments cover both edge layouts: the Latin-1 names stay
    // byte-packed, the CJK one forces wide character storage.
    let tenants = ["acme", "borealis", "céline", "dyna", "東京電機"];
    let actions = ["archive", "create", "list", "restore", "update", "view"];

    (0..n)
        .map(|i| {
            let tenant = tenants[i % tenants.len()];
            let action = actions[i % actions.len()];
            format!("/{tenant}/{action}/{i:06}")
        })
        .collect()
}

fn bench_put(c: &mut Criterion) {
    let mut group = c.benchmark_group("put");

    for size in [1_000, 10_000] {
        let keys = generate_sequential_keys(size);

        group.bench_with_input(BenchmarkId::new("RadixTree", size), &keys, |b, keys| {
            b.iter(|| {
                let tree = RadixTree::new();
                for (i, key) in keys.iter().enumerate() {
                    tree.put(key, i as u64).unwrap();
                }
                black_box(tree)
            });
        });

        group.bench_with_input(BenchmarkId::new("BTreeMap", size), &keys, |b, keys| {
            b.iter(|| {
                let mut map: BTreeMap<String, u64> = BTreeMap::new();
                for (i, key) in keys.iter().enumerate() {
                    map.insert(key.clone(), i as u64);
                }
                black_box(map)
            });
        });
    }

    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");

    for size in [1_000, 10_000] {
        let keys = generate_sequential_keys(size);

        let tree = RadixTree::new();
        for (i, key) in keys.iter().enumerate() {
            tree.put(key, i as u64).unwrap();
        }

        let mut btree: BTreeMap<String, u64> = BTreeMap::new();
        for (i, key) in keys.iter().enumerate() {
            btree.insert(key.clone(), i as u64);
        }

        group.bench_with_input(BenchmarkId::new("RadixTree", size), &keys, |b, keys| {
            b.iter(|| {
                let mut sum = 0u64;
                for key in keys.iter() {
                    if let Some(v) = tree.get_value_for_exact_key(key) {
                        sum += *v;
                    }
                }
                black_box(sum)
            });
        });

        group.bench_with_input(BenchmarkId::new("BTreeMap", size), &keys, |b, keys| {
            b.iter(|| {
                let mut sum = 0u64;
                for key in keys.iter() {
                    if let Some(v) = btree.get(key) {
                        sum += *v;
                    }
                }
                black_box(sum)
            });
        });
    }

    group.finish();
}

fn bench_prefix_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("prefix_scan");

    let keys = generate_path_keys(10_000);
    let tree = RadixTree::new();
    let mut btree: BTreeMap<String, u64> = BTreeMap::new();
    for (i, key) in keys.iter().enumerate() {
        tree.put(key, i as u64).unwrap();
        btree.insert(key.clone(), i as u64);
    }
    let prefix = "/acme/";

    group.bench_function("RadixTree", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for value in tree.get_values_for_keys_starting_with(prefix) {
                sum += *value;
            }
            black_box(sum)
        });
    });

    group.bench_function("BTreeMap", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for (_, value) in btree
                .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
                .take_while(|(k, _)| k.starts_with(prefix))
            {
                sum += *value;
            }
            black_box(sum)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_put, bench_get, bench_prefix_scan);
criterion_main!(benches);
