use super::*;

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

fn assert_valid<V>(tree: &RadixTree<V>) {
    let issues = tree.verify_integrity();
    assert!(issues.is_empty(), "tree invariants violated: {issues:?}");
}

#[derive(Clone, Debug)]
enum Op<V> {
    Put(String, V),
    PutIfAbsent(String, V),
    Remove(String),
    Get(String),
    Scan(String),
}

fn key_strategy() -> impl Strategy<Value = String> + Clone {
    // A small alphabet forces shared prefixes, edge splits, and merges; the
    // non-ASCII characters keep wide edge storage in play.
    prop::collection::vec(
        prop::sample::select(vec!['a', 'b', 'c', 'd', 'é', 'ü', '字']),
        1..=8,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

fn ops_strategy_u64() -> impl Strategy<Value = Vec<Op<u64>>> {
    let key = key_strategy();
    let op = prop_oneof![
        40 => (key.clone(), any::<u64>()).prop_map(|(k, v)| Op::Put(k, v)),
        15 => (key.clone(), any::<u64>()).prop_map(|(k, v)| Op::PutIfAbsent(k, v)),
        25 => key.clone().prop_map(Op::Remove),
        15 => key.clone().prop_map(Op::Get),
        5 => key.prop_map(Op::Scan),
    ];
    prop::collection::vec(op, 0..=600)
}

fn ops_strategy_void() -> impl Strategy<Value = Vec<Op<VoidValue>>> {
    let key = key_strategy();
    let op = prop_oneof![
        40 => key.clone().prop_map(|k| Op::Put(k, VoidValue)),
        15 => key.clone().prop_map(|k| Op::PutIfAbsent(k, VoidValue)),
        25 => key.clone().prop_map(Op::Remove),
        15 => key.clone().prop_map(Op::Get),
        5 => key.prop_map(Op::Scan),
    ];
    prop::collection::vec(op, 0..=600)
}

fn run_map_ops(
    tree: &RadixTree<u64>,
    ops: Vec<Op<u64>>,
) -> std::result::Result<(), TestCaseError> {
    let mut model: BTreeMap<String, u64> = BTreeMap::new();

    for op in ops {
        match op {
            Op::Put(key, value) => {
                let prev = tree.put(&key, value).unwrap().as_deref().copied();
                prop_assert_eq!(prev, model.insert(key, value));
            }
            Op::PutIfAbsent(key, value) => {
                let prev = tree.put_if_absent(&key, value).unwrap().as_deref().copied();
                let expected = match model.entry(key) {
                    Entry::Occupied(entry) => Some(*entry.get()),
                    Entry::Vacant(entry) => {
                        entry.insert(value);
                        None
                    }
                };
                prop_assert_eq!(prev, expected);
            }
            Op::Remove(key) => {
                prop_assert_eq!(tree.remove(&key), model.remove(&key).is_some());
            }
            Op::Get(key) => {
                let got = tree.get_value_for_exact_key(&key).as_deref().copied();
                prop_assert_eq!(got, model.get(&key).copied());
            }
            Op::Scan(prefix) => {
                let got: Vec<(String, u64)> = tree
                    .get_key_value_pairs_for_keys_starting_with(&prefix)
                    .map(|(k, v)| (k, *v))
                    .collect();
                let expected: Vec<(String, u64)> = model
                    .range(prefix.clone()..)
                    .take_while(|(k, _)| k.starts_with(&prefix))
                    .map(|(k, v)| (k.clone(), *v))
                    .collect();
                prop_assert_eq!(got, expected);
            }
        }

        prop_assert_eq!(tree.size(), model.len());
        assert_valid(tree);
    }

    let got: Vec<(String, u64)> = tree
        .get_key_value_pairs_for_keys_starting_with("")
        .map(|(k, v)| (k, *v))
        .collect();
    let expected: Vec<(String, u64)> = model.iter().map(|(k, v)| (k.clone(), *v)).collect();
    prop_assert_eq!(got, expected);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_u64(ops in ops_strategy_u64()) {
        let tree: RadixTree<u64> = RadixTree::new();
        run_map_ops(&tree, ops)?;
    }

    #[test]
    fn prop_equivalence_u64_restricted_reads(ops in ops_strategy_u64()) {
        let tree: RadixTree<u64> = RadixTree::with_restricted_reads();
        run_map_ops(&tree, ops)?;
    }

    #[test]
    fn prop_equivalence_void(ops in ops_strategy_void()) {
        let members: RadixTree<VoidValue> = RadixTree::new();
        let mut model: BTreeSet<String> = BTreeSet::new();

        for op in ops {
            match op {
                Op::Put(key, value) => {
                    let prev = members.put(&key, value).unwrap();
                    prop_assert_eq!(prev.is_some(), !model.insert(key));
                }
                Op::PutIfAbsent(key, value) => {
                    let prev = members.put_if_absent(&key, value).unwrap();
                    prop_assert_eq!(prev.is_some(), !model.insert(key));
                }
                Op::Remove(key) => {
                    prop_assert_eq!(members.remove(&key), model.remove(&key));
                }
                Op::Get(key) => {
                    prop_assert_eq!(
                        members.get_value_for_exact_key(&key).is_some(),
                        model.contains(&key)
                    );
                }
                Op::Scan(prefix) => {
                    let got: Vec<String> = members.get_keys_starting_with(&prefix).collect();
                    let expected: Vec<String> = model
                        .range(prefix.clone()..)
                        .take_while(|k| k.starts_with(&prefix))
                        .cloned()
                        .collect();
                    prop_assert_eq!(got, expected);
                }
            }

            prop_assert_eq!(members.size(), model.len());
            assert_valid(&members);
        }

        let got: Vec<String> = members.get_keys_starting_with("").collect();
        let expected: Vec<String> = model.iter().cloned().collect();
        prop_assert_eq!(got, expected);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(&[T])) {
    fn heap<T>(items: &mut [T], k: usize, f: &mut impl FnMut(&[T])) {
        if k <= 1 {
            f(items);
            return;
        }
        for i in 0..k - 1 {
            heap(items, k - 1, f);
            if k % 2 == 0 {
                items.swap(i, k - 1);
            } else {
                items.swap(0, k - 1);
            }
        }
        heap(items, k - 1, f);
    }

    let mut items = items.to_vec();
    let len = items.len();
    heap(&mut items, len, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys = ["a", "b", "c", "aa", "ab", "ba"];

    for_each_permutation(&keys, |perm| {
        let tree: RadixTree<u64> = RadixTree::new();
        let mut model: BTreeMap<String, u64> = BTreeMap::new();

        for (i, key) in perm.iter().enumerate() {
            let value = i as u64;
            let prev = tree.put(key, value).unwrap().as_deref().copied();
            assert_eq!(prev, model.insert((*key).to_string(), value));
        }

        assert_valid(&tree);
        let got: Vec<(String, u64)> = tree
            .get_key_value_pairs_for_keys_starting_with("")
            .map(|(k, v)| (k, *v))
            .collect();
        let expected: Vec<(String, u64)> = model.iter().map(|(k, v)| (k.clone(), *v)).collect();
        assert_eq!(got, expected);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys = ["a", "b", "c", "aa", "ab", "ba"];

    // Trees are deliberately not cloneable, so rebuild per removal order.
    for_each_permutation(&keys, |perm| {
        let tree: RadixTree<u64> = RadixTree::new();
        let mut model: BTreeMap<String, u64> = BTreeMap::new();
        for (i, key) in keys.iter().enumerate() {
            let value = i as u64;
            tree.put(key, value).unwrap();
            model.insert((*key).to_string(), value);
        }

        for key in perm {
            assert!(tree.remove(key));
            assert!(model.remove(*key).is_some());
            assert_eq!(tree.size(), model.len());
            assert_valid(&tree);
        }

        assert!(tree.is_empty());
        assert_eq!(tree.debug_root().child_count(), 0);
    });
}
