//! Operation model driving [`BstMap`] against `std::collections::BTreeMap`.
//!
//! Shared between the in-crate proptest suite and the fuzz targets (via the
//! `model` feature).

use std::collections::BTreeMap;
use std::mem;

use arbitrary::Arbitrary;
use proptest::strategy::{Just, Strategy};

use crate::BstMap;

/// Key selector: `Index` resolves to an existing key (biasing ops toward
/// hits), `Random` to an arbitrary one.
#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    Index(usize),
    Random(u32),
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue),
    EntryOrDefault(ItemValue),
    Get(ItemValue),
    Find(ItemValue),
    Clear,
    Balance,
    CloneSwap,
    Take,
    Depth,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        4 => value_strategy().prop_map(Op::Insert),
        2 => value_strategy().prop_map(Op::EntryOrDefault),
        2 => value_strategy().prop_map(Op::Get),
        2 => value_strategy().prop_map(Op::Find),
        1 => Just(Op::Clear),
        1 => Just(Op::Balance),
        1 => Just(Op::CloneSwap),
        1 => Just(Op::Take),
        1 => Just(Op::Depth),
    ]
}

fn resolve(model: &BTreeMap<u32, u64>, item: ItemValue) -> u32 {
    match item {
        ItemValue::Index(index) => {
            if model.is_empty() {
                index as u32
            } else {
                *model
                    .keys()
                    .nth(index % model.len())
                    .expect("index taken modulo the key count")
            }
        }
        ItemValue::Random(key) => key,
    }
}

/// Smallest depth any tree holding `len` pairs can have: ⌈log₂(len + 1)⌉.
pub fn depth_bound(len: usize) -> usize {
    (len + 1).next_power_of_two().trailing_zeros() as usize
}

/// Runs `ops` against both a [`BstMap`] and a `BTreeMap`, checking that
/// every observable result agrees and that the tree invariants hold after
/// each step.
pub fn run_btree_equivalence(ops: Vec<Op>) {
    let mut model: BTreeMap<u32, u64> = BTreeMap::new();
    let mut map: BstMap<u32, u64> = BstMap::new();

    for (op_id, op) in ops.into_iter().enumerate() {
        let stamp = op_id as u64;

        match op {
            Op::Insert(item) => {
                let key = resolve(&model, item);
                let expect_inserted = !model.contains_key(&key);
                model.entry(key).or_insert(stamp);

                let (cursor, inserted) = map.insert(key, stamp);
                assert_eq!(inserted, expect_inserted, "op #{op_id}: {op:?}");
                assert_eq!(
                    cursor.key_value().map(|(key, _)| *key),
                    Some(key),
                    "op #{op_id}: {op:?}"
                );
            }

            Op::EntryOrDefault(item) => {
                let key = resolve(&model, item);
                let expected = *model.entry(key).or_default();
                let value = *map.entry(key).or_default();
                assert_eq!(value, expected, "op #{op_id}: {op:?}");
            }

            Op::Get(item) => {
                let key = resolve(&model, item);
                assert_eq!(map.get(&key), model.get(&key), "op #{op_id}: {op:?}");
            }

            Op::Find(item) => {
                let key = resolve(&model, item);
                let cursor = map.find(&key);
                match model.get(&key) {
                    Some(value) => {
                        assert_eq!(
                            cursor.key_value(),
                            Some((&key, value)),
                            "op #{op_id}: {op:?}"
                        );
                        assert!(cursor.depth() >= 1, "op #{op_id}: {op:?}");
                    }
                    None => {
                        assert!(cursor.is_end(), "op #{op_id}: {op:?}");
                        assert_eq!(cursor, map.cursor_end(), "op #{op_id}: {op:?}");
                        assert_eq!(cursor.depth(), 0, "op #{op_id}: {op:?}");
                    }
                }
            }

            Op::Clear => {
                model.clear();
                map.clear();
                assert!(map.is_empty(), "op #{op_id}: {op:?}");
                assert_eq!(map.cursor_first(), map.cursor_end(), "op #{op_id}: {op:?}");
            }

            Op::Balance => {
                map.balance();
                assert!(
                    map.depth() <= depth_bound(map.len()),
                    "op #{op_id}: {op:?}: depth {} exceeds bound {}",
                    map.depth(),
                    depth_bound(map.len())
                );
            }

            Op::CloneSwap => {
                let copy = map.clone();
                copy.assert_invariants();
                map = copy;
            }

            Op::Take => {
                let taken = mem::take(&mut map);
                assert!(map.is_empty(), "op #{op_id}: {op:?}");
                assert_eq!(map.cursor_first(), map.cursor_end(), "op #{op_id}: {op:?}");
                map = taken;
            }

            Op::Depth => {
                let depth = map.depth();
                assert_eq!(depth == 0, map.is_empty(), "op #{op_id}: {op:?}");
                assert!(depth <= map.len(), "op #{op_id}: {op:?}");
                assert!(depth >= depth_bound(map.len()), "op #{op_id}: {op:?}");
            }
        }

        map.assert_invariants();
        assert_eq!(map.len(), model.len(), "op #{op_id}: {op:?}");
        assert!(
            model
                .iter()
                .zip(map.iter())
                .all(|((mk, mv), (k, v))| mk == k && mv == v),
            "op #{op_id}: {op:?}"
        );
    }
}

/// Builds a map from `values`, rebalances it, and checks that the pair
/// sequence is unchanged and the depth bound holds.
pub fn run_balance_preserves(values: Vec<u16>) {
    let mut map: BstMap<u16, u32> = BstMap::new();
    for (stamp, value) in values.into_iter().enumerate() {
        map.insert(value, stamp as u32);
    }

    let before: Vec<(u16, u32)> = map.iter().map(|(key, value)| (*key, *value)).collect();

    map.balance();
    map.assert_invariants();

    let after: Vec<(u16, u32)> = map.iter().map(|(key, value)| (*key, *value)).collect();
    assert_eq!(before, after);
    assert!(map.depth() <= depth_bound(map.len()));
}
