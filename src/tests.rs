use std::cell::Cell;
use std::cmp::Ordering;
use std::mem;
use std::ops::Range;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::model;

use super::*;

fn insert_find_all(keys: &[u32]) {
    let mut map: BstMap<u32, u32> = BstMap::new();

    for &key in keys {
        let (_, inserted) = map.insert(key, key * 10);
        assert!(inserted);
        map.assert_invariants();
    }

    assert_eq!(map.len(), keys.len());

    for &key in keys {
        assert_eq!(map.get(&key), Some(&(key * 10)));
    }
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn two_elems_find() {
    insert_find_all(&[0, 1]);
    insert_find_all(&[1, 0]);
}

#[test]
fn three_elems_find() {
    insert_find_all(&[0, 1, 2]);
    insert_find_all(&[0, 2, 1]);
    insert_find_all(&[1, 0, 2]);
    insert_find_all(&[1, 2, 0]);
    insert_find_all(&[2, 0, 1]);
    insert_find_all(&[2, 1, 0]);
}

#[test]
fn four_elems_find() {
    insert_find_all(&[0, 1, 2, 3]);
    insert_find_all(&[0, 1, 3, 2]);
    insert_find_all(&[0, 2, 1, 3]);
    insert_find_all(&[0, 2, 3, 1]);
    insert_find_all(&[0, 3, 1, 2]);
    insert_find_all(&[0, 3, 2, 1]);

    insert_find_all(&[1, 0, 2, 3]);
    insert_find_all(&[1, 0, 3, 2]);
    insert_find_all(&[1, 2, 0, 3]);
    insert_find_all(&[1, 2, 3, 0]);
    insert_find_all(&[1, 3, 0, 2]);
    insert_find_all(&[1, 3, 2, 0]);

    insert_find_all(&[2, 0, 1, 3]);
    insert_find_all(&[2, 0, 3, 1]);
    insert_find_all(&[2, 1, 0, 3]);
    insert_find_all(&[2, 1, 3, 0]);
    insert_find_all(&[2, 3, 0, 1]);
    insert_find_all(&[2, 3, 1, 0]);

    insert_find_all(&[3, 0, 1, 2]);
    insert_find_all(&[3, 0, 2, 1]);
    insert_find_all(&[3, 1, 0, 2]);
    insert_find_all(&[3, 1, 2, 0]);
    insert_find_all(&[3, 2, 0, 1]);
    insert_find_all(&[3, 2, 1, 0]);
}

#[test]
fn in_order_iteration_is_sorted() {
    let mut map = BstMap::new();
    for key in [5, 3, 8, 1, 4] {
        map.insert(key, ());
    }

    let keys: Vec<u32> = map.iter().map(|(key, _)| *key).collect();
    assert_eq!(keys, vec![1, 3, 4, 5, 8]);
}

#[test]
fn ascending_chain_then_balance() {
    let mut map = BstMap::new();
    for key in 1..=7 {
        map.insert(key, key);
    }

    assert_eq!(map.depth(), 7);

    map.balance();
    map.assert_invariants();

    assert_eq!(map.depth(), 3);
    let keys: Vec<i32> = map.iter().map(|(key, _)| *key).collect();
    assert_eq!(keys, (1..=7).collect::<Vec<_>>());
}

#[test]
fn duplicate_insert_keeps_stored_value() {
    let mut map = BstMap::new();

    let (_, first) = map.insert("a", 1);
    assert!(first);

    let (cursor, second) = map.insert("a", 2);
    assert!(!second);
    assert_eq!(cursor.key_value(), Some((&"a", &1)));

    assert_eq!(map.get(&"a"), Some(&1));
    assert_eq!(map.len(), 1);
}

#[test]
fn reversed_predicate_orders_descending() {
    let mut map = BstMap::with_cmp(natural::<String>().rev());
    for i in 0..=10 {
        map.insert(i.to_string(), i);
    }
    map.assert_invariants();

    let keys: Vec<String> = map.iter().map(|(key, _)| key.clone()).collect();

    let mut expected: Vec<String> = (0..=10).map(|i| i.to_string()).collect();
    expected.sort();
    expected.reverse();

    assert_eq!(keys, expected);
    assert_eq!(keys.first().map(String::as_str), Some("9"));
    assert_eq!(keys.last().map(String::as_str), Some("0"));
}

#[test]
fn find_present_and_absent() {
    let mut map = BstMap::new();
    for key in [4, 2, 6] {
        map.insert(key, key * 100);
    }

    let hit = map.find(&2);
    assert_eq!(hit.key_value(), Some((&2, &200)));
    assert!(!hit.is_end());

    let miss = map.find(&5);
    assert!(miss.is_end());
    assert_eq!(miss, map.cursor_end());
    assert_eq!(miss.depth(), 0);
}

#[test]
fn find_on_empty_is_end() {
    let map: BstMap<i32, i32> = BstMap::new();
    assert!(map.find(&1).is_end());
    assert_eq!(map.cursor_first(), map.cursor_end());
}

#[test]
fn clear_empties_and_is_idempotent() {
    let mut map = BstMap::new();
    for key in [2, 1, 3] {
        map.insert(key, key);
    }

    map.clear();
    assert_eq!(map.len(), 0);
    assert!(map.is_empty());
    assert_eq!(map.cursor_first(), map.cursor_end());
    assert_eq!(map.get(&1), None);

    map.clear();
    assert!(map.is_empty());

    let (_, inserted) = map.insert(7, 7);
    assert!(inserted);
    assert_eq!(map.len(), 1);
}

#[test]
fn depth_of_empty_and_single() {
    let mut map = BstMap::new();
    assert_eq!(map.depth(), 0);

    map.insert(1, "one");
    assert_eq!(map.depth(), 1);
    assert_eq!(map.cursor_first().depth(), 1);
    assert_eq!(map.cursor_end().depth(), 0);
}

#[test]
fn cursor_walk_matches_iter() {
    let mut map = BstMap::new();
    for key in [6, 2, 9, 1, 4] {
        map.insert(key, key);
    }

    let mut cursor = map.cursor_first();
    let mut walked = Vec::new();
    while let Some((key, _)) = cursor.key_value() {
        assert!(cursor.depth() >= 1);
        walked.push(*key);
        cursor.move_next();
    }

    assert!(cursor.is_end());
    cursor.move_next();
    assert!(cursor.is_end());

    let iterated: Vec<u32> = map.iter().map(|(key, _)| *key).collect();
    assert_eq!(walked, iterated);
}

#[test]
fn cursor_mut_updates_value() {
    let mut map = BstMap::new();
    map.insert("k", 1);

    let mut cursor = map.cursor_first_mut();
    *cursor.value_mut().expect("cursor points at the only node") = 5;

    assert_eq!(map.get(&"k"), Some(&5));
}

#[test]
fn iter_mut_updates_values() {
    let mut map = BstMap::new();
    for key in [1, 2, 3] {
        map.insert(key, key as i64);
    }

    for (_, value) in map.iter_mut() {
        *value = -*value;
    }

    let values: Vec<i64> = map.iter().map(|(_, value)| *value).collect();
    assert_eq!(values, vec![-1, -2, -3]);
}

#[test]
fn into_iter_yields_sorted_pairs() {
    let mut map = BstMap::new();
    for key in [3, 1, 2] {
        map.insert(key, key * 10);
    }

    let pairs: Vec<(i32, i32)> = map.into_iter().collect();
    assert_eq!(pairs, vec![(1, 10), (2, 20), (3, 30)]);
}

#[test]
fn into_iter_partial_consumption_drops_cleanly() {
    let mut map = BstMap::new();
    for key in 0..100 {
        map.insert(key, key);
    }

    let mut iter = map.into_iter();
    assert_eq!(iter.next(), Some((0, 0)));
    assert_eq!(iter.next(), Some((1, 1)));
    assert_eq!(iter.len(), 98);
}

#[test]
fn clone_is_independent() {
    let mut map = BstMap::new();
    for key in [2, 1, 3] {
        map.insert(key, key * 100);
    }

    let mut copy = map.clone();
    copy.assert_invariants();
    assert_eq!(
        map.iter().collect::<Vec<_>>(),
        copy.iter().collect::<Vec<_>>()
    );

    *copy.get_mut(&2).expect("key present in copy") = -1;
    assert_eq!(map.get(&2), Some(&200));

    *map.get_mut(&1).expect("key present in original") = -2;
    assert_eq!(copy.get(&1), Some(&100));
}

#[test]
fn clone_copies_shape() {
    let mut map = BstMap::new();
    for key in 0..32 {
        map.insert(key, ());
    }
    assert_eq!(map.depth(), 32);

    let copy = map.clone();
    copy.assert_invariants();
    assert_eq!(copy.depth(), 32);
    assert_eq!(copy.len(), 32);
}

#[test]
fn take_moves_content_and_empties_source() {
    let mut map = BstMap::new();
    for key in [4, 2, 6] {
        map.insert(key, key);
    }

    let moved = mem::take(&mut map);

    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
    assert_eq!(map.cursor_first(), map.cursor_end());

    let keys: Vec<u32> = moved.iter().map(|(key, _)| *key).collect();
    assert_eq!(keys, vec![2, 4, 6]);
}

#[test]
fn entry_or_default_inserts_once() {
    let mut map: BstMap<&str, i32> = BstMap::new();

    *map.entry("k").or_default() += 1;
    *map.entry("k").or_default() += 1;

    assert_eq!(map.get(&"k"), Some(&2));
    assert_eq!(map.len(), 1);
}

#[test]
fn entry_or_insert_and_modify() {
    let mut map: BstMap<&str, u32> = BstMap::new();

    map.entry("a").and_modify(|value| *value += 1).or_insert(10);
    assert_eq!(map.get(&"a"), Some(&10));

    map.entry("a").and_modify(|value| *value += 1).or_insert(99);
    assert_eq!(map.get(&"a"), Some(&11));

    assert_eq!(map.entry("a").key(), &"a");
    assert_eq!(map.entry("b").key(), &"b");
    assert_eq!(map.len(), 1);
}

#[test]
fn balance_on_empty_and_single() {
    let mut map: BstMap<i32, i32> = BstMap::new();
    map.balance();
    assert_eq!(map.depth(), 0);

    map.insert(1, 1);
    map.balance();
    map.assert_invariants();
    assert_eq!(map.depth(), 1);
    assert_eq!(map.get(&1), Some(&1));
}

#[test]
fn balance_preserves_values_and_bounds_depth() {
    let mut map = BstMap::new();
    let mut state: u64 = 0xfeed_5eed;
    for _ in 0..500 {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        map.insert((state >> 33) as u32, state);
    }

    let before: Vec<(u32, u64)> = map.iter().map(|(key, value)| (*key, *value)).collect();

    map.balance();
    map.assert_invariants();

    let after: Vec<(u32, u64)> = map.iter().map(|(key, value)| (*key, *value)).collect();
    assert_eq!(before, after);
    assert!(map.depth() <= model::depth_bound(map.len()));
}

#[test]
fn degenerate_chain_clears_without_recursion() {
    let mut map = BstMap::new();
    for key in 0..5_000u32 {
        map.insert(key, key);
    }

    assert_eq!(map.depth(), 5_000);

    map.clear();
    assert!(map.is_empty());
    assert_eq!(map.cursor_first(), map.cursor_end());
}

#[test]
fn stateful_comparator_is_independent_per_map() {
    struct Counting {
        calls: Cell<u64>,
    }

    impl Compare<u32> for Counting {
        fn compare(&self, l: &u32, r: &u32) -> Ordering {
            self.calls.set(self.calls.get() + 1);
            l.cmp(r)
        }
    }

    let mut a = BstMap::with_cmp(Counting {
        calls: Cell::new(0),
    });
    let mut b = BstMap::with_cmp(Counting {
        calls: Cell::new(0),
    });

    for key in [5, 3, 8] {
        a.insert(key, ());
    }
    assert!(a.cmp().calls.get() > 0);
    assert_eq!(b.cmp().calls.get(), 0);

    let before = a.cmp().calls.get();
    a.find(&8);
    assert!(a.cmp().calls.get() > before);

    b.insert(1, ());
    assert_eq!(b.cmp().calls.get(), 0);
}

#[test]
fn closure_comparator_orders_by_mapped_key() {
    let mut map = BstMap::with_cmp(|l: &i32, r: &i32| l.abs().cmp(&r.abs()));
    for key in [-3, 1, 2] {
        map.insert(key, ());
    }

    let keys: Vec<i32> = map.iter().map(|(key, _)| *key).collect();
    assert_eq!(keys, vec![1, 2, -3]);

    assert!(map.contains_key(&3));
    let (_, inserted) = map.insert(3, ());
    assert!(!inserted);
}

#[test]
fn display_matches_dump_format() {
    let mut map = BstMap::new();
    map.insert(2, "b");
    map.insert(1, "a");

    assert_eq!(map.to_string(), "bst(2) {(1: a), (2: b), }");

    let empty: BstMap<i32, &str> = BstMap::new();
    assert_eq!(empty.to_string(), "bst(0) {}");
}

#[test]
fn debug_renders_as_map() {
    let mut map = BstMap::new();
    map.insert(1, "a");
    assert_eq!(format!("{map:?}"), r#"{1: "a"}"#);
}

#[test]
fn from_iterator_and_extend() {
    let map: BstMap<u32, u32> = [(3, 30), (1, 10), (2, 20)].into_iter().collect();
    let keys: Vec<u32> = map.iter().map(|(key, _)| *key).collect();
    assert_eq!(keys, vec![1, 2, 3]);

    let mut map = map;
    map.extend([(0, 0), (2, 99)]);
    assert_eq!(map.len(), 4);
    assert_eq!(map.get(&2), Some(&20));
}

#[test]
fn dotgraph_renders() {
    let mut map = BstMap::new();
    for key in [2, 1, 3] {
        map.insert(key, ());
    }

    let mut out = String::new();
    map.dotgraph("t", &mut out).expect("writing to a String");
    assert!(out.starts_with("digraph"));
    assert!(out.contains("rank=same"));
    assert!(out.contains("grapht-2"));

    let empty: BstMap<i32, ()> = BstMap::new();
    let mut out = String::new();
    empty.dotgraph("e", &mut out).expect("writing to a String");
    assert_eq!(out, "digraph \"graph-e\" {}");
}

#[cfg(miri)]
const OP_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const OP_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), OP_RANGE)) {
        model::run_btree_equivalence(ops);
    }

    #[test]
    fn balance_preserves(values in proptest::collection::vec(any::<u16>(), 0..256)) {
        model::run_balance_preserves(values);
    }
}
