//! Random-insertion and lookup profiler for [`BstMap`].
//!
//! Performs seeded pseudo-random insertions and lookups, reporting wall
//! time and the comparison counts observed through an instrumented
//! comparator, then rebalances a copy of the tree and repeats the lookups.
//!
//! Usage: `profile [insertions] [searches] [seed_insert] [seed_search]`

use std::cell::Cell;
use std::cmp::Ordering;
use std::env;
use std::process;
use std::time::Instant;

use taproot::{BstMap, Compare};

/// Natural order over `u64` that counts how often it is consulted.
#[derive(Clone, Default)]
struct CountingCmp {
    comparisons: Cell<u64>,
}

impl Compare<u64> for CountingCmp {
    fn compare(&self, l: &u64, r: &u64) -> Ordering {
        self.comparisons.set(self.comparisons.get() + 1);
        l.cmp(r)
    }
}

/// Deterministic pseudo-random key stream (64-bit LCG).
struct KeyGen {
    state: u64,
}

impl KeyGen {
    fn new(seed: u64) -> KeyGen {
        KeyGen { state: seed }
    }

    fn next(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state >> 11
    }
}

type ProfiledMap = BstMap<u64, u64, CountingCmp>;

fn profile_insertions(map: &mut ProfiledMap, keygen: &mut KeyGen, count: usize) {
    let mut total = 0u64;
    let mut best = u64::MAX;
    let mut worst = 0u64;

    let target = map.len() + count;
    let mut stamp = 0u64;

    let start = Instant::now();
    while map.len() != target {
        let before = map.cmp().comparisons.get();
        *map.entry(keygen.next()).or_default() = stamp;
        stamp += 1;

        let spent = map.cmp().comparisons.get() - before;
        total += spent;
        best = best.min(spent);
        worst = worst.max(spent);
    }
    let elapsed = start.elapsed();

    println!(
        "{stamp} random insertions: {:.6}s final size: {} comparisons total: {total} best: {best} worst: {worst}",
        elapsed.as_secs_f64(),
        map.len(),
    );
}

fn profile_find(map: &ProfiledMap, keygen: &mut KeyGen, searches: usize) {
    let mut hits = 0usize;
    let mut total = 0u64;
    let mut best = u64::MAX;
    let mut worst = 0u64;

    let start = Instant::now();
    for _ in 0..searches {
        let key = keygen.next();

        let before = map.cmp().comparisons.get();
        let cursor = map.find(&key);
        let spent = map.cmp().comparisons.get() - before;

        total += spent;
        best = best.min(spent);
        worst = worst.max(spent);
        hits += usize::from(!cursor.is_end());
    }
    let elapsed = start.elapsed();

    println!(
        "{searches} random searches: {:.6}s comparisons total: {total} best: {best} worst: {worst} (hits {hits})",
        elapsed.as_secs_f64(),
    );
}

fn parse_arg(arg: Option<String>, default: u64) -> u64 {
    match arg {
        Some(text) => text.parse().unwrap_or_else(|_| {
            eprintln!("arguments must be non-negative integers");
            eprintln!("usage: profile [insertions] [searches] [seed_insert] [seed_search]");
            process::exit(2);
        }),
        None => default,
    }
}

fn main() {
    let mut args = env::args().skip(1);
    let insertions = parse_arg(args.next(), 1_000_000) as usize;
    let searches = parse_arg(args.next(), 1_000_000) as usize;
    let seed_insert = parse_arg(args.next(), 123_543);
    let seed_search = parse_arg(args.next(), 874_563);

    println!("profiling bst with u64 keys (uniform pseudo-random)");
    println!("insert seed {seed_insert} search seed {seed_search}");
    println!();
    println!("size: {insertions}");

    let mut tree: ProfiledMap = BstMap::with_cmp(CountingCmp::default());

    let mut keygen = KeyGen::new(seed_insert);
    print!("bst_unbalanced ");
    profile_insertions(&mut tree, &mut keygen, insertions);
    println!("bst_unbalanced depth {}", tree.depth());

    let mut keygen = KeyGen::new(seed_search);
    print!("bst_unbalanced ");
    profile_find(&tree, &mut keygen, searches);

    let mut balanced = tree.clone();
    println!("balancing tree");
    let start = Instant::now();
    balanced.balance();
    println!(
        "bst_balanced depth {} took {:.6}s",
        balanced.depth(),
        start.elapsed().as_secs_f64(),
    );

    let mut keygen = KeyGen::new(seed_search);
    print!("bst_balanced ");
    profile_find(&balanced, &mut keygen, searches);
}
