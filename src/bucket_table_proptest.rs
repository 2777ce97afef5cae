#![cfg(test)]

// Property tests for the delegate containers kept inside the crate so
// they can check table geometry directly.

use crate::bucket_map::BucketMap;
use crate::bucket_table::BucketTable;
use crate::config::HashConfig;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations so shrinking moves toward earlier keys.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Emplace(usize, i32),
    Index(usize),
    Remove(usize),
    Contains(String),
    Reserve(u8),
    Rehash(u8),
    LoadFactor(u8),
    Clear,
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Emplace(i, v)),
            3 => idx.clone().prop_map(OpI::Index),
            3 => idx.clone().prop_map(OpI::Remove),
            1 => "[a-z]{0,4}".prop_map(OpI::Contains),
            1 => any::<u8>().prop_map(OpI::Reserve),
            1 => any::<u8>().prop_map(OpI::Rehash),
            1 => (1u8..=32).prop_map(OpI::LoadFactor),
            1 => Just(OpI::Clear),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Runs one scenario against `sut`, checking against a std HashMap model.
// Invariants exercised after every op:
// - Content and `len` parity with the model (insert keeps existing values).
// - `len <= capacity()`; bucket_count is a power of two.
// - bucket_count never decreases.
fn run_scenario<S: BuildHasher>(
    mut sut: BucketMap<Key, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut last_buckets = sut.bucket_count();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let already = model.get(&k).copied();
                let (stored, added) = sut.insert(k.clone(), v);
                prop_assert_eq!(added, already.is_none());
                prop_assert_eq!(*stored, already.unwrap_or(v));
                model.entry(k).or_insert(v);
            }
            OpI::Emplace(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                let mut built = false;
                let (_, added) = sut.emplace(k.clone(), || {
                    built = true;
                    v
                });
                prop_assert_eq!(added, !already);
                prop_assert_eq!(built, !already);
                model.entry(k).or_insert(v);
            }
            OpI::Index(i) => {
                let k = key_from(pool, i);
                let slot = sut.get_or_insert_default(k.clone());
                *slot = slot.wrapping_add(1);
                let m = model.entry(k).or_default();
                *m = m.wrapping_add(1);
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.remove(k.0.as_str()), model.remove(&k));
            }
            OpI::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            OpI::Reserve(n) => {
                sut.reserve(n as usize);
                prop_assert!(sut.capacity() >= n as usize);
            }
            OpI::Rehash(n) => {
                sut.rehash(n as usize);
                prop_assert!(sut.bucket_count() >= n as usize);
            }
            OpI::LoadFactor(z) => {
                let z = z as f32 / 8.0;
                prop_assert!(sut.set_max_load_factor(z).is_ok());
                prop_assert_eq!(sut.max_load_factor(), z);
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
            }
            OpI::Iterate => {
                let s: BTreeSet<_> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                let m: BTreeSet<_> = model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(s, m);
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert!(sut.len() <= sut.capacity());
        prop_assert!(sut.bucket_count().is_power_of_two());
        prop_assert!(sut.bucket_count() >= last_buckets);
        last_buckets = sut.bucket_count();
        for (k, v) in &model {
            prop_assert_eq!(sut.get(k.0.as_str()), Some(v));
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_bucket_map_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(BucketMap::new(), &pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_bucket_map_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(BucketMap::with_hasher(ConstBuildHasher), &pool, ops)?;
    }
}

// Property: for any insertion count and load factor, the table grows only
// when the next element would not fit, and always to a power of two that
// fits it.
proptest! {
    #[test]
    fn prop_growth_only_when_needed(n in 0usize..600, z in 1u8..=32, initial in 1usize..64) {
        let cfg = HashConfig::new()
            .with_initial_buckets(initial)
            .with_max_load_factor(z as f32 / 8.0);
        let mut t: BucketTable<u64> = BucketTable::with_config(&cfg).unwrap();
        for x in 0..n as u64 {
            let before = t.geometry();
            let placed = t.place(x.wrapping_mul(0x9e37_79b9_7f4a_7c15), x, |p, e| p == e, |p| p);
            prop_assert!(placed.inserted);
            let after = placed.geometry;
            let fits = before.len + 1 <= before.capacity();
            prop_assert_eq!(after.bucket_count == before.bucket_count, fits);
            prop_assert!(after.len <= after.capacity());
        }
    }
}

// Property: under any remove/insert churn, hashbrown's allocation grows only
// together with the bucket count.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_allocation_tracks_buckets(
        z in 1u8..=32,
        initial in 1usize..128,
        ops in proptest::collection::vec((any::<bool>(), 0u64..96), 1..2000),
    ) {
        let cfg = HashConfig::new()
            .with_initial_buckets(initial)
            .with_max_load_factor(z as f32 / 8.0);
        let mut t: BucketTable<u64> = BucketTable::with_config(&cfg).unwrap();
        let mix = |x: u64| x.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        for (insert, x) in ops {
            let before = (t.bucket_count(), t.allocated());
            if insert {
                t.place(mix(x), x, |p, e| p == e, |p| p);
            } else {
                t.remove(mix(x), |e| *e == x);
            }
            if t.bucket_count() == before.0 {
                prop_assert_eq!(t.allocated(), before.1);
            }
        }
    }
}
