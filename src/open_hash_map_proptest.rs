#![cfg(test)]

// Property tests for OpenHashMap kept inside the crate so they can check
// structural invariants of the slot table after every step.

use crate::open_hash_map::OpenHashMap;
use crate::policy::LoadFactorPolicy;
use proptest::prelude::*;
use std::collections::hash_map::RandomState;
use std::collections::{BTreeMap, BTreeSet, HashMap};
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

// Pool-indexed operations: indices shrink to earlier keys, pool length
// shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Put(usize, i32),
    Get(usize),
    Remove(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario(max_pool: usize) -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=max_pool).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Put(i, v)),
            2 => idx.clone().prop_map(OpI::Get),
            2 => idx.clone().prop_map(OpI::Remove),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..200).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Drives `sut` and a std HashMap model through the same ops.
// Invariants checked after every op:
// - put returns the model's previous value; get/contains parity with the model.
// - remove returns the model's value, or None for absent keys.
// - keys()/values() are aligned, duplicate-free and equal the model as a set.
// - len parity; occupancy never reaches capacity; every live entry is reachable
//   from its home slot without crossing an empty slot.
fn run_state_machine<S>(
    mut sut: OpenHashMap<Key, i32, S>,
    pool: Vec<String>,
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut model: HashMap<Key, i32> = HashMap::new();
    for op in ops {
        match op {
            OpI::Put(i, v) => {
                let k = key_from(&pool, i);
                let prev = sut.put(k.clone(), v);
                prop_assert_eq!(prev, model.insert(k, v));
            }
            OpI::Get(i) => {
                let k = key_from(&pool, i);
                prop_assert_eq!(sut.get(&k), model.get(&k));
            }
            OpI::Remove(i) => {
                let k = key_from(&pool, i);
                prop_assert_eq!(sut.remove(&k), model.remove(&k));
                prop_assert!(sut.get(&k).is_none());
            }
            OpI::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(&pool, i);
                match (sut.get_mut(&k), model.get_mut(&k)) {
                    (Some(sv), Some(mv)) => {
                        *sv = sv.saturating_add(d);
                        *mv = mv.saturating_add(d);
                    }
                    (None, None) => {}
                    (s, m) => prop_assert!(false, "presence mismatch: {:?} vs {:?}", s, m),
                }
            }
            OpI::Iterate => {
                let keys: Vec<Key> = sut.keys().cloned().collect();
                let values: Vec<i32> = sut.values().copied().collect();
                prop_assert_eq!(keys.len(), values.len());
                let pairs: BTreeMap<Key, i32> = keys.iter().cloned().zip(values).collect();
                prop_assert_eq!(pairs.len(), keys.len(), "duplicate key in iteration");
                let expected: BTreeMap<Key, i32> =
                    model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(pairs, expected);
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        let occ = *sut.occupancy();
        prop_assert!(occ.used() < occ.capacity());
        sut.assert_invariants();
    }
    Ok(())
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

// Few distinct hashes: many partial collisions with frequent growth.
#[derive(Clone, Default)]
struct NarrowBuildHasher;
struct NarrowHasher(u64);
impl BuildHasher for NarrowBuildHasher {
    type Hasher = NarrowHasher;
    fn build_hasher(&self) -> Self::Hasher {
        NarrowHasher(0)
    }
}
impl Hasher for NarrowHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.wrapping_mul(31).wrapping_add(u64::from(b));
        }
    }
    fn finish(&self) -> u64 {
        self.0 % 5
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario(48)) {
        run_state_machine(OpenHashMap::new(), pool, ops)?;
    }

    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario(12)) {
        run_state_machine(OpenHashMap::with_hasher(ConstBuildHasher), pool, ops)?;
    }

    #[test]
    fn prop_state_machine_narrow_hash((pool, ops) in arb_scenario(48)) {
        run_state_machine(OpenHashMap::with_hasher(NarrowBuildHasher), pool, ops)?;
    }

    // Property: the live (key, value) set survives every rebuild, whether it
    // was triggered by growth, shrinking or tombstone compaction.
    #[test]
    fn prop_rebuilds_preserve_entries(
        keys in proptest::collection::btree_set(0u32..10_000, 1..400),
        keep_every in 2usize..6,
    ) {
        let policy = LoadFactorPolicy::new(60, 10, 20, 2).unwrap();
        let mut m: OpenHashMap<u32, u32, _, LoadFactorPolicy> =
            OpenHashMap::with_capacity_hasher_and_policy(0, RandomState::new(), policy);
        for &k in &keys {
            m.put(k, k ^ 0xa5a5);
        }
        let mut expected: BTreeSet<(u32, u32)> = BTreeSet::new();
        for (i, &k) in keys.iter().enumerate() {
            if i % keep_every == 0 {
                expected.insert((k, k ^ 0xa5a5));
            } else {
                prop_assert_eq!(m.remove(&k), Some(k ^ 0xa5a5));
            }
        }
        let seen: BTreeSet<(u32, u32)> = m.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(seen, expected.clone());
        prop_assert_eq!(m.len(), expected.len());
        m.assert_invariants();
    }
}
