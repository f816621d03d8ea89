// OpenHashMap property tests through the public API.
//
// Property 1: model equivalence with std HashMap over random put/remove
// streams on a small key space, so keys are updated, removed and
// reinserted many times and tombstones are constantly reused.
//
// Property 2: rebuilds are invisible. After any op stream, the map equals
// a freshly built map holding the same pairs, and its occupancy respects
// the policy's high-water mark.
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};
use value_hashmap::{LoadFactorPolicy, OpenHashMap, Value, ValueHashMap};

proptest! {
    #[test]
    fn prop_matches_std_hash_map(ops in proptest::collection::vec((any::<bool>(), 0u16..64, any::<u32>()), 1..400)) {
        let mut m: OpenHashMap<u16, u32> = OpenHashMap::new();
        let mut model: HashMap<u16, u32> = HashMap::new();
        for (is_put, k, v) in ops {
            if is_put {
                prop_assert_eq!(m.put(k, v), model.insert(k, v));
            } else {
                prop_assert_eq!(m.remove(&k), model.remove(&k));
            }
            prop_assert_eq!(m.get(&k), model.get(&k));
            prop_assert_eq!(m.len(), model.len());
        }
        for k in 0u16..64 {
            prop_assert_eq!(m.get(&k), model.get(&k));
        }
    }

    #[test]
    fn prop_rebuilds_are_invisible(
        ops in proptest::collection::vec((0u8..3, -50i64..50), 1..300),
        max_load in 20u8..=90,
    ) {
        let policy = LoadFactorPolicy::new(max_load, max_load / 3, 30, 2).unwrap();
        let mut m: ValueHashMap<i64, _> = OpenHashMap::with_capacity_hasher_and_policy(
            0,
            std::collections::hash_map::RandomState::new(),
            policy,
        );
        let mut model: BTreeMap<i64, i64> = BTreeMap::new();
        for (op, k) in ops {
            let key = Value::BigInt(k);
            match op {
                0 | 1 => {
                    m.put(key, k * 10 + i64::from(op));
                    model.insert(k, k * 10 + i64::from(op));
                }
                _ => {
                    m.remove(&key);
                    model.remove(&k);
                }
            }
            let occ = *m.occupancy();
            prop_assert!(occ.used() * 100 <= occ.capacity() * usize::from(max_load));
        }
        let seen: BTreeMap<i64, i64> = m
            .iter()
            .map(|(k, v)| match k {
                Value::BigInt(k) => (*k, *v),
                other => panic!("unexpected key {}", other),
            })
            .collect();
        prop_assert_eq!(&seen, &model);

        let rebuilt: ValueHashMap<i64> = model.iter().map(|(k, v)| (Value::BigInt(*k), *v)).collect();
        prop_assert_eq!(rebuilt.len(), m.len());
        for (k, v) in rebuilt.iter() {
            prop_assert_eq!(m.get(k), Some(v));
        }
    }
}
