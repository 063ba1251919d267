#![cfg(test)]

// Property tests for HashMap kept inside the crate so they can check the
// table's internal invariants after every operation.

use core::hash::BuildHasher;
use core::hash::BuildHasherDefault;
use core::hash::Hasher;
use std::collections::BTreeSet;
use std::collections::HashMap as StdHashMap;

use proptest::prelude::*;
use siphasher::sip::SipHasher;

use crate::error::Error;
use crate::hash_map::HashMap;

#[derive(Clone, Default)]
struct FixedSip;

impl BuildHasher for FixedSip {
    type Hasher = SipHasher;

    fn build_hasher(&self) -> SipHasher {
        SipHasher::new_with_keys(0x0123_4567, 0x89ab_cdef)
    }
}

// Keeps only the low two bits of the written value so every key lands in
// one of four home slots and long clusters form.
#[derive(Default)]
struct ClusterHasher(u64);

impl Hasher for ClusterHasher {
    fn finish(&self) -> u64 {
        self.0 & 0b11
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = self.0.wrapping_mul(31).wrapping_add(u64::from(b));
        }
    }
}

type Clustered = BuildHasherDefault<ClusterHasher>;

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, i32),
    Remove(u16),
    Get(u16),
    At(u16),
    BumpDefault(u16),
    Mutate(u16, i32),
    Iterate,
    Clear,
    ShrinkToFit,
}

fn arb_ops(key_space: u16) -> impl Strategy<Value = Vec<Op>> {
    let key = 0..key_space;
    let op = prop_oneof![
        4 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        3 => key.clone().prop_map(Op::Remove),
        2 => key.clone().prop_map(Op::Get),
        1 => key.clone().prop_map(Op::At),
        1 => key.clone().prop_map(Op::BumpDefault),
        1 => (key, any::<i32>()).prop_map(|(k, d)| Op::Mutate(k, d)),
        1 => Just(Op::Iterate),
        1 => Just(Op::Clear),
        1 => Just(Op::ShrinkToFit),
    ];
    proptest::collection::vec(op, 1..300)
}

fn run_against_model<S: BuildHasher>(
    mut sut: HashMap<u16, i32, S>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: StdHashMap<u16, i32> = StdHashMap::new();

    for op in ops {
        match op {
            Op::Insert(k, v) => {
                let already = model.contains_key(&k);
                prop_assert_eq!(sut.insert(k, v), !already);
                model.entry(k).or_insert(v);
            }
            Op::Remove(k) => {
                let capacity = sut.capacity();
                let removed = model.remove(&k);
                let was_present = removed.is_some();
                prop_assert_eq!(sut.remove(&k), removed);
                if !was_present {
                    prop_assert_eq!(sut.capacity(), capacity, "absent removal must not resize");
                } else if sut.capacity() != capacity {
                    prop_assert_eq!(sut.capacity(), capacity / 2, "shrink must halve");
                }
            }
            Op::Get(k) => {
                prop_assert_eq!(sut.get(&k), model.get(&k));
                prop_assert_eq!(sut.contains_key(&k), model.contains_key(&k));
            }
            Op::At(k) => {
                let expected = model.get(&k).ok_or(Error::KeyNotFound);
                prop_assert_eq!(sut.at(&k), expected);
            }
            Op::BumpDefault(k) => {
                *sut.get_or_insert_default(k) += 1;
                *model.entry(k).or_default() += 1;
            }
            Op::Mutate(k, d) => {
                if let Some(v) = sut.get_mut(&k) {
                    *v = v.wrapping_add(d);
                }
                if let Some(v) = model.get_mut(&k) {
                    *v = v.wrapping_add(d);
                }
            }
            Op::Iterate => {
                let seen: Vec<u16> = sut.keys().copied().collect();
                let unique: BTreeSet<u16> = seen.iter().copied().collect();
                prop_assert_eq!(seen.len(), unique.len(), "iteration yielded a key twice");
                let expected: BTreeSet<u16> = model.keys().copied().collect();
                prop_assert_eq!(unique, expected);
            }
            Op::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), 8);
            }
            Op::ShrinkToFit => sut.shrink_to_fit(),
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        sut.assert_invariants();
    }

    for (k, v) in &model {
        prop_assert_eq!(sut.get(k), Some(v));
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// - `insert` reports whether the key was new and never overwrites.
// - `remove`, `get`, `at` and default insertion agree with the model.
// - Iteration yields each live key exactly once.
// - Placement, displacement bookkeeping and load thresholds hold after
//   every step.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in arb_ops(512)) {
        run_against_model(HashMap::with_hasher(FixedSip), ops)?;
    }

    #[test]
    fn prop_state_machine_clustered(ops in arb_ops(64)) {
        run_against_model(HashMap::with_hasher(Clustered::default()), ops)?;
    }

    // Property: removing every key in any order empties the map, which ends
    // at minimum capacity.
    #[test]
    fn prop_remove_all_any_order(
        keys in proptest::collection::btree_set(any::<u32>(), 0..400)
            .prop_map(|set| set.into_iter().collect::<Vec<_>>())
            .prop_shuffle()
    ) {
        let mut map: HashMap<u32, u32, FixedSip> = HashMap::with_hasher(FixedSip);
        for &k in &keys {
            prop_assert!(map.insert(k, !k));
        }
        prop_assert_eq!(map.len(), keys.len());

        for &k in keys.iter().rev() {
            prop_assert_eq!(map.remove(&k), Some(!k));
            map.assert_invariants();
        }
        prop_assert!(map.is_empty());
        prop_assert_eq!(map.capacity(), 8);
    }
}
