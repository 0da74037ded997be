#![cfg(test)]

// Property tests for LinkedHashMap kept inside the crate so they can use
// a colliding hasher and the internal table accessors.

use crate::error::Error;
use crate::eviction::OverflowStrategy;
use crate::map::{BoundedMap, OfferResult};
use crate::options::MapOptions;
use crate::order_list::{OrderList, Ordering};
use core::hash::{BuildHasher, Hasher};
use proptest::prelude::*;
use std::collections::hash_map::RandomState;

#[derive(Clone, Debug)]
enum Op {
    Put(u8, i32),
    Offer(u8, i32),
    Get(u8),
    Peek(u8),
    Bump(u8),
    Remove(u8),
    FilterEven,
    Clear,
}

fn arb_op() -> impl Strategy<Value = Op> {
    // Small key space keeps the map near capacity and exercises eviction.
    let key = 0u8..8;
    prop_oneof![
        4 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::Put(k, v)),
        2 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::Offer(k, v)),
        2 => key.clone().prop_map(Op::Get),
        1 => key.clone().prop_map(Op::Peek),
        1 => key.clone().prop_map(Op::Bump),
        2 => key.prop_map(Op::Remove),
        1 => Just(Op::FilterEven),
        1 => Just(Op::Clear),
    ]
}

fn arb_ordering() -> impl Strategy<Value = Ordering> {
    prop_oneof![
        Just(Ordering::Insertion),
        Just(Ordering::Access),
        Just(Ordering::Modification),
    ]
}

fn arb_strategy() -> impl Strategy<Value = OverflowStrategy> {
    prop_oneof![
        Just(OverflowStrategy::Throw),
        Just(OverflowStrategy::Discard),
        Just(OverflowStrategy::RemoveLeastRecent),
        Just(OverflowStrategy::RemoveMostRecent),
    ]
}

/// Reference model: a Vec in iteration order, head first.
struct Model {
    entries: Vec<(u8, i32)>,
    capacity: usize,
    ordering: Ordering,
    strategy: OverflowStrategy,
}

impl Model {
    fn pos(&self, k: u8) -> Option<usize> {
        self.entries.iter().position(|&(kk, _)| kk == k)
    }

    fn touch(&mut self, i: usize) {
        let e = self.entries.remove(i);
        self.entries.push(e);
    }

    fn update(&mut self, i: usize, v: i32) -> i32 {
        let old = core::mem::replace(&mut self.entries[i].1, v);
        if self.ordering != Ordering::Insertion {
            self.touch(i);
        }
        old
    }

    fn put(&mut self, k: u8, v: i32) -> Result<Option<i32>, Error> {
        if let Some(i) = self.pos(k) {
            return Ok(Some(self.update(i, v)));
        }
        if self.entries.len() >= self.capacity {
            match self.strategy {
                OverflowStrategy::Throw => {
                    return Err(Error::CapacityExceeded {
                        capacity: self.capacity,
                    })
                }
                OverflowStrategy::Discard => return Ok(None),
                OverflowStrategy::RemoveLeastRecent => {
                    self.entries.remove(0);
                }
                OverflowStrategy::RemoveMostRecent => {
                    self.entries.pop();
                }
            }
        }
        self.entries.push((k, v));
        Ok(None)
    }

    fn offer(&mut self, k: u8, v: i32) -> OfferResult<i32> {
        if let Some(i) = self.pos(k) {
            return OfferResult {
                accepted: true,
                previous: Some(self.update(i, v)),
            };
        }
        if self.entries.len() >= self.capacity {
            return OfferResult {
                accepted: false,
                previous: None,
            };
        }
        self.entries.push((k, v));
        OfferResult {
            accepted: true,
            previous: None,
        }
    }

    fn get(&mut self, k: u8) -> Option<i32> {
        let i = self.pos(k)?;
        let v = self.entries[i].1;
        if self.ordering == Ordering::Access {
            self.touch(i);
        }
        Some(v)
    }
}

fn run<S: BuildHasher>(
    mut sut: BoundedMap<u8, i32, S, OrderList>,
    mut model: Model,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    for op in ops {
        match op {
            Op::Put(k, v) => prop_assert_eq!(sut.put(k, v), model.put(k, v)),
            Op::Offer(k, v) => prop_assert_eq!(sut.offer(k, v), model.offer(k, v)),
            Op::Get(k) => prop_assert_eq!(sut.get(&k).copied(), model.get(k)),
            Op::Peek(k) => {
                let expected = model.pos(k).map(|i| model.entries[i].1);
                prop_assert_eq!(sut.peek(&k).copied(), expected);
            }
            Op::Bump(k) => {
                let expected = model.pos(k).map(|i| {
                    let bumped = model.entries[i].1.wrapping_add(1);
                    model.update(i, bumped)
                });
                let old = sut.get_mut(&k).map(|v| {
                    let old = *v;
                    *v = old.wrapping_add(1);
                    old
                });
                prop_assert_eq!(old, expected);
            }
            Op::Remove(k) => {
                let expected = model.pos(k).map(|i| model.entries.remove(i).1);
                prop_assert_eq!(sut.remove(&k), expected);
            }
            Op::FilterEven => {
                let before = model.entries.len();
                model.entries.retain(|&(_, v)| v % 2 == 0);
                let removed = sut.filter_values(|v| v % 2 == 0);
                prop_assert_eq!(removed, before - model.entries.len());
            }
            Op::Clear => {
                model.entries.clear();
                sut.clear();
            }
        }

        // Post-conditions after each op
        let seen: Vec<(u8, i32)> = sut.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(&seen, &model.entries);
        prop_assert_eq!(sut.len(), model.entries.len());
        prop_assert!(sut.len() <= model.capacity);
        prop_assert_eq!(sut.remaining(), Some(model.capacity - sut.len()));
        prop_assert_eq!(sut.first().map(|(k, _)| *k), model.entries.first().map(|e| e.0));
        prop_assert_eq!(sut.last().map(|(k, _)| *k), model.entries.last().map(|e| e.0));
    }
    Ok(())
}

fn options(capacity: usize, ordering: Ordering, strategy: OverflowStrategy) -> MapOptions {
    MapOptions::new()
        .with_capacity(capacity)
        .with_ordering(ordering)
        .with_overflow_strategy(strategy)
}

// Property: state-machine equivalence against a Vec model.
// Invariants exercised across random operation sequences:
// - `put` returns the previous value, evicts or refuses exactly as the
//   strategy dictates, and never lets `len` exceed capacity.
// - `offer` never fails and refuses new keys only when full.
// - Iteration order matches the ordering mode after every operation.
// - `get_mut` repositions like an update.
// - `first`/`last` are the head and tail of that order.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_linked_map_matches_model(
        capacity in 1usize..6,
        ordering in arb_ordering(),
        strategy in arb_strategy(),
        ops in proptest::collection::vec(arb_op(), 1..80),
    ) {
        let opts = options(capacity, ordering, strategy);
        let sut = BoundedMap::with_options_and_hasher(opts, RandomState::new()).unwrap();
        let model = Model { entries: Vec::new(), capacity, ordering, strategy };
        run(sut, model, ops)?;
    }
}

// Collision variant using a constant hasher to stress chain handling.
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

// Property: same invariants with every key in one bucket chain, so
// removal and eviction unlink from the head, middle and tail of a chain.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_linked_map_matches_model_with_collisions(
        capacity in 1usize..6,
        ordering in arb_ordering(),
        strategy in arb_strategy(),
        ops in proptest::collection::vec(arb_op(), 1..80),
    ) {
        let opts = options(capacity, ordering, strategy);
        let sut = BoundedMap::with_options_and_hasher(opts, ConstBuildHasher).unwrap();
        let model = Model { entries: Vec::new(), capacity, ordering, strategy };
        run(sut, model, ops)?;
    }
}
