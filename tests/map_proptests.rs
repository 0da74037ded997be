// HashMap property tests.
//
// Property 1: state-machine equivalence with std::collections::HashMap for
// an unbounded map.
//  - Operations: put, offer, get, remove, filter, clear.
//  - Invariant: after every op, len() and the full key/value content match
//    the model; put/offer/remove return what the model returns.
//
// Property 2: a bounded Throw map never exceeds capacity, and a failed put
// leaves the content unchanged.
use chained_hashmap::{Error, HashMap, MapOptions};
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Put(u16, i64),
    Offer(u16, i64),
    Get(u16),
    Remove(u16),
    RetainOdd,
    Clear,
}

fn arb_op(keys: u16) -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (0..keys, any::<i64>()).prop_map(|(k, v)| Op::Put(k, v)),
        2 => (0..keys, any::<i64>()).prop_map(|(k, v)| Op::Offer(k, v)),
        3 => (0..keys).prop_map(Op::Get),
        3 => (0..keys).prop_map(Op::Remove),
        1 => Just(Op::RetainOdd),
        1 => Just(Op::Clear),
    ]
}

fn snapshot(m: &HashMap<u16, i64>) -> BTreeMap<u16, i64> {
    m.iter().map(|(k, v)| (*k, *v)).collect()
}

proptest! {
    #[test]
    fn prop_hashmap_matches_std(ops in proptest::collection::vec(arb_op(200), 1..400)) {
        let mut sut: HashMap<u16, i64> = HashMap::new();
        let mut model: std::collections::HashMap<u16, i64> = std::collections::HashMap::new();

        for op in ops {
            match op {
                Op::Put(k, v) => prop_assert_eq!(sut.put(k, v), Ok(model.insert(k, v))),
                Op::Offer(k, v) => {
                    let r = sut.offer(k, v);
                    prop_assert!(r.accepted);
                    prop_assert_eq!(r.previous, model.insert(k, v));
                }
                Op::Get(k) => prop_assert_eq!(sut.get(&k), model.get(&k)),
                Op::Remove(k) => prop_assert_eq!(sut.remove(&k), model.remove(&k)),
                Op::RetainOdd => {
                    let before = model.len();
                    model.retain(|_, v| *v % 2 != 0);
                    prop_assert_eq!(sut.filter_values(|v| *v % 2 != 0), before - model.len());
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(sut.len(), model.len());
            let expected: BTreeMap<u16, i64> = model.iter().map(|(k, v)| (*k, *v)).collect();
            prop_assert_eq!(snapshot(&sut), expected);
            prop_assert!(sut == model);
        }
    }

    #[test]
    fn prop_bounded_throw_never_overflows(
        capacity in 0usize..16,
        ops in proptest::collection::vec(arb_op(32), 1..200),
    ) {
        let mut sut: HashMap<u16, i64> =
            HashMap::with_options(MapOptions::new().with_capacity(capacity)).unwrap();
        for op in ops {
            let before = snapshot(&sut);
            match op {
                Op::Put(k, v) => match sut.put(k, v) {
                    Ok(_) => prop_assert_eq!(sut.peek(&k), Some(&v)),
                    Err(Error::CapacityExceeded { capacity: c }) => {
                        prop_assert_eq!(c, capacity);
                        prop_assert!(!before.contains_key(&k));
                        prop_assert_eq!(snapshot(&sut), before);
                    }
                    Err(e) => prop_assert!(false, "unexpected error {e}"),
                },
                Op::Offer(k, v) => {
                    let r = sut.offer(k, v);
                    prop_assert_eq!(r.accepted, before.contains_key(&k) || before.len() < capacity);
                }
                Op::Get(k) => { let _ = sut.get(&k); }
                Op::Remove(k) => { let _ = sut.remove(&k); }
                Op::RetainOdd => { sut.filter_values(|v| *v % 2 != 0); }
                Op::Clear => sut.clear(),
            }
            prop_assert!(sut.len() <= capacity);
            prop_assert_eq!(sut.remaining(), Some(capacity - sut.len()));
        }
    }
}
