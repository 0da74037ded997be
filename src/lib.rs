//! chained-hashmap: a single-threaded chained hash map with optional entry
//! ordering and capacity-bounded eviction.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one storage engine beneath both a plain `HashMap` and an
//!   order-tracking `LinkedHashMap`, with capacity enforcement and eviction
//!   handled in a single place.
//! - Layers:
//!   - ChainedTable<K, V, S, H>: prime-length bucket array; collisions are
//!     chained through per-entry `next` ids. Owns growth. Reports every
//!     insert/access/modify/remove to an injected `AccessHook`.
//!   - OrderList: an `AccessHook` keeping a circular doubly linked list of
//!     entry ids behind a sentinel, in insertion, access or modification
//!     order. `Unordered` is the no-op hook used by plain maps.
//!   - eviction::admit: given a full map and a new key, decides between
//!     rejecting, discarding, or evicting the head or tail of the order.
//!   - BoundedMap<K, V, S, H>: public facade; an unbounded table plus a
//!     fixed capacity and overflow strategy.
//!
//! Constraints
//! - Single-threaded: no interior locking; callers needing sharing wrap the
//!   map in their own mutex.
//! - Entries live in a `SlotMap` arena and are addressed by generational
//!   `EntryId`s; the order list holds ids only, never entries.
//! - The bucket array length is always prime and grows to the next prime
//!   at least double its size once `len > slots * load_factor`.
//! - Capacity, load factor, ordering and overflow strategy are fixed at
//!   construction; a non-positive load factor is rejected up front.
//!
//! Hasher and rehashing invariants
//! - Each entry stores its `u64` hash; lookups compare the cached hash
//!   before `Eq`, and growth re-buckets by the cached hash without calling
//!   `K: Hash` again.
//! - `K: Hash + Eq` must agree (equal keys hash equally); this is the
//!   caller's obligation and is not checked.
//!
//! Overflow semantics
//! - Only a new key arriving while `len == capacity` consults the overflow
//!   strategy. Updates of existing keys always succeed.
//! - `put` may fail with `Error::CapacityExceeded`; `offer` never fails
//!   and reports refusal through `OfferResult::accepted`.
//! - Eviction is silent; `Remove*` strategies on a plain map have no order
//!   to pick from and behave like `Throw`.
//!
//! Notes and non-goals
//! - No internal synchronization; `&mut self` on every mutating call is
//!   the only exclusion.
//! - No persistence; `serde` support serializes entries in iteration
//!   order and restores them by replaying `put`.

mod error;
mod eviction;
pub mod hash_table;
mod map;
mod map_proptest;
mod options;
pub mod order_list;
mod primes;
mod serde_impl;

// Public surface
pub use error::{Error, Result};
pub use eviction::OverflowStrategy;
pub use hash_table::{AccessHook, EntryId, Unordered};
pub use map::{BoundedMap, HashMap, LinkedHashMap, OfferResult};
pub use options::{MapOptions, DEFAULT_LOAD_FACTOR};
pub use order_list::{OrderList, Ordering};
pub use serde_impl::MapSeed;
