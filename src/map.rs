//! BoundedMap: the public map facade.
//!
//! A `BoundedMap` is an unbounded `ChainedTable` plus a fixed capacity and
//! overflow strategy. Capacity is checked here, before delegating a new key
//! to the table; updates of existing keys never consult it. The access hook
//! type selects the flavour:
//! - `HashMap<K, V, S>`: `Unordered`, iteration order is arena order.
//! - `LinkedHashMap<K, V, S>`: `OrderList`, iteration follows the
//!   configured `Ordering` and eviction picks from its ends.

use crate::error::{Error, Result};
use crate::eviction::{admit, Admission, OverflowStrategy};
use crate::hash_table::{AccessHook, ChainedTable, Iter, IterMut, Unordered};
use crate::options::MapOptions;
use crate::order_list::{OrderList, Ordering};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, BuildHasherDefault, Hash, Hasher};
use std::collections::hash_map::{DefaultHasher, RandomState};
use tracing::trace;

/// Result of `offer`: whether the key is now mapped, and the value it
/// replaced if it was already present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferResult<V> {
    pub accepted: bool,
    pub previous: Option<V>,
}

#[derive(Clone)]
pub struct BoundedMap<K, V, S, H> {
    table: ChainedTable<K, V, S, H>,
    capacity: Option<usize>,
    overflow: OverflowStrategy,
}

/// Plain chained hash map; iteration order is unspecified.
pub type HashMap<K, V, S = RandomState> = BoundedMap<K, V, S, Unordered>;

/// Chained hash map that keeps entries in insertion, access or
/// modification order.
pub type LinkedHashMap<K, V, S = RandomState> = BoundedMap<K, V, S, OrderList>;

impl<K, V, H> BoundedMap<K, V, RandomState, H>
where
    K: Eq + Hash,
    H: AccessHook,
{
    /// Unbounded map with default options.
    pub fn new() -> Self {
        Self::from_valid_options(MapOptions::default(), RandomState::new())
    }

    /// Map holding at most `capacity` entries, failing on overflow.
    pub fn bounded(capacity: usize) -> Self {
        Self::from_valid_options(MapOptions::default().with_capacity(capacity), RandomState::new())
    }

    pub fn with_options(options: MapOptions) -> Result<Self> {
        Self::with_options_and_hasher(options, RandomState::new())
    }

    /// Build from `options` and pre-populate by `put`ting every pair of
    /// `initial` in order.
    pub fn create<I>(options: MapOptions, initial: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = Self::with_options(options)?;
        map.put_all(initial)?;
        Ok(map)
    }
}

impl<K, V, H> Default for BoundedMap<K, V, RandomState, H>
where
    K: Eq + Hash,
    H: AccessHook,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S, H> BoundedMap<K, V, S, H>
where
    K: Eq + Hash,
    S: BuildHasher,
    H: AccessHook,
{
    pub fn with_options_and_hasher(options: MapOptions, hasher: S) -> Result<Self> {
        options.validate()?;
        Ok(Self::from_valid_options(options, hasher))
    }

    pub(crate) fn from_valid_options(options: MapOptions, hasher: S) -> Self {
        Self {
            table: ChainedTable::with_hasher_and_hook(
                options.load_factor,
                hasher,
                H::with_ordering(options.ordering),
            ),
            capacity: options.capacity,
            overflow: options.overflow_strategy,
        }
    }

    /// Options that rebuild an empty map with this configuration.
    pub fn options(&self) -> MapOptions {
        MapOptions {
            capacity: self.capacity,
            load_factor: self.table.load_factor(),
            ordering: self.table.hook().ordering().unwrap_or_default(),
            overflow_strategy: self.overflow,
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
    pub fn load_factor(&self) -> f64 {
        self.table.load_factor()
    }
    pub fn overflow_strategy(&self) -> OverflowStrategy {
        self.overflow
    }
    pub fn hasher(&self) -> &S {
        self.table.hasher()
    }

    /// Free entries before the map is full; `None` when unbounded.
    pub fn remaining(&self) -> Option<usize> {
        self.capacity.map(|c| c.saturating_sub(self.len()))
    }

    pub fn is_full(&self) -> bool {
        self.capacity.is_some_and(|c| self.len() >= c)
    }

    /// Look up `q`, reporting an access (which repositions the entry under
    /// `Ordering::Access`).
    pub fn get<Q>(&mut self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let id = self.table.get(q)?;
        self.table.entry(id).map(|(_, v)| v)
    }

    /// Mutable lookup. Counts as a modification, so the entry moves to the
    /// tail under `Ordering::Access` and `Ordering::Modification`.
    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.get_mut(q)
    }

    /// Look up `q` without reporting an access.
    pub fn peek<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let id = self.table.lookup(q)?;
        self.table.entry(id).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let id = self.table.lookup(q)?;
        self.table.entry(id)
    }

    /// Membership test; never repositions the entry.
    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.lookup(q).is_some()
    }

    /// Linear scan for `value`.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.values().any(|v| v == value)
    }

    /// Insert or update `key`.
    ///
    /// Updating an existing key always succeeds and returns the old value.
    /// A new key arriving while the map is full is handled by the overflow
    /// strategy: `Throw` returns `Error::CapacityExceeded`, `Discard`
    /// returns `Ok(None)` without inserting, and the `Remove*` strategies
    /// evict one entry before inserting.
    pub fn put(&mut self, key: K, value: V) -> Result<Option<V>> {
        let hash = self.table.make_hash(&key);
        if let Some(id) = self.table.find(hash, &key) {
            return Ok(self.table.replace(id, value));
        }
        match admit(self.overflow, self.len(), self.capacity, self.table.hook()) {
            Admission::Accept => {}
            Admission::Discard => {
                trace!(len = self.len(), "map full, discarding new key");
                return Ok(None);
            }
            Admission::Reject => {
                return Err(Error::CapacityExceeded {
                    capacity: self.capacity.unwrap_or(0),
                })
            }
            Admission::Evict(victim) => {
                trace!(strategy = ?self.overflow, "map full, evicting entry");
                if self.table.remove_id(victim).is_none() {
                    return Err(Error::CapacityExceeded {
                        capacity: self.capacity.unwrap_or(0),
                    });
                }
            }
        }
        self.table.insert_new(hash, key, value);
        Ok(None)
    }

    /// Non-failing insertion: a new key is refused (`accepted == false`)
    /// when the map is full, regardless of overflow strategy.
    pub fn offer(&mut self, key: K, value: V) -> OfferResult<V> {
        let hash = self.table.make_hash(&key);
        if let Some(id) = self.table.find(hash, &key) {
            return OfferResult {
                accepted: true,
                previous: self.table.replace(id, value),
            };
        }
        if self.is_full() {
            return OfferResult {
                accepted: false,
                previous: None,
            };
        }
        self.table.insert_new(hash, key, value);
        OfferResult {
            accepted: true,
            previous: None,
        }
    }

    /// `put` every pair in order, stopping at the first error.
    pub fn put_all<I>(&mut self, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in iter {
            self.put(k, v)?;
        }
        Ok(())
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.remove(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.remove(q)
    }

    /// Keep only entries for which `keep` holds; returns how many were
    /// removed.
    pub fn filter_entries<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.table.filter_entries(keep)
    }

    pub fn filter_keys<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&K) -> bool,
    {
        self.table.filter_entries(|k, _| keep(k))
    }

    pub fn filter_values<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&V) -> bool,
    {
        self.table.filter_entries(|_, v| keep(v))
    }

    /// Rewrite every value in place. Order is not affected.
    pub fn transform_values<F>(&mut self, mut f: F)
    where
        F: FnMut(&V) -> V,
    {
        for (_, v) in self.table.iter_mut() {
            *v = f(v);
        }
    }

    /// Rewrite the values of entries matching `pred`. Order is not affected.
    pub fn replace_value_if<P, F>(&mut self, mut pred: P, mut f: F)
    where
        P: FnMut(&K, &V) -> bool,
        F: FnMut(&V) -> V,
    {
        for (k, v) in self.table.iter_mut() {
            if pred(k, v) {
                *v = f(v);
            }
        }
    }

    /// New map with the same options whose values are `f` of this map's
    /// values, populated in this map's iteration order.
    pub fn map_values<V2, F>(&self, mut f: F) -> BoundedMap<K, V2, S, H>
    where
        K: Clone,
        S: Clone,
        F: FnMut(&V) -> V2,
    {
        let mut out = BoundedMap::from_valid_options(self.options(), self.hasher().clone());
        for (k, v) in self.iter() {
            let hash = out.table.make_hash(k);
            out.table.insert_new(hash, k.clone(), f(v));
        }
        out
    }

    /// Copy the content into a std `HashMap`.
    pub fn to_std_map(&self) -> std::collections::HashMap<K, V>
    where
        K: Clone,
        V: Clone,
    {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Remove every entry and shrink the bucket array to its minimum.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn iter(&self) -> Iter<'_, K, V, H> {
        self.table.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.table.iter_mut()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.iter_mut().map(|(_, v)| v)
    }
}

impl<K, V, S> BoundedMap<K, V, S, OrderList>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn ordering(&self) -> Ordering {
        self.table.hook().ordering().unwrap_or_default()
    }

    /// Least recent entry: the next eviction victim under
    /// `RemoveLeastRecent`.
    pub fn first(&self) -> Option<(&K, &V)> {
        let id = self.table.hook().head()?;
        self.table.entry(id)
    }

    /// Most recent entry.
    pub fn last(&self) -> Option<(&K, &V)> {
        let id = self.table.hook().tail()?;
        self.table.entry(id)
    }

    /// Iterate from most recent to least recent.
    pub fn iter_rev(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        let hook = self.table.hook();
        let mut cur = hook.last();
        core::iter::from_fn(move || {
            let id = cur?;
            cur = hook.before(id);
            Some(id)
        })
        .filter_map(move |id| self.table.entry(id))
    }

    /// Reposition `q` as most recent. Returns false if absent.
    pub fn move_to_back<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.table.lookup(q) {
            Some(id) => {
                self.table.hook_mut().move_to_end(id);
                true
            }
            None => false,
        }
    }

    /// Reposition `q` as least recent. Returns false if absent.
    pub fn move_to_front<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.table.lookup(q) {
            Some(id) => {
                self.table.hook_mut().move_to_front(id);
                true
            }
            None => false,
        }
    }
}

/// Content equality: same keys, each mapped to equal values. Layout,
/// hasher and ordering are not compared.
impl<K, V, S1, H1, S2, H2> PartialEq<BoundedMap<K, V, S2, H2>> for BoundedMap<K, V, S1, H1>
where
    K: Eq + Hash,
    V: PartialEq,
    S1: BuildHasher,
    S2: BuildHasher,
    H1: AccessHook,
    H2: AccessHook,
{
    fn eq(&self, other: &BoundedMap<K, V, S2, H2>) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.peek(k).is_some_and(|o| v == o))
    }
}

impl<K, V, S, H> Eq for BoundedMap<K, V, S, H>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
    H: AccessHook,
{
}

impl<K, V, S1, H, S2> PartialEq<std::collections::HashMap<K, V, S2>> for BoundedMap<K, V, S1, H>
where
    K: Eq + Hash,
    V: PartialEq,
    S1: BuildHasher,
    S2: BuildHasher,
    H: AccessHook,
{
    fn eq(&self, other: &std::collections::HashMap<K, V, S2>) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| v == o))
    }
}

impl<K, V, S1, H, S2> PartialEq<BoundedMap<K, V, S1, H>> for std::collections::HashMap<K, V, S2>
where
    K: Eq + Hash,
    V: PartialEq,
    S1: BuildHasher,
    S2: BuildHasher,
    H: AccessHook,
{
    fn eq(&self, other: &BoundedMap<K, V, S1, H>) -> bool {
        other == self
    }
}

/// Order-independent, so it agrees with `PartialEq` across flavours,
/// hashers and orderings.
impl<K, V, S, H> Hash for BoundedMap<K, V, S, H>
where
    K: Eq + Hash,
    V: Hash,
    S: BuildHasher,
    H: AccessHook,
{
    fn hash<T: Hasher>(&self, state: &mut T) {
        let entry_hasher = BuildHasherDefault::<DefaultHasher>::default();
        let sum = self
            .iter()
            .fold(0u64, |acc, kv| acc.wrapping_add(entry_hasher.hash_one(kv)));
        state.write_usize(self.len());
        state.write_u64(sum);
    }
}

impl<K, V, S, H> fmt::Debug for BoundedMap<K, V, S, H>
where
    K: Eq + Hash + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
    H: AccessHook,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, S, H> IntoIterator for &'a BoundedMap<K, V, S, H>
where
    K: Eq + Hash,
    S: BuildHasher,
    H: AccessHook,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, H>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Owned pairs in iteration order.
impl<K, V, S, H> IntoIterator for BoundedMap<K, V, S, H>
where
    K: Eq + Hash,
    S: BuildHasher,
    H: AccessHook,
{
    type Item = (K, V);
    type IntoIter = std::vec::IntoIter<(K, V)>;
    fn into_iter(self) -> Self::IntoIter {
        self.table.into_entries().into_iter()
    }
}

impl<K, V, S, H, S2> From<BoundedMap<K, V, S, H>> for std::collections::HashMap<K, V, S2>
where
    K: Eq + Hash,
    S: BuildHasher,
    H: AccessHook,
    S2: BuildHasher + Default,
{
    fn from(map: BoundedMap<K, V, S, H>) -> Self {
        map.into_iter().collect()
    }
}

/// Collects into an unbounded map with default options.
impl<K, V, S, H> FromIterator<(K, V)> for BoundedMap<K, V, S, H>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
    H: AccessHook,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::from_valid_options(MapOptions::default(), S::default());
        for (k, v) in iter {
            // unbounded: put cannot fail
            let _ = map.put(k, v);
        }
        map
    }
}
