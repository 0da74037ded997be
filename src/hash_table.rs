//! ChainedTable: prime-length bucket array with chained entries and an
//! injected access hook.
//!
//! Entries are stored in a `SlotMap` arena and addressed by generational
//! `EntryId`s; each bucket holds the id of its chain head and every entry
//! carries the id of the next entry in its chain. The hash of a key is
//! computed once at insertion and cached on the entry, so growth never
//! calls back into `K: Hash`.
//!
//! Every successful lookup, insertion, modification and removal is reported
//! to the table's `AccessHook`. The hook is how ordering (and therefore
//! eviction order) is layered on without the table knowing about it.

use crate::order_list::Ordering;
use crate::primes::{grown_length, MIN_SLOTS};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use slotmap::{new_key_type, SecondaryMap, SlotMap};
use tracing::debug;

new_key_type! {
    /// Stable identity of a live entry. Ids are never reused for a
    /// different entry, even after the slot is recycled.
    pub struct EntryId;
}

/// Notification sink invoked by the table on every successful operation.
///
/// Besides receiving notifications, a hook answers the traversal questions
/// the map needs: where iteration starts, what follows an entry, and which
/// entries are least and most recent. A hook that does not track order
/// reports `is_ordered() == false` and the table falls back to arena order.
pub trait AccessHook {
    fn with_ordering(ordering: Ordering) -> Self
    where
        Self: Sized;

    fn on_insert(&mut self, id: EntryId);
    fn on_access(&mut self, id: EntryId);
    fn on_modify(&mut self, id: EntryId);
    fn on_remove(&mut self, id: EntryId);

    /// Drop all tracked entries at once; used by `clear`.
    fn reset(&mut self);

    fn is_ordered(&self) -> bool;
    fn ordering(&self) -> Option<Ordering>;
    fn first(&self) -> Option<EntryId>;
    fn last(&self) -> Option<EntryId>;
    fn after(&self, id: EntryId) -> Option<EntryId>;
    fn before(&self, id: EntryId) -> Option<EntryId>;
}

/// Hook for plain maps: ignores every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unordered;

impl AccessHook for Unordered {
    fn with_ordering(_ordering: Ordering) -> Self {
        Unordered
    }
    #[inline]
    fn on_insert(&mut self, _id: EntryId) {}
    #[inline]
    fn on_access(&mut self, _id: EntryId) {}
    #[inline]
    fn on_modify(&mut self, _id: EntryId) {}
    #[inline]
    fn on_remove(&mut self, _id: EntryId) {}
    fn reset(&mut self) {}
    fn is_ordered(&self) -> bool {
        false
    }
    fn ordering(&self) -> Option<Ordering> {
        None
    }
    fn first(&self) -> Option<EntryId> {
        None
    }
    fn last(&self) -> Option<EntryId> {
        None
    }
    fn after(&self, _id: EntryId) -> Option<EntryId> {
        None
    }
    fn before(&self, _id: EntryId) -> Option<EntryId> {
        None
    }
}

#[derive(Clone, Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    hash: u64,
    next: Option<EntryId>, // chain link within the bucket
}

#[derive(Clone)]
pub struct ChainedTable<K, V, S, H> {
    hasher: S,
    slots: Vec<Option<EntryId>>,
    entries: SlotMap<EntryId, Entry<K, V>>,
    load_factor: f64,
    hook: H,
}

#[inline]
fn slot_index(hash: u64, len: usize) -> usize {
    (hash % len as u64) as usize
}

impl<K, V, S, H> ChainedTable<K, V, S, H>
where
    K: Eq + Hash,
    S: BuildHasher,
    H: AccessHook,
{
    /// `load_factor` is assumed validated by the caller.
    pub fn with_hasher_and_hook(load_factor: f64, hasher: S, hook: H) -> Self {
        Self {
            hasher,
            slots: vec![None; MIN_SLOTS],
            entries: SlotMap::with_key(),
            load_factor,
            hook,
        }
    }

    pub fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
    pub fn hasher(&self) -> &S {
        &self.hasher
    }
    pub fn hook(&self) -> &H {
        &self.hook
    }
    pub fn hook_mut(&mut self) -> &mut H {
        &mut self.hook
    }

    /// Scan the chain selected by `hash` for `q`. No notification.
    pub fn find<Q>(&self, hash: u64, q: &Q) -> Option<EntryId>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut cur = self.slots[slot_index(hash, self.slots.len())];
        while let Some(id) = cur {
            let e = self.entries.get(id)?;
            if e.hash == hash && e.key.borrow() == q {
                return Some(id);
            }
            cur = e.next;
        }
        None
    }

    pub fn lookup<Q>(&self, q: &Q) -> Option<EntryId>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(self.make_hash(q), q)
    }

    /// Lookup that reports an access to the hook.
    pub fn get<Q>(&mut self, q: &Q) -> Option<EntryId>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let id = self.lookup(q)?;
        self.hook.on_access(id);
        Some(id)
    }

    /// Mutable lookup. Handing out `&mut V` counts as a modification.
    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let id = self.lookup(q)?;
        self.hook.on_modify(id);
        self.value_mut(id)
    }

    pub fn entry(&self, id: EntryId) -> Option<(&K, &V)> {
        self.entries.get(id).map(|e| (&e.key, &e.value))
    }

    pub fn value_mut(&mut self, id: EntryId) -> Option<&mut V> {
        self.entries.get_mut(id).map(|e| &mut e.value)
    }

    /// Replace the value of a live entry in place; the chain is untouched.
    pub fn replace(&mut self, id: EntryId, value: V) -> Option<V> {
        let e = self.entries.get_mut(id)?;
        let old = core::mem::replace(&mut e.value, value);
        self.hook.on_modify(id);
        Some(old)
    }

    /// Append a key known to be absent to the tail of its bucket chain.
    /// `hash` must be `make_hash(&key)`.
    pub fn insert_new(&mut self, hash: u64, key: K, value: V) -> EntryId {
        let slot = slot_index(hash, self.slots.len());
        let id = self.entries.insert(Entry {
            key,
            value,
            hash,
            next: None,
        });
        match self.chain_tail(slot) {
            Some(tail) => {
                if let Some(t) = self.entries.get_mut(tail) {
                    t.next = Some(id);
                }
            }
            None => self.slots[slot] = Some(id),
        }
        self.hook.on_insert(id);
        if self.entries.len() as f64 > self.slots.len() as f64 * self.load_factor {
            self.grow();
        }
        id
    }

    fn chain_tail(&self, slot: usize) -> Option<EntryId> {
        let mut cur = self.slots[slot]?;
        while let Some(next) = self.entries.get(cur).and_then(|e| e.next) {
            cur = next;
        }
        Some(cur)
    }

    /// Point `prev` (or the bucket head) past a removed link.
    fn link_past(&mut self, slot: usize, prev: Option<EntryId>, next: Option<EntryId>) {
        match prev {
            Some(p) => {
                if let Some(e) = self.entries.get_mut(p) {
                    e.next = next;
                }
            }
            None => self.slots[slot] = next,
        }
    }

    fn release(&mut self, id: EntryId) -> Option<(K, V)> {
        self.hook.on_remove(id);
        self.entries.remove(id).map(|e| (e.key, e.value))
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let slot = slot_index(hash, self.slots.len());
        let mut prev = None;
        let mut cur = self.slots[slot];
        while let Some(id) = cur {
            let e = self.entries.get(id)?;
            let next = e.next;
            if e.hash == hash && e.key.borrow() == q {
                self.link_past(slot, prev, next);
                return self.release(id);
            }
            prev = Some(id);
            cur = next;
        }
        None
    }

    /// Remove a live entry by identity; used by eviction.
    pub fn remove_id(&mut self, id: EntryId) -> Option<(K, V)> {
        let hash = self.entries.get(id)?.hash;
        let slot = slot_index(hash, self.slots.len());
        let mut prev = None;
        let mut cur = self.slots[slot];
        while let Some(c) = cur {
            let next = self.entries.get(c)?.next;
            if c == id {
                self.link_past(slot, prev, next);
                return self.release(id);
            }
            prev = Some(c);
            cur = next;
        }
        None
    }

    /// Remove every entry for which `keep` returns false. Returns the
    /// number of entries removed.
    pub fn filter_entries<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&K, &V) -> bool,
    {
        let mut removed = 0;
        for slot in 0..self.slots.len() {
            let mut prev = None;
            let mut cur = self.slots[slot];
            while let Some(id) = cur {
                let Some(e) = self.entries.get(id) else {
                    break;
                };
                let next = e.next;
                if keep(&e.key, &e.value) {
                    prev = Some(id);
                } else {
                    self.link_past(slot, prev, next);
                    let _ = self.release(id);
                    removed += 1;
                }
                cur = next;
            }
        }
        removed
    }

    /// Drop every entry and shrink back to the minimum bucket count.
    pub fn clear(&mut self) {
        self.slots = vec![None; MIN_SLOTS];
        self.entries.clear();
        self.hook.reset();
    }

    fn grow(&mut self) {
        let old_len = self.slots.len();
        let new_len = grown_length(old_len);
        if new_len <= old_len {
            return;
        }
        let mut slots = vec![None; new_len];
        for head in core::mem::take(&mut self.slots) {
            let mut cur = head;
            while let Some(id) = cur {
                let Some(e) = self.entries.get_mut(id) else {
                    break;
                };
                cur = e.next;
                let s = slot_index(e.hash, new_len);
                e.next = slots[s];
                slots[s] = Some(id);
            }
        }
        self.slots = slots;
        debug!(from = old_len, to = new_len, len = self.len(), "grew bucket array");
    }

    /// Entry ids in iteration order: hook order when the hook is ordered,
    /// arena order otherwise.
    pub fn ids(&self) -> Ids<'_, K, V, H> {
        let walk = if self.hook.is_ordered() {
            Walk::Linked(self.hook.first())
        } else {
            Walk::Arena(self.entries.keys())
        };
        Ids {
            hook: &self.hook,
            walk,
        }
    }

    pub fn iter(&self) -> Iter<'_, K, V, H> {
        Iter {
            entries: &self.entries,
            ids: self.ids(),
            remaining: self.entries.len(),
        }
    }

    /// Consume the table, yielding owned pairs in iteration order.
    pub fn into_entries(mut self) -> Vec<(K, V)> {
        let order: Vec<EntryId> = self.ids().collect();
        order
            .into_iter()
            .filter_map(|id| self.entries.remove(id))
            .map(|e| (e.key, e.value))
            .collect()
    }

    /// Mutable iteration in the same order as `iter`.
    ///
    /// The order is materialized up front so that the yielded `&mut V`
    /// borrows come from a single pass over the arena.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let n = self.entries.len();
        let mut rank: SecondaryMap<EntryId, usize> = SecondaryMap::with_capacity(n);
        for (i, id) in self.ids().enumerate() {
            rank.insert(id, i);
        }
        let mut ordered: Vec<Option<(&K, &mut V)>> = Vec::with_capacity(n);
        ordered.resize_with(n, || None);
        for (id, e) in self.entries.iter_mut() {
            if let Some(&i) = rank.get(id) {
                ordered[i] = Some((&e.key, &mut e.value));
            }
        }
        IterMut {
            inner: ordered.into_iter().flatten(),
        }
    }
}

enum Walk<'a, K, V> {
    Arena(slotmap::basic::Keys<'a, EntryId, Entry<K, V>>),
    Linked(Option<EntryId>),
}

/// Iterator over entry ids in iteration order.
pub struct Ids<'a, K, V, H> {
    hook: &'a H,
    walk: Walk<'a, K, V>,
}

impl<'a, K, V, H: AccessHook> Iterator for Ids<'a, K, V, H> {
    type Item = EntryId;
    fn next(&mut self) -> Option<EntryId> {
        match &mut self.walk {
            Walk::Arena(keys) => keys.next(),
            Walk::Linked(cur) => {
                let id = (*cur)?;
                *cur = self.hook.after(id);
                Some(id)
            }
        }
    }
}

/// Iterator over `(&K, &V)` in iteration order.
pub struct Iter<'a, K, V, H> {
    entries: &'a SlotMap<EntryId, Entry<K, V>>,
    ids: Ids<'a, K, V, H>,
    remaining: usize,
}

impl<'a, K, V, H: AccessHook> Iterator for Iter<'a, K, V, H> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let id = self.ids.next()?;
        let e = self.entries.get(id)?;
        self.remaining = self.remaining.saturating_sub(1);
        Some((&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V, H: AccessHook> ExactSizeIterator for Iter<'a, K, V, H> {}

/// Iterator over `(&K, &mut V)` in iteration order.
pub struct IterMut<'a, K, V> {
    inner: core::iter::Flatten<std::vec::IntoIter<Option<(&'a K, &'a mut V)>>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order_list::OrderList;
    use std::collections::hash_map::RandomState;
    use std::collections::BTreeSet;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl core::hash::Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        } // force all keys into the same bucket
    }

    fn plain() -> ChainedTable<String, i32, RandomState, Unordered> {
        ChainedTable::with_hasher_and_hook(0.75, RandomState::new(), Unordered)
    }

    fn put<S: BuildHasher, H: AccessHook>(
        t: &mut ChainedTable<String, i32, S, H>,
        k: &str,
        v: i32,
    ) -> Option<i32> {
        let hash = t.make_hash(k);
        match t.find(hash, k) {
            Some(id) => t.replace(id, v),
            None => {
                t.insert_new(hash, k.to_string(), v);
                None
            }
        }
    }

    /// Invariant: `find` and `lookup` agree, and stored values are returned.
    #[test]
    fn insert_then_lookup() {
        let mut t = plain();
        assert_eq!(put(&mut t, "a", 1), None);
        assert_eq!(put(&mut t, "b", 2), None);
        assert_eq!(put(&mut t, "a", 3), Some(1));
        assert_eq!(t.len(), 2);
        let id = t.lookup("a").expect("present");
        assert_eq!(t.entry(id), Some((&"a".to_string(), &3)));
        assert!(t.lookup("zz").is_none());
    }

    /// Invariant: growth keeps every key retrievable and the length prime.
    #[test]
    fn growth_preserves_entries() {
        let mut t = plain();
        assert_eq!(t.slot_count(), MIN_SLOTS);
        for i in 0..1_000 {
            put(&mut t, &format!("k{i}"), i);
        }
        assert!(t.slot_count() > MIN_SLOTS);
        assert!(crate::primes::is_prime(t.slot_count()));
        assert!(t.len() as f64 <= t.slot_count() as f64 * t.load_factor());
        for i in 0..1_000 {
            let id = t.lookup(format!("k{i}").as_str()).expect("present after growth");
            assert_eq!(t.entry(id).map(|(_, v)| *v), Some(i));
        }
    }

    /// Invariant: under full collision, chains resolve by equality and
    /// unlinking from the head, middle and tail keeps the rest reachable.
    #[test]
    fn collisions_chain_and_unlink() {
        let mut t: ChainedTable<String, i32, ConstBuildHasher, Unordered> =
            ChainedTable::with_hasher_and_hook(100.0, ConstBuildHasher, Unordered);
        for (i, k) in ["a", "b", "c", "d", "e"].iter().enumerate() {
            put(&mut t, k, i as i32);
        }
        assert_eq!(t.slot_count(), MIN_SLOTS);
        assert_eq!(t.remove("a"), Some(("a".to_string(), 0)));
        assert_eq!(t.remove("c"), Some(("c".to_string(), 2)));
        assert_eq!(t.remove("e"), Some(("e".to_string(), 4)));
        assert_eq!(t.remove("e"), None);
        assert_eq!(t.len(), 2);
        assert!(t.lookup("b").is_some());
        assert!(t.lookup("d").is_some());
    }

    #[test]
    fn remove_id_unlinks_from_chain() {
        let mut t: ChainedTable<String, i32, ConstBuildHasher, Unordered> =
            ChainedTable::with_hasher_and_hook(100.0, ConstBuildHasher, Unordered);
        put(&mut t, "a", 1);
        put(&mut t, "b", 2);
        put(&mut t, "c", 3);
        let id = t.lookup("b").unwrap();
        assert_eq!(t.remove_id(id), Some(("b".to_string(), 2)));
        assert_eq!(t.remove_id(id), None, "stale id must not resolve");
        let keys: BTreeSet<&str> = t.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, BTreeSet::from(["a", "c"]));
    }

    #[test]
    fn filter_entries_counts_and_unlinks() {
        let mut t = plain();
        for i in 0..50 {
            put(&mut t, &format!("k{i}"), i);
        }
        let removed = t.filter_entries(|_, v| v % 5 == 0);
        assert_eq!(removed, 40);
        assert_eq!(t.len(), 10);
        assert!(t.iter().all(|(_, v)| v % 5 == 0));
        assert!(t.lookup("k10").is_some());
        assert!(t.lookup("k11").is_none());
    }

    #[test]
    fn clear_resets_to_minimum() {
        let mut t = plain();
        for i in 0..100 {
            put(&mut t, &format!("k{i}"), i);
        }
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.slot_count(), MIN_SLOTS);
        assert_eq!(t.iter().count(), 0);
        put(&mut t, "again", 1);
        assert_eq!(t.len(), 1);
    }

    /// Invariant: hook notifications follow insert/modify/remove, so an
    /// ordered hook iterates in insertion order and `iter_mut` matches it.
    #[test]
    fn ordered_hook_drives_iteration() {
        let mut t: ChainedTable<String, i32, RandomState, OrderList> =
            ChainedTable::with_hasher_and_hook(
                0.75,
                RandomState::new(),
                OrderList::new(Ordering::Insertion),
            );
        for (i, k) in ["x", "y", "z", "w"].iter().enumerate() {
            put(&mut t, k, i as i32);
        }
        t.remove("y");
        let keys: Vec<&str> = t.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["x", "z", "w"]);
        assert_eq!(t.iter().len(), 3);

        for (_, v) in t.iter_mut() {
            *v *= 10;
        }
        let pairs: Vec<(String, i32)> = t.iter().map(|(k, v)| (k.clone(), *v)).collect();
        assert_eq!(
            pairs,
            vec![("x".into(), 0), ("z".into(), 20), ("w".into(), 30)]
        );
    }

    #[test]
    fn get_reports_access() {
        let mut t: ChainedTable<String, i32, RandomState, OrderList> =
            ChainedTable::with_hasher_and_hook(
                0.75,
                RandomState::new(),
                OrderList::new(Ordering::Access),
            );
        put(&mut t, "a", 1);
        put(&mut t, "b", 2);
        assert!(t.get("a").is_some());
        let keys: Vec<&str> = t.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn get_mut_reports_modification() {
        let mut t: ChainedTable<String, i32, RandomState, OrderList> =
            ChainedTable::with_hasher_and_hook(
                0.75,
                RandomState::new(),
                OrderList::new(Ordering::Modification),
            );
        put(&mut t, "a", 1);
        put(&mut t, "b", 2);
        assert!(t.get("a").is_some());
        if let Some(v) = t.get_mut("a") {
            *v = 10;
        }
        assert!(t.get_mut("missing").is_none());
        let pairs: Vec<(&str, i32)> = t.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(pairs, vec![("b", 2), ("a", 10)]);
    }

    #[test]
    fn into_entries_follows_iteration_order() {
        let mut t: ChainedTable<String, i32, ConstBuildHasher, OrderList> =
            ChainedTable::with_hasher_and_hook(
                0.75,
                ConstBuildHasher,
                OrderList::new(Ordering::Insertion),
            );
        for (i, k) in ["q", "p", "r"].into_iter().enumerate() {
            put(&mut t, k, i as i32);
        }
        t.remove("p");
        assert_eq!(
            t.into_entries(),
            vec![("q".to_string(), 0), ("r".to_string(), 2)]
        );
    }
}
