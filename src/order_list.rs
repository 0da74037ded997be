//! OrderList: circular doubly linked list of entry ids behind a sentinel.
//!
//! Links are kept in a `SecondaryMap` keyed by the table's `EntryId`, so the
//! list never owns entries. A link of `None` points at the sentinel header:
//! `header.after` is the head (least recent) and `header.before` is the tail
//! (most recent).

use crate::hash_table::{AccessHook, EntryId};
use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;

/// Which operations move an entry to the tail of the order list.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Ordering {
    /// Only insertion of a new key.
    #[default]
    Insertion,
    /// Insertion, lookups and value updates.
    Access,
    /// Insertion and value updates.
    Modification,
}

type Link = Option<EntryId>;

#[derive(Copy, Clone, Debug, Default)]
struct Links {
    before: Link,
    after: Link,
}

#[derive(Clone, Debug)]
pub struct OrderList {
    ordering: Ordering,
    header: Links,
    links: SecondaryMap<EntryId, Links>,
}

impl OrderList {
    pub fn new(ordering: Ordering) -> Self {
        Self {
            ordering,
            header: Links::default(),
            links: SecondaryMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
    pub fn contains(&self, id: EntryId) -> bool {
        self.links.contains_key(id)
    }

    pub fn head(&self) -> Option<EntryId> {
        self.header.after
    }
    pub fn tail(&self) -> Option<EntryId> {
        self.header.before
    }

    pub fn next(&self, id: EntryId) -> Option<EntryId> {
        self.links.get(id).and_then(|l| l.after)
    }
    pub fn prev(&self, id: EntryId) -> Option<EntryId> {
        self.links.get(id).and_then(|l| l.before)
    }

    fn set_after(&mut self, at: Link, to: Link) {
        match at {
            None => self.header.after = to,
            Some(id) => {
                if let Some(l) = self.links.get_mut(id) {
                    l.after = to;
                }
            }
        }
    }

    fn set_before(&mut self, at: Link, to: Link) {
        match at {
            None => self.header.before = to,
            Some(id) => {
                if let Some(l) = self.links.get_mut(id) {
                    l.before = to;
                }
            }
        }
    }

    /// Link `id` between `before` and `after`, which must be adjacent.
    fn splice(&mut self, id: EntryId, before: Link, after: Link) {
        self.links.insert(id, Links { before, after });
        self.set_after(before, Some(id));
        self.set_before(after, Some(id));
    }

    pub fn add_last(&mut self, id: EntryId) {
        if self.contains(id) {
            return;
        }
        let tail = self.header.before;
        self.splice(id, tail, None);
    }

    pub fn add_first(&mut self, id: EntryId) {
        if self.contains(id) {
            return;
        }
        let head = self.header.after;
        self.splice(id, None, head);
    }

    pub fn remove(&mut self, id: EntryId) -> bool {
        let Some(l) = self.links.remove(id) else {
            return false;
        };
        self.set_after(l.before, l.after);
        self.set_before(l.after, l.before);
        true
    }

    pub fn move_to_end(&mut self, id: EntryId) {
        if self.header.before == Some(id) {
            return;
        }
        if self.remove(id) {
            self.add_last(id);
        }
    }

    pub fn move_to_front(&mut self, id: EntryId) {
        if self.header.after == Some(id) {
            return;
        }
        if self.remove(id) {
            self.add_first(id);
        }
    }

    pub fn clear(&mut self) {
        self.header = Links::default();
        self.links.clear();
    }

    /// Ids from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = EntryId> + '_ {
        let mut cur = self.head();
        core::iter::from_fn(move || {
            let id = cur?;
            cur = self.next(id);
            Some(id)
        })
    }

    /// Ids from tail to head.
    pub fn iter_rev(&self) -> impl Iterator<Item = EntryId> + '_ {
        let mut cur = self.tail();
        core::iter::from_fn(move || {
            let id = cur?;
            cur = self.prev(id);
            Some(id)
        })
    }
}

impl Default for OrderList {
    fn default() -> Self {
        Self::new(Ordering::default())
    }
}

impl AccessHook for OrderList {
    fn with_ordering(ordering: Ordering) -> Self {
        Self::new(ordering)
    }

    fn on_insert(&mut self, id: EntryId) {
        self.add_last(id);
    }

    fn on_access(&mut self, id: EntryId) {
        if self.ordering == Ordering::Access {
            self.move_to_end(id);
        }
    }

    fn on_modify(&mut self, id: EntryId) {
        match self.ordering {
            Ordering::Access | Ordering::Modification => self.move_to_end(id),
            Ordering::Insertion => {}
        }
    }

    fn on_remove(&mut self, id: EntryId) {
        self.remove(id);
    }

    fn reset(&mut self) {
        self.clear();
    }

    fn is_ordered(&self) -> bool {
        true
    }
    fn ordering(&self) -> Option<Ordering> {
        Some(self.ordering)
    }
    fn first(&self) -> Option<EntryId> {
        self.head()
    }
    fn last(&self) -> Option<EntryId> {
        self.tail()
    }
    fn after(&self, id: EntryId) -> Option<EntryId> {
        self.next(id)
    }
    fn before(&self, id: EntryId) -> Option<EntryId> {
        self.prev(id)
    }
}
