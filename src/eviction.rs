//! Admission control for new keys arriving at a full map.

use crate::hash_table::{AccessHook, EntryId};
use serde::{Deserialize, Serialize};

/// What a full map does with a new key.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverflowStrategy {
    /// Fail the insertion with `Error::CapacityExceeded`.
    #[default]
    Throw,
    /// Drop the new key silently.
    Discard,
    /// Evict the head of the order list, then insert.
    RemoveLeastRecent,
    /// Evict the tail of the order list, then insert.
    RemoveMostRecent,
}

/// Outcome of admission control for one new-key insertion.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Admission {
    Accept,
    Reject,
    Discard,
    Evict(EntryId),
}

/// Decide whether a new key may enter a map holding `len` entries.
///
/// Only called for keys that are not already present. Eviction strategies
/// with no candidate (a plain map, or a zero-capacity map) reject.
pub(crate) fn admit<H: AccessHook>(
    strategy: OverflowStrategy,
    len: usize,
    capacity: Option<usize>,
    hook: &H,
) -> Admission {
    match capacity {
        Some(cap) if len >= cap => {}
        _ => return Admission::Accept,
    }
    let victim = match strategy {
        OverflowStrategy::Throw => return Admission::Reject,
        OverflowStrategy::Discard => return Admission::Discard,
        OverflowStrategy::RemoveLeastRecent => hook.first(),
        OverflowStrategy::RemoveMostRecent => hook.last(),
    };
    victim.map_or(Admission::Reject, Admission::Evict)
}
