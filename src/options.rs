//! Construction options shared by `HashMap` and `LinkedHashMap`.

use crate::error::{Error, Result};
use crate::eviction::OverflowStrategy;
use crate::order_list::Ordering;
use serde::{Deserialize, Serialize};

pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;

/// Map configuration. Fields are fixed once a map is built.
///
/// Deserializes from camelCase keys, e.g.
/// `{"capacity": 2, "ordering": "ACCESS", "overflowStrategy": "REMOVE_LEAST_RECENT"}`;
/// missing fields take their defaults.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct MapOptions {
    /// Maximum number of entries; `None` is unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,
    pub load_factor: f64,
    /// Ignored by plain maps.
    pub ordering: Ordering,
    pub overflow_strategy: OverflowStrategy,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            capacity: None,
            load_factor: DEFAULT_LOAD_FACTOR,
            ordering: Ordering::default(),
            overflow_strategy: OverflowStrategy::default(),
        }
    }
}

impl MapOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.capacity = None;
        self
    }

    pub fn with_load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    pub fn with_ordering(mut self, ordering: Ordering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_overflow_strategy(mut self, strategy: OverflowStrategy) -> Self {
        self.overflow_strategy = strategy;
        self
    }

    /// Rejects a load factor that is not finite and positive.
    ///
    /// Any positive value passes, but the bucket array is dense: it holds at
    /// least `len / load_factor` slots of 8 bytes each. Keep the load factor
    /// around 0.1 or above; something like `1e-9` needs gigabytes of buckets
    /// after a few dozen inserts.
    pub fn validate(&self) -> Result<()> {
        // NaN fails the comparison as well.
        if !(self.load_factor > 0.0 && self.load_factor.is_finite()) {
            return Err(Error::InvalidLoadFactor(self.load_factor));
        }
        Ok(())
    }
}
