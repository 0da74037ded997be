//! Error type shared by every fallible map operation.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A new key arrived while the map was full and the overflow strategy is
    /// `Throw` (or an eviction strategy found nothing to evict).
    #[error("map capacity of {capacity} entries exceeded")]
    CapacityExceeded { capacity: usize },

    #[error("invalid load factor: {0} (must be a finite value > 0)")]
    InvalidLoadFactor(f64),
}

pub type Result<T> = core::result::Result<T, Error>;
