//! Prime table lengths for the bucket array.

/// Upper bound on the bucket array length (2^31 - 1).
pub(crate) const LARGEST_PRIME: usize = 2_147_483_647;

/// Bucket array length of a fresh or cleared table.
pub(crate) const MIN_SLOTS: usize = 7;

pub(crate) fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }
    let mut i = 5usize;
    while i.saturating_mul(i) <= n {
        if n % i == 0 || n % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}

/// Smallest prime `>= n`, saturating at `LARGEST_PRIME`.
pub(crate) fn next_prime(n: usize) -> usize {
    if n >= LARGEST_PRIME {
        return LARGEST_PRIME;
    }
    let mut c = n.max(2);
    while !is_prime(c) {
        c += 1;
    }
    c
}

/// Length the bucket array grows to from `len`.
pub(crate) fn grown_length(len: usize) -> usize {
    match len.checked_mul(2) {
        Some(doubled) if doubled < LARGEST_PRIME => next_prime(doubled),
        _ => LARGEST_PRIME,
    }
}
