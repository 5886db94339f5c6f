//! Process-wide floating point operation counter.
//!
//! The dense primitives report how many real floating point operations
//! they issue. The counter is a monotonic atomic updated with relaxed
//! ordering: it is observability only, not part of any algorithm.

use std::sync::atomic::{AtomicU64, Ordering};

static FLOP_COUNT: AtomicU64 = AtomicU64::new(0);

/// Add `n` real floating point operations to the global counter.
#[inline]
pub fn increment_flops(n: u64) {
    FLOP_COUNT.fetch_add(n, Ordering::Relaxed);
}

/// Total real floating point operations recorded so far.
pub fn flops() -> u64 {
    FLOP_COUNT.load(Ordering::Relaxed)
}

/// Reset the counter to zero.
pub fn reset_flops() {
    FLOP_COUNT.store(0, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_accumulates() {
        let before = flops();
        increment_flops(17);
        increment_flops(3);
        assert!(flops() >= before + 20);
    }
}
