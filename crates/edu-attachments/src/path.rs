//! Storage key generation
//!
//! Keys follow the `{parent_id}/{category}_{timestamp}` layout. The
//! timestamp comes from a clock that is forced to be strictly increasing at
//! call granularity, so two uploads for the same parent and category get
//! distinct keys even inside one wall-clock millisecond.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use edu_core::traits::Id;

/// Format a storage key from its parts. Pure; no failure mode.
pub fn format_path(parent_id: Id, category: &str, timestamp: i64) -> String {
    format!("{}/{}_{}", parent_id, category, timestamp)
}

/// Issues collision-free storage keys
///
/// Holds the last issued timestamp; a new call takes the wall clock in
/// milliseconds, bumped past the previous value on ties.
#[derive(Debug, Default)]
pub struct PathNamer {
    last: AtomicI64,
}

impl PathNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next strictly-increasing timestamp in milliseconds
    pub fn next_timestamp(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(observed) => prev = observed,
            }
        }
    }

    /// Build a fresh storage key for a parent and category
    pub fn path_for(&self, parent_id: Id, category: &str) -> String {
        format_path(parent_id, category, self.next_timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_format() {
        assert_eq!(format_path(5, "mid", 1000), "5/mid_1000");
    }

    #[test]
    fn test_same_tick_calls_get_distinct_paths() {
        let namer = PathNamer::new();
        // Far more calls than can spread across distinct milliseconds
        let paths: HashSet<String> = (0..10_000).map(|_| namer.path_for(7, "final")).collect();
        assert_eq!(paths.len(), 10_000);
    }

    #[test]
    fn test_timestamps_strictly_increase() {
        let namer = PathNamer::new();
        let mut prev = namer.next_timestamp();
        for _ in 0..1000 {
            let next = namer.next_timestamp();
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn test_concurrent_callers_never_collide() {
        let namer = Arc::new(PathNamer::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let namer = namer.clone();
                std::thread::spawn(move || {
                    (0..2000)
                        .map(|_| namer.next_timestamp())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            for ts in handle.join().unwrap() {
                assert!(all.insert(ts), "duplicate timestamp issued: {ts}");
            }
        }
    }
}
