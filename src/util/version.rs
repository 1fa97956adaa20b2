//! Version id allocation.
//!
//! Every commit needs a fresh, chronologically ordered version id that no
//! concurrent commit can collide with. The default allocator derives ids
//! from the wall clock (milliseconds since the Unix epoch) and guards strict
//! monotonicity with a process-wide atomic, so two commits in the same
//! millisecond still get distinct, increasing ids.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Allocates monotonically increasing, chronologically ordered version ids.
pub trait VersionAllocator: Send + Sync {
    fn next(&self) -> u64;
}

// Shared across all allocator instances in the process.
static LAST_ISSUED: AtomicU64 = AtomicU64::new(0);

/// Default allocator: wall-clock milliseconds, bumped past the last issued
/// id when the clock stalls or runs backward.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampVersionAllocator;

impl TimestampVersionAllocator {
    pub fn new() -> Self {
        Self
    }
}

impl VersionAllocator for TimestampVersionAllocator {
    fn next(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        let mut last = LAST_ISSUED.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match LAST_ISSUED.compare_exchange_weak(
                last,
                candidate,
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(observed) => last = observed,
            }
        }
    }
}
