//! Cart line keys.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Issues strictly increasing line keys from the millisecond clock.
///
/// Two scans in the same millisecond, or a clock step backwards, get the
/// previous key plus one. Keys saturate at `u64::MAX`.
#[derive(Debug, Default)]
pub struct UniqueKeyGenerator {
    last: AtomicU64,
}

impl UniqueKeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> u64 {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last.saturating_add(1)))
            })
            .unwrap_or_else(|last| last);
        now.max(previous.saturating_add(1))
    }

    /// Ensures future keys are greater than `key`, e.g. after restoring lines.
    pub fn observe(&self, key: u64) {
        self.last.fetch_max(key, Ordering::SeqCst);
    }
}
