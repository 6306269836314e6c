use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use chrono::{DateTime, Utc};

/// Process-wide request counters, read by whatever readiness check the host exposes.
#[derive(Debug, Default)]
pub struct ActivityStats {
    requests: AtomicU64,
    /// Unix millis of the last delivery; 0 = none yet.
    last_activity_ms: AtomicI64,
}

impl ActivityStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one inbound delivery and stamp the activity time.
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.last_activity_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        match self.last_activity_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => DateTime::from_timestamp_millis(ms),
        }
    }
}
