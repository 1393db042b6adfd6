//! Shared counters for the /health endpoint. Updated by every compute handler.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct HealthState {
    /// Compute requests answered since startup.
    pub requests_served: AtomicU64,
    /// Compute requests that returned no points (empty or fully-excluded input).
    pub empty_results: AtomicU64,
    /// Nanosecond timestamp of the last compute request (0 = none).
    pub last_request_at_ns: AtomicU64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self, at_ns: u64, empty: bool) {
        self.requests_served.fetch_add(1, Ordering::Relaxed);
        if empty {
            self.empty_results.fetch_add(1, Ordering::Relaxed);
        }
        self.last_request_at_ns.store(at_ns, Ordering::Relaxed);
    }

    pub fn requests_served(&self) -> u64 {
        self.requests_served.load(Ordering::Relaxed)
    }

    pub fn empty_results(&self) -> u64 {
        self.empty_results.load(Ordering::Relaxed)
    }

    pub fn last_request_at_ns(&self) -> u64 {
        self.last_request_at_ns.load(Ordering::Relaxed)
    }
}
