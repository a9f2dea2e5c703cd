//! Request counters for the directory frontend.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Monotonic counters shared by every connection.
///
/// One instance is created at bootstrap and handed to the directory handler
/// as an `Arc`; it is snapshotted once more when the bridge shuts down.
#[derive(Debug, Default)]
pub struct FrontendStats {
    bind_requests: AtomicU64,
    bind_successes: AtomicU64,
    search_requests: AtomicU64,
    search_successes: AtomicU64,
    closes: AtomicU64,
}

impl FrontendStats {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_bind_request(&self) {
        self.bind_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_bind_success(&self) {
        self.bind_successes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_search_request(&self) {
        self.search_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_search_success(&self) {
        self.search_successes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_close(&self) {
        self.closes.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads every counter.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            bind_requests: self.bind_requests.load(Ordering::Relaxed),
            bind_successes: self.bind_successes.load(Ordering::Relaxed),
            search_requests: self.search_requests.load(Ordering::Relaxed),
            search_successes: self.search_successes.load(Ordering::Relaxed),
            closes: self.closes.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`FrontendStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Bind requests received.
    pub bind_requests: u64,
    /// Binds that authenticated.
    pub bind_successes: u64,
    /// Search requests received.
    pub search_requests: u64,
    /// Searches answered with `success`.
    pub search_successes: u64,
    /// Sessions closed.
    pub closes: u64,
}
