//! Counters describing how resolution requests used the repository chain.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Resolution counters (thread-safe, cheap to clone).
///
/// Clones share the same counters, so a handle can be kept by a caller while
/// the resolver records into it.
#[derive(Debug, Clone, Default)]
pub struct ResolutionMetrics {
    inner: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicU64,
    local_queries: AtomicU64,
    remote_queries: AtomicU64,
    access_failures: AtomicU64,
    fast_path_hits: AtomicU64,
    escalations: AtomicU64,
}

/// Point-in-time copy of [`ResolutionMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub local_queries: u64,
    pub remote_queries: u64,
    pub access_failures: u64,
    pub fast_path_hits: u64,
    pub escalations: u64,
}

impl ResolutionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.inner.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_local_query(&self) {
        self.inner.local_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remote_query(&self) {
        self.inner.remote_queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_access_failure(&self) {
        self.inner.access_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// A static request returned from the first authoritative hit.
    pub fn record_fast_path(&self) {
        self.inner.fast_path_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// A request needed the second (remote escalation) pass.
    pub fn record_escalation(&self) {
        self.inner.escalations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.inner.requests.load(Ordering::Relaxed),
            local_queries: self.inner.local_queries.load(Ordering::Relaxed),
            remote_queries: self.inner.remote_queries.load(Ordering::Relaxed),
            access_failures: self.inner.access_failures.load(Ordering::Relaxed),
            fast_path_hits: self.inner.fast_path_hits.load(Ordering::Relaxed),
            escalations: self.inner.escalations.load(Ordering::Relaxed),
        }
    }
}

impl MetricsSnapshot {
    /// Share of tier queries answered without going remote (0.0 to 1.0).
    pub fn local_ratio(&self) -> f64 {
        let total = self.local_queries + self.remote_queries;
        if total == 0 {
            0.0
        } else {
            self.local_queries as f64 / total as f64
        }
    }
}
