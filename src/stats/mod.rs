// src/stats/mod.rs
// Process-wide usage counters shared by every in-flight request

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Atomic counters for request volume, error rate, and token usage.
///
/// Created once at process start, never reset. Requests run concurrently, so
/// each field is updated with a single atomic increment - never
/// read-modify-write on the caller side.
pub struct StatsTracker {
    request_count: AtomicU64,
    error_count: AtomicU64,
    tokens_in: AtomicU64,
    tokens_out: AtomicU64,
    start_time: Instant,
}

/// Point-in-time view of the counters for `/stats`.
#[derive(Debug, Clone, Copy)]
pub struct StatsSnapshot {
    pub request_count: u64,
    pub error_count: u64,
    pub tokens_in: u64,
    pub tokens_out: u64,
    pub uptime_seconds: u64,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self {
            request_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            tokens_in: AtomicU64::new(0),
            tokens_out: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Exactly once per request, at entry, regardless of outcome.
    pub fn record_request(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    /// At most once per request that ends in a handled failure path.
    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tokens(&self, tokens_in: u64, tokens_out: u64) {
        self.tokens_in.fetch_add(tokens_in, Ordering::Relaxed);
        self.tokens_out.fetch_add(tokens_out, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            request_count: self.request_count.load(Ordering::Relaxed),
            error_count: self.error_count.load(Ordering::Relaxed),
            tokens_in: self.tokens_in.load(Ordering::Relaxed),
            tokens_out: self.tokens_out.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsSnapshot {
    pub fn error_rate(&self) -> String {
        if self.request_count == 0 {
            return "0.00%".to_string();
        }
        format!(
            "{:.2}%",
            (self.error_count as f64 / self.request_count as f64) * 100.0
        )
    }

    pub fn uptime(&self) -> String {
        let hours = self.uptime_seconds / 3600;
        let minutes = (self.uptime_seconds % 3600) / 60;
        format!("{}h {}m", hours, minutes)
    }
}
