//! Run counters for the insight host
//!
//! Process-wide totals for the stats endpoint. Counters are write-only from
//! the evaluation's point of view and never influence a verdict.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::models::types::Severity;

/// Snapshot returned by `/v1/stats`
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryStats {
    pub total_evaluations: u64,
    pub safe: u64,
    pub caution: u64,
    pub critical: u64,
    pub degraded: u64,
    pub failed: u64,
    pub avg_latency_ms: f64,
    pub uptime_seconds: u64,
}

/// Lock-free evaluation counters
pub struct TelemetryCollector {
    total: AtomicU64,
    safe: AtomicU64,
    caution: AtomicU64,
    critical: AtomicU64,
    degraded: AtomicU64,
    failed: AtomicU64,
    total_latency_ms: AtomicU64,
    started: Instant,
}

impl TelemetryCollector {
    pub fn new() -> Self {
        Self {
            total: AtomicU64::new(0),
            safe: AtomicU64::new(0),
            caution: AtomicU64::new(0),
            critical: AtomicU64::new(0),
            degraded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Record a finished evaluation. `severity` is `None` for error trees.
    pub fn record(&self, severity: Option<Severity>, degraded: bool, latency_ms: u64) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);

        let bucket = match severity {
            Some(Severity::Safe) => &self.safe,
            Some(Severity::Caution) => &self.caution,
            Some(Severity::Critical) => &self.critical,
            None => &self.failed,
        };
        bucket.fetch_add(1, Ordering::Relaxed);

        if degraded {
            self.degraded.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn get_stats(&self) -> TelemetryStats {
        let total = self.total.load(Ordering::Relaxed);
        let latency = self.total_latency_ms.load(Ordering::Relaxed);
        TelemetryStats {
            total_evaluations: total,
            safe: self.safe.load(Ordering::Relaxed),
            caution: self.caution.load(Ordering::Relaxed),
            critical: self.critical.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            avg_latency_ms: if total == 0 { 0.0 } else { latency as f64 / total as f64 },
            uptime_seconds: self.started.elapsed().as_secs(),
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}
