//! Metrics for filter refreshes and queries
//!
//! ## Usage
//!
//! ```ignore
//! use loaded_filters::metrics::FilterMetrics;
//!
//! let metrics = FilterMetrics::new();
//! metrics.record_query(QueryAnswer::ProvenEmpty);
//! let snapshot = metrics.snapshot();
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// How a result-set query was answered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryAnswer {
    /// Range outside what the manager knows about
    OutOfBounds,
    /// Some filter might contain the beneficiary
    MayContain,
    /// No filter in range contains the beneficiary
    ProvenEmpty,
}

/// Thread-safe counters for the filter manager
#[derive(Debug, Default)]
pub struct FilterMetrics {
    /// Refresh ticks started
    pub refreshes_attempted: AtomicU64,
    /// Refresh ticks that installed a new snapshot
    pub refreshes_updated: AtomicU64,
    /// Refresh ticks that failed and kept the old snapshot
    pub refreshes_failed: AtomicU64,
    /// Filters built across all refreshes
    pub filters_built: AtomicU64,
    /// Filters removed because their file was purged
    pub filters_trimmed: AtomicU64,
    /// Result-set queries answered
    pub queries: AtomicU64,
    /// Queries answered "empty" without touching the database
    pub queries_proven_empty: AtomicU64,
    /// Queries outside the known interval
    pub queries_out_of_bounds: AtomicU64,
}

impl FilterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_refresh_started(&self) {
        self.refreshes_attempted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a refresh that installed a new snapshot
    pub fn record_refresh_updated(&self, built: usize, trimmed: usize) {
        self.refreshes_updated.fetch_add(1, Ordering::Relaxed);
        self.filters_built.fetch_add(built as u64, Ordering::Relaxed);
        self.filters_trimmed.fetch_add(trimmed as u64, Ordering::Relaxed);
    }

    pub fn record_refresh_failed(&self) {
        self.refreshes_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_query(&self, answer: QueryAnswer) {
        self.queries.fetch_add(1, Ordering::Relaxed);
        match answer {
            QueryAnswer::OutOfBounds => {
                self.queries_out_of_bounds.fetch_add(1, Ordering::Relaxed);
            }
            QueryAnswer::ProvenEmpty => {
                self.queries_proven_empty.fetch_add(1, Ordering::Relaxed);
            }
            QueryAnswer::MayContain => {}
        }
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            refreshes_attempted: self.refreshes_attempted.load(Ordering::Relaxed),
            refreshes_updated: self.refreshes_updated.load(Ordering::Relaxed),
            refreshes_failed: self.refreshes_failed.load(Ordering::Relaxed),
            filters_built: self.filters_built.load(Ordering::Relaxed),
            filters_trimmed: self.filters_trimmed.load(Ordering::Relaxed),
            queries: self.queries.load(Ordering::Relaxed),
            queries_proven_empty: self.queries_proven_empty.load(Ordering::Relaxed),
            queries_out_of_bounds: self.queries_out_of_bounds.load(Ordering::Relaxed),
        }
    }

    /// Share of queries that skipped the database
    pub fn skip_rate(&self) -> f64 {
        let total = self.queries.load(Ordering::Relaxed);
        let skipped = self.queries_proven_empty.load(Ordering::Relaxed);
        if total > 0 {
            skipped as f64 / total as f64
        } else {
            0.0
        }
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub refreshes_attempted: u64,
    pub refreshes_updated: u64,
    pub refreshes_failed: u64,
    pub filters_built: u64,
    pub filters_trimmed: u64,
    pub queries: u64,
    pub queries_proven_empty: u64,
    pub queries_out_of_bounds: u64,
}
