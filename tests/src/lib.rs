//! # Loaded Filters Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks (build, query)
//! └── src/
//!     └── integration/  # Manager + store + scheduler flows
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p loaded-filters-tests
//!
//! # By category
//! cargo test -p loaded-filters-tests integration::refresh_flows
//! cargo test -p loaded-filters-tests integration::query_flows
//!
//! # Benchmarks
//! cargo bench -p loaded-filters-tests
//! ```
//!
//! Set `RUST_LOG=loaded_filters=debug` to see the manager's logs.

#![allow(dead_code)]

pub mod integration;

use tracing_subscriber::EnvFilter;

/// Install a test-writer subscriber once per process
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
