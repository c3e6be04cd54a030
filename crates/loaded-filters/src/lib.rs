//! # Loaded Filters
//!
//! Per-load Bloom filters that let the claims read path skip a database
//! query when a beneficiary provably has no rows updated in a
//! `_lastUpdated` window.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure business logic, no I/O
//!   - `BloomFilter`: Core probabilistic data structure
//!   - `DateRange`: `_lastUpdated` bounds and overlap rules
//!   - `LoadedFileFilter`: Immutable filter over one loaded file
//!   - `filter_builder`: Build, merge and trim filter collections
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `LoadedFilterApi`: Driving port (inbound API)
//!   - `LoadedBatchStore`: Driven port (warehouse metadata queries)
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `LoadedFilterManager`: Implements `LoadedFilterApi`
//!   - `spawn_refresh_task`: Fixed-delay background refresh
//!
//! - **Adapters Layer** (`adapters/`): Store implementations
//!   - `InMemoryBatchStore`: Process-local store
//!
//! ## Invariants
//!
//! - **No false negatives**: a beneficiary inserted into a filter is always
//!   reported as possibly present.
//! - **Sound emptiness**: `is_result_set_empty` only answers `true` when no
//!   filter overlapping the range can contain the beneficiary. `false` is
//!   always a safe answer.
//! - **Atomic snapshot**: filters and watermarks are replaced together;
//!   readers never see a mix of two refreshes.
//! - **Bounded refresh memory**: a refresh holds at most one page of one
//!   file's batches at a time.
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use loaded_filters::{
//!     spawn_refresh_task, DateRange, FilterManagerConfig, InMemoryBatchStore,
//!     LoadedFilterApi, LoadedFilterManager,
//! };
//!
//! let config = FilterManagerConfig::from_env();
//! let store = Arc::new(InMemoryBatchStore::new());
//! let manager = Arc::new(LoadedFilterManager::with_config(store, &config));
//! manager.init().await;
//! let handle = spawn_refresh_task(manager.clone(), &config);
//!
//! let range = DateRange::from_params(["ge2024-01-01T00:00:00Z"])?;
//! if manager.is_result_set_empty("567834", &range)? {
//!     // Skip the claims query
//! }
//!
//! handle.shutdown().await?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports for convenience
pub use adapters::InMemoryBatchStore;
pub use config::{FilterManagerConfig, FilterManagerConfigBuilder};
pub use domain::{
    BloomFilter, BoundSide, ComparisonPrefix, DateBound, DateRange, FilterBuilder, LoadedBatch,
    LoadedBatchId, LoadedFile, LoadedFileFilter, LoadedFileId, LoadedTuple, Timestamp,
};
pub use error::{DataError, FilterError};
pub use metrics::{FilterMetrics, MetricsSnapshot, QueryAnswer};
pub use ports::{LoadedBatchStore, LoadedFilterApi};
pub use service::{
    before_last_updated_feature, spawn_refresh_task, FilterSnapshot, LoadedFilterManager,
    RefreshHandle, RefreshOutcome,
};
