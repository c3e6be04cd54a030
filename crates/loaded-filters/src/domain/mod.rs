//! Domain Layer - Pure business logic
//!
//! This layer contains:
//! - Core Bloom filter implementation, hash functions and sizing
//! - Load metadata entities
//! - `_lastUpdated` date ranges
//! - The per-file filter value type
//! - The filter builder functions
//!
//! RULES:
//! - No I/O operations
//! - No async code
//! - No locks

pub mod bloom_filter;
pub mod date_range;
pub mod entities;
pub mod filter_builder;
pub mod hash_functions;
pub mod loaded_file_filter;
pub mod sizing;

pub use bloom_filter::BloomFilter;
pub use date_range::{BoundSide, ComparisonPrefix, DateBound, DateRange};
pub use entities::{
    LoadedBatch, LoadedBatchId, LoadedFile, LoadedFileId, LoadedTuple, Timestamp,
    BENEFICIARY_ID_WIDTH, BENEFICIARY_SEPARATOR,
};
pub use filter_builder::{
    build_filter, build_filters, estimate_expected_count, expected_count, merge_filters,
    trim_filters, update_filters, FilterBuilder, MIN_EXPECTED_ELEMENTS,
};
pub use loaded_file_filter::{LoadedFileFilter, LOADED_FILTER_FPR};
pub use sizing::FilterSizing;
