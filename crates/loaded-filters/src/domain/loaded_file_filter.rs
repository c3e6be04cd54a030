//! Per-file membership filter
//!
//! A `LoadedFileFilter` pairs the activity window of one loaded file with a
//! Bloom filter over every beneficiary id its batches touched. Filters are
//! immutable once built; a file with new batches gets a new filter.

use super::bloom_filter::BloomFilter;
use super::date_range::DateRange;
use super::entities::{LoadedFileId, Timestamp};
use crate::error::FilterError;

/// Target false positive rate of every loaded-file filter
pub const LOADED_FILTER_FPR: f64 = 0.01;

/// Bloom filter over the beneficiaries of one loaded file
#[derive(Clone, Debug)]
pub struct LoadedFileFilter {
    loaded_file_id: LoadedFileId,
    batches_count: usize,
    first_updated: Timestamp,
    last_updated: Timestamp,
    membership: BloomFilter,
}

impl LoadedFileFilter {
    /// Create a filter, checking `batches_count >= 1` and `last_updated >= first_updated`
    pub fn new(
        loaded_file_id: LoadedFileId,
        batches_count: usize,
        first_updated: Timestamp,
        last_updated: Timestamp,
        membership: BloomFilter,
    ) -> Result<Self, FilterError> {
        if batches_count == 0 {
            return Err(FilterError::InvalidFilter(format!(
                "loaded file {} has a zero batch count",
                loaded_file_id
            )));
        }
        if last_updated < first_updated {
            return Err(FilterError::InvalidFilter(format!(
                "loaded file {} last updated {} is before first updated {}",
                loaded_file_id, last_updated, first_updated
            )));
        }

        Ok(Self {
            loaded_file_id,
            batches_count,
            first_updated,
            last_updated,
            membership,
        })
    }

    /// Allocate an empty Bloom filter sized for `expected_count` at 1% FPR
    pub fn new_filter(expected_count: usize) -> BloomFilter {
        BloomFilter::for_capacity(expected_count, LOADED_FILTER_FPR)
    }

    /// Whether `[first_updated, last_updated]` overlaps `range`
    ///
    /// Fails with `InvalidBound` if either bound uses a prefix that makes no
    /// sense on its side.
    pub fn matches_date_range(&self, range: &DateRange) -> Result<bool, FilterError> {
        range.overlaps(self.first_updated, self.last_updated)
    }

    /// Whether the beneficiary might have been touched by this file
    ///
    /// Never a false negative.
    pub fn might_contain(&self, beneficiary_id: &str) -> bool {
        self.membership.might_contain(beneficiary_id)
    }

    pub fn loaded_file_id(&self) -> LoadedFileId {
        self.loaded_file_id
    }

    pub fn batches_count(&self) -> usize {
        self.batches_count
    }

    pub fn first_updated(&self) -> Timestamp {
        self.first_updated
    }

    pub fn last_updated(&self) -> Timestamp {
        self.last_updated
    }

    /// Size of the underlying bit array
    pub fn bit_size(&self) -> usize {
        self.membership.sizing().bits
    }

    /// Estimated number of distinct beneficiaries in the filter
    pub fn approximate_element_count(&self) -> usize {
        self.membership.approximate_element_count()
    }
}
