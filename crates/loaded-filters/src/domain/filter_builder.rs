//! Filter builder functions
//!
//! These functions hold all the logic of the filter manager and none of its
//! state. Batches are fetched through a caller-supplied closure, so nothing
//! here performs I/O or takes a lock; the manager owns both.
//!
//! `FilterBuilder` is the incremental form: it takes a file's batches one
//! page at a time, so a caller streaming from the store never holds more
//! than one page.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use super::bloom_filter::BloomFilter;
use super::entities::{LoadedBatch, LoadedFileId, LoadedTuple, Timestamp, BENEFICIARY_ID_WIDTH};
use super::loaded_file_filter::LoadedFileFilter;
use crate::error::FilterError;

/// Smallest capacity a filter is sized for
pub const MIN_EXPECTED_ELEMENTS: usize = 100;

/// Expected beneficiaries of a file with `batch_count` batches like `sample`
///
/// Assumes every batch is about as large as the sample. A low estimate
/// only raises the false positive rate; it never causes a false negative.
pub fn expected_count(sample: &LoadedBatch, batch_count: usize) -> usize {
    sample
        .payload_len()
        .div_ceil(BENEFICIARY_ID_WIDTH)
        .saturating_mul(batch_count)
        .max(MIN_EXPECTED_ELEMENTS)
}

/// Estimate how many beneficiaries a file touched from all of its batches
pub fn estimate_expected_count(batches: &[LoadedBatch]) -> usize {
    batches
        .first()
        .map_or(MIN_EXPECTED_ELEMENTS, |first| expected_count(first, batches.len()))
}

/// Filter for one loaded file under construction
#[derive(Debug)]
pub struct FilterBuilder {
    file_id: LoadedFileId,
    first_updated: Timestamp,
    last_updated: Timestamp,
    batches: usize,
    bloom: BloomFilter,
}

impl FilterBuilder {
    /// Start a filter sized for `expected_count` beneficiaries
    pub fn new(file_id: LoadedFileId, first_updated: Timestamp, expected_count: usize) -> Self {
        Self {
            file_id,
            first_updated,
            last_updated: first_updated,
            batches: 0,
            bloom: LoadedFileFilter::new_filter(expected_count),
        }
    }

    /// Insert every beneficiary of `batches`
    pub fn add_batches(&mut self, batches: &[LoadedBatch]) {
        for batch in batches {
            for beneficiary in batch.beneficiary_ids() {
                self.bloom.insert(beneficiary);
            }
            self.last_updated = self.last_updated.max(batch.created);
        }
        self.batches += batches.len();
    }

    pub fn batches_added(&self) -> usize {
        self.batches
    }

    /// Seal the filter
    ///
    /// Fails with `EmptyBatches` if no batch was added: such a filter would
    /// report every beneficiary as absent.
    pub fn finish(self) -> Result<LoadedFileFilter, FilterError> {
        if self.batches == 0 {
            return Err(FilterError::EmptyBatches {
                file_id: self.file_id,
            });
        }

        let filter = LoadedFileFilter::new(
            self.file_id,
            self.batches,
            self.first_updated,
            self.last_updated,
            self.bloom,
        )?;
        info!(
            file_id = self.file_id,
            batches = filter.batches_count(),
            bit_size = filter.bit_size(),
            cardinality = filter.approximate_element_count(),
            "Built a filter for loaded file"
        );
        Ok(filter)
    }
}

/// Build the filter for one loaded file from all of its batches
pub fn build_filter<F>(
    file_id: LoadedFileId,
    first_updated: Timestamp,
    fetch_batches: &mut F,
) -> Result<LoadedFileFilter, FilterError>
where
    F: FnMut(LoadedFileId) -> Result<Vec<LoadedBatch>, FilterError>,
{
    let batches = fetch_batches(file_id)?;
    let mut builder = FilterBuilder::new(file_id, first_updated, estimate_expected_count(&batches));
    builder.add_batches(&batches);
    builder.finish()
}

/// Build one filter per tuple, in tuple order
pub fn build_filters<F>(
    tuples: &[LoadedTuple],
    fetch_batches: &mut F,
) -> Result<Vec<LoadedFileFilter>, FilterError>
where
    F: FnMut(LoadedFileId) -> Result<Vec<LoadedBatch>, FilterError>,
{
    tuples
        .iter()
        .map(|t| build_filter(t.loaded_file_id, t.first_updated, fetch_batches))
        .collect()
}

/// Merge freshly built filters for `tuples` into `existing`
///
/// A new filter replaces any existing filter with the same file id. The
/// result is sorted descending by `first_updated`. Applying the same tuples
/// twice yields the same set of filters as applying them once.
pub fn update_filters<F>(
    existing: &[Arc<LoadedFileFilter>],
    tuples: &[LoadedTuple],
    fetch_batches: &mut F,
) -> Result<Vec<Arc<LoadedFileFilter>>, FilterError>
where
    F: FnMut(LoadedFileId) -> Result<Vec<LoadedBatch>, FilterError>,
{
    Ok(merge_filters(existing, build_filters(tuples, fetch_batches)?))
}

/// Merge already built filters into `existing`, replacing by file id
pub fn merge_filters(
    existing: &[Arc<LoadedFileFilter>],
    built: Vec<LoadedFileFilter>,
) -> Vec<Arc<LoadedFileFilter>> {
    let mut result = existing.to_vec();
    for filter in built {
        result.retain(|f| f.loaded_file_id() != filter.loaded_file_id());
        result.push(Arc::new(filter));
    }
    sort_descending(&mut result);
    result
}

/// Drop every filter whose file is no longer loaded. Never adds filters.
pub fn trim_filters(
    existing: &[Arc<LoadedFileFilter>],
    loaded_file_ids: &HashSet<LoadedFileId>,
) -> Vec<Arc<LoadedFileFilter>> {
    existing
        .iter()
        .filter(|f| loaded_file_ids.contains(&f.loaded_file_id()))
        .cloned()
        .collect()
}

fn sort_descending(filters: &mut [Arc<LoadedFileFilter>]) {
    filters.sort_by(|a, b| b.first_updated().cmp(&a.first_updated()));
}
