//! Outbound Ports (Driven Ports)
//!
//! The handful of warehouse queries the filter manager issues. Everything
//! else about the warehouse schema stays behind this trait.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::{LoadedBatch, LoadedBatchId, LoadedFileId, LoadedTuple, Timestamp};
use crate::error::DataError;

/// Loaded file and batch metadata (Driven Port)
///
/// Implementations are expected to bound every call with their own
/// connection or statement timeouts.
#[async_trait]
pub trait LoadedBatchStore: Send + Sync {
    /// Latest `created` of any batch, `None` when no batch exists
    async fn max_batch_created(&self) -> Result<Option<Timestamp>, DataError>;

    /// Earliest `created` of any batch, `None` when no batch exists
    async fn min_batch_created(&self) -> Result<Option<Timestamp>, DataError>;

    /// One tuple per file having a batch created after `after`
    ///
    /// `None` means every file. Tuples are ordered by file `created`,
    /// newest first. Files without batches are not returned.
    async fn load_tuples_created_after(
        &self,
        after: Option<Timestamp>,
    ) -> Result<Vec<LoadedTuple>, DataError>;

    /// Ids of every file record still present
    async fn currently_loaded_file_ids(&self) -> Result<HashSet<LoadedFileId>, DataError>;

    /// Number of batches recorded for one file
    async fn batch_count_for_file(&self, file_id: LoadedFileId) -> Result<usize, DataError>;

    /// One page of a file's batches, ascending by `loaded_batch_id`
    ///
    /// Returns at most `limit` batches with an id greater than `after`
    /// (`None` starts from the first batch). A page shorter than `limit`
    /// is the last one.
    async fn batches_for_file(
        &self,
        file_id: LoadedFileId,
        after: Option<LoadedBatchId>,
        limit: usize,
    ) -> Result<Vec<LoadedBatch>, DataError>;
}
