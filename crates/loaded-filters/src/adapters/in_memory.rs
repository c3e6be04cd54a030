//! In-memory batch store
//!
//! Holds files and batches in process memory and answers the same queries a
//! warehouse would. Store calls can be made to fail on demand, which is how
//! refresh resilience is exercised.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::{LoadedBatch, LoadedBatchId, LoadedFile, LoadedFileId, LoadedTuple, Timestamp};
use crate::error::DataError;
use crate::ports::LoadedBatchStore;

#[derive(Default)]
struct StoreState {
    files: BTreeMap<LoadedFileId, LoadedFile>,
    batches: Vec<LoadedBatch>,
}

/// In-memory `LoadedBatchStore`
#[derive(Default)]
pub struct InMemoryBatchStore {
    state: RwLock<StoreState>,
    /// Store calls still to fail before answering normally
    pending_failures: AtomicUsize,
    /// Total store calls answered or failed
    calls: AtomicUsize,
}

impl InMemoryBatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file. Replaces any file with the same id.
    pub fn add_file(&self, file: LoadedFile) {
        self.state.write().files.insert(file.loaded_file_id, file);
    }

    /// Record a batch
    ///
    /// The batch is stored even if its file is unknown; like the warehouse
    /// join, such batches are invisible to `load_tuples_created_after`.
    pub fn add_batch(&self, batch: LoadedBatch) {
        self.state.write().batches.push(batch);
    }

    /// Delete a file and all of its batches, returning whether it existed
    pub fn purge_file(&self, file_id: LoadedFileId) -> bool {
        let mut state = self.state.write();
        state.batches.retain(|b| b.loaded_file_id != file_id);
        state.files.remove(&file_id).is_some()
    }

    /// Make the next `count` store calls fail with a connection error
    pub fn fail_next(&self, count: usize) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// Number of store calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn file_count(&self) -> usize {
        self.state.read().files.len()
    }

    pub fn batch_count(&self) -> usize {
        self.state.read().batches.len()
    }

    fn begin_call(&self) -> Result<(), DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(DataError::ConnectionError(
                "injected store failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl LoadedBatchStore for InMemoryBatchStore {
    async fn max_batch_created(&self) -> Result<Option<Timestamp>, DataError> {
        self.begin_call()?;
        Ok(self.state.read().batches.iter().map(|b| b.created).max())
    }

    async fn min_batch_created(&self) -> Result<Option<Timestamp>, DataError> {
        self.begin_call()?;
        Ok(self.state.read().batches.iter().map(|b| b.created).min())
    }

    async fn load_tuples_created_after(
        &self,
        after: Option<Timestamp>,
    ) -> Result<Vec<LoadedTuple>, DataError> {
        self.begin_call()?;
        let state = self.state.read();

        let mut tuples: Vec<LoadedTuple> = state
            .files
            .values()
            .filter_map(|file| {
                state
                    .batches
                    .iter()
                    .filter(|b| b.loaded_file_id == file.loaded_file_id)
                    .filter(|b| after.map_or(true, |after| b.created > after))
                    .map(|b| b.created)
                    .max()
                    .map(|last| LoadedTuple::new(file.loaded_file_id, file.created, last))
            })
            .collect();
        tuples.sort_by(|a, b| b.first_updated.cmp(&a.first_updated));

        Ok(tuples)
    }

    async fn currently_loaded_file_ids(&self) -> Result<HashSet<LoadedFileId>, DataError> {
        self.begin_call()?;
        Ok(self.state.read().files.keys().copied().collect())
    }

    async fn batch_count_for_file(&self, file_id: LoadedFileId) -> Result<usize, DataError> {
        self.begin_call()?;
        Ok(self
            .state
            .read()
            .batches
            .iter()
            .filter(|b| b.loaded_file_id == file_id)
            .count())
    }

    async fn batches_for_file(
        &self,
        file_id: LoadedFileId,
        after: Option<LoadedBatchId>,
        limit: usize,
    ) -> Result<Vec<LoadedBatch>, DataError> {
        self.begin_call()?;
        let state = self.state.read();

        let mut page: Vec<&LoadedBatch> = state
            .batches
            .iter()
            .filter(|b| b.loaded_file_id == file_id)
            .filter(|b| after.map_or(true, |after| b.loaded_batch_id > after))
            .collect();
        page.sort_by_key(|b| b.loaded_batch_id);

        Ok(page.into_iter().take(limit).cloned().collect())
    }
}
