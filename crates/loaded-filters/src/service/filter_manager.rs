//! Loaded Filter Manager
//!
//! Owns the installed filter snapshot and keeps it in step with the batch
//! store. The logic lives in `domain::filter_builder`; this type only does
//! the I/O, the locking and the bookkeeping around it.
//!
//! ## State
//!
//! ```text
//! UNINITIALIZED --init()--> INITIALIZED --refresh()--> REFRESHED --refresh()--> ...
//! ```
//!
//! Readers clone the current `Arc<FilterSnapshot>` and release the lock
//! before scanning. A refresh does all store calls and filter building
//! without the lock and takes the write lock only to swap the pointer.
//!
//! Filters are built one file at a time from pages of at most
//! `batch_fetch_size` batches. Each page is dropped once its beneficiaries
//! are in the filter.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::DateTime;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::FilterManagerConfig;
use crate::domain::{
    expected_count, merge_filters, trim_filters, DateRange, FilterBuilder, LoadedFileFilter,
    LoadedFileId, LoadedTuple, Timestamp,
};
use crate::error::FilterError;
use crate::metrics::{FilterMetrics, QueryAnswer};
use crate::ports::{LoadedBatchStore, LoadedFilterApi};

/// Unix time of 2020-01-01T00:00:00Z
const BEFORE_LAST_UPDATED_FEATURE_SECS: i64 = 1_577_836_800;

/// Watermark used while the store has no batches
///
/// Earlier than any batch that can exist, so a later real watermark always
/// compares as newer.
pub fn before_last_updated_feature() -> Timestamp {
    DateTime::from_timestamp(BEFORE_LAST_UPDATED_FEATURE_SECS, 0).unwrap_or_default()
}

/// Result of one `refresh()` call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No batch newer than the installed watermark
    Unchanged,
    /// A new snapshot was installed
    Updated {
        /// Filters built or rebuilt
        built: usize,
        /// Filters dropped because their file was purged
        trimmed: usize,
        /// Filters in the new snapshot
        installed: usize,
    },
    /// The store or the build failed; the previous snapshot is kept
    Failed { reason: String },
}

/// Everything a query needs, replaced as a unit
#[derive(Clone, Debug, Default)]
pub struct FilterSnapshot {
    /// Descending by `first_updated`
    filters: Vec<Arc<LoadedFileFilter>>,
    /// The same filters, descending by `last_updated`
    scan_order: Vec<Arc<LoadedFileFilter>>,
    first_batch_created: Option<Timestamp>,
    last_batch_created: Option<Timestamp>,
    transaction_time: Option<Timestamp>,
}

impl FilterSnapshot {
    fn new(
        mut filters: Vec<Arc<LoadedFileFilter>>,
        first_batch_created: Timestamp,
        last_batch_created: Timestamp,
    ) -> Self {
        filters.sort_by(|a, b| b.first_updated().cmp(&a.first_updated()));
        let mut scan_order = filters.clone();
        scan_order.sort_by(|a, b| b.last_updated().cmp(&a.last_updated()));

        Self {
            filters,
            scan_order,
            first_batch_created: Some(first_batch_created),
            last_batch_created: Some(last_batch_created),
            transaction_time: Some(last_batch_created),
        }
    }

    fn with_transaction_time(&self, transaction_time: Timestamp) -> Self {
        Self {
            transaction_time: Some(transaction_time),
            ..self.clone()
        }
    }

    /// Filters, newest `first_updated` first
    pub fn filters(&self) -> &[Arc<LoadedFileFilter>] {
        &self.filters
    }

    pub fn first_batch_created(&self) -> Option<Timestamp> {
        self.first_batch_created
    }

    pub fn last_batch_created(&self) -> Option<Timestamp> {
        self.last_batch_created
    }

    pub fn transaction_time(&self) -> Option<Timestamp> {
        self.transaction_time
    }

    /// Whether `range` starts at or after the oldest batch still loaded
    ///
    /// A range without a lower bound, or a snapshot without filters, is out
    /// of bounds.
    pub fn is_in_bounds(&self, range: &DateRange) -> bool {
        if self.filters.is_empty() {
            return false;
        }
        match (range.lower_instant(), self.first_batch_created) {
            (Some(lower), Some(first)) => lower >= first,
            _ => false,
        }
    }

    /// Answer a result-set query against this snapshot
    pub fn query(&self, beneficiary_id: &str, range: &DateRange) -> Result<QueryAnswer, FilterError> {
        if beneficiary_id.is_empty() {
            return Err(FilterError::InvalidBeneficiaryId);
        }
        range.validate()?;

        if !self.is_in_bounds(range) {
            return Ok(QueryAnswer::OutOfBounds);
        }

        let lower = range.lower_instant();
        for filter in &self.scan_order {
            if filter.matches_date_range(range)? {
                if filter.might_contain(beneficiary_id) {
                    return Ok(QueryAnswer::MayContain);
                }
            } else if lower.is_some_and(|lower| filter.last_updated() < lower) {
                // Every remaining filter ended even earlier
                return Ok(QueryAnswer::ProvenEmpty);
            }
        }

        Ok(QueryAnswer::ProvenEmpty)
    }
}

/// Keeps the loaded-file filters in step with the batch store
///
/// Share it as `Arc<LoadedFilterManager<S>>` between the refresh task and
/// the request handlers.
pub struct LoadedFilterManager<S: LoadedBatchStore> {
    store: Arc<S>,
    snapshot: RwLock<Arc<FilterSnapshot>>,
    /// Serializes refreshes and `init`
    refresh_lock: Mutex<()>,
    batch_fetch_size: usize,
    metrics: FilterMetrics,
}

impl<S: LoadedBatchStore> LoadedFilterManager<S> {
    /// Create an uninitialized manager with the default configuration
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, &FilterManagerConfig::default())
    }

    /// Create an uninitialized manager
    pub fn with_config(store: Arc<S>, config: &FilterManagerConfig) -> Self {
        Self {
            store,
            snapshot: RwLock::new(Arc::new(FilterSnapshot::default())),
            refresh_lock: Mutex::new(()),
            batch_fetch_size: config.batch_fetch_size.max(1),
            metrics: FilterMetrics::new(),
        }
    }

    /// Seed the transaction time from the newest batch
    ///
    /// Never fails: if the store is empty or unreachable the fallback
    /// watermark is used and the next refresh tries again. Once a refresh
    /// has installed watermarks this does nothing.
    pub async fn init(&self) {
        let _guard = self.refresh_lock.lock().await;
        if self.snapshot().last_batch_created.is_some() {
            debug!("Loaded file filters already refreshed, init skipped");
            return;
        }

        let transaction_time = match self.store.max_batch_created().await {
            Ok(Some(created)) => created,
            Ok(None) => before_last_updated_feature(),
            Err(e) => {
                warn!(
                    error = %e,
                    "Unable to query for transaction time on init, will be set on refresh"
                );
                before_last_updated_feature()
            }
        };

        let mut guard = self.snapshot.write();
        *guard = Arc::new(guard.with_transaction_time(transaction_time));
    }

    /// Bring the filters up to date with the store
    ///
    /// Errors are logged and reported in the outcome; the installed snapshot
    /// is left untouched by a failed refresh.
    pub async fn refresh(&self) -> RefreshOutcome {
        let _guard = self.refresh_lock.lock().await;
        self.metrics.record_refresh_started();

        match self.try_refresh().await {
            Ok(outcome) => {
                if let RefreshOutcome::Updated { built, trimmed, .. } = &outcome {
                    self.metrics.record_refresh_updated(*built, *trimmed);
                } else {
                    debug!("No new batches, loaded file filters unchanged");
                }
                outcome
            }
            Err(e) => {
                error!(error = %e, "Error found refreshing loaded file filters");
                self.metrics.record_refresh_failed();
                RefreshOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn try_refresh(&self) -> Result<RefreshOutcome, FilterError> {
        let fallback = before_last_updated_feature();
        let current = self.snapshot();

        // Keep the transaction time meaningful while a long first build runs
        if current.transaction_time.map_or(true, |t| t == fallback) {
            let transaction_time = self.store.max_batch_created().await?.unwrap_or(fallback);
            let mut guard = self.snapshot.write();
            *guard = Arc::new(guard.with_transaction_time(transaction_time));
        }

        let current_last = self.store.max_batch_created().await?.unwrap_or(fallback);
        if let Some(last) = current.last_batch_created {
            if last >= current_last {
                return Ok(RefreshOutcome::Unchanged);
            }
        }

        info!(
            from = ?current.last_batch_created,
            to = %current_last,
            "Refreshing loaded file filters"
        );

        let tuples = self
            .store
            .load_tuples_created_after(current.last_batch_created)
            .await?;
        let mut built = Vec::with_capacity(tuples.len());
        for tuple in &tuples {
            built.push(self.build_file_filter(tuple).await?);
        }

        let current_first = self.store.min_batch_created().await?.unwrap_or(fallback);
        let loaded_file_ids = match current.first_batch_created {
            Some(first) if first >= current_first => None,
            _ => {
                info!(before = %current_first, "Trimming loaded file filters");
                Some(self.store.currently_loaded_file_ids().await?)
            }
        };

        let built_count = built.len();
        let (filters, trimmed) = rebuild(&current.filters, built, loaded_file_ids.as_ref());

        info!(
            first_batch_created = %current_first,
            last_batch_created = %current_last,
            filters = filters.len(),
            "Updating loaded file filter timestamps"
        );

        let installed = filters.len();
        self.set(filters, current_first, current_last);

        Ok(RefreshOutcome::Updated {
            built: built_count,
            trimmed,
            installed,
        })
    }

    /// Stream one file's batches into a new filter, a page at a time
    async fn build_file_filter(&self, tuple: &LoadedTuple) -> Result<LoadedFileFilter, FilterError> {
        let file_id = tuple.loaded_file_id;
        let limit = self.batch_fetch_size;

        let batch_count = self.store.batch_count_for_file(file_id).await?;
        let mut page = self.store.batches_for_file(file_id, None, limit).await?;
        let Some(sample) = page.first() else {
            return Err(FilterError::EmptyBatches { file_id });
        };
        let mut builder =
            FilterBuilder::new(file_id, tuple.first_updated, expected_count(sample, batch_count));

        loop {
            let after = page.last().map(|b| b.loaded_batch_id);
            let last_page = page.len() < limit;

            builder = tokio::task::spawn_blocking(move || {
                builder.add_batches(&page);
                builder
            })
            .await
            .map_err(|e| FilterError::TaskFailed(e.to_string()))?;

            if last_page {
                break;
            }
            page = self.store.batches_for_file(file_id, after, limit).await?;
            if page.is_empty() {
                break;
            }
        }

        debug!(file_id, batches = builder.batches_added(), "Fetched batches for loaded file");
        builder.finish()
    }

    /// Install a state directly
    ///
    /// The transaction time becomes `last_batch_created`.
    pub fn set(
        &self,
        filters: Vec<Arc<LoadedFileFilter>>,
        first_batch_created: Timestamp,
        last_batch_created: Timestamp,
    ) {
        let snapshot = FilterSnapshot::new(filters, first_batch_created, last_batch_created);
        *self.snapshot.write() = Arc::new(snapshot);
    }

    /// The installed snapshot
    pub fn snapshot(&self) -> Arc<FilterSnapshot> {
        self.snapshot.read().clone()
    }

    pub fn metrics(&self) -> &FilterMetrics {
        &self.metrics
    }

    /// Oldest batch creation time covered by the filters
    ///
    /// # Panics
    /// If no refresh has completed and `set` was never called.
    pub fn first_batch_created(&self) -> Timestamp {
        match self.snapshot().first_batch_created {
            Some(created) => created,
            None => panic!("LoadedFilterManager has not been refreshed"),
        }
    }

    /// Newest batch creation time covered by the filters
    ///
    /// # Panics
    /// If no refresh has completed and `set` was never called.
    pub fn last_batch_created(&self) -> Timestamp {
        match self.snapshot().last_batch_created {
            Some(created) => created,
            None => panic!("LoadedFilterManager has not been refreshed"),
        }
    }
}

impl<S: LoadedBatchStore> LoadedFilterApi for LoadedFilterManager<S> {
    fn is_result_set_empty(
        &self,
        beneficiary_id: &str,
        range: &DateRange,
    ) -> Result<bool, FilterError> {
        let answer = self.snapshot().query(beneficiary_id, range)?;
        self.metrics.record_query(answer);
        Ok(answer == QueryAnswer::ProvenEmpty)
    }

    fn is_in_bounds(&self, range: &DateRange) -> bool {
        self.snapshot().is_in_bounds(range)
    }

    /// # Panics
    /// If called before `init`, a refresh or `set`.
    fn transaction_time(&self) -> Timestamp {
        match self.snapshot().transaction_time {
            Some(time) => time,
            None => panic!("LoadedFilterManager has not been initialized"),
        }
    }

    fn filters(&self) -> Vec<Arc<LoadedFileFilter>> {
        self.snapshot().filters.clone()
    }
}

impl<S: LoadedBatchStore> fmt::Display for LoadedFilterManager<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot.read().clone();
        write!(
            f,
            "LoadedFilterManager [filters.size={}, transaction_time={:?}, first_batch_created={:?}, last_batch_created={:?}]",
            snapshot.filters.len(),
            snapshot.transaction_time,
            snapshot.first_batch_created,
            snapshot.last_batch_created,
        )
    }
}

/// Merge the built filters and trim. Returns the new filters and how many
/// were trimmed.
fn rebuild(
    existing: &[Arc<LoadedFileFilter>],
    built: Vec<LoadedFileFilter>,
    loaded_file_ids: Option<&HashSet<LoadedFileId>>,
) -> (Vec<Arc<LoadedFileFilter>>, usize) {
    let updated = merge_filters(existing, built);

    match loaded_file_ids {
        Some(ids) => {
            let trimmed = trim_filters(&updated, ids);
            let removed = updated.len() - trimmed.len();
            (trimmed, removed)
        }
        None => (updated, 0),
    }
}
