//! Inbound Ports (Driving Ports)
//!
//! What the claims read path calls before deciding to hit the database.

use std::sync::Arc;

use crate::domain::{DateRange, LoadedFileFilter, Timestamp};
use crate::error::FilterError;

/// Primary loaded-filter API (Driving Port)
///
/// All methods are synchronous and read whichever snapshot is installed;
/// none of them wait for a refresh.
pub trait LoadedFilterApi: Send + Sync {
    /// Whether the beneficiary provably has no rows updated in `range`
    ///
    /// `Ok(false)` is always a safe answer. `Ok(true)` is only returned when
    /// every filter overlapping `range` excludes the beneficiary.
    ///
    /// # Errors
    /// - `InvalidBeneficiaryId` if `beneficiary_id` is empty
    /// - `InvalidBound` if `range` uses a prefix the filters cannot evaluate
    fn is_result_set_empty(
        &self,
        beneficiary_id: &str,
        range: &DateRange,
    ) -> Result<bool, FilterError>;

    /// Whether `range` lies inside the interval the filters cover
    ///
    /// A range without a lower bound is never in bounds.
    fn is_in_bounds(&self, range: &DateRange) -> bool;

    /// Watermark up to which the filters are known to be accurate
    fn transaction_time(&self) -> Timestamp;

    /// Installed filters, newest first
    fn filters(&self) -> Vec<Arc<LoadedFileFilter>>;
}
