//! Error types for the loaded-file filter subsystem

use thiserror::Error;

use crate::domain::{BoundSide, ComparisonPrefix, LoadedFileId};

/// Errors that can occur while building or querying loaded-file filters
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Batches cannot be empty for a filter (loaded file {file_id})")]
    EmptyBatches { file_id: LoadedFileId },

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid {side} bound prefix in _lastUpdated: {prefix}")]
    InvalidBound {
        side: BoundSide,
        prefix: ComparisonPrefix,
    },

    #[error("Invalid date parameter: {0}")]
    InvalidDateParam(String),

    #[error("Beneficiary id cannot be empty")]
    InvalidBeneficiaryId,

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Data provider error: {0}")]
    DataError(#[from] DataError),

    #[error("Filter build task failed: {0}")]
    TaskFailed(String),
}

impl FilterError {
    /// Whether the error was caused by caller input rather than by the
    /// manager or its store.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FilterError::InvalidBound { .. }
                | FilterError::InvalidDateParam(_)
                | FilterError::InvalidBeneficiaryId
        )
    }
}

/// Errors from the batch store
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}
