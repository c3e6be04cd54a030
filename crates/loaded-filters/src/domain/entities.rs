//! Load metadata entities shared between the store and the filter builders

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point in time used for every load watermark
pub type Timestamp = DateTime<Utc>;

/// Identifier of one ingestion file
pub type LoadedFileId = u64;

/// Identifier of one batch within an ingestion file
pub type LoadedBatchId = u64;

/// Serialized width of one beneficiary id in a batch payload, separator included
pub const BENEFICIARY_ID_WIDTH: usize = 16;

/// Separator between ids in a batch payload
pub const BENEFICIARY_SEPARATOR: char = ',';

/// Summary of one loaded file: `(loaded_file_id, created, max(batch.created))`
///
/// Fetched before deciding which filters need a rebuild.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedTuple {
    pub loaded_file_id: LoadedFileId,
    pub first_updated: Timestamp,
    pub last_updated: Timestamp,
}

impl LoadedTuple {
    pub fn new(
        loaded_file_id: LoadedFileId,
        first_updated: Timestamp,
        last_updated: Timestamp,
    ) -> Self {
        Self {
            loaded_file_id,
            first_updated,
            last_updated,
        }
    }
}

/// One ingestion file as recorded by the warehouse
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedFile {
    pub loaded_file_id: LoadedFileId,
    /// RIF record type of the file, e.g. `BENEFICIARY`
    pub record_type: String,
    pub created: Timestamp,
}

impl LoadedFile {
    pub fn new(loaded_file_id: LoadedFileId, record_type: impl Into<String>, created: Timestamp) -> Self {
        Self {
            loaded_file_id,
            record_type: record_type.into(),
            created,
        }
    }
}

/// One chunk of an ingestion file and the beneficiaries it touched
///
/// Beneficiary ids are kept in the comma-separated form the warehouse stores
/// them in; `beneficiary_ids()` splits them on demand.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedBatch {
    pub loaded_batch_id: LoadedBatchId,
    pub loaded_file_id: LoadedFileId,
    beneficiaries: String,
    pub created: Timestamp,
}

impl LoadedBatch {
    /// Create a batch from a list of beneficiary ids
    pub fn new<I>(
        loaded_batch_id: LoadedBatchId,
        loaded_file_id: LoadedFileId,
        beneficiaries: I,
        created: Timestamp,
    ) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut joined = String::new();
        for (i, id) in beneficiaries.into_iter().enumerate() {
            if i > 0 {
                joined.push(BENEFICIARY_SEPARATOR);
            }
            joined.push_str(id.as_ref());
        }
        Self::from_payload(loaded_batch_id, loaded_file_id, joined, created)
    }

    /// Create a batch from an already-serialized payload
    pub fn from_payload(
        loaded_batch_id: LoadedBatchId,
        loaded_file_id: LoadedFileId,
        beneficiaries: String,
        created: Timestamp,
    ) -> Self {
        Self {
            loaded_batch_id,
            loaded_file_id,
            beneficiaries,
            created,
        }
    }

    /// Iterate the beneficiary ids in this batch
    pub fn beneficiary_ids(&self) -> impl Iterator<Item = &str> {
        self.beneficiaries
            .split(BENEFICIARY_SEPARATOR)
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Serialized payload
    pub fn payload(&self) -> &str {
        &self.beneficiaries
    }

    /// Length in bytes of the serialized payload
    pub fn payload_len(&self) -> usize {
        self.beneficiaries.len()
    }
}
