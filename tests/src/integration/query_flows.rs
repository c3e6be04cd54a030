//! # Query Flows
//!
//! `_lastUpdated` request parameters parsed into a `DateRange` and answered
//! by a refreshed manager.
//!
//! ## Flows Tested:
//!
//! 1. **Parameter parsing**: prefixes map to the right bound, bad ones are
//!    client errors
//! 2. **Soundness**: across random loads and windows, a beneficiary with
//!    rows in the window is never reported as empty

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use loaded_filters::{
        DateRange, FilterError, InMemoryBatchStore, LoadedBatch, LoadedFile, LoadedFileId,
        LoadedFilterApi, LoadedFilterManager, Timestamp,
    };

    use crate::init_test_tracing;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn at(minutes: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
    }

    /// Two files an hour apart: file 1 touches 100..110, file 2 touches 200..210
    async fn two_file_manager() -> Arc<LoadedFilterManager<InMemoryBatchStore>> {
        let store = Arc::new(InMemoryBatchStore::new());
        for (file_id, start) in [(1u64, 0i64), (2, 60)] {
            store.add_file(LoadedFile::new(file_id, "BENEFICIARY", at(start)));
            let ids: Vec<String> = (0..10).map(|i| (file_id * 100 + i).to_string()).collect();
            store.add_batch(LoadedBatch::new(file_id, file_id, &ids, at(start + 5)));
        }

        let manager = Arc::new(LoadedFilterManager::new(store));
        manager.init().await;
        manager.refresh().await;
        manager
    }

    // =============================================================================
    // INTEGRATION TESTS: PARAMETER PARSING
    // =============================================================================

    #[tokio::test]
    async fn test_request_parameters_drive_answers() {
        init_test_tracing();
        let manager = two_file_manager().await;

        // Window covering only file 2
        let range = DateRange::from_params(["gt2024-01-01T00:30:00Z"]).unwrap();
        assert!(manager.is_result_set_empty("105", &range).unwrap());
        assert!(!manager.is_result_set_empty("205", &range).unwrap());

        // Window covering only file 1
        let range =
            DateRange::from_params(["ge2024-01-01T00:05:00Z", "lt2024-01-01T01:00:00Z"]).unwrap();
        assert!(!manager.is_result_set_empty("105", &range).unwrap());
        assert!(manager.is_result_set_empty("205", &range).unwrap());

        // Exact instant at file 2's last batch
        let range = DateRange::from_params(["2024-01-01T01:05:00Z"]).unwrap();
        assert!(!manager.is_result_set_empty("205", &range).unwrap());
    }

    #[tokio::test]
    async fn test_open_and_early_windows_fall_back_to_database() {
        let manager = two_file_manager().await;

        let open = DateRange::from_params(["le2024-01-01T02:00:00Z"]).unwrap();
        assert!(!manager.is_result_set_empty("999", &open).unwrap());

        let early = DateRange::from_params(["ge2023-12-31T00:00:00Z"]).unwrap();
        assert!(!manager.is_result_set_empty("999", &early).unwrap());

        let metrics = manager.metrics().snapshot();
        assert_eq!(metrics.queries_out_of_bounds, 2);
        assert_eq!(metrics.queries_proven_empty, 0);
    }

    #[test]
    fn test_unsupported_prefixes_are_client_errors() {
        for params in [
            vec!["sa2024-01-01T00:00:00Z"],
            vec!["ne2024-01-01T00:00:00Z"],
            vec!["ap2024-01-01T00:00:00Z"],
            vec!["ge2024-01-01T00:00:00Z", "gt2024-01-02T00:00:00Z"],
            vec!["xx2024-01-01T00:00:00Z"],
            vec!["ge-not-a-date"],
        ] {
            let err = DateRange::from_params(&params).unwrap_err();
            assert!(err.is_client_error(), "{:?} gave {}", params, err);
        }
    }

    #[tokio::test]
    async fn test_empty_beneficiary_is_rejected() {
        let manager = two_file_manager().await;
        let range = DateRange::starting_at(at(5));

        assert!(matches!(
            manager.is_result_set_empty("", &range),
            Err(FilterError::InvalidBeneficiaryId)
        ));
    }

    // =============================================================================
    // INTEGRATION TESTS: SOUNDNESS
    // =============================================================================

    /// Interval and members of one generated file
    struct GeneratedFile {
        first: Timestamp,
        last: Timestamp,
        members: Vec<String>,
    }

    #[tokio::test]
    async fn test_never_reports_empty_when_rows_exist() {
        init_test_tracing();
        let mut rng = StdRng::seed_from_u64(0xbfd);
        let store = Arc::new(InMemoryBatchStore::new());
        let mut truth: HashMap<LoadedFileId, GeneratedFile> = HashMap::new();

        // Overlapping files of varying length, some running long
        for file_id in 1..=30u64 {
            let start = rng.gen_range(0..1_000);
            store.add_file(LoadedFile::new(file_id, "BENEFICIARY", at(start)));

            let mut members = Vec::new();
            let mut last = at(start);
            for batch in 0..rng.gen_range(1..4u64) {
                let created = at(start + rng.gen_range(0..300));
                let ids: Vec<String> = (0..rng.gen_range(1..20))
                    .map(|_| rng.gen_range(0..500).to_string())
                    .collect();
                store.add_batch(LoadedBatch::new(file_id * 10 + batch, file_id, &ids, created));
                members.extend(ids);
                last = last.max(created);
            }
            truth.insert(
                file_id,
                GeneratedFile {
                    first: at(start),
                    last,
                    members,
                },
            );
        }

        let manager = LoadedFilterManager::new(store);
        manager.init().await;
        manager.refresh().await;
        assert_eq!(manager.filters().len(), truth.len());

        let mut proven_empty = 0;
        for _ in 0..2_000 {
            let lower = at(rng.gen_range(0..1_400));
            let range = if rng.gen_bool(0.5) {
                DateRange::starting_at(lower)
            } else {
                DateRange::closed(lower, lower + chrono::Duration::minutes(rng.gen_range(0..200)))
            };
            let beneficiary = rng.gen_range(0..500).to_string();

            let has_rows = truth.values().any(|file| {
                range.overlaps(file.first, file.last).unwrap()
                    && file.members.contains(&beneficiary)
            });

            let empty = manager.is_result_set_empty(&beneficiary, &range).unwrap();
            if has_rows {
                assert!(!empty, "{} has rows in {:?}", beneficiary, range);
            }
            if empty {
                proven_empty += 1;
            }
        }

        // The index has to be useful as well as sound
        assert!(proven_empty > 0);
    }
}
