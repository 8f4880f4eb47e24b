//! Search across several record fields with one combined ranking.
//!
//! The archive API matches a query against one field per request. To search
//! "title or author", one request per field is issued and the results are
//! concatenated in field order, then stably sorted by rating, highest first.
//! A record matching in two fields appears twice.

use futures_util::future::join_all;
use tracing::{debug, instrument};

use crate::api::{ApiError, MetadataSource, Record, SearchField, SearchRequest, SortDirection, SortKey};

/// A search field whose request failed.
#[derive(Debug)]
pub struct FieldFailure {
    /// The field that was searched.
    pub field: SearchField,
    /// Why it failed.
    pub error: ApiError,
}

/// Combined result of a multi-field search.
#[derive(Debug, Default)]
pub struct AggregatedSearch {
    /// Records from every successful field, ranked by rating.
    pub records: Vec<Record>,
    /// Fields that contributed nothing because their request failed.
    pub failures: Vec<FieldFailure>,
}

impl AggregatedSearch {
    /// True when every field failed (and at least one was searched).
    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.records.is_empty() && !self.failures.is_empty()
    }
}

/// Searches `query` in each of `fields` and merges the results.
///
/// Requests run concurrently; results are still concatenated in the order of
/// `fields`, keeping each field's own order, before a stable sort by rating
/// descending. Records with equal ratings therefore keep their concatenated
/// order. A failed field is recorded in [`AggregatedSearch::failures`] and
/// contributes no records. No de-duplication is done.
#[instrument(skip(source), fields(query = %query))]
pub async fn search_across_fields(
    source: &dyn MetadataSource,
    query: &str,
    fields: &[SearchField],
    sort: Option<SortKey>,
    direction: Option<SortDirection>,
) -> AggregatedSearch {
    let requests: Vec<SearchRequest> = fields
        .iter()
        .map(|field| SearchRequest::new(query).field(*field).sorted(sort, direction))
        .collect();

    let outcomes = join_all(requests.iter().map(|request| source.search(request))).await;

    let mut aggregated = AggregatedSearch::default();
    for (field, outcome) in fields.iter().copied().zip(outcomes) {
        match outcome {
            Ok(records) => {
                debug!(%field, count = records.len(), "field search finished");
                aggregated.records.extend(records);
            }
            Err(error) => {
                debug!(%field, error = %error, "field search failed");
                aggregated.failures.push(FieldFailure { field, error });
            }
        }
    }

    rank_by_rating(&mut aggregated.records);
    aggregated
}

/// Stable sort, highest rating first. Unrated (`NaN`) records sort last.
pub fn rank_by_rating(records: &mut [Record]) {
    records.sort_by(|a, b| rank_key(b).total_cmp(&rank_key(a)));
}

fn rank_key(record: &Record) -> f32 {
    if record.rating.is_nan() {
        f32::NEG_INFINITY
    } else {
        record.rating
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::api::FileLookup;

    /// Canned per-field answers; unknown fields fail with a remote error.
    #[derive(Default)]
    struct FieldSource {
        answers: HashMap<SearchField, Vec<Record>>,
        calls: Mutex<Vec<SearchRequest>>,
    }

    impl FieldSource {
        fn with(mut self, field: SearchField, records: Vec<Record>) -> Self {
            self.answers.insert(field, records);
            self
        }
    }

    #[async_trait]
    impl MetadataSource for FieldSource {
        async fn fetch(&self, _lookup: &FileLookup) -> Result<Record, ApiError> {
            Err(ApiError::remote("unused", "unused"))
        }

        async fn search(&self, request: &SearchRequest) -> Result<Vec<Record>, ApiError> {
            crate::api::validate_query(&request.query)?;
            self.calls.lock().unwrap().push(request.clone());
            request
                .field
                .and_then(|field| self.answers.get(&field).cloned())
                .ok_or_else(|| ApiError::remote("Search Error", "field unavailable"))
        }

        async fn latest_files(&self, _limit: u32, _start_id: u64) -> Result<Vec<Record>, ApiError> {
            Ok(Vec::new())
        }
    }

    fn rec(id: u64, rating: f32) -> Record {
        Record {
            id,
            title: format!("file {id}"),
            rating,
            ..Record::default()
        }
    }

    fn ids(records: &[Record]) -> Vec<u64> {
        records.iter().map(|r| r.id).collect()
    }

    #[tokio::test]
    async fn test_results_sorted_by_rating_with_stable_ties() {
        let source = FieldSource::default()
            .with(SearchField::Title, vec![rec(1, 3.0), rec(2, 5.0), rec(3, 3.0)])
            .with(SearchField::Author, vec![rec(4, 3.0), rec(5, 4.0)]);

        let result = search_across_fields(
            &source,
            "doom",
            &[SearchField::Title, SearchField::Author],
            None,
            None,
        )
        .await;

        assert!(result.failures.is_empty());
        // Ties at 3.0 keep concatenation order: 1, 3 (title) then 4 (author).
        assert_eq!(ids(&result.records), vec![2, 5, 1, 3, 4]);
        let ratings: Vec<f32> = result.records.iter().map(|r| r.rating).collect();
        assert!(ratings.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    async fn test_record_matching_two_fields_appears_twice() {
        let shared = rec(7, 4.5);
        let source = FieldSource::default()
            .with(SearchField::Title, vec![shared.clone()])
            .with(SearchField::Author, vec![shared]);

        let result = search_across_fields(
            &source,
            "doom",
            &[SearchField::Title, SearchField::Author],
            None,
            None,
        )
        .await;

        assert_eq!(ids(&result.records), vec![7, 7]);
    }

    #[tokio::test]
    async fn test_failed_field_contributes_nothing_and_is_reported() {
        let source = FieldSource::default().with(SearchField::Title, vec![rec(1, 2.0), rec(2, 4.0)]);

        let result = search_across_fields(
            &source,
            "doom",
            &[SearchField::Title, SearchField::Email],
            None,
            None,
        )
        .await;

        assert_eq!(ids(&result.records), vec![2, 1]);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].field, SearchField::Email);
        assert!(!result.all_failed());
    }

    #[tokio::test]
    async fn test_empty_field_list_is_empty_result() {
        let source = FieldSource::default();
        let result = search_across_fields(&source, "doom", &[], None, None).await;
        assert!(result.records.is_empty());
        assert!(result.failures.is_empty());
        assert!(!result.all_failed());
    }

    #[tokio::test]
    async fn test_short_query_fails_every_field() {
        let source = FieldSource::default().with(SearchField::Title, vec![rec(1, 1.0)]);
        let result = search_across_fields(&source, "ab", &[SearchField::Title], None, None).await;
        assert!(result.all_failed());
        assert!(result.failures[0].error.is_validation());
        assert!(source.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sort_options_are_forwarded_to_every_request() {
        let source = FieldSource::default()
            .with(SearchField::Title, vec![])
            .with(SearchField::Author, vec![]);

        search_across_fields(
            &source,
            "doom",
            &[SearchField::Title, SearchField::Author],
            Some(SortKey::Rating),
            Some(SortDirection::Desc),
        )
        .await;

        let calls = source.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls
            .iter()
            .all(|c| c.sort == Some(SortKey::Rating) && c.direction == Some(SortDirection::Desc)));
    }

    #[test]
    fn test_rank_by_rating_orders_nan_last() {
        let mut records = vec![rec(1, f32::NAN), rec(2, 1.0), rec(3, 5.0)];
        rank_by_rating(&mut records);
        assert_eq!(ids(&records), vec![3, 2, 1]);
    }
}
