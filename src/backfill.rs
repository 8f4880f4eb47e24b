//! Detail backfill for summary search results.
//!
//! Search and latest-files responses carry summary records only; the text file
//! and reviews need one `get` per record. Backfill fetches them one at a time
//! and swaps each summary for its detail record. A failed fetch leaves the
//! summary in place.

use tracing::{debug, instrument};

use crate::api::{ApiError, FileLookup, MetadataSource, Record};

/// One record whose detail fetch failed.
#[derive(Debug)]
pub struct BackfillFailure {
    /// Position in the list that was backfilled.
    pub index: usize,
    /// Id that was looked up.
    pub id: u64,
    /// Why it failed.
    pub error: ApiError,
}

/// Outcome of [`backfill_details`].
#[derive(Debug, Default)]
pub struct BackfillReport {
    /// Records that were replaced with detail.
    pub updated: usize,
    /// Records that were left as summaries.
    pub failures: Vec<BackfillFailure>,
}

/// Replaces every record in `records` with its fetched detail.
///
/// Records are fetched sequentially in list order. A failure is recorded in
/// the report and the entry is left untouched.
#[instrument(skip(source, records), fields(count = records.len()))]
pub async fn backfill_details(source: &dyn MetadataSource, records: &mut [Record]) -> BackfillReport {
    let ids: Vec<u64> = records.iter().map(|record| record.id).collect();
    let mut report = BackfillReport::default();

    fetch_details_each(source, &ids, |index, outcome| match outcome {
        Ok(detail) => {
            records[index] = detail;
            report.updated += 1;
        }
        Err(error) => report.failures.push(BackfillFailure {
            index,
            id: ids[index],
            error,
        }),
    })
    .await;

    report
}

/// Fetches the detail record for each id and hands every result to `deliver`
/// as soon as it arrives, with the id's position in `ids`.
///
/// This is the form used when the list lives elsewhere (for example on the
/// browser's control loop) and must not be written from the fetching task.
pub async fn fetch_details_each<F>(source: &dyn MetadataSource, ids: &[u64], mut deliver: F)
where
    F: FnMut(usize, Result<Record, ApiError>) + Send,
{
    for (index, id) in ids.iter().copied().enumerate() {
        let outcome = source.fetch(&FileLookup::by_id(id)).await;
        if let Err(error) = &outcome {
            debug!(index, id, error = %error, "detail fetch failed, keeping summary");
        }
        deliver(index, outcome);
    }
}
