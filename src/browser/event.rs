//! Messages from background work to the browser control loop.

use crate::api::{ApiError, Record};
use crate::download::{DownloadError, DownloadedFile};
use crate::search::FieldFailure;

use super::state::RequestGeneration;

/// A result produced by a background task.
///
/// Tasks never touch [`BrowserState`](super::BrowserState); they send one of
/// these and the control loop applies it through
/// [`BrowserController::handle_event`](super::BrowserController::handle_event).
#[derive(Debug)]
pub enum BrowserEvent {
    /// A search or latest-files request finished.
    ResultsReady {
        /// Request the results belong to.
        generation: RequestGeneration,
        /// Ranked records.
        records: Vec<Record>,
        /// Search fields that failed (always empty for latest-files).
        failures: Vec<FieldFailure>,
    },
    /// A search or latest-files request produced nothing usable.
    RequestFailed {
        /// Request that failed.
        generation: RequestGeneration,
        /// Why.
        error: ApiError,
    },
    /// Detail for one row of a result list arrived.
    DetailReady {
        /// Request whose list the row belongs to.
        generation: RequestGeneration,
        /// Row index in that list.
        index: usize,
        /// The detail record.
        record: Record,
    },
    /// A mirror answered and the download attempt is starting.
    DownloadStarted {
        /// Mirror base URL.
        mirror: String,
        /// Size announced by the mirror.
        expected: Option<u64>,
    },
    /// Cumulative bytes of the current attempt.
    DownloadProgress {
        /// Bytes written so far.
        bytes: u64,
    },
    /// The download succeeded or ran out of mirrors.
    DownloadFinished {
        /// Record that was downloaded.
        record: Record,
        /// Outcome.
        result: Result<DownloadedFile, DownloadError>,
    },
}

impl BrowserEvent {
    /// Request generation the event is tagged with, if any.
    #[must_use]
    pub fn generation(&self) -> Option<RequestGeneration> {
        match self {
            Self::ResultsReady { generation, .. }
            | Self::RequestFailed { generation, .. }
            | Self::DetailReady { generation, .. } => Some(*generation),
            Self::DownloadStarted { .. } | Self::DownloadProgress { .. } | Self::DownloadFinished { .. } => None,
        }
    }
}
