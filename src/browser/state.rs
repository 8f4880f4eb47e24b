//! Browser state and its transitions.
//!
//! [`BrowserState`] is plain data owned by the control loop. Every method is a
//! synchronous transition; nothing here spawns work or touches the network.
//! The controller decides what to spawn based on the return values.

use std::fmt;

use crate::api::Record;
use crate::download::{DownloadError, DownloadedFile};

/// Monotonic tag for one search or latest-files request.
///
/// Every background result carries the generation it was started under.
/// Results whose generation is no longer current are dropped on arrival.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestGeneration(u64);

impl RequestGeneration {
    #[must_use]
    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for RequestGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the browser is currently showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BrowserMode {
    /// Nothing requested yet.
    #[default]
    Empty,
    /// A result list (possibly still loading, possibly empty).
    Listed,
    /// A result list with one row's detail open.
    Detailed,
    /// Waiting for the user to confirm a download.
    ConfirmPending,
    /// A confirmed download is running.
    Downloading,
}

/// Live progress of the running download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Record being downloaded.
    pub record_id: u64,
    /// File name being downloaded.
    pub filename: String,
    /// Mirror of the current attempt, once one has answered.
    pub mirror: Option<String>,
    /// Bytes written by the current attempt.
    pub bytes: u64,
    /// Expected size reported by the mirror.
    pub expected: Option<u64>,
}

impl DownloadProgress {
    /// Completed fraction in `0.0..=1.0`, when the size is known.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio(&self) -> Option<f64> {
        match self.expected {
            Some(total) if total > 0 => Some((self.bytes as f64 / total as f64).min(1.0)),
            _ => None,
        }
    }
}

/// Result list, selection and dialog state of the browser.
#[derive(Debug, Default)]
pub struct BrowserState {
    records: Vec<Record>,
    selected: Option<usize>,
    mode: BrowserMode,
    resume_mode: BrowserMode,
    generation: RequestGeneration,
    loading: bool,
    confirm_row: Option<usize>,
    download: Option<DownloadProgress>,
    last_download: Option<Result<DownloadedFile, DownloadError>>,
    status: String,
}

impl BrowserState {
    /// Current result list.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Selected row, if any.
    #[must_use]
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Record at the selected row, as it is now (summary or detail).
    #[must_use]
    pub fn selected_record(&self) -> Option<&Record> {
        self.selected.and_then(|row| self.records.get(row))
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> BrowserMode {
        self.mode
    }

    /// Generation of the most recent request.
    #[must_use]
    pub fn generation(&self) -> RequestGeneration {
        self.generation
    }

    /// True while the most recent request has not answered.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Row awaiting download confirmation.
    #[must_use]
    pub fn confirm_row(&self) -> Option<usize> {
        self.confirm_row
    }

    /// Record awaiting download confirmation.
    #[must_use]
    pub fn confirm_record(&self) -> Option<&Record> {
        self.confirm_row.and_then(|row| self.records.get(row))
    }

    /// Progress of the running download.
    #[must_use]
    pub fn download(&self) -> Option<&DownloadProgress> {
        self.download.as_ref()
    }

    /// Outcome of the most recent finished download.
    #[must_use]
    pub fn last_download(&self) -> Option<&Result<DownloadedFile, DownloadError>> {
        self.last_download.as_ref()
    }

    /// Status line text.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Replaces the status line.
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Starts a new request and returns its generation.
    ///
    /// The current list and selection stay visible until the new results
    /// arrive. A pending confirmation is cancelled; a running download keeps
    /// going in the background.
    pub fn begin_request(&mut self) -> RequestGeneration {
        self.generation = self.generation.next();
        self.loading = true;
        self.confirm_row = None;
        self.mode = BrowserMode::Listed;
        self.resume_mode = BrowserMode::Listed;
        self.generation
    }

    /// Installs the results of `generation`.
    ///
    /// Returns `false` (and changes nothing) when `generation` is stale.
    /// Otherwise the list is replaced wholesale and the selection cleared.
    pub fn apply_results(&mut self, generation: RequestGeneration, records: Vec<Record>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.records = records;
        self.selected = None;
        self.loading = false;
        self.confirm_row = None;
        self.resume_mode = BrowserMode::Listed;
        if self.mode != BrowserMode::Downloading {
            self.mode = BrowserMode::Listed;
        }
        true
    }

    /// Records that `generation` failed. Returns `false` when stale.
    pub fn apply_failure(&mut self, generation: RequestGeneration, message: impl Into<String>) -> bool {
        if generation != self.generation {
            return false;
        }
        self.loading = false;
        self.status = message.into();
        true
    }

    /// Swaps the summary at `index` for its detail record.
    ///
    /// Applied only when `generation` is current, `index` is in range and the
    /// entry there still has the same id. Returns whether it was applied.
    pub fn apply_detail(&mut self, generation: RequestGeneration, index: usize, record: Record) -> bool {
        if generation != self.generation {
            return false;
        }
        match self.records.get_mut(index) {
            Some(slot) if slot.id == record.id => {
                *slot = record;
                true
            }
            _ => false,
        }
    }

    /// Opens the detail view for `row`. Only valid from the list or detail
    /// views and for an existing row.
    pub fn select(&mut self, row: usize) -> bool {
        if !matches!(self.mode, BrowserMode::Listed | BrowserMode::Detailed) || row >= self.records.len() {
            return false;
        }
        self.selected = Some(row);
        self.mode = BrowserMode::Detailed;
        true
    }

    /// Closes the detail view, keeping the selection.
    pub fn close_detail(&mut self) -> bool {
        if self.mode != BrowserMode::Detailed {
            return false;
        }
        self.mode = BrowserMode::Listed;
        true
    }

    /// Asks for confirmation to download `row`.
    ///
    /// Refused while another download is running.
    pub fn confirm(&mut self, row: usize) -> bool {
        if !matches!(self.mode, BrowserMode::Listed | BrowserMode::Detailed)
            || row >= self.records.len()
            || self.download.is_some()
        {
            return false;
        }
        self.resume_mode = self.mode;
        self.confirm_row = Some(row);
        self.mode = BrowserMode::ConfirmPending;
        true
    }

    /// Accepts the pending confirmation and returns the record to download.
    pub fn accept(&mut self) -> Option<Record> {
        if self.mode != BrowserMode::ConfirmPending {
            return None;
        }
        let record = self.confirm_record().cloned()?;
        self.confirm_row = None;
        self.mode = BrowserMode::Downloading;
        self.download = Some(DownloadProgress {
            record_id: record.id,
            filename: record.filename.clone(),
            mirror: None,
            bytes: 0,
            expected: None,
        });
        self.status = format!("Downloading {}...", record.filename);
        Some(record)
    }

    /// Dismisses the pending confirmation with no side effects.
    pub fn decline(&mut self) -> bool {
        if self.mode != BrowserMode::ConfirmPending {
            return false;
        }
        self.confirm_row = None;
        self.mode = self.resume_mode;
        true
    }

    /// A mirror attempt started; the byte count restarts.
    pub fn start_attempt(&mut self, mirror: String, expected: Option<u64>) {
        if let Some(download) = &mut self.download {
            download.mirror = Some(mirror);
            download.bytes = 0;
            download.expected = expected;
        }
    }

    /// Cumulative bytes of the current attempt.
    pub fn update_progress(&mut self, bytes: u64) {
        if let Some(download) = &mut self.download {
            download.bytes = bytes;
        }
    }

    /// Stores the outcome of the running download and leaves the download
    /// view, returning to the list or detail view it was started from.
    pub fn finish_download(&mut self, result: Result<DownloadedFile, DownloadError>) {
        self.download = None;
        self.status = match &result {
            Ok(file) => format!("Saved {} ({} bytes)", file.path.display(), file.bytes),
            Err(error) => format!("Download failed: {error}"),
        };
        self.last_download = Some(result);
        if self.mode == BrowserMode::Downloading {
            self.mode = match self.resume_mode {
                BrowserMode::Detailed if self.selected.is_some() => BrowserMode::Detailed,
                _ => BrowserMode::Listed,
            };
        }
    }
}
