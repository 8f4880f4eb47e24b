//! Control loop side of the browser: spawns background work and applies its
//! results.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, info, warn};

use super::event::BrowserEvent;
use super::state::{BrowserMode, BrowserState, RequestGeneration};
use crate::api::{ApiError, MetadataSource, Record, SearchField, validate_query};
use crate::backfill::fetch_details_each;
use crate::download::{DownloadedFile, MirrorDownloader, ProgressSink};
use crate::search::search_across_fields;

/// Fields searched when the user types a query.
pub const DEFAULT_SEARCH_FIELDS: [SearchField; 2] = [SearchField::Title, SearchField::Author];

/// Files listed when the search input is empty.
pub const DEFAULT_LATEST_LIMIT: u32 = 50;

/// Called on the control loop after a download succeeds.
pub type PostDownloadHook = Box<dyn Fn(&Record, &DownloadedFile) + Send + Sync>;

/// Called instead of the confirmation dialog when a row is picked for
/// download. The embedder decides what to do with the record.
pub type ConfirmHook = Box<dyn Fn(&Record) + Send + Sync>;

/// Owns the browser state and every channel into it.
///
/// Background tasks (search, latest-files, backfill, download) are spawned on
/// the tokio runtime and report back through one unbounded channel. The
/// owner of the controller pulls events with [`next_event`](Self::next_event)
/// and applies them with [`handle_event`](Self::handle_event); state is only
/// ever written from there.
pub struct BrowserController {
    state: BrowserState,
    source: Arc<dyn MetadataSource>,
    downloader: Arc<MirrorDownloader>,
    download_dir: PathBuf,
    search_fields: Vec<SearchField>,
    latest_limit: u32,
    post_download: Option<PostDownloadHook>,
    confirm_hook: Option<ConfirmHook>,
    events_tx: UnboundedSender<BrowserEvent>,
    events_rx: UnboundedReceiver<BrowserEvent>,
}

impl BrowserController {
    /// Creates a controller in [`BrowserMode::Empty`].
    pub fn new(
        source: Arc<dyn MetadataSource>,
        downloader: Arc<MirrorDownloader>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        let (events_tx, events_rx) = unbounded_channel();
        Self {
            state: BrowserState::default(),
            source,
            downloader,
            download_dir: download_dir.into(),
            search_fields: DEFAULT_SEARCH_FIELDS.to_vec(),
            latest_limit: DEFAULT_LATEST_LIMIT,
            post_download: None,
            confirm_hook: None,
            events_tx,
            events_rx,
        }
    }

    /// Replaces the fields searched by [`submit_input`](Self::submit_input).
    #[must_use]
    pub fn with_search_fields(mut self, fields: Vec<SearchField>) -> Self {
        self.search_fields = fields;
        self
    }

    /// Replaces the page size used for an empty search input.
    #[must_use]
    pub fn with_latest_limit(mut self, limit: u32) -> Self {
        self.latest_limit = limit;
        self
    }

    /// Installs a callback run after every successful download.
    #[must_use]
    pub fn with_post_download(mut self, hook: PostDownloadHook) -> Self {
        self.post_download = Some(hook);
        self
    }

    /// Replaces the confirm-and-download flow: [`confirm`](Self::confirm)
    /// hands the row's record to `hook` and leaves the mode unchanged.
    #[must_use]
    pub fn with_confirm_hook(mut self, hook: ConfirmHook) -> Self {
        self.confirm_hook = Some(hook);
        self
    }

    /// Current state, for rendering.
    #[must_use]
    pub fn state(&self) -> &BrowserState {
        &self.state
    }

    /// Directory downloads are written to.
    #[must_use]
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Where the record awaiting confirmation (or else the selected record)
    /// would be saved.
    #[must_use]
    pub fn download_path_preview(&self) -> Option<PathBuf> {
        let record = self
            .state
            .confirm_record()
            .or_else(|| self.state.selected_record())?;
        MirrorDownloader::destination_for(record, &self.download_dir).ok()
    }

    /// Handles the search box: an empty input lists the latest files, anything
    /// else searches the configured fields.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for a non-empty query that is too
    /// short. The message is also put on the status line.
    pub fn submit_input(&mut self, input: &str) -> Result<RequestGeneration, ApiError> {
        let query = input.trim();
        if query.is_empty() {
            Ok(self.request_latest(self.latest_limit, 0))
        } else {
            let fields = self.search_fields.clone();
            self.request_search(query, &fields)
        }
    }

    /// Starts a multi-field search.
    ///
    /// The query is validated before anything is spawned; a rejected query
    /// leaves the generation and the list untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when the query is too short.
    pub fn request_search(
        &mut self,
        query: &str,
        fields: &[SearchField],
    ) -> Result<RequestGeneration, ApiError> {
        if let Err(error) = validate_query(query) {
            self.state.set_status(error.to_string());
            return Err(error);
        }

        let generation = self.state.begin_request();
        self.state.set_status(format!("Searching for \"{query}\"..."));
        info!(%generation, query, "search requested");

        let source = Arc::clone(&self.source);
        let tx = self.events_tx.clone();
        let query = query.to_string();
        let fields = fields.to_vec();
        tokio::spawn(async move {
            let mut aggregated = search_across_fields(source.as_ref(), &query, &fields, None, None).await;
            let event = if aggregated.all_failed() {
                let first = aggregated.failures.remove(0);
                BrowserEvent::RequestFailed {
                    generation,
                    error: first.error,
                }
            } else {
                BrowserEvent::ResultsReady {
                    generation,
                    records: aggregated.records,
                    failures: aggregated.failures,
                }
            };
            send(&tx, event);
        });

        Ok(generation)
    }

    /// Starts a latest-files request.
    pub fn request_latest(&mut self, limit: u32, start_id: u64) -> RequestGeneration {
        let generation = self.state.begin_request();
        self.state.set_status("Loading latest files...");
        info!(%generation, limit, start_id, "latest files requested");

        let source = Arc::clone(&self.source);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let event = match source.latest_files(limit, start_id).await {
                Ok(records) => BrowserEvent::ResultsReady {
                    generation,
                    records,
                    failures: Vec::new(),
                },
                Err(error) => BrowserEvent::RequestFailed { generation, error },
            };
            send(&tx, event);
        });

        generation
    }

    /// Opens the detail view for `row`.
    pub fn select(&mut self, row: usize) -> bool {
        self.state.select(row)
    }

    /// Closes the detail view.
    pub fn close_detail(&mut self) -> bool {
        self.state.close_detail()
    }

    /// Asks for download confirmation of `row`, or passes its record to the
    /// confirm hook when one is installed.
    pub fn confirm(&mut self, row: usize) -> bool {
        if let Some(hook) = &self.confirm_hook {
            let mode = self.state.mode();
            return match self.state.records().get(row) {
                Some(record) if matches!(mode, BrowserMode::Listed | BrowserMode::Detailed) => {
                    debug!(id = record.id, "confirm handed to hook");
                    hook(record);
                    true
                }
                _ => false,
            };
        }
        let accepted = self.state.confirm(row);
        if !accepted && self.state.download().is_some() {
            self.state.set_status("A download is already running");
        }
        accepted
    }

    /// Confirms the pending download and spawns it.
    pub fn accept(&mut self) -> bool {
        let Some(record) = self.state.accept() else {
            return false;
        };
        info!(id = record.id, file = %record.filename, "download confirmed");

        let downloader = Arc::clone(&self.downloader);
        let dir = self.download_dir.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let sink = ChannelProgress { tx: tx.clone() };
            let result = downloader.download(&record, &dir, &sink).await;
            send(&tx, BrowserEvent::DownloadFinished { record, result });
        });
        true
    }

    /// Dismisses the pending confirmation.
    pub fn decline(&mut self) -> bool {
        self.state.decline()
    }

    /// Waits for the next background event.
    ///
    /// Never returns `None` while the controller is alive, since it keeps a
    /// sender of its own.
    pub async fn next_event(&mut self) -> Option<BrowserEvent> {
        self.events_rx.recv().await
    }

    /// Returns a pending background event without waiting.
    pub fn try_next_event(&mut self) -> Option<BrowserEvent> {
        self.events_rx.try_recv().ok()
    }

    /// Applies one background event to the state.
    ///
    /// Events tagged with a superseded generation are dropped. Installing a
    /// result list starts backfill for that list.
    pub fn handle_event(&mut self, event: BrowserEvent) {
        match event {
            BrowserEvent::ResultsReady {
                generation,
                records,
                failures,
            } => {
                let count = records.len();
                if !self.state.apply_results(generation, records) {
                    debug!(%generation, current = %self.state.generation(), "discarding stale results");
                    return;
                }
                let mut status = format!("{count} result{}", if count == 1 { "" } else { "s" });
                if !failures.is_empty() {
                    let fields: Vec<String> = failures.iter().map(|f| f.field.to_string()).collect();
                    for failure in &failures {
                        warn!(field = %failure.field, error = %failure.error, "search field failed");
                    }
                    let _ = write!(status, " ({} search failed)", fields.join(", "));
                }
                self.state.set_status(status);
                self.spawn_backfill(generation);
            }
            BrowserEvent::RequestFailed { generation, error } => {
                if self.state.apply_failure(generation, error.to_string()) {
                    warn!(%generation, error = %error, "request failed");
                } else {
                    debug!(%generation, "discarding stale failure");
                }
            }
            BrowserEvent::DetailReady {
                generation,
                index,
                record,
            } => {
                if !self.state.apply_detail(generation, index, record) {
                    debug!(%generation, index, "discarding stale detail");
                }
            }
            BrowserEvent::DownloadStarted { mirror, expected } => {
                self.state.start_attempt(mirror, expected);
            }
            BrowserEvent::DownloadProgress { bytes } => {
                self.state.update_progress(bytes);
            }
            BrowserEvent::DownloadFinished { record, result } => {
                match &result {
                    Ok(file) => {
                        if let Some(hook) = &self.post_download {
                            hook(&record, file);
                        }
                    }
                    Err(error) => warn!(id = record.id, error = %error, "download failed"),
                }
                self.state.finish_download(result);
            }
        }
    }

    /// True when the state is waiting on the user, not on background work.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        !self.state.is_loading() && self.state.mode() != BrowserMode::Downloading
    }

    fn spawn_backfill(&self, generation: RequestGeneration) {
        let ids: Vec<u64> = self.state.records().iter().map(|record| record.id).collect();
        if ids.is_empty() {
            return;
        }
        debug!(%generation, count = ids.len(), "starting detail backfill");

        let source = Arc::clone(&self.source);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            fetch_details_each(source.as_ref(), &ids, |index, outcome| {
                if let Ok(record) = outcome {
                    send(
                        &tx,
                        BrowserEvent::DetailReady {
                            generation,
                            index,
                            record,
                        },
                    );
                }
            })
            .await;
        });
    }
}

/// Forwards download progress to the control loop.
struct ChannelProgress {
    tx: UnboundedSender<BrowserEvent>,
}

impl ProgressSink for ChannelProgress {
    fn on_attempt(&self, mirror: &str, expected_len: Option<u64>) {
        send(
            &self.tx,
            BrowserEvent::DownloadStarted {
                mirror: mirror.to_string(),
                expected: expected_len,
            },
        );
    }

    fn on_progress(&self, bytes_so_far: u64) {
        send(&self.tx, BrowserEvent::DownloadProgress { bytes: bytes_so_far });
    }
}

fn send(tx: &UnboundedSender<BrowserEvent>, event: BrowserEvent) {
    if tx.send(event).is_err() {
        debug!("browser closed, dropping background event");
    }
}
