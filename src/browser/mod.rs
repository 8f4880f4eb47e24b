//! Interactive browser state and its controller.
//!
//! The browser moves through these modes:
//!
//! ```text
//! Empty -> Listed <-> Detailed -> ConfirmPending -> Downloading
//!            ^          ^              |                |
//!            +----------+--- decline --+---- finish ----+
//! ```
//!
//! Searches, detail backfill and downloads run as tokio tasks. They report
//! through a single channel as [`BrowserEvent`]s tagged with the
//! [`RequestGeneration`] they were started under; the control loop applies
//! them with [`BrowserController::handle_event`], discarding anything from a
//! superseded request.

mod controller;
mod event;
mod state;

pub use controller::{
    BrowserController, ConfirmHook, DEFAULT_LATEST_LIMIT, DEFAULT_SEARCH_FIELDS, PostDownloadHook,
};
pub use event::BrowserEvent;
pub use state::{BrowserMode, BrowserState, DownloadProgress, RequestGeneration};
