//! idGames archive client library
//!
//! Talks to the idGames archive metadata API, downloads files from its
//! mirrors, and holds the state machine behind the interactive browser.
//!
//! # Architecture
//!
//! - [`api`] - Metadata client (`get`, `search`, `latestfiles`) and record types
//! - [`search`] - Multi-field search with a combined rating ranking
//! - [`download`] - Mirror-fallback downloads with progress reporting
//! - [`backfill`] - Detail fetches for summary result lists
//! - [`browser`] - Browser state, background events and the controller
//! - [`config`] - Endpoint, mirror and timeout configuration

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod backfill;
pub mod browser;
pub mod config;
pub mod download;
mod http_client;
pub mod search;
mod user_agent;

// Re-export commonly used types
pub use api::{ApiClient, ApiError, FileLookup, MetadataSource, Record, Review, SearchField, SearchRequest};
pub use backfill::{BackfillReport, backfill_details, fetch_details_each};
pub use browser::{BrowserController, BrowserEvent, BrowserMode, BrowserState, RequestGeneration};
pub use config::{ArchiveConfig, MirrorList};
pub use download::{DownloadError, DownloadedFile, MirrorDownloader, NoProgress, ProgressSink};
pub use search::{AggregatedSearch, search_across_fields};
