//! Mirror-fallback downloads for archive files.
//!
//! A record's file lives at `{mirror}/{dir}/{filename}` on every mirror. The
//! [`MirrorDownloader`] tries each configured mirror in order, streaming the
//! body to `{destination}/{filename}` and reporting progress through a
//! [`ProgressSink`]. The first mirror that delivers the whole file wins.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for large archives)
//! - Partial files from failed attempts are removed before the next mirror
//! - Every failed attempt is kept for the final error

mod error;
mod mirror;
mod progress;

pub use error::{DownloadError, MirrorError, MirrorFailure};
pub use mirror::{DownloadedFile, MirrorDownloader};
pub use progress::{NoProgress, ProgressSink};
