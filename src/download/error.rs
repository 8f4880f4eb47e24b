//! Error types for the download module.
//!
//! A download is a sequence of mirror attempts. Each failed attempt is kept as
//! a [`MirrorFailure`]; only running out of mirrors (or failing before the
//! first attempt) surfaces as a [`DownloadError`].

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Why a single mirror attempt failed. The next mirror is tried afterwards.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// Network-level error (DNS resolution, connection refused, TLS, reset).
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The mirror URL.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before the body finished.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The mirror URL.
        url: String,
    },

    /// The mirror answered with a non-success status.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The mirror URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Creating or writing the destination file failed.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The destination file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The mirror base URL cannot be combined with the record path.
    #[error("invalid mirror URL: {url}")]
    InvalidUrl {
        /// The rejected URL string.
        url: String,
    },
}

impl MirrorError {
    /// Classifies a reqwest error as a timeout or a network failure.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}

/// One failed mirror attempt.
#[derive(Debug)]
pub struct MirrorFailure {
    /// Mirror base URL as configured.
    pub mirror: String,
    /// What went wrong.
    pub error: MirrorError,
}

impl fmt::Display for MirrorFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.mirror, self.error)
    }
}

/// Errors that end a download.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The destination directory could not be created.
    #[error("cannot create download directory {path}: {source}")]
    Storage {
        /// The destination directory.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Every mirror was tried and none delivered the file.
    #[error("all mirrors failed for {filename} ({} tried){}", .attempts.len(), summarize(.attempts))]
    Exhausted {
        /// File that was requested.
        filename: String,
        /// Every attempt, in mirror order.
        attempts: Vec<MirrorFailure>,
    },

    /// The record does not name a downloadable file.
    #[error("record {id} has no usable filename ({filename:?})")]
    InvalidRecord {
        /// Record id.
        id: u64,
        /// The filename as received.
        filename: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl DownloadError {
    /// Creates a storage error.
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Mirror attempts behind an [`Exhausted`](Self::Exhausted) error.
    #[must_use]
    pub fn attempts(&self) -> &[MirrorFailure] {
        match self {
            Self::Exhausted { attempts, .. } => attempts,
            _ => &[],
        }
    }
}

fn summarize(attempts: &[MirrorFailure]) -> String {
    attempts
        .iter()
        .map(|attempt| format!("\n  {attempt}"))
        .collect()
}

// No From<reqwest::Error> / From<std::io::Error>: every variant needs a URL or
// path that the source error does not carry.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_http_status_display() {
        let error = MirrorError::http_status("https://m1.example/levels/a.zip", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(msg.contains("m1.example"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_mirror_io_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = MirrorError::io(PathBuf::from("/tmp/a.zip"), io_error);
        assert!(error.to_string().contains("/tmp/a.zip"));
    }

    #[test]
    fn test_exhausted_lists_every_attempt_in_order() {
        let error = DownloadError::Exhausted {
            filename: "a.zip".to_string(),
            attempts: vec![
                MirrorFailure {
                    mirror: "https://m1.example".to_string(),
                    error: MirrorError::http_status("https://m1.example/a.zip", 404),
                },
                MirrorFailure {
                    mirror: "https://m2.example".to_string(),
                    error: MirrorError::http_status("https://m2.example/a.zip", 503),
                },
            ],
        };
        let msg = error.to_string();
        assert!(msg.contains("2 tried"), "Expected attempt count in: {msg}");
        let first = msg.find("m1.example").unwrap_or(usize::MAX);
        let second = msg.find("m2.example").unwrap_or(0);
        assert!(first < second, "Expected mirror order in: {msg}");
        assert_eq!(error.attempts().len(), 2);
    }

    #[test]
    fn test_exhausted_without_mirrors() {
        let error = DownloadError::Exhausted {
            filename: "a.zip".to_string(),
            attempts: Vec::new(),
        };
        assert!(error.to_string().contains("0 tried"));
    }

    #[test]
    fn test_storage_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let error = DownloadError::storage("/readonly/dl", io_error);
        assert!(error.to_string().contains("/readonly/dl"));
        assert!(error.attempts().is_empty());
    }
}
