//! Error types for the metadata client.

use thiserror::Error;

/// Errors that can occur while talking to the archive metadata API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller input violates a precondition; no request was sent.
    #[error("invalid request: {message}")]
    Validation {
        /// What was wrong with the input.
        message: String,
    },

    /// The configured endpoint is not a valid URL.
    #[error("invalid API URL: {url}")]
    InvalidUrl {
        /// The rejected URL string.
        url: String,
    },

    /// Transport-level failure (DNS, connect, TLS, timeout).
    #[error("could not connect to the archive API at {url}: {source}")]
    Connection {
        /// The request URL.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[error("archive API returned HTTP {status} for {url}")]
    HttpStatus {
        /// The request URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body could not be read to the end.
    #[error("could not read the archive API response from {url}: {source}")]
    ResponseRead {
        /// The request URL.
        url: String,
        /// The underlying body read error.
        #[source]
        source: reqwest::Error,
    },

    /// The payload is not valid JSON or has an unexpected shape.
    #[error("could not decode the archive API response: {source}")]
    Decode {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The API returned an `error` object instead of content.
    #[error("archive API error ({kind}): {message}")]
    Remote {
        /// Error type reported by the API.
        kind: String,
        /// Human-readable message reported by the API.
        message: String,
    },

    /// A single-record response carried no `content`.
    #[error("archive API response for '{action}' has no content")]
    MissingContent {
        /// The API action that was requested.
        action: &'static str,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    pub fn connection(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Connection {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a response read error.
    pub fn response_read(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::ResponseRead {
            url: url.into(),
            source,
        }
    }

    /// Creates a decode error.
    #[must_use]
    pub fn decode(source: serde_json::Error) -> Self {
        Self::Decode { source }
    }

    /// Creates a remote error from the API's error object.
    pub fn remote(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Returns true for caller-input errors raised before any request.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// A vocabulary value (search field, sort key, direction) was not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct UnknownValueError {
    /// Which vocabulary was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
    /// Comma-separated accepted values.
    pub expected: String,
}
