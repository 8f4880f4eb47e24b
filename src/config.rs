//! Immutable archive configuration shared by the metadata client and the
//! download manager.
//!
//! Nothing in this crate reads endpoints or mirrors from globals: callers build
//! an [`ArchiveConfig`] once and hand it to [`ApiClient`](crate::api::ApiClient)
//! and [`MirrorDownloader`](crate::download::MirrorDownloader). Tests substitute
//! mock servers the same way.

use std::fmt;
use std::sync::Arc;

/// Default idGames API endpoint.
pub const DEFAULT_API_URL: &str = "https://www.doomworld.com/idgames/api/api.php";

/// Default mirror hosts, tried in this order.
pub const DEFAULT_MIRRORS: [&str; 2] = [
    "https://www.quaddicted.com/files/idgames",
    "https://ftpmirror1.infania.net/pub/idgames",
];

/// Default API connect timeout (10 seconds).
pub const API_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default API read timeout (30 seconds).
pub const API_READ_TIMEOUT_SECS: u64 = 30;

/// Default mirror connect timeout (30 seconds).
pub const DOWNLOAD_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default mirror read timeout (5 minutes for large archives).
pub const DOWNLOAD_READ_TIMEOUT_SECS: u64 = 300;

/// Ordered, read-only list of mirror base URLs.
///
/// Cloning is cheap; all clones share one allocation.
#[derive(Clone, PartialEq, Eq)]
pub struct MirrorList(Arc<[String]>);

impl MirrorList {
    /// Builds a mirror list, dropping blank entries and trailing slashes.
    #[must_use]
    pub fn new<I, S>(mirrors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cleaned: Vec<String> = mirrors
            .into_iter()
            .map(Into::into)
            .map(|m| m.trim().trim_end_matches('/').to_string())
            .filter(|m| !m.is_empty())
            .collect();
        Self(cleaned.into())
    }

    /// Iterates mirrors in configured order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of configured mirrors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no mirror is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for MirrorList {
    fn default() -> Self {
        Self::new(DEFAULT_MIRRORS)
    }
}

impl fmt::Debug for MirrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

/// Endpoint, mirrors and timeouts for one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveConfig {
    /// Metadata API endpoint (query parameters are appended per request).
    pub api_url: String,
    /// Mirror hosts for file downloads.
    pub mirrors: MirrorList,
    /// Connect timeout for API requests, in seconds.
    pub api_connect_timeout_secs: u64,
    /// Total timeout for API requests, in seconds.
    pub api_read_timeout_secs: u64,
    /// Connect timeout for mirror requests, in seconds.
    pub download_connect_timeout_secs: u64,
    /// Total timeout for mirror requests, in seconds.
    pub download_read_timeout_secs: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            mirrors: MirrorList::default(),
            api_connect_timeout_secs: API_CONNECT_TIMEOUT_SECS,
            api_read_timeout_secs: API_READ_TIMEOUT_SECS,
            download_connect_timeout_secs: DOWNLOAD_CONNECT_TIMEOUT_SECS,
            download_read_timeout_secs: DOWNLOAD_READ_TIMEOUT_SECS,
        }
    }
}

impl ArchiveConfig {
    /// Replaces the API endpoint.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Replaces the mirror list.
    #[must_use]
    pub fn with_mirrors(mut self, mirrors: MirrorList) -> Self {
        self.mirrors = mirrors;
        self
    }

    /// Replaces the API timeouts.
    #[must_use]
    pub fn with_api_timeouts(mut self, connect_secs: u64, read_secs: u64) -> Self {
        self.api_connect_timeout_secs = connect_secs;
        self.api_read_timeout_secs = read_secs;
        self
    }

    /// Replaces the mirror download timeouts.
    #[must_use]
    pub fn with_download_timeouts(mut self, connect_secs: u64, read_secs: u64) -> Self {
        self.download_connect_timeout_secs = connect_secs;
        self.download_read_timeout_secs = read_secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_list_trims_trailing_slashes_and_blanks() {
        let mirrors = MirrorList::new(["https://a.example/idgames/", "  ", "https://b.example"]);
        let collected: Vec<&str> = mirrors.iter().collect();
        assert_eq!(
            collected,
            vec!["https://a.example/idgames", "https://b.example"]
        );
    }

    #[test]
    fn test_mirror_list_preserves_order() {
        let mirrors = MirrorList::new(["https://z.example", "https://a.example"]);
        assert_eq!(mirrors.iter().next(), Some("https://z.example"));
        assert_eq!(mirrors.len(), 2);
    }

    #[test]
    fn test_default_config_uses_known_endpoint_and_mirrors() {
        let config = ArchiveConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.mirrors.len(), DEFAULT_MIRRORS.len());
        assert_eq!(config.api_read_timeout_secs, 30);
        assert_eq!(config.download_read_timeout_secs, 300);
    }

    #[test]
    fn test_builder_methods_replace_fields() {
        let config = ArchiveConfig::default()
            .with_api_url("http://localhost/api.php")
            .with_mirrors(MirrorList::new(["http://localhost/m1"]))
            .with_api_timeouts(1, 2)
            .with_download_timeouts(3, 4);
        assert_eq!(config.api_url, "http://localhost/api.php");
        assert_eq!(config.mirrors.len(), 1);
        assert_eq!(config.api_connect_timeout_secs, 1);
        assert_eq!(config.api_read_timeout_secs, 2);
        assert_eq!(config.download_connect_timeout_secs, 3);
        assert_eq!(config.download_read_timeout_secs, 4);
    }
}
