//! Shared HTTP client construction for API and mirror traffic.
//!
//! Both the metadata client and the mirror downloader build their
//! `reqwest::Client` here so timeouts, compression, user-agent and proxy
//! handling stay consistent.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Proxy};
use tracing::warn;

use crate::user_agent;

/// Builds a client with the given timeouts.
///
/// Some sandboxed environments panic while reading system proxy settings.
/// When that happens the client is rebuilt with system lookup disabled and
/// proxies taken from `HTTPS_PROXY`/`HTTP_PROXY`/`ALL_PROXY` only.
///
/// # Errors
///
/// Returns the underlying `reqwest::Error` when the builder rejects the
/// configuration.
pub(crate) fn build_http_client(
    purpose: &'static str,
    connect_timeout_secs: u64,
    read_timeout_secs: u64,
) -> Result<Client, reqwest::Error> {
    let timeouts = (connect_timeout_secs, read_timeout_secs);
    if let Ok(built) = catch_unwind(AssertUnwindSafe(|| base_builder(timeouts).build())) {
        return built;
    }

    warn!(purpose, "system proxy lookup panicked; using proxies from the environment");
    let fallback = catch_unwind(AssertUnwindSafe(|| {
        with_env_proxies(base_builder(timeouts).no_proxy()).build()
    }));
    fallback.unwrap_or_else(|_| base_builder(timeouts).no_proxy().build())
}

fn base_builder((connect_secs, read_secs): (u64, u64)) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_secs))
        .timeout(Duration::from_secs(read_secs))
        .gzip(true)
        .user_agent(user_agent::default_user_agent())
}

fn with_env_proxies(mut builder: ClientBuilder) -> ClientBuilder {
    let https = env_proxy(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]);
    if let Some(proxy) = https.and_then(|url| Proxy::https(url).ok()) {
        builder = builder.proxy(proxy);
    }
    let http = env_proxy(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]);
    if let Some(proxy) = http.and_then(|url| Proxy::http(url).ok()) {
        builder = builder.proxy(proxy);
    }
    builder
}

/// First non-blank value among `names`.
fn env_proxy(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
