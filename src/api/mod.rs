//! Client for the idGames archive metadata API.
//!
//! The API is a single GET endpoint driven by query parameters:
//!
//! - `action=get` with `id` or `file` returns one record with its text file
//!   and reviews
//! - `action=search` with `query` and optional `type`, `sort`, `dir` returns
//!   summary records
//! - `action=latestfiles` with optional `limit`, `startid` returns the newest
//!   summary records
//!
//! Every request also sends `out=json`.
//!
//! # Example
//!
//! ```no_run
//! use idgames_core::api::{ApiClient, SearchField, SearchRequest};
//! use idgames_core::ArchiveConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new(&ArchiveConfig::default())?;
//! let records = client
//!     .search(&SearchRequest::new("memento").field(SearchField::Title))
//!     .await?;
//! for record in &records {
//!     println!("{} by {}", record.title, record.author);
//! }
//! # Ok(())
//! # }
//! ```

mod decode;
mod error;
mod query;
mod record;

pub use decode::decode_one_or_many;
pub use error::{ApiError, UnknownValueError};
pub use query::{
    FileLookup, MIN_QUERY_LEN, SearchField, SearchRequest, SortDirection, SortKey, validate_query,
};
pub use record::{MAX_RATING, Record, Review};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ArchiveConfig;
use crate::http_client::build_http_client;
use query::{Action, latest_params};

/// The three metadata operations, as consumed by search aggregation, detail
/// backfill and the browser controller.
///
/// [`ApiClient`] is the production implementation.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetches one record with full detail.
    async fn fetch(&self, lookup: &FileLookup) -> Result<Record, ApiError>;

    /// Runs one search. Implementations must reject short queries with
    /// [`ApiError::Validation`] before doing any I/O.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Record>, ApiError>;

    /// Lists the newest files. `0` means "unset" for both arguments.
    async fn latest_files(&self, limit: u32, start_id: u64) -> Result<Vec<Record>, ApiError>;
}

/// Stateless HTTP client for the metadata API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    endpoint: Url,
}

impl ApiClient {
    /// Creates a client for the configured endpoint and API timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] for a malformed endpoint and
    /// [`ApiError::ClientBuild`] when the HTTP client cannot be built.
    pub fn new(config: &ArchiveConfig) -> Result<Self, ApiError> {
        let client = build_http_client(
            "api",
            config.api_connect_timeout_secs,
            config.api_read_timeout_secs,
        )
        .map_err(|source| ApiError::ClientBuild { source })?;
        Self::with_client(client, &config.api_url)
    }

    /// Creates a client around an existing `reqwest::Client`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] for a malformed endpoint.
    pub fn with_client(client: Client, api_url: &str) -> Result<Self, ApiError> {
        let endpoint = Url::parse(api_url).map_err(|_| ApiError::InvalidUrl {
            url: api_url.to_string(),
        })?;
        Ok(Self { client, endpoint })
    }

    /// The endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetches one record by id or path, including text file and reviews.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Connection`], [`ApiError::HttpStatus`] or
    /// [`ApiError::ResponseRead`] for transport failures,
    /// [`ApiError::Remote`] when the API reports an error, and
    /// [`ApiError::Decode`] / [`ApiError::MissingContent`] for payloads
    /// that do not describe a record.
    #[instrument(skip(self), fields(id = ?lookup.id, path = ?lookup.path))]
    pub async fn fetch(&self, lookup: &FileLookup) -> Result<Record, ApiError> {
        let url = self.request_url(Action::Get, &lookup.params());
        let body = self.get_response_data(url).await?;
        decode::decode_record(&body)
    }

    /// Runs one search.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] without sending anything when the
    /// query is shorter than [`MIN_QUERY_LEN`]; otherwise the same errors as
    /// [`fetch`](Self::fetch) except `MissingContent` (no content is an empty
    /// result).
    #[instrument(skip(self), fields(query = %request.query, field = ?request.field))]
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<Record>, ApiError> {
        validate_query(&request.query)?;
        let url = self.request_url(Action::Search, &request.params());
        let body = self.get_response_data(url).await?;
        decode::decode_record_list(&body)
    }

    /// Lists the newest uploads.
    ///
    /// `limit == 0` leaves the page size to the server; `start_id == 0` asks
    /// for the server's default newest set.
    ///
    /// # Errors
    ///
    /// Same as [`search`](Self::search), minus validation.
    #[instrument(skip(self))]
    pub async fn latest_files(&self, limit: u32, start_id: u64) -> Result<Vec<Record>, ApiError> {
        let url = self.request_url(Action::LatestFiles, &latest_params(limit, start_id));
        let body = self.get_response_data(url).await?;
        decode::decode_record_list(&body)
    }

    fn request_url(&self, action: Action, params: &[(&'static str, String)]) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("action", action.as_str());
            pairs.append_pair("out", "json");
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    async fn get_response_data(&self, url: Url) -> Result<Vec<u8>, ApiError> {
        debug!(url = %url, "calling archive API");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ApiError::connection(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::http_status(url.as_str(), status.as_u16()));
        }

        response
            .bytes()
            .await
            .map(|body| body.to_vec())
            .map_err(|e| ApiError::response_read(url.as_str(), e))
    }
}

#[async_trait]
impl MetadataSource for ApiClient {
    async fn fetch(&self, lookup: &FileLookup) -> Result<Record, ApiError> {
        ApiClient::fetch(self, lookup).await
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<Record>, ApiError> {
        ApiClient::search(self, request).await
    }

    async fn latest_files(&self, limit: u32, start_id: u64) -> Result<Vec<Record>, ApiError> {
        ApiClient::latest_files(self, limit, start_id).await
    }
}
