//! Mirror-fallback file download.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::error::{DownloadError, MirrorError, MirrorFailure};
use super::progress::ProgressSink;
use crate::api::Record;
use crate::config::{ArchiveConfig, MirrorList};
use crate::http_client::build_http_client;

/// A file that finished downloading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    /// Where the file was written.
    pub path: PathBuf,
    /// Bytes written.
    pub bytes: u64,
    /// Mirror that delivered it.
    pub mirror: String,
}

/// Downloads archive files, trying each configured mirror in order.
///
/// The first mirror that delivers the whole file wins. Failed attempts are
/// collected and returned together if no mirror succeeds.
///
/// # Example
///
/// ```no_run
/// use idgames_core::download::{MirrorDownloader, NoProgress};
/// use idgames_core::api::Record;
/// use idgames_core::ArchiveConfig;
/// use std::path::Path;
///
/// # async fn example(record: Record) -> Result<(), Box<dyn std::error::Error>> {
/// let downloader = MirrorDownloader::new(&ArchiveConfig::default())?;
/// let file = downloader.download(&record, Path::new("./wads"), &NoProgress).await?;
/// println!("{} bytes from {}", file.bytes, file.mirror);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MirrorDownloader {
    client: Client,
    mirrors: MirrorList,
}

impl MirrorDownloader {
    /// Creates a downloader for the configured mirrors and download timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] when the HTTP client cannot be
    /// built.
    pub fn new(config: &ArchiveConfig) -> Result<Self, DownloadError> {
        let client = build_http_client(
            "download",
            config.download_connect_timeout_secs,
            config.download_read_timeout_secs,
        )
        .map_err(|source| DownloadError::ClientBuild { source })?;
        Ok(Self::with_client(client, config.mirrors.clone()))
    }

    /// Creates a downloader around an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(client: Client, mirrors: MirrorList) -> Self {
        Self { client, mirrors }
    }

    /// Mirrors in the order they are tried.
    #[must_use]
    pub fn mirrors(&self) -> &MirrorList {
        &self.mirrors
    }

    /// Path the record would be written to inside `destination_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidRecord`] when the record's filename
    /// has no usable final component.
    pub fn destination_for(record: &Record, destination_dir: &Path) -> Result<PathBuf, DownloadError> {
        let filename = sanitize_filename(&record.filename).ok_or_else(|| {
            DownloadError::InvalidRecord {
                id: record.id,
                filename: record.filename.clone(),
            }
        })?;
        Ok(destination_dir.join(filename))
    }

    /// Downloads `record` into `destination_dir`, overwriting any existing
    /// file of the same name.
    ///
    /// `progress` gets an [`on_attempt`](ProgressSink::on_attempt) call per
    /// mirror that answers, a count of zero, then the cumulative byte count
    /// after every chunk. A zero-byte file therefore still reports `0`.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::InvalidRecord`] before any I/O if the filename is unusable
    /// - [`DownloadError::Storage`] if the directory cannot be created (no mirror is tried)
    /// - [`DownloadError::Exhausted`] with every attempt when all mirrors fail
    #[must_use = "download result contains the path to the downloaded file"]
    #[instrument(skip(self, record, progress), fields(id = record.id, file = %record.filename))]
    pub async fn download(
        &self,
        record: &Record,
        destination_dir: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<DownloadedFile, DownloadError> {
        let target = Self::destination_for(record, destination_dir)?;

        tokio::fs::create_dir_all(destination_dir)
            .await
            .map_err(|e| DownloadError::storage(destination_dir, e))?;

        let mut attempts = Vec::with_capacity(self.mirrors.len());
        for mirror in self.mirrors.iter() {
            match self.try_mirror(mirror, record, &target, progress).await {
                Ok(bytes) => {
                    info!(mirror, bytes, path = %target.display(), "download complete");
                    return Ok(DownloadedFile {
                        path: target,
                        bytes,
                        mirror: mirror.to_string(),
                    });
                }
                Err(error) => {
                    warn!(mirror, error = %error, "mirror failed, trying next");
                    attempts.push(MirrorFailure {
                        mirror: mirror.to_string(),
                        error,
                    });
                }
            }
        }

        Err(DownloadError::Exhausted {
            filename: record.filename.clone(),
            attempts,
        })
    }

    async fn try_mirror(
        &self,
        mirror: &str,
        record: &Record,
        target: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<u64, MirrorError> {
        let url = mirror_url(mirror, &record.dir, &record.filename)?;
        debug!(url = %url, "requesting file from mirror");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| MirrorError::from_reqwest(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MirrorError::http_status(url.as_str(), status.as_u16()));
        }

        progress.on_attempt(mirror, response.content_length());

        let file = File::create(target)
            .await
            .map_err(|e| MirrorError::io(target, e))?;

        match stream_to_file(file, response, url.as_str(), target, progress).await {
            Ok(bytes) => Ok(bytes),
            Err(error) => {
                if let Err(cleanup) = tokio::fs::remove_file(target).await {
                    debug!(path = %target.display(), error = %cleanup, "could not remove partial file");
                }
                Err(error)
            }
        }
    }
}

async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    url: &str,
    target: &Path,
    progress: &dyn ProgressSink,
) -> Result<u64, MirrorError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;
    progress.on_progress(0);

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| MirrorError::from_reqwest(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| MirrorError::io(target, e))?;

        bytes_written += chunk.len() as u64;
        progress.on_progress(bytes_written);
    }

    writer
        .flush()
        .await
        .map_err(|e| MirrorError::io(target, e))?;

    Ok(bytes_written)
}

/// `{mirror}/{dir}/{filename}`, with each path segment percent-encoded.
pub(crate) fn mirror_url(mirror: &str, dir: &str, filename: &str) -> Result<Url, MirrorError> {
    let mut url = Url::parse(mirror).map_err(|_| MirrorError::invalid_url(mirror))?;
    url.path_segments_mut()
        .map_err(|()| MirrorError::invalid_url(mirror))?
        .pop_if_empty()
        .extend(dir.split('/').filter(|segment| !segment.is_empty()))
        .push(filename);
    Ok(url)
}

/// Final path component of `filename`, or `None` if nothing usable remains.
pub(crate) fn sanitize_filename(filename: &str) -> Option<&str> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    match name {
        "" | "." | ".." => None,
        name => Some(name),
    }
}
