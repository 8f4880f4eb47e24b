//! Download command handler: fetch metadata, then stream the file from the
//! first mirror that delivers it.

use anyhow::{Context, Result};
use idgames_core::download::{MirrorDownloader, ProgressSink};
use idgames_core::ApiClient;
use indicatif::{ProgressBar, ProgressStyle};

use super::lookup_from_args;
use crate::app_config::Settings;
use crate::cli::LookupArgs;
use crate::output::format_size;

/// Drives an `indicatif` bar from download callbacks.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        Self { bar }
    }
}

impl ProgressSink for BarProgress {
    fn on_attempt(&self, mirror: &str, expected_len: Option<u64>) {
        self.bar.reset();
        match expected_len {
            Some(total) => {
                self.bar.set_length(total);
                if let Ok(style) = ProgressStyle::with_template(
                    "{msg} [{bar:30}] {bytes}/{total_bytes} ({bytes_per_sec})",
                ) {
                    self.bar.set_style(style.progress_chars("=> "));
                }
            }
            None => {
                if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} {bytes} ({bytes_per_sec})") {
                    self.bar.set_style(style);
                }
            }
        }
        self.bar.set_message(mirror.to_string());
    }

    fn on_progress(&self, bytes_so_far: u64) {
        self.bar.set_position(bytes_so_far);
    }
}

pub async fn run_download_command(settings: &Settings, args: &LookupArgs, quiet: bool) -> Result<()> {
    let client = ApiClient::new(&settings.archive).context("Failed to create API client")?;
    let record = client
        .fetch(&lookup_from_args(args))
        .await
        .context("Failed to fetch file details")?;

    let downloader =
        MirrorDownloader::new(&settings.archive).context("Failed to create download client")?;
    let progress = BarProgress::new(quiet);
    let result = downloader
        .download(&record, &settings.download_dir, &progress)
        .await;
    progress.bar.finish_and_clear();

    let file = result.with_context(|| format!("Could not download {}", record.filename))?;
    println!(
        "Saved {} ({} from {})",
        file.path.display(),
        format_size(file.bytes),
        file.mirror
    );
    Ok(())
}
