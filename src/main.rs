//! CLI entry point for the idgames archive browser.

use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use clap::Parser;
use idgames_core::{ApiClient, BrowserController, DownloadedFile, MirrorDownloader, Record};
use tracing::{debug, info};

mod app_config;
mod cli;
mod commands;
mod output;
mod tui;

use app_config::{Settings, VerbositySetting, load_default_file_config};
use cli::{Cli, Command, GlobalArgs, MirrorArgs};

const BROWSER_LOG_FILE: &str = "idgames.log";

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    let loaded = load_default_file_config()?;
    let file_verbosity = loaded.config.as_ref().and_then(|cfg| cfg.verbosity);
    let command = cli.command.clone().unwrap_or(Command::Browse(MirrorArgs::default()));
    let default_level = default_log_level(&cli.global, file_verbosity);

    if matches!(command, Command::Browse(_)) {
        let log_path = init_file_tracing(default_level)?;
        info!(path = %log_path.display(), "browser logging to file");
    } else {
        init_tracing(default_level);
    }
    debug!(?cli, "CLI arguments parsed");

    let settings = Settings::resolve(&cli.merged_global(), loaded.config.as_ref());
    debug!(?settings, "settings resolved");

    match command {
        Command::Browse(_) => run_browser(&settings).await,
        Command::Search(args) => commands::run_search_command(&settings, &args).await,
        Command::Latest(args) => commands::run_latest_command(&settings, &args).await,
        Command::Get(args) => commands::run_get_command(&settings, &args).await,
        Command::Download(args) => {
            commands::run_download_command(&settings, &args.lookup, cli.global.quiet).await
        }
        Command::Config(_) => commands::run_config_show_command(&loaded, &settings),
    }
}

/// Log level when `RUST_LOG` is unset.
/// Priority: quiet flag > verbose flag > config file verbosity > info.
fn default_log_level(args: &GlobalArgs, file_verbosity: Option<VerbositySetting>) -> &'static str {
    if args.quiet {
        return "error";
    }
    match (args.verbose, file_verbosity) {
        (0, Some(VerbositySetting::Quiet)) => "error",
        (0, Some(VerbositySetting::Verbose)) | (1, _) => "debug",
        (0, Some(VerbositySetting::Debug)) => "trace",
        (0, _) => "info",
        _ => "trace",
    }
}

fn env_filter(default_level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level))
}

fn init_tracing(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_env_filter(env_filter(default_level))
        .try_init();
}

/// The browser owns the terminal, so its logs go to a file instead.
fn init_file_tracing(default_level: &str) -> Result<PathBuf> {
    let path = std::env::temp_dir().join(BROWSER_LOG_FILE);
    let file = File::create(&path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let _ = tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_env_filter(env_filter(default_level))
        .try_init();
    Ok(path)
}

async fn run_browser(settings: &Settings) -> Result<()> {
    if !io::stdout().is_terminal() {
        bail!("The interactive browser needs a terminal; use a subcommand such as 'search' or 'latest'");
    }

    let client = ApiClient::new(&settings.archive).context("Failed to create API client")?;
    let downloader =
        MirrorDownloader::new(&settings.archive).context("Failed to create download client")?;
    let controller = BrowserController::new(
        Arc::new(client),
        Arc::new(downloader),
        settings.download_dir.clone(),
    )
    .with_latest_limit(settings.latest_limit)
    .with_post_download(Box::new(|record: &Record, file: &DownloadedFile| {
        info!(id = record.id, path = %file.path.display(), mirror = %file.mirror, "download saved");
    }));

    tui::run(controller).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(verbose: u8, quiet: bool) -> GlobalArgs {
        GlobalArgs {
            verbose,
            quiet,
            ..GlobalArgs::default()
        }
    }

    #[test]
    fn test_default_log_level_flags() {
        assert_eq!(default_log_level(&args(0, false), None), "info");
        assert_eq!(default_log_level(&args(1, false), None), "debug");
        assert_eq!(default_log_level(&args(2, false), None), "trace");
        assert_eq!(default_log_level(&args(2, true), None), "error");
    }

    #[test]
    fn test_default_log_level_file_setting_applies_without_flags() {
        assert_eq!(
            default_log_level(&args(0, false), Some(VerbositySetting::Verbose)),
            "debug"
        );
        assert_eq!(
            default_log_level(&args(0, false), Some(VerbositySetting::Quiet)),
            "error"
        );
        assert_eq!(
            default_log_level(&args(0, false), Some(VerbositySetting::Default)),
            "info"
        );
        assert_eq!(
            default_log_level(&args(1, false), Some(VerbositySetting::Quiet)),
            "debug"
        );
    }
}
