//! Config command handler: show effective configuration.

use anyhow::Result;

use crate::app_config::{LoadedConfig, Settings};

pub fn run_config_show_command(loaded: &LoadedConfig, settings: &Settings) -> Result<()> {
    let resolved_path = loaded.path.as_ref().map_or_else(
        || "<unresolved>".to_string(),
        |path| path.display().to_string(),
    );
    println!("config_path = {resolved_path}");
    println!(
        "config_file = {}",
        if loaded.loaded_from_file() {
            "loaded"
        } else {
            "not found (using defaults)"
        }
    );
    println!("download_dir = {}", settings.download_dir.display());
    println!("api_url = {}", settings.archive.api_url);
    let mirrors: Vec<String> = settings
        .archive
        .mirrors
        .iter()
        .map(|mirror| format!("\"{mirror}\""))
        .collect();
    println!("mirrors = [{}]", mirrors.join(", "));
    println!("latest_limit = {}", settings.latest_limit);
    println!(
        "api_timeouts = {}s connect / {}s read",
        settings.archive.api_connect_timeout_secs, settings.archive.api_read_timeout_secs
    );
    println!(
        "download_timeouts = {}s connect / {}s read",
        settings.archive.download_connect_timeout_secs,
        settings.archive.download_read_timeout_secs
    );
    if let Some(verbosity) = loaded.config.as_ref().and_then(|cfg| cfg.verbosity) {
        println!("verbosity = {}", verbosity.as_str());
    }
    Ok(())
}
