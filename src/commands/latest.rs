//! Latest command handler: newest uploads as a table.

use anyhow::{Context, Result};
use idgames_core::ApiClient;

use crate::app_config::Settings;
use crate::cli::LatestArgs;
use crate::output;

pub async fn run_latest_command(settings: &Settings, args: &LatestArgs) -> Result<()> {
    let client = ApiClient::new(&settings.archive).context("Failed to create API client")?;
    let limit = args.limit.unwrap_or(settings.latest_limit);
    let records = client
        .latest_files(limit, args.start_id)
        .await
        .context("Failed to list latest files")?;

    if records.is_empty() {
        println!("No files returned.");
        return Ok(());
    }

    let width = output::terminal_width();
    for record in &records {
        println!("{}", output::render_record_row(record, width));
    }
    Ok(())
}
