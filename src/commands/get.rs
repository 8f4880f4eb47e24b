//! Get command handler: full detail for one file.

use anyhow::{Context, Result};
use idgames_core::ApiClient;

use super::lookup_from_args;
use crate::app_config::Settings;
use crate::cli::LookupArgs;
use crate::output;

pub async fn run_get_command(settings: &Settings, args: &LookupArgs) -> Result<()> {
    let client = ApiClient::new(&settings.archive).context("Failed to create API client")?;
    let record = client
        .fetch(&lookup_from_args(args))
        .await
        .context("Failed to fetch file details")?;

    for line in output::render_record_detail(&record) {
        println!("{line}");
    }
    Ok(())
}
