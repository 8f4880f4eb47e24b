//! Search command handler: multi-field search printed as a ranked table.

use anyhow::{Context, Result, bail};
use idgames_core::browser::DEFAULT_SEARCH_FIELDS;
use idgames_core::{ApiClient, search_across_fields};
use tracing::warn;

use crate::app_config::Settings;
use crate::cli::SearchArgs;
use crate::output;

pub async fn run_search_command(settings: &Settings, args: &SearchArgs) -> Result<()> {
    let client = ApiClient::new(&settings.archive).context("Failed to create API client")?;
    let fields = if args.fields.is_empty() {
        DEFAULT_SEARCH_FIELDS.to_vec()
    } else {
        args.fields.clone()
    };

    let mut aggregated =
        search_across_fields(&client, &args.query, &fields, args.sort, args.direction).await;

    if aggregated.all_failed() {
        let first = aggregated.failures.remove(0);
        bail!(
            "Search for '{}' failed ({} field): {}",
            args.query,
            first.field,
            first.error
        );
    }
    for failure in &aggregated.failures {
        warn!(field = %failure.field, error = %failure.error, "search field failed; results are partial");
    }

    if aggregated.records.is_empty() {
        println!("No files matched '{}'.", args.query);
        return Ok(());
    }

    let width = output::terminal_width();
    for record in &aggregated.records {
        println!("{}", output::render_record_row(record, width));
    }
    println!("{} result(s)", aggregated.records.len());
    Ok(())
}
