//! CLI command handlers.

mod config;
mod download;
mod get;
mod latest;
mod search;

pub use config::run_config_show_command;
pub use download::run_download_command;
pub use get::run_get_command;
pub use latest::run_latest_command;
pub use search::run_search_command;

use idgames_core::FileLookup;

use crate::cli::LookupArgs;

fn lookup_from_args(args: &LookupArgs) -> FileLookup {
    FileLookup {
        id: args.id,
        path: args.file.clone(),
    }
}
