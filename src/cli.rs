//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use idgames_core::api::{SearchField, SortDirection, SortKey};

/// Search, inspect and download files from the idGames archive.
///
/// Without a subcommand, opens the interactive browser.
#[derive(Parser, Debug)]
#[command(name = "idgames")]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory downloads are saved to
    #[arg(short = 'd', long, global = true, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,

    /// Metadata API endpoint
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Mirror base URL; repeat to try several in order
    #[arg(long = "mirror", value_name = "URL")]
    pub mirrors: Vec<String>,
}

impl Cli {
    /// Global options, with mirrors given after the subcommand appended to
    /// the ones given before it.
    #[must_use]
    pub fn merged_global(&self) -> GlobalArgs {
        let mut global = self.global.clone();
        let trailing = match &self.command {
            Some(Command::Browse(extra) | Command::Config(extra)) => Some(extra),
            Some(Command::Download(args)) => Some(&args.mirror),
            _ => None,
        };
        if let Some(extra) = trailing {
            global.mirrors.extend(extra.mirrors.iter().cloned());
        }
        global
    }
}

/// Mirrors accepted after the subcommands that use them.
#[derive(Args, Debug, Clone, Default)]
pub struct MirrorArgs {
    /// Mirror base URL, tried after any given before the subcommand
    #[arg(long = "mirror", value_name = "URL")]
    pub mirrors: Vec<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Open the interactive browser (default)
    Browse(MirrorArgs),

    /// Search one or more fields and print ranked results
    Search(SearchArgs),

    /// List the newest uploads
    Latest(LatestArgs),

    /// Show full details for one file
    Get(LookupArgs),

    /// Download one file, trying each mirror in turn
    Download(DownloadArgs),

    /// Show the resolved configuration
    Config(MirrorArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Search text (at least 3 characters)
    pub query: String,

    /// Field to search; repeat for several (default: title and author)
    #[arg(short = 'f', long = "field", value_name = "FIELD")]
    pub fields: Vec<SearchField>,

    /// Server-side sort key (date, filename, size, rating)
    #[arg(long)]
    pub sort: Option<SortKey>,

    /// Server-side sort direction (asc, desc)
    #[arg(long = "dir")]
    pub direction: Option<SortDirection>,
}

#[derive(Args, Debug, Clone)]
pub struct LatestArgs {
    /// Number of files to list (1-1000; default from config)
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub limit: Option<u32>,

    /// Only list files older than this id
    #[arg(long, default_value_t = 0)]
    pub start_id: u64,
}

/// Selects a file by numeric id or archive path.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct LookupArgs {
    /// Archive file id
    #[arg(long)]
    pub id: Option<u64>,

    /// Archive-relative path, e.g. levels/doom2/m-o/mm2.zip
    #[arg(long)]
    pub file: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub lookup: LookupArgs,

    #[command(flatten)]
    pub mirror: MirrorArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let cli = Cli::try_parse_from(["idgames"]).unwrap();
        assert_eq!(cli.global.verbose, 0);
        assert!(!cli.global.quiet);
        assert!(cli.global.mirrors.is_empty());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let cli = Cli::try_parse_from(["idgames", "-v"]).unwrap();
        assert_eq!(cli.global.verbose, 1);

        let cli = Cli::try_parse_from(["idgames", "-vv"]).unwrap();
        assert_eq!(cli.global.verbose, 2);

        let cli = Cli::try_parse_from(["idgames", "latest", "--verbose", "--verbose"]).unwrap();
        assert_eq!(cli.global.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let cli = Cli::try_parse_from(["idgames", "-q", "config"]).unwrap();
        assert!(cli.global.quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Cli::try_parse_from(["idgames", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Cli::try_parse_from(["idgames", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Cli::try_parse_from(["idgames", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_mirror_flag_repeats_in_order() {
        let cli = Cli::try_parse_from([
            "idgames",
            "--mirror",
            "https://a.example",
            "download",
            "--id",
            "5",
            "--mirror",
            "https://b.example",
        ])
        .unwrap();
        assert_eq!(
            cli.merged_global().mirrors,
            vec!["https://a.example", "https://b.example"]
        );
        let Some(Command::Download(args)) = cli.command else {
            panic!("expected download command");
        };
        assert_eq!(args.lookup.id, Some(5));
    }

    #[test]
    fn test_cli_mirror_flag_only_before_or_after_subcommand() {
        let before = Cli::try_parse_from(["idgames", "--mirror", "https://a.example", "config"]).unwrap();
        assert_eq!(before.merged_global().mirrors, vec!["https://a.example"]);

        let after = Cli::try_parse_from(["idgames", "browse", "--mirror", "https://b.example"]).unwrap();
        assert!(after.global.mirrors.is_empty());
        assert_eq!(after.merged_global().mirrors, vec!["https://b.example"]);

        assert!(Cli::try_parse_from(["idgames", "search", "doom", "--mirror", "https://c.example"]).is_err());
    }

    #[test]
    fn test_cli_search_parses_fields_and_sort() {
        let cli = Cli::try_parse_from([
            "idgames", "search", "memento", "-f", "title", "--field", "AUTHOR", "--sort", "rating",
            "--dir", "desc",
        ])
        .unwrap();
        let Some(Command::Search(args)) = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(args.query, "memento");
        assert_eq!(args.fields, vec![SearchField::Title, SearchField::Author]);
        assert_eq!(args.sort, Some(SortKey::Rating));
        assert_eq!(args.direction, Some(SortDirection::Desc));
    }

    #[test]
    fn test_cli_search_rejects_unknown_field() {
        let err = Cli::try_parse_from(["idgames", "search", "doom", "-f", "colour"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_latest_limit_range() {
        let cli = Cli::try_parse_from(["idgames", "latest", "-n", "20"]).unwrap();
        let Some(Command::Latest(args)) = cli.command else {
            panic!("expected latest command");
        };
        assert_eq!(args.limit, Some(20));
        assert_eq!(args.start_id, 0);

        assert!(Cli::try_parse_from(["idgames", "latest", "-n", "0"]).is_err());
        assert!(Cli::try_parse_from(["idgames", "latest", "-n", "1001"]).is_err());
    }

    #[test]
    fn test_cli_lookup_requires_exactly_one_selector() {
        assert!(Cli::try_parse_from(["idgames", "get"]).is_err());
        assert!(Cli::try_parse_from(["idgames", "get", "--id", "1", "--file", "a.zip"]).is_err());

        let cli = Cli::try_parse_from(["idgames", "get", "--file", "levels/doom/a.zip"]).unwrap();
        let Some(Command::Get(args)) = cli.command else {
            panic!("expected get command");
        };
        assert_eq!(args.file.as_deref(), Some("levels/doom/a.zip"));
        assert_eq!(args.id, None);
    }
}
