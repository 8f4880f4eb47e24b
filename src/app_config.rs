//! Application configuration loading for CLI defaults.
//!
//! Values are layered: command-line flags override the config file, which
//! overrides built-in defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use idgames_core::browser::DEFAULT_LATEST_LIMIT;
use idgames_core::config::{ArchiveConfig, MirrorList};

use crate::cli::GlobalArgs;

/// File configuration for idgames defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Directory downloads are saved to.
    pub download_dir: Option<PathBuf>,
    /// Metadata API endpoint.
    pub api_url: Option<String>,
    /// Mirror base URLs, in the order they are tried.
    pub mirrors: Option<Vec<String>>,
    /// Files listed when the browser search box is empty (1..=1000).
    pub latest_limit: Option<u32>,
    /// API connect timeout in seconds.
    pub api_connect_timeout_secs: Option<u64>,
    /// API read timeout in seconds.
    pub api_read_timeout_secs: Option<u64>,
    /// Mirror connect timeout in seconds.
    pub download_connect_timeout_secs: Option<u64>,
    /// Mirror read timeout in seconds.
    pub download_read_timeout_secs: Option<u64>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(limit) = self.latest_limit
            && !(1..=1000).contains(&limit)
        {
            bail!("Invalid config value for `latest_limit`: {limit}. Expected range: 1..=1000");
        }
        if let Some(mirrors) = &self.mirrors
            && mirrors.iter().all(|m| m.trim().is_empty())
        {
            bail!("Invalid config value for `mirrors`: at least one mirror is required");
        }
        validate_timeout_secs("api_connect_timeout_secs", self.api_connect_timeout_secs)?;
        validate_timeout_secs("api_read_timeout_secs", self.api_read_timeout_secs)?;
        validate_timeout_secs(
            "download_connect_timeout_secs",
            self.download_connect_timeout_secs,
        )?;
        validate_timeout_secs(
            "download_read_timeout_secs",
            self.download_read_timeout_secs,
        )?;
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Returns the stable string label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Verbose => "verbose",
            Self::Quiet => "quiet",
            Self::Debug => "debug",
        }
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

impl LoadedConfig {
    /// Indicates whether configuration was loaded from disk.
    #[must_use]
    pub fn loaded_from_file(&self) -> bool {
        self.config.is_some()
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/idgames/config.toml`
/// 2. `$HOME/.config/idgames/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join("idgames").join("config.toml"));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("idgames")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if present.
pub fn load_default_file_config() -> Result<LoadedConfig> {
    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let invalid = || format!("Invalid `{key}` value on line {line_no}");

        match key {
            "download_dir" => {
                cfg.download_dir = Some(PathBuf::from(
                    parse_string_literal(value).with_context(invalid)?,
                ));
            }
            "api_url" => {
                cfg.api_url = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "mirrors" => {
                cfg.mirrors = Some(parse_string_array(value).with_context(invalid)?);
            }
            "latest_limit" => {
                let parsed = parse_integer_u64(value).with_context(invalid)?;
                let limit = u32::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("latest_limit out of range for u32"))
                    .with_context(invalid)?;
                cfg.latest_limit = Some(limit);
            }
            "api_connect_timeout_secs" => {
                cfg.api_connect_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "api_read_timeout_secs" => {
                cfg.api_read_timeout_secs = Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "download_connect_timeout_secs" => {
                cfg.download_connect_timeout_secs =
                    Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "download_read_timeout_secs" => {
                cfg.download_read_timeout_secs =
                    Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_no}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    let raw_value = raw_value.trim();
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

/// `["a", "b"]`; a trailing comma is allowed.
fn parse_string_array(raw_value: &str) -> Result<Vec<String>> {
    let Some(inner) = raw_value
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    else {
        bail!("Expected array of double-quoted strings");
    };

    let mut items = Vec::new();
    let mut in_string = false;
    let mut start = 0;
    for (index, ch) in inner.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            ',' if !in_string => {
                items.push(&inner[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    items.push(&inner[start..]);

    items
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse_string_literal)
        .collect()
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

/// Effective settings after layering flags, file and defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Endpoint, mirrors and timeouts handed to the library.
    pub archive: ArchiveConfig,
    /// Directory downloads are saved to.
    pub download_dir: PathBuf,
    /// Files listed when the browser search box is empty.
    pub latest_limit: u32,
}

impl Settings {
    /// Layers `args` over `file` over built-in defaults.
    #[must_use]
    pub fn resolve(args: &GlobalArgs, file: Option<&FileConfig>) -> Self {
        let file = file.cloned().unwrap_or_default();
        let defaults = ArchiveConfig::default();

        let api_url = args
            .api_url
            .clone()
            .or(file.api_url)
            .unwrap_or(defaults.api_url);
        let mirrors = if args.mirrors.is_empty() {
            file.mirrors.map_or(defaults.mirrors, MirrorList::new)
        } else {
            MirrorList::new(args.mirrors.iter().cloned())
        };

        let archive = ArchiveConfig::default()
            .with_api_url(api_url)
            .with_mirrors(mirrors)
            .with_api_timeouts(
                file.api_connect_timeout_secs
                    .unwrap_or(defaults.api_connect_timeout_secs),
                file.api_read_timeout_secs
                    .unwrap_or(defaults.api_read_timeout_secs),
            )
            .with_download_timeouts(
                file.download_connect_timeout_secs
                    .unwrap_or(defaults.download_connect_timeout_secs),
                file.download_read_timeout_secs
                    .unwrap_or(defaults.download_read_timeout_secs),
            );

        let download_dir = args
            .download_dir
            .clone()
            .or(file.download_dir)
            .unwrap_or_else(default_download_dir);

        Self {
            archive,
            download_dir,
            latest_limit: file.latest_limit.unwrap_or(DEFAULT_LATEST_LIMIT),
        }
    }
}

/// `$HOME/Downloads`, or the working directory when `HOME` is unset.
fn default_download_dir() -> PathBuf {
    env_var_non_empty_os("HOME").map_or_else(|| PathBuf::from("."), |home| PathBuf::from(home).join("Downloads"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::Cli;

    #[test]
    fn test_parse_config_partial_fields() {
        let cfg = parse_config_str(
            r#"
latest_limit = 25
verbosity = "verbose"
"#,
        )
        .expect("partial config should parse");
        assert_eq!(cfg.latest_limit, Some(25));
        assert_eq!(cfg.verbosity, Some(VerbositySetting::Verbose));
        assert!(cfg.download_dir.is_none());
    }

    #[test]
    fn test_parse_config_all_fields() {
        let cfg = parse_config_str(
            r#"
download_dir = "/srv/wads"
api_url = "http://localhost:8080/api.php"
mirrors = ["https://m1.example/idgames", "https://m2.example/pub/idgames",]
latest_limit = 100
api_connect_timeout_secs = 5
api_read_timeout_secs = 20
download_connect_timeout_secs = 15
download_read_timeout_secs = 600
verbosity = "quiet"
"#,
        )
        .expect("full config should parse");
        assert_eq!(cfg.download_dir, Some(PathBuf::from("/srv/wads")));
        assert_eq!(cfg.api_url.as_deref(), Some("http://localhost:8080/api.php"));
        assert_eq!(
            cfg.mirrors,
            Some(vec![
                "https://m1.example/idgames".to_string(),
                "https://m2.example/pub/idgames".to_string(),
            ])
        );
        assert_eq!(cfg.api_connect_timeout_secs, Some(5));
        assert_eq!(cfg.download_read_timeout_secs, Some(600));
    }

    #[test]
    fn test_parse_config_supports_inline_comments() {
        let cfg = parse_config_str(
            r#"
latest_limit = 10 # smaller pages
mirrors = ["https://m1.example/#frag"] # hash inside string is kept
"#,
        )
        .expect("config with comments should parse");
        assert_eq!(cfg.latest_limit, Some(10));
        assert_eq!(cfg.mirrors, Some(vec!["https://m1.example/#frag".to_string()]));
    }

    #[test]
    fn test_parse_config_rejects_invalid_latest_limit() {
        let err = parse_config_str("latest_limit = 0").expect_err("0 is below range");
        assert!(err.to_string().contains("latest_limit"));
    }

    #[test]
    fn test_parse_config_rejects_empty_mirror_list() {
        let err = parse_config_str("mirrors = []").expect_err("empty list rejected");
        assert!(err.to_string().contains("mirrors"));
    }

    #[test]
    fn test_parse_config_rejects_unquoted_mirror() {
        let err = parse_config_str("mirrors = [https://m1.example]").expect_err("unquoted item");
        assert!(format!("{err:#}").contains("mirrors"));
    }

    #[test]
    fn test_parse_config_rejects_invalid_timeout_value() {
        let err = parse_config_str("api_read_timeout_secs = 0").expect_err("invalid timeout expected");
        assert!(err.to_string().contains("api_read_timeout_secs"));
    }

    #[test]
    fn test_parse_config_rejects_numeric_values_with_trailing_tokens() {
        let err = parse_config_str("latest_limit = 4 trailing").expect_err("trailing token");
        assert!(err.to_string().contains("latest_limit"));
    }

    #[test]
    fn test_parse_config_rejects_unknown_keys() {
        let err = parse_config_str("concurrency = 4").expect_err("unknown key error expected");
        assert!(err.to_string().contains("Unknown configuration key"));
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn test_parse_config_rejects_missing_equals() {
        let err = parse_config_str("latest_limit 4").expect_err("syntax error expected");
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_verbosity_as_str() {
        assert_eq!(VerbositySetting::Default.as_str(), "default");
        assert_eq!(VerbositySetting::Verbose.as_str(), "verbose");
        assert_eq!(VerbositySetting::Quiet.as_str(), "quiet");
        assert_eq!(VerbositySetting::Debug.as_str(), "debug");
    }

    #[test]
    fn test_settings_flags_override_file_over_defaults() {
        let cli = Cli::try_parse_from([
            "idgames",
            "--mirror",
            "https://cli.example/m",
            "--download-dir",
            "/tmp/cli",
            "latest",
        ])
        .expect("args parse");
        let file = FileConfig {
            api_url: Some("http://file.example/api.php".to_string()),
            mirrors: Some(vec!["https://file.example/m".to_string()]),
            download_dir: Some(PathBuf::from("/tmp/file")),
            latest_limit: Some(20),
            api_read_timeout_secs: Some(7),
            ..FileConfig::default()
        };

        let settings = Settings::resolve(&cli.global, Some(&file));

        assert_eq!(settings.archive.api_url, "http://file.example/api.php");
        assert_eq!(
            settings.archive.mirrors.iter().collect::<Vec<_>>(),
            vec!["https://cli.example/m"]
        );
        assert_eq!(settings.download_dir, PathBuf::from("/tmp/cli"));
        assert_eq!(settings.latest_limit, 20);
        assert_eq!(settings.archive.api_read_timeout_secs, 7);
        assert_eq!(settings.archive.api_connect_timeout_secs, 10);
    }

    #[test]
    fn test_settings_without_file_use_defaults() {
        let cli = Cli::try_parse_from(["idgames"]).expect("args parse");
        let settings = Settings::resolve(&cli.global, None);
        assert_eq!(settings.archive, ArchiveConfig::default());
        assert_eq!(settings.latest_limit, DEFAULT_LATEST_LIMIT);
    }
}
