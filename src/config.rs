//! Configuration management for the component viewer language server.
//!
//! Handles:
//! - Command-line argument parsing
//! - Optional TOML configuration file
//!
//! Command-line values win over the file, the file wins over defaults.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::session::{SessionConfig, DEFAULT_FALLBACK_TIMEOUT};
use crate::target::{TargetRules, DEFAULT_EXCLUDE_PATTERN, DEFAULT_SCRIPT_PATTERN};

const CONFIG_DIR_NAME: &str = "angular-component-viewer";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Command-line arguments for the component viewer language server
#[derive(Debug, Default, Parser)]
#[command(name = "acv-ls")]
#[command(about = "Edit an Angular component's script, markup and style as one document")]
#[command(version)]
pub struct Args {
    /// Configuration file to load instead of the user default
    #[arg(long, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        help = "Seconds before an unclosed scratch document is cleaned up (default 50)"
    )]
    pub fallback_secs: Option<u64>,

    #[arg(long, help = "Do not watch scratch files for external removal")]
    pub no_watch: bool,

    /// Log level for the language server
    #[arg(
        long,
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}

/// Keys accepted in the configuration file
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub fallback_timeout_secs: Option<u64>,
    pub watch_external_removal: Option<bool>,
    pub script_pattern: Option<String>,
    pub exclude_pattern: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub session: SessionConfig,
    pub log_level: String,
    /// The configuration file that was loaded, if any
    pub config_path: Option<PathBuf>,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create configuration from explicit arguments (useful for testing)
    pub fn from_args(args: Args) -> Result<Self> {
        let config_path = match args.config {
            Some(path) => Some(path),
            None => default_config_path().filter(|path| path.exists()),
        };
        let file = match &config_path {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        Self::merge(args.fallback_secs, args.no_watch, args.log_level, file, config_path)
    }

    fn merge(
        fallback_secs: Option<u64>,
        no_watch: bool,
        log_level: String,
        file: FileConfig,
        config_path: Option<PathBuf>,
    ) -> Result<Self> {
        let fallback_timeout = fallback_secs
            .or(file.fallback_timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_FALLBACK_TIMEOUT);
        let watch_external_removal = !no_watch && file.watch_external_removal.unwrap_or(true);
        let rules = TargetRules::new(
            file.script_pattern.as_deref().unwrap_or(DEFAULT_SCRIPT_PATTERN),
            file.exclude_pattern.as_deref().unwrap_or(DEFAULT_EXCLUDE_PATTERN),
        )?;

        Ok(Config {
            session: SessionConfig {
                fallback_timeout,
                watch_external_removal,
                rules,
            },
            log_level,
            config_path,
        })
    }
}

/// `<config_dir>/angular-component-viewer/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config =
            Config::merge(None, false, "info".to_string(), FileConfig::default(), None).unwrap();
        assert_eq!(config.session.fallback_timeout, Duration::from_secs(50));
        assert!(config.session.watch_external_removal);
        assert!(config.session.rules.accepts(Path::new("a.component.ts")));
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = FileConfig::parse(
            r#"
fallback_timeout_secs = 10
watch_external_removal = true
"#,
        )
        .unwrap();
        let config = Config::merge(Some(3), true, "debug".to_string(), file, None).unwrap();
        assert_eq!(config.session.fallback_timeout, Duration::from_secs(3));
        assert!(!config.session.watch_external_removal);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_file_patterns() {
        let file = FileConfig::parse(
            r#"
fallback_timeout_secs = 10
script_pattern = '\.(ts|js)$'
exclude_pattern = '\.(spec|test)\.(ts|js)$'
"#,
        )
        .unwrap();
        let config = Config::merge(None, false, "info".to_string(), file, None).unwrap();
        assert_eq!(config.session.fallback_timeout, Duration::from_secs(10));
        assert!(config.session.rules.accepts(Path::new("foo.component.js")));
        assert!(!config.session.rules.accepts(Path::new("foo.test.js")));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(FileConfig::parse("fallback = 1").is_err());
    }

    #[test]
    fn test_load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acv.toml");
        std::fs::write(&path, "watch_external_removal = false\n").unwrap();

        let args = Args {
            config: Some(path.clone()),
            log_level: "info".to_string(),
            ..Default::default()
        };
        let config = Config::from_args(args).unwrap();
        assert!(!config.session.watch_external_removal);
        assert_eq!(config.config_path, Some(path));
    }
}
