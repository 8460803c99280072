use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use kubestream_k8s::DEFAULT_TAIL_LINES;
use kubestream_logs::DEFAULT_CAPACITY;

use crate::cli::Args;

const DEFAULT_TICK_RATE_MS: u64 = 100;

/// Optional settings file; every field may be overridden on the command line
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub context: Option<String>,
    pub namespace: Option<String>,
    pub buffer_size: Option<usize>,
    pub tail_lines: Option<i64>,
    pub tick_rate_ms: Option<u64>,
    pub export_dir: Option<PathBuf>,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid config file")
    }
}

/// Read the config file
///
/// An explicit path must exist; the default location is optional.
pub fn load(path: Option<&Path>) -> Result<FileConfig> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => match default_path() {
            Some(path) => (path, false),
            None => return Ok(FileConfig::default()),
        },
    };

    match std::fs::read_to_string(&path) {
        Ok(text) => FileConfig::parse(&text).with_context(|| path.display().to_string()),
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
            Ok(FileConfig::default())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

fn default_path() -> Option<PathBuf> {
    let base = dirs::config_dir()?;
    Some(base.join("kubestream").join("config.toml"))
}

/// Effective settings after layering CLI over file over defaults
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub context: Option<String>,
    pub namespace: Option<String>,
    pub pod: String,
    pub container: Option<String>,
    pub since_seconds: Option<i64>,
    pub buffer_size: usize,
    pub tail_lines: i64,
    pub tick_rate: Duration,
    pub export_dir: PathBuf,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    pub fn resolve(args: Args, file: FileConfig) -> Self {
        Self {
            context: args.context.or(file.context),
            namespace: args.namespace.or(file.namespace),
            pod: args.pod,
            container: args.container,
            since_seconds: args.since,
            buffer_size: args
                .buffer_size
                .or(file.buffer_size)
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_CAPACITY),
            tail_lines: args
                .tail_lines
                .or(file.tail_lines)
                .unwrap_or(DEFAULT_TAIL_LINES),
            tick_rate: Duration::from_millis(file.tick_rate_ms.unwrap_or(DEFAULT_TICK_RATE_MS)),
            export_dir: args
                .export_dir
                .or(file.export_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
            log_file: args.log_file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["kubestream", "api-0"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(args(&[]), FileConfig::default());
        assert_eq!(settings.buffer_size, 5_000);
        assert_eq!(settings.tail_lines, 100);
        assert_eq!(settings.tick_rate, Duration::from_millis(100));
        assert_eq!(settings.export_dir, PathBuf::from("."));
        assert!(settings.context.is_none());
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = FileConfig::parse(
            r#"
            context = "staging"
            namespace = "web"
            buffer_size = 2000
            tail_lines = 10
            tick_rate_ms = 250
            "#,
        )
        .unwrap();

        let settings = Settings::resolve(args(&["--context", "prod", "--tail-lines", "500"]), file);
        assert_eq!(settings.context.as_deref(), Some("prod"));
        assert_eq!(settings.namespace.as_deref(), Some("web"));
        assert_eq!(settings.buffer_size, 2000);
        assert_eq!(settings.tail_lines, 500);
        assert_eq!(settings.tick_rate, Duration::from_millis(250));
    }

    #[test]
    fn test_zero_buffer_falls_back() {
        let settings = Settings::resolve(args(&["--buffer-size", "0"]), FileConfig::default());
        assert_eq!(settings.buffer_size, DEFAULT_CAPACITY);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(FileConfig::parse("buffer = 10").is_err());
        assert_eq!(FileConfig::parse("").unwrap(), FileConfig::default());
    }

    #[test]
    fn test_default_path_under_config_dir() {
        if let Some(base) = dirs::config_dir() {
            assert_eq!(
                default_path(),
                Some(base.join("kubestream").join("config.toml"))
            );
        }
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let missing = std::env::temp_dir().join("kubestream-no-such-config.toml");
        assert!(load(Some(&missing)).is_err());
    }
}
