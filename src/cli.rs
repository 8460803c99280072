use std::path::PathBuf;

use clap::Parser;

/// kubestream - tail, search, and export Kubernetes pod logs in the terminal
#[derive(Parser, Debug)]
#[command(name = "kubestream")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Pod to tail
    #[arg(value_name = "POD")]
    pub pod: String,

    /// Namespace (defaults to the context's namespace, then "default")
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Kubernetes context name (defaults to the current context)
    #[arg(long)]
    pub context: Option<String>,

    /// Container within the pod
    #[arg(short, long)]
    pub container: Option<String>,

    /// Only show logs newer than this, e.g. 300, 90s, 15m, 1h 30m
    #[arg(long, value_parser = parse_since)]
    pub since: Option<i64>,

    /// Maximum number of records kept in memory
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Number of historical log lines to fetch
    #[arg(long)]
    pub tail_lines: Option<i64>,

    /// Config file (defaults to ~/.config/kubestream/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory exports are written to
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Write diagnostics to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Parse a positive duration into whole seconds
///
/// Accepts humantime syntax (`90s`, `15m`, `1h 30m`, `2d`); a bare number is seconds.
pub fn parse_since(value: &str) -> Result<i64, String> {
    let value = value.trim();
    let text = if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}s", value)
    } else {
        value.to_string()
    };

    let duration = humantime::parse_duration(&text)
        .map_err(|e| format!("invalid duration '{}': {}", value, e))?;
    let seconds = i64::try_from(duration.as_secs())
        .map_err(|_| format!("duration out of range: '{}'", value))?;
    if seconds <= 0 {
        return Err(format!("duration must be at least one second: '{}'", value));
    }

    Ok(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pod_only() {
        let args = Args::try_parse_from(["kubestream", "api-7d9f"]).unwrap();
        assert_eq!(args.pod, "api-7d9f");
        assert!(args.namespace.is_none());
        assert!(args.context.is_none());
        assert!(args.since.is_none());
    }

    #[test]
    fn test_all_flags() {
        let args = Args::try_parse_from([
            "kubestream",
            "api-7d9f",
            "-n",
            "web",
            "--context",
            "prod",
            "-c",
            "app",
            "--since",
            "15m",
            "--buffer-size",
            "200",
            "--tail-lines",
            "50",
            "--export-dir",
            "/tmp/out",
        ])
        .unwrap();

        assert_eq!(args.namespace.as_deref(), Some("web"));
        assert_eq!(args.context.as_deref(), Some("prod"));
        assert_eq!(args.container.as_deref(), Some("app"));
        assert_eq!(args.since, Some(900));
        assert_eq!(args.buffer_size, Some(200));
        assert_eq!(args.tail_lines, Some(50));
        assert_eq!(args.export_dir, Some(PathBuf::from("/tmp/out")));
    }

    #[test]
    fn test_missing_pod_is_an_error() {
        assert!(Args::try_parse_from(["kubestream"]).is_err());
        assert!(Args::try_parse_from(["kubestream", "api", "--since", "soon"]).is_err());
    }

    #[test]
    fn test_parse_since() {
        assert_eq!(parse_since("300"), Ok(300));
        assert_eq!(parse_since("90s"), Ok(90));
        assert_eq!(parse_since("2h"), Ok(7200));
        assert_eq!(parse_since("1h 30m"), Ok(5400));
        assert_eq!(parse_since("1d"), Ok(86_400));
        assert!(parse_since("0").is_err());
        assert!(parse_since("500ms").is_err());
        assert!(parse_since("5x").is_err());
        assert!(parse_since("m").is_err());
    }

    #[test]
    fn test_parse_since_out_of_range() {
        assert!(parse_since("999999999999999999d").is_err());
        assert!(parse_since("10000000000000000000").is_err());
        assert!(parse_since("99999999999999999999999").is_err());
        assert!(Args::try_parse_from(["kubestream", "api", "--since", "999999999999999999d"]).is_err());
    }
}
