//! Shared types for kubestream
//!
//! This crate contains data structures used across multiple kubestream crates.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use ratatui::style::Color;

// ============================================================================
// Session Types
// ============================================================================

/// Container name used in session keys when none was requested
pub const DEFAULT_CONTAINER: &str = "default";

/// Identifies at most one live tailing session
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub connection_id: String,
    pub namespace: String,
    pub pod_name: String,
    pub container_name: String,
}

impl SessionKey {
    pub fn new(
        connection_id: impl Into<String>,
        namespace: impl Into<String>,
        pod_name: impl Into<String>,
        container_name: Option<&str>,
    ) -> Self {
        Self {
            connection_id: connection_id.into(),
            namespace: namespace.into(),
            pod_name: pod_name.into(),
            container_name: container_name.unwrap_or(DEFAULT_CONTAINER).to_string(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.connection_id, self.namespace, self.pod_name, self.container_name
        )
    }
}

/// Process-unique session identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Events emitted by a live session, in transport order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// A raw chunk of bytes, not necessarily aligned to line boundaries
    Data {
        session_id: SessionId,
        pod_name: String,
        chunk: Vec<u8>,
    },
    /// The transport failed; the session is over
    Error { session_id: SessionId, message: String },
    /// The server closed the stream
    End { session_id: SessionId },
}

impl StreamEvent {
    pub fn session_id(&self) -> SessionId {
        match self {
            Self::Data { session_id, .. }
            | Self::Error { session_id, .. }
            | Self::End { session_id } => *session_id,
        }
    }

    /// Whether this event closes its session
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error { .. } | Self::End { .. })
    }
}

// ============================================================================
// Log Types
// ============================================================================

/// Time range for the initial log window
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TimeRange {
    /// Show all available logs (uses tail_lines)
    #[default]
    All,
    Last5m,
    Last15m,
    Last30m,
    Last1h,
    Last6h,
    Last24h,
}

impl TimeRange {
    /// Get the number of seconds for this time range
    pub fn as_seconds(&self) -> Option<i64> {
        match self {
            Self::All => None,
            Self::Last5m => Some(5 * 60),
            Self::Last15m => Some(15 * 60),
            Self::Last30m => Some(30 * 60),
            Self::Last1h => Some(60 * 60),
            Self::Last6h => Some(6 * 60 * 60),
            Self::Last24h => Some(24 * 60 * 60),
        }
    }

    /// Pick the range matching a `--since` value in seconds
    pub fn from_seconds(seconds: Option<i64>) -> Self {
        match seconds {
            None => Self::All,
            Some(s) if s <= 5 * 60 => Self::Last5m,
            Some(s) if s <= 15 * 60 => Self::Last15m,
            Some(s) if s <= 30 * 60 => Self::Last30m,
            Some(s) if s <= 60 * 60 => Self::Last1h,
            Some(s) if s <= 6 * 60 * 60 => Self::Last6h,
            Some(_) => Self::Last24h,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Last5m => "5m",
            Self::Last15m => "15m",
            Self::Last30m => "30m",
            Self::Last1h => "1h",
            Self::Last6h => "6h",
            Self::Last24h => "24h",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Self::All => Self::Last5m,
            Self::Last5m => Self::Last15m,
            Self::Last15m => Self::Last30m,
            Self::Last30m => Self::Last1h,
            Self::Last1h => Self::Last6h,
            Self::Last6h => Self::Last24h,
            Self::Last24h => Self::All,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Self::All => Self::Last24h,
            Self::Last5m => Self::All,
            Self::Last15m => Self::Last5m,
            Self::Last30m => Self::Last15m,
            Self::Last1h => Self::Last30m,
            Self::Last6h => Self::Last1h,
            Self::Last24h => Self::Last6h,
        }
    }
}

/// Log severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum LogLevel {
    Error,
    Warning,
    Debug,
    Trace,
    #[default]
    Info,
}

impl LogLevel {
    /// Parse an explicit level label as written by structured loggers
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" | "trc" | "trce" => Some(Self::Trace),
            "debug" | "dbg" | "debg" => Some(Self::Debug),
            "info" | "inf" | "information" | "notice" => Some(Self::Info),
            "warn" | "warning" | "wrn" => Some(Self::Warning),
            "error" | "err" | "erro" | "fatal" | "panic" | "critical" | "crit" | "ftl" => {
                Some(Self::Error)
            }
            _ => None,
        }
    }

    /// Map pino/bunyan style numeric levels
    pub fn from_number(n: u64) -> Self {
        match n {
            0..=10 => Self::Trace,
            11..=20 => Self::Debug,
            21..=30 => Self::Info,
            31..=40 => Self::Warning,
            _ => Self::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Debug => "debug",
            Self::Trace => "trace",
            Self::Info => "info",
        }
    }

    /// Get display color for this level
    pub fn color(&self) -> Color {
        match self {
            Self::Trace => Color::DarkGray,
            Self::Debug => Color::Cyan,
            Self::Info => Color::Green,
            Self::Warning => Color::Yellow,
            Self::Error => Color::Red,
        }
    }

    /// Single-glyph marker shown in front of each row
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Error => "✖",
            Self::Warning => "▲",
            Self::Debug => "●",
            Self::Trace => "·",
            Self::Info => "ℹ",
        }
    }

    /// Short display string (3 chars)
    pub fn short(&self) -> &'static str {
        match self {
            Self::Trace => "TRC",
            Self::Debug => "DBG",
            Self::Info => "INF",
            Self::Warning => "WRN",
            Self::Error => "ERR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canonical UTC instant together with its ISO-8601 text
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timestamp {
    at: DateTime<Utc>,
    text: String,
}

impl Timestamp {
    /// Keep `text` verbatim as the canonical form of `at`
    pub fn verbatim(at: DateTime<Utc>, text: impl Into<String>) -> Self {
        Self {
            at,
            text: text.into(),
        }
    }

    /// Render `at` as `YYYY-MM-DDTHH:MM:SS.mmmZ`
    pub fn millis(at: DateTime<Utc>) -> Self {
        Self {
            at,
            text: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn now() -> Self {
        Self::millis(Utc::now())
    }

    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Where a record came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RecordKind {
    /// A line read from the pod
    #[default]
    Log,
    /// Inline marker for a failed stream
    StreamError,
    /// Inline marker for a stream the server closed
    StreamEnded,
}

/// A single parsed log line
#[derive(Clone, Debug)]
pub struct LogRecord {
    /// Content-derived identifier, stable across re-parsing
    pub id: String,

    /// Line number within the session's stream
    pub sequence: u64,

    pub timestamp: Timestamp,

    /// False when the timestamp was synthesized at parse time
    pub has_real_timestamp: bool,

    /// Source pod name (absent for system records)
    pub pod_name: Option<String>,

    pub level: LogLevel,

    /// Display text with any timestamp prefix stripped
    pub message: String,

    /// Original raw log line
    pub raw: String,

    /// Client address, only for nginx access lines
    pub ip: Option<String>,

    pub kind: RecordKind,
}

impl LogRecord {
    /// Build a marker record that did not come from the pod
    pub fn system(kind: RecordKind, level: LogLevel, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            id: format!("system-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default()),
            sequence: 0,
            timestamp: Timestamp::now(),
            has_real_timestamp: false,
            pod_name: None,
            level,
            raw: message.clone(),
            message,
            ip: None,
            kind,
        }
    }

    pub fn pod(&self) -> &str {
        self.pod_name.as_deref().unwrap_or_default()
    }

    pub fn is_system(&self) -> bool {
        self.kind != RecordKind::Log
    }
}

/// Output format for exported logs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Text,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => "log",
            Self::Csv => "csv",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_defaults_container() {
        let key = SessionKey::new("prod", "web", "api-7d9f", None);
        assert_eq!(key.container_name, DEFAULT_CONTAINER);
        assert_eq!(key.to_string(), "prod-web-api-7d9f-default");
    }

    #[test]
    fn test_level_labels() {
        assert_eq!(LogLevel::from_label("WARN"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::from_label("fatal"), Some(LogLevel::Error));
        assert_eq!(LogLevel::from_label("verbose"), None);
        assert_eq!(LogLevel::from_number(50), LogLevel::Error);
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_time_range_from_seconds() {
        assert_eq!(TimeRange::from_seconds(None), TimeRange::All);
        assert_eq!(TimeRange::from_seconds(Some(600)), TimeRange::Last15m);
        assert_eq!(TimeRange::from_seconds(Some(86_400 * 3)), TimeRange::Last24h);
    }
}
