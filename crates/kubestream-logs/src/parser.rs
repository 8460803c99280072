use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use xxhash_rust::xxh3::xxh3_64;

use kubestream_types::{LogLevel, LogRecord, RecordKind, Timestamp};

use crate::timestamp;

/// nginx combined access log, optionally followed by `"$http_x_forwarded_for"`
static NGINX_ACCESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(\S+) \S+ \S+ \[([^\]]+)\] "([^"]*)" (\d{3}) (\d+|-) "([^"]*)" "([^"]*)"(?: "([^"]*)")?\s*$"#,
    )
    .expect("nginx access pattern should compile")
});

/// Field names checked, in order, when a line is a JSON object
const JSON_TIMESTAMP_FIELDS: [&str; 3] = ["timestamp", "time", "ts"];
const JSON_LEVEL_FIELDS: [&str; 3] = ["level", "lvl", "severity"];
const JSON_MESSAGE_FIELDS: [&str; 2] = ["message", "msg"];

/// Content-derived record id: identical `(pod, line)` pairs give identical ids
pub fn record_id(pod_name: &str, raw: &str) -> String {
    format!("{}-{:016x}", pod_name, xxh3_64(raw.as_bytes()))
}

/// Fields pulled out of an nginx access line
#[derive(Debug, PartialEq, Eq)]
struct AccessLine<'a> {
    ip: &'a str,
    time: &'a str,
    request: &'a str,
    status: u16,
    size: &'a str,
}

/// Log parser for extracting structure from raw log lines
pub struct LogParser;

impl LogParser {
    /// Parse a raw log line into a LogRecord
    ///
    /// Never fails: anything unrecognized stays as plain text with an
    /// approximate timestamp.
    pub fn parse(raw: &str, pod_name: &str, sequence: u64) -> LogRecord {
        let (timestamp, has_real_timestamp, body) = match timestamp::extract_prefix(raw) {
            Some(m) => (m.timestamp, true, Some(m.rest.trim())),
            None => (Timestamp::now(), false, None),
        };

        let mut record = LogRecord {
            id: record_id(pod_name, raw),
            sequence,
            timestamp,
            has_real_timestamp,
            pod_name: Some(pod_name.to_string()),
            level: LogLevel::Info,
            message: body.unwrap_or(raw).to_string(),
            raw: raw.to_string(),
            ip: None,
            kind: RecordKind::Log,
        };

        // Kubelet prefixes every line when timestamps=true, so structured
        // payloads usually sit behind the stripped prefix.
        let mut level_from_source = false;

        if let Some(access) = Self::parse_access_line(raw).or_else(|| body.and_then(Self::parse_access_line)) {
            Self::apply_access_line(&mut record, &access);
            level_from_source = true;
        }

        if let Some(object) = Self::parse_json_object(raw).or_else(|| body.and_then(Self::parse_json_object)) {
            level_from_source |= Self::apply_json(&mut record, &object);
        }

        if !level_from_source {
            if let Some(level) = Self::infer_level(&record.message) {
                record.level = level;
            }
        }

        record
    }

    fn parse_access_line(line: &str) -> Option<AccessLine<'_>> {
        let caps = NGINX_ACCESS.captures(line)?;

        Some(AccessLine {
            ip: caps.get(1)?.as_str(),
            time: caps.get(2)?.as_str(),
            request: caps.get(3)?.as_str(),
            status: caps.get(4)?.as_str().parse().ok()?,
            size: caps.get(5)?.as_str(),
        })
    }

    fn apply_access_line(record: &mut LogRecord, access: &AccessLine<'_>) {
        record.ip = Some(access.ip.to_string());
        if let Some(ts) = timestamp::normalize_nginx(access.time) {
            record.timestamp = ts;
            record.has_real_timestamp = true;
        }
        record.message = format!("{} {} {}", access.request, access.status, access.size);
        record.level = if access.status >= 400 {
            LogLevel::Error
        } else {
            LogLevel::Info
        };
    }

    fn parse_json_object(line: &str) -> Option<Map<String, Value>> {
        let trimmed = line.trim();
        if !trimmed.starts_with('{') {
            return None;
        }

        match serde_json::from_str::<Value>(trimmed).ok()? {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Apply JSON fields; returns whether an explicit level was recognized
    fn apply_json(record: &mut LogRecord, fields: &Map<String, Value>) -> bool {
        let ts = JSON_TIMESTAMP_FIELDS
            .iter()
            .filter_map(|key| fields.get(*key))
            .find_map(|value| match value {
                Value::String(s) => timestamp::parse_standalone(s),
                Value::Number(n) => n.as_f64().and_then(timestamp::from_epoch),
                _ => None,
            });
        if let Some(ts) = ts {
            record.timestamp = ts;
            record.has_real_timestamp = true;
        }

        if let Some(message) = JSON_MESSAGE_FIELDS
            .iter()
            .find_map(|key| fields.get(*key).and_then(Value::as_str))
        {
            record.message = message.to_string();
        }

        let level = JSON_LEVEL_FIELDS
            .iter()
            .filter_map(|key| fields.get(*key))
            .find_map(|value| match value {
                Value::String(s) => LogLevel::from_label(s),
                Value::Number(n) => n.as_u64().map(LogLevel::from_number),
                _ => None,
            });

        match level {
            Some(level) => {
                record.level = level;
                true
            }
            None => false,
        }
    }

    /// Keyword-based level, case-insensitive, highest severity first
    pub fn infer_level(message: &str) -> Option<LogLevel> {
        let lower = message.to_lowercase();

        if lower.contains("error") || lower.contains("fatal") {
            Some(LogLevel::Error)
        } else if lower.contains("warn") {
            Some(LogLevel::Warning)
        } else if lower.contains("debug") {
            Some(LogLevel::Debug)
        } else {
            None
        }
    }
}
