//! Recognition and normalization of log-line timestamps.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

use kubestream_types::Timestamp;

/// Timestamp shapes recognized at the start of a line, in priority order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimestampFamily {
    /// `2024-01-15T10:30:00.123Z` (1-6 fractional digits)
    IsoFractionalUtc,
    /// `2024-01-15T10:30:00Z`
    IsoUtc,
    /// `2024-01-15T10:30:00` or `2024-01-15T10:30:00.123`
    IsoNaive,
    /// `2024-01-15T10:30:00+02:00`, `2024-01-15T10:30:00.5-0700`
    Rfc3339Offset,
    /// `2024-01-15T10:30:00.123456789Z` (container runtime)
    IsoNanosUtc,
    /// `2024-01-15 10:30:00` or `2024-01-15 10:30:00.123`
    SpaceSeparated,
    /// `Jan 15 10:30:00`
    Syslog,
    /// `[2024-01-15T10:30:00Z]`
    BracketIso,
}

/// Later entries are more general; reordering lets them shadow earlier ones.
static FAMILIES: LazyLock<Vec<(TimestampFamily, Regex)>> = LazyLock::new(|| {
    use TimestampFamily::*;

    [
        (
            IsoFractionalUtc,
            r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{1,6}Z)(?:\s+|$)",
        ),
        (IsoUtc, r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z)(?:\s+|$)"),
        (
            IsoNaive,
            r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?)(?:\s+|$)",
        ),
        (
            Rfc3339Offset,
            r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?[+-]\d{2}:?\d{2})(?:\s+|$)",
        ),
        (
            IsoNanosUtc,
            r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{7,9}Z)(?:\s+|$)",
        ),
        (
            SpaceSeparated,
            r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}(?:[.,]\d+)?)(?:\s+|$)",
        ),
        (
            Syslog,
            r"^((?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec) {1,2}\d{1,2} \d{2}:\d{2}:\d{2})(?:\s+|$)",
        ),
        (
            BracketIso,
            r"^\[(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?Z)\](?:\s+|$)",
        ),
    ]
    .into_iter()
    .map(|(family, pattern)| {
        (
            family,
            Regex::new(pattern).expect("timestamp pattern should compile"),
        )
    })
    .collect()
});

static NGINX_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})/([A-Za-z]{3})/(\d{4}):(\d{2}):(\d{2}):(\d{2})(?:\s+[+-]\d{4})?$")
        .expect("nginx time pattern should compile")
});

/// A timestamp found at the start of a line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimestampMatch<'a> {
    pub family: TimestampFamily,
    pub timestamp: Timestamp,
    /// Remainder of the line after the timestamp and its separator
    pub rest: &'a str,
}

/// Find the first timestamp family that matches the start of `line`
///
/// A family only counts when its text is a valid instant; otherwise the
/// next family is tried.
pub fn extract_prefix(line: &str) -> Option<TimestampMatch<'_>> {
    FAMILIES.iter().find_map(|(family, re)| {
        let caps = re.captures(line)?;
        let whole = caps.get(0)?;
        let text = caps.get(1)?.as_str();
        let timestamp = normalize(*family, text)?;

        Some(TimestampMatch {
            family: *family,
            timestamp,
            rest: &line[whole.end()..],
        })
    })
}

/// Parse a standalone timestamp string (e.g. a JSON field) in any family
pub fn parse_standalone(text: &str) -> Option<Timestamp> {
    let text = text.trim();
    if let Some(m) = extract_prefix(text) {
        if m.rest.trim().is_empty() {
            return Some(m.timestamp);
        }
    }

    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| Timestamp::millis(dt.with_timezone(&Utc)))
}

/// Convert the matched text of a family into a canonical UTC instant
pub fn normalize(family: TimestampFamily, text: &str) -> Option<Timestamp> {
    match family {
        TimestampFamily::IsoFractionalUtc
        | TimestampFamily::IsoUtc
        | TimestampFamily::IsoNanosUtc
        | TimestampFamily::BracketIso => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|dt| Timestamp::verbatim(dt.with_timezone(&Utc), text)),
        TimestampFamily::IsoNaive => NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| Timestamp::millis(naive.and_utc())),
        TimestampFamily::Rfc3339Offset => DateTime::parse_from_rfc3339(text)
            .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z"))
            .ok()
            .map(|dt| Timestamp::millis(dt.with_timezone(&Utc))),
        TimestampFamily::SpaceSeparated => {
            NaiveDateTime::parse_from_str(&text.replace(',', "."), "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(|naive| Timestamp::millis(naive.and_utc()))
        }
        TimestampFamily::Syslog => normalize_syslog(text, Utc::now().year()),
    }
}

/// `Mon DD HH:MM:SS` in the given year, zero milliseconds, UTC
fn normalize_syslog(text: &str, year: i32) -> Option<Timestamp> {
    let mut parts = text.split_whitespace();
    let month = month_number(parts.next()?)?;
    let day: u32 = parts.next()?.parse().ok()?;
    let time = parts.next()?;

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let naive = NaiveDateTime::parse_from_str(
        &format!("{} {}", date.format("%Y-%m-%d"), time),
        "%Y-%m-%d %H:%M:%S",
    )
    .ok()?;

    Some(Timestamp::millis(naive.and_utc()))
}

/// Convert nginx `DD/Mon/YYYY:HH:MM:SS +ZZZZ` to UTC ISO form
///
/// The numeric offset is accepted but not applied: the wall-clock time is
/// taken as UTC.
pub fn normalize_nginx(text: &str) -> Option<Timestamp> {
    let caps = NGINX_TIME.captures(text.trim())?;
    let day: u32 = caps[1].parse().ok()?;
    let month = month_number(&caps[2])?;
    let year: i32 = caps[3].parse().ok()?;
    let hour: u32 = caps[4].parse().ok()?;
    let minute: u32 = caps[5].parse().ok()?;
    let second: u32 = caps[6].parse().ok()?;

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    Some(Timestamp::millis(naive.and_utc()))
}

/// Epoch seconds or milliseconds, as found in JSON loggers
pub fn from_epoch(value: f64) -> Option<Timestamp> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    let millis = if value >= 1e12 { value } else { value * 1000.0 };
    DateTime::from_timestamp_millis(millis as i64).map(Timestamp::millis)
}

fn month_number(abbr: &str) -> Option<u32> {
    let month = match abbr.to_ascii_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
