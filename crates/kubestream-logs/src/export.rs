//! Text and CSV renderings of buffered records.

use std::borrow::Cow;

use kubestream_types::{ExportFormat, LogRecord};

const CSV_HEADER: &str = "Timestamp,Level,Pod,Message";

/// Render records in the given format, one line per record
pub fn render<'a, I>(records: I, format: ExportFormat) -> String
where
    I: IntoIterator<Item = &'a LogRecord>,
{
    match format {
        ExportFormat::Text => records
            .into_iter()
            .map(text_line)
            .collect::<Vec<_>>()
            .join("\n"),
        ExportFormat::Csv => std::iter::once(CSV_HEADER.to_string())
            .chain(records.into_iter().map(csv_row))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// `[timestamp] pod message`; the pod is omitted for system records
pub fn text_line(record: &LogRecord) -> String {
    match record.pod_name.as_deref() {
        Some(pod) => format!("[{}] {} {}", record.timestamp, pod, single_line(&record.message)),
        None => format!("[{}] {}", record.timestamp, single_line(&record.message)),
    }
}

pub fn csv_row(record: &LogRecord) -> String {
    [
        record.timestamp.as_str(),
        record.level.as_str(),
        record.pod(),
        record.message.as_str(),
    ]
    .iter()
    .map(|field| csv_field(field))
    .collect::<Vec<_>>()
    .join(",")
}

/// Quote a field, doubling embedded quotes
fn csv_field(value: &str) -> String {
    format!("\"{}\"", single_line(value).replace('"', "\"\""))
}

/// Escape line breaks so a multi-line message stays on one output line
fn single_line(value: &str) -> Cow<'_, str> {
    if value.contains(['\r', '\n']) {
        Cow::Owned(value.replace('\r', "\\r").replace('\n', "\\n"))
    } else {
        Cow::Borrowed(value)
    }
}
