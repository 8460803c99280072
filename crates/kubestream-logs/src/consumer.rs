use kubestream_types::{LogLevel, LogRecord, RecordKind, SessionId, StreamEvent};

use crate::lines::LineSplitter;
use crate::parser::LogParser;

/// Line state of the tracked session
struct Tracked {
    session_id: SessionId,
    pod_name: String,
    splitter: LineSplitter,
    sequence: u64,
}

impl Tracked {
    fn parse(&mut self, line: &str) -> LogRecord {
        self.sequence += 1;
        LogParser::parse(line, &self.pod_name, self.sequence)
    }
}

/// Turns session events into log records for the one session it tracks
///
/// Events tagged with any other session id are stale and are dropped.
#[derive(Default)]
pub struct StreamConsumer {
    tracked: Option<Tracked>,
}

impl StreamConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly started session, discarding any previous line state
    pub fn track(&mut self, session_id: SessionId, pod_name: &str) {
        self.tracked = Some(Tracked {
            session_id,
            pod_name: pod_name.to_string(),
            splitter: LineSplitter::new(),
            sequence: 0,
        });
    }

    pub fn untrack(&mut self) {
        self.tracked = None;
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.tracked.as_ref().map(|t| t.session_id)
    }

    /// Records produced by an event, in line order
    ///
    /// Errors and stream end flush the partial line, append an inline
    /// marker, and stop tracking the session.
    pub fn handle(&mut self, event: StreamEvent) -> Vec<LogRecord> {
        let session_id = event.session_id();
        let Some(tracked) = self
            .tracked
            .as_mut()
            .filter(|t| t.session_id == session_id)
        else {
            tracing::trace!(session = %session_id, "dropping stale event");
            return Vec::new();
        };

        let marker = match event {
            StreamEvent::Data { chunk, .. } => {
                let lines = tracked.splitter.push(&chunk);
                return lines.iter().map(|line| tracked.parse(line)).collect();
            }
            StreamEvent::Error { message, .. } => LogRecord::system(
                RecordKind::StreamError,
                LogLevel::Error,
                format!("Log stream error: {}", message),
            ),
            StreamEvent::End { .. } => {
                LogRecord::system(RecordKind::StreamEnded, LogLevel::Info, "Log stream ended")
            }
        };

        let mut records: Vec<LogRecord> = tracked
            .splitter
            .finish()
            .map(|line| tracked.parse(&line))
            .into_iter()
            .collect();
        records.push(marker);

        self.tracked = None;
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(id: u64, chunk: &str) -> StreamEvent {
        StreamEvent::Data {
            session_id: SessionId(id),
            pod_name: "api-0".to_string(),
            chunk: chunk.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_lines_parsed_in_order() {
        let mut consumer = StreamConsumer::new();
        consumer.track(SessionId(1), "api-0");

        let first = consumer.handle(data(1, "2024-01-15T10:30:00Z boot\n2024-01-15T10:30:01Z lis"));
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].message, "boot");
        assert_eq!(first[0].sequence, 1);

        let second = consumer.handle(data(1, "tening\n\n"));
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].message, "listening");
        assert_eq!(second[0].sequence, 2);
        assert_eq!(second[0].pod_name.as_deref(), Some("api-0"));
    }

    #[test]
    fn test_stale_session_dropped() {
        let mut consumer = StreamConsumer::new();
        consumer.track(SessionId(2), "api-0");

        assert!(consumer.handle(data(1, "late line\n")).is_empty());
        assert!(consumer.handle(StreamEvent::End { session_id: SessionId(1) }).is_empty());
        assert_eq!(consumer.active_session(), Some(SessionId(2)));
    }

    #[test]
    fn test_untracked_drops_everything() {
        let mut consumer = StreamConsumer::new();
        assert!(consumer.handle(data(1, "line\n")).is_empty());
    }

    #[test]
    fn test_end_flushes_partial_and_marks() {
        let mut consumer = StreamConsumer::new();
        consumer.track(SessionId(1), "api-0");
        consumer.handle(data(1, "shutting down"));

        let records = consumer.handle(StreamEvent::End { session_id: SessionId(1) });
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "shutting down");
        assert_eq!(records[1].kind, RecordKind::StreamEnded);
        assert_eq!(records[1].level, LogLevel::Info);
        assert_eq!(consumer.active_session(), None);
    }

    #[test]
    fn test_error_marker_embeds_cause() {
        let mut consumer = StreamConsumer::new();
        consumer.track(SessionId(3), "api-0");

        let records = consumer.handle(StreamEvent::Error {
            session_id: SessionId(3),
            message: "connection reset".to_string(),
        });
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, RecordKind::StreamError);
        assert_eq!(records[0].level, LogLevel::Error);
        assert!(records[0].message.contains("connection reset"));
        assert!(records[0].pod_name.is_none());
    }
}
