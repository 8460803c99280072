use kubestream_types::{ExportFormat, LogRecord};

use crate::buffer::{LevelCounts, LogBuffer};
use crate::export;
use crate::search::SearchQuery;

/// A search match, located by absolute arrival position
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchHit {
    /// Arrival position since the last clear (stable across eviction)
    pub position: u64,
    /// Index into the buffer at the time of the search
    pub index: usize,
    /// 1-based number of this match among all matches
    pub ordinal: usize,
    pub total: usize,
}

struct SearchState {
    query: SearchQuery,
    current: Option<u64>,
}

/// Where parsed records land before they are drawn
///
/// Wraps the bounded buffer with intake pause, the "waiting for logs"
/// placeholder, scrollback search, and export.
pub struct LogSink {
    buffer: LogBuffer,
    paused: bool,
    waiting: bool,
    dropped_while_paused: u64,
    search: Option<SearchState>,
}

impl LogSink {
    pub fn new(capacity: usize) -> Self {
        Self::with_buffer(LogBuffer::new(capacity))
    }

    pub fn with_buffer(buffer: LogBuffer) -> Self {
        Self {
            buffer,
            paused: false,
            waiting: false,
            dropped_while_paused: 0,
            search: None,
        }
    }

    pub fn buffer(&self) -> &LogBuffer {
        &self.buffer
    }

    /// Show the placeholder until the next record arrives
    pub fn show_placeholder(&mut self) {
        self.waiting = true;
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    /// Append a record from the stream; dropped while paused
    ///
    /// Returns whether the record was kept.
    pub fn add_record(&mut self, record: LogRecord) -> bool {
        if self.paused {
            self.dropped_while_paused += 1;
            return false;
        }

        self.store(record);
        true
    }

    /// Append an inline marker, even while paused
    pub fn add_system_record(&mut self, record: LogRecord) {
        self.store(record);
    }

    fn store(&mut self, record: LogRecord) {
        self.waiting = false;
        if self.buffer.push(record).is_some() {
            tracing::trace!(capacity = self.buffer.capacity(), "evicted oldest record");
        }
    }

    /// Empty the buffer and reset counters; the search term is kept
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.dropped_while_paused = 0;
        if let Some(search) = self.search.as_mut() {
            search.current = None;
        }
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume intake; records dropped while paused are not recovered
    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn dropped_while_paused(&self) -> u64 {
        self.dropped_while_paused
    }

    /// Set the search term and jump to its first occurrence
    ///
    /// A blank term clears the search.
    pub fn search(&mut self, term: &str) -> Option<SearchHit> {
        let Some(query) = SearchQuery::literal(term) else {
            self.search = None;
            return None;
        };

        self.search = Some(SearchState {
            query,
            current: None,
        });
        self.search_next()
    }

    /// Jump to the next match after the current one, wrapping to the first
    pub fn search_next(&mut self) -> Option<SearchHit> {
        self.step(|positions, current| match current {
            Some(cur) => positions
                .iter()
                .position(|&p| p > cur)
                .or((!positions.is_empty()).then_some(0)),
            None => (!positions.is_empty()).then_some(0),
        })
    }

    /// Jump to the match before the current one, wrapping to the last
    pub fn search_previous(&mut self) -> Option<SearchHit> {
        self.step(|positions, current| {
            let last = positions.len().checked_sub(1);
            match current {
                Some(cur) => positions.iter().rposition(|&p| p < cur).or(last),
                None => last,
            }
        })
    }

    fn step(&mut self, pick: impl FnOnce(&[u64], Option<u64>) -> Option<usize>) -> Option<SearchHit> {
        let search = self.search.as_mut()?;

        let (positions, evicted) = self.buffer.with_records(|records, evicted| {
            let positions: Vec<u64> = records
                .iter()
                .enumerate()
                .filter(|(_, r)| search.query.matches(r))
                .map(|(i, _)| evicted + i as u64)
                .collect();
            (positions, evicted)
        });

        let Some(ordinal) = pick(positions.as_slice(), search.current) else {
            search.current = None;
            return None;
        };

        let position = positions[ordinal];
        search.current = Some(position);

        Some(SearchHit {
            position,
            index: (position - evicted) as usize,
            ordinal: ordinal + 1,
            total: positions.len(),
        })
    }

    pub fn clear_search(&mut self) {
        self.search = None;
    }

    pub fn search_query(&self) -> Option<&SearchQuery> {
        self.search.as_ref().map(|s| &s.query)
    }

    /// Buffer index of the current match, if it has not been evicted
    pub fn current_match_index(&self) -> Option<usize> {
        let current = self.search.as_ref()?.current?;
        let evicted = self.buffer.evicted();
        let index = current.checked_sub(evicted)? as usize;
        (index < self.buffer.len()).then_some(index)
    }

    pub fn export(&self, format: ExportFormat) -> String {
        self.buffer
            .with_records(|records, _| export::render(records.iter(), format))
    }

    /// Level breakdown of what is buffered right now
    pub fn stats(&self) -> LevelCounts {
        self.buffer.level_counts()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::with_buffer(LogBuffer::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogParser;
    use kubestream_types::{LogLevel, RecordKind};

    fn line(sink: &mut LogSink, text: &str) -> bool {
        let seq = sink.len() as u64 + 1;
        sink.add_record(LogParser::parse(text, "api-0", seq))
    }

    #[test]
    fn test_placeholder_cleared_by_first_record() {
        let mut sink = LogSink::new(10);
        sink.show_placeholder();
        assert!(sink.is_waiting());
        assert_eq!(sink.stats().total(), 0);

        line(&mut sink, "hello");
        assert!(!sink.is_waiting());
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.export(ExportFormat::Csv).lines().count(), 2);
    }

    #[test]
    fn test_pause_drops_and_resume_does_not_recover() {
        let mut sink = LogSink::new(10);
        line(&mut sink, "before");

        sink.pause();
        assert!(!line(&mut sink, "during 1"));
        assert!(!line(&mut sink, "during 2"));
        assert_eq!(sink.dropped_while_paused(), 2);

        sink.resume();
        assert!(line(&mut sink, "after"));

        let messages: Vec<String> = sink.buffer().all().into_iter().map(|r| r.message).collect();
        assert_eq!(messages, vec!["before", "after"]);
    }

    #[test]
    fn test_system_records_bypass_pause() {
        let mut sink = LogSink::new(10);
        sink.pause();
        sink.add_system_record(LogRecord::system(
            RecordKind::StreamError,
            LogLevel::Error,
            "Log stream error: EOF",
        ));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.stats().error, 1);
    }

    #[test]
    fn test_capacity_plus_k() {
        let mut sink = LogSink::new(5);
        for n in 0..8 {
            line(&mut sink, &format!("line {}", n));
        }

        assert_eq!(sink.len(), 5);
        assert_eq!(sink.buffer().evicted(), 3);
        let messages: Vec<String> = sink.buffer().all().into_iter().map(|r| r.message).collect();
        assert_eq!(messages, vec!["line 3", "line 4", "line 5", "line 6", "line 7"]);
    }

    #[test]
    fn test_search_cycles_and_wraps() {
        let mut sink = LogSink::new(10);
        for text in ["timeout a", "ok", "TIMEOUT b", "ok", "timeout c"] {
            line(&mut sink, text);
        }

        let hit = sink.search("timeout").unwrap();
        assert_eq!((hit.index, hit.ordinal, hit.total), (0, 1, 3));
        assert_eq!(sink.search_next().unwrap().index, 2);
        assert_eq!(sink.search_next().unwrap().index, 4);
        assert_eq!(sink.search_next().unwrap().index, 0);
        assert_eq!(sink.search_previous().unwrap().index, 4);
        assert_eq!(sink.search_previous().unwrap().index, 2);
        assert_eq!(sink.current_match_index(), Some(2));
    }

    #[test]
    fn test_search_survives_eviction() {
        let mut sink = LogSink::new(3);
        for text in ["match 1", "x", "match 2"] {
            line(&mut sink, text);
        }
        assert_eq!(sink.search("match").unwrap().index, 0);

        line(&mut sink, "y");
        assert_eq!(sink.current_match_index(), None);

        let hit = sink.search_next().unwrap();
        assert_eq!(hit.index, 1);
        assert_eq!(hit.position, 2);
        assert_eq!(hit.total, 1);
    }

    #[test]
    fn test_search_without_matches() {
        let mut sink = LogSink::new(10);
        line(&mut sink, "nothing here");
        assert!(sink.search("absent").is_none());
        assert!(sink.search_next().is_none());
        assert!(sink.search("  ").is_none());
        assert!(sink.search_query().is_none());
    }

    #[test]
    fn test_clear_resets() {
        let mut sink = LogSink::new(10);
        line(&mut sink, "error one");
        sink.pause();
        line(&mut sink, "dropped");
        sink.resume();
        sink.search("error");

        sink.clear();
        assert!(sink.is_empty());
        assert_eq!(sink.dropped_while_paused(), 0);
        assert_eq!(sink.stats(), LevelCounts::default());
        assert_eq!(sink.current_match_index(), None);
        assert_eq!(sink.search_query().map(|q| q.term()), Some("error"));
    }

    #[test]
    fn test_stats_by_level() {
        let mut sink = LogSink::new(10);
        line(&mut sink, "ERROR a");
        line(&mut sink, "warning b");
        line(&mut sink, "debug c");
        line(&mut sink, "plain");

        let stats = sink.stats();
        assert_eq!(stats.get(LogLevel::Error), 1);
        assert_eq!(stats.get(LogLevel::Warning), 1);
        assert_eq!(stats.get(LogLevel::Debug), 1);
        assert_eq!(stats.get(LogLevel::Info), 1);
        assert_eq!(stats.total(), 4);
    }
}
