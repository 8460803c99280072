use regex::{Regex, RegexBuilder};

use kubestream_types::LogRecord;

/// Compiled search term for the scrollback
#[derive(Clone)]
pub struct SearchQuery {
    regex: Regex,

    /// Original term as typed
    term: String,
}

impl SearchQuery {
    /// Literal, case-insensitive search; `None` for a blank term
    pub fn literal(term: &str) -> Option<Self> {
        if term.trim().is_empty() {
            return None;
        }

        let regex = RegexBuilder::new(&regex::escape(term))
            .case_insensitive(true)
            .build()
            .ok()?;

        Some(Self {
            regex,
            term: term.to_string(),
        })
    }

    /// Check whether a record's rendered text contains the term
    pub fn matches(&self, record: &LogRecord) -> bool {
        self.regex.is_match(&record.message)
            || record
                .pod_name
                .as_deref()
                .is_some_and(|pod| self.regex.is_match(pod))
    }

    /// Find all match positions in a string (for highlighting)
    pub fn find_matches(&self, text: &str) -> Vec<(usize, usize)> {
        self.regex
            .find_iter(text)
            .filter(|m| !m.is_empty())
            .map(|m| (m.start(), m.end()))
            .collect()
    }

    pub fn term(&self) -> &str {
        &self.term
    }
}

impl std::fmt::Debug for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchQuery")
            .field("term", &self.term)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogParser;

    #[test]
    fn test_literal_is_case_insensitive() {
        let query = SearchQuery::literal("Timeout").unwrap();
        let record = LogParser::parse("upstream TIMEOUT after 30s", "gateway", 1);
        assert!(query.matches(&record));

        let other = LogParser::parse("all good", "gateway", 2);
        assert!(!query.matches(&other));
    }

    #[test]
    fn test_literal_escapes_regex_syntax() {
        let query = SearchQuery::literal("GET /api/v1?id=1").unwrap();
        let record = LogParser::parse("GET /api/v1?id=1 200", "api", 1);
        assert!(query.matches(&record));
        assert!(SearchQuery::literal("   ").is_none());
    }

    #[test]
    fn test_matches_pod_name() {
        let query = SearchQuery::literal("canary").unwrap();
        let record = LogParser::parse("ready", "web-canary-0", 1);
        assert!(query.matches(&record));
    }

    #[test]
    fn test_find_matches() {
        let query = SearchQuery::literal("error").unwrap();
        let matches = query.find_matches("an error occurred, another Error here");
        assert_eq!(matches, vec![(3, 8), (27, 32)]);
    }
}
