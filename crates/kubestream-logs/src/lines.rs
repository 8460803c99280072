/// Longest line held back waiting for a newline; longer runs are emitted in pieces
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Splits a byte stream into lines, carrying partial lines between chunks
///
/// Splitting happens on raw bytes so multi-byte UTF-8 sequences cut by a
/// chunk boundary are reassembled before decoding. At most
/// `MAX_LINE_BYTES` are buffered.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every line it completes, in order
    ///
    /// Whitespace-only lines are dropped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            self.pending.extend_from_slice(&rest[..pos]);
            self.drain_overlong(&mut lines);
            if let Some(line) = Self::decode(&self.pending) {
                lines.push(line);
            }
            self.pending.clear();
            rest = &rest[pos + 1..];
        }

        self.pending.extend_from_slice(rest);
        self.drain_overlong(&mut lines);
        lines
    }

    /// Emit full-size pieces until the pending run fits the cap
    fn drain_overlong(&mut self, lines: &mut Vec<String>) {
        while self.pending.len() > MAX_LINE_BYTES {
            let mut cut = MAX_LINE_BYTES;
            // Back off to a char boundary so the piece decodes cleanly
            while cut > MAX_LINE_BYTES - 4 && (self.pending[cut] & 0xC0) == 0x80 {
                cut -= 1;
            }
            let piece: Vec<u8> = self.pending.drain(..cut).collect();
            if let Some(line) = Self::decode(&piece) {
                lines.push(line);
            }
        }
    }

    /// Flush the trailing partial line, if any
    pub fn finish(&mut self) -> Option<String> {
        let line = Self::decode(&self.pending);
        self.pending.clear();
        line
    }

    /// Bytes held back waiting for a newline
    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn decode(bytes: &[u8]) -> Option<String> {
        let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
        let line = String::from_utf8_lossy(bytes);
        if line.trim().is_empty() {
            None
        } else {
            Some(line.into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_across_chunks() {
        let mut splitter = LineSplitter::new();

        assert_eq!(splitter.push(b"first li"), Vec::<String>::new());
        assert_eq!(splitter.push(b"ne\nsecond\nthi"), vec!["first line", "second"]);
        assert_eq!(splitter.pending_len(), 3);
        assert_eq!(splitter.push(b"rd\r\n"), vec!["third"]);
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn test_blank_lines_dropped() {
        let mut splitter = LineSplitter::new();
        assert_eq!(splitter.push(b"a\n\n   \n\t\nb\n"), vec!["a", "b"]);
    }

    #[test]
    fn test_utf8_split_mid_char() {
        let text = "héllo\n".as_bytes();
        let mut splitter = LineSplitter::new();

        assert!(splitter.push(&text[..2]).is_empty());
        assert_eq!(splitter.push(&text[2..]), vec!["héllo"]);
    }

    #[test]
    fn test_overlong_run_is_capped() {
        let mut splitter = LineSplitter::new();
        let run = vec![b'x'; MAX_LINE_BYTES + 10];

        let first = splitter.push(&run[..MAX_LINE_BYTES / 2]);
        assert!(first.is_empty());
        let lines = splitter.push(&run[MAX_LINE_BYTES / 2..]);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), MAX_LINE_BYTES);
        assert_eq!(splitter.pending_len(), 10);

        for _ in 0..4 {
            splitter.push(&run);
            assert!(splitter.pending_len() <= MAX_LINE_BYTES);
        }
        assert_eq!(splitter.push(b"\n").len(), 1);
        assert_eq!(splitter.pending_len(), 0);
    }

    #[test]
    fn test_overlong_cut_keeps_chars_whole() {
        let mut splitter = LineSplitter::new();
        let mut run = vec![b'a'; MAX_LINE_BYTES - 1];
        run.extend_from_slice("é tail\n".as_bytes());

        let lines = splitter.push(&run);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), MAX_LINE_BYTES - 1);
        assert_eq!(lines[1], "é tail");
    }

    #[test]
    fn test_finish_flushes_partial() {
        let mut splitter = LineSplitter::new();
        splitter.push(b"no newline at end");
        assert_eq!(splitter.finish().as_deref(), Some("no newline at end"));
        assert_eq!(splitter.pending_len(), 0);
    }
}
