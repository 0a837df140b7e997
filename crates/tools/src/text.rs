/// Text position helpers shared by the parsing crates.
///
/// Offsets are byte offsets into UTF-8 text. Lines and columns are 1-based,
/// and columns count characters rather than bytes.
use memchr::memchr_iter;

/// Precomputed line starts for fast offset -> (line, column) lookups.
#[derive(Clone, Debug)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = Vec::with_capacity(16);
        line_starts.push(0);
        line_starts.extend(memchr_iter(b'\n', text.as_bytes()).map(|nl| nl + 1));
        Self { line_starts }
    }

    /// Resolve `offset` to a 1-based (line, column) pair.
    ///
    /// Offsets past the end of `text` clamp to the end. `text` must be the
    /// same text this index was built from.
    pub fn line_column(&self, text: &str, offset: usize) -> (usize, usize) {
        let offset = offset.min(text.len());
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line.saturating_sub(1)];
        let column = char_count(&text.as_bytes()[line_start..offset]) + 1;
        (line.max(1), column)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// Count UTF-8 scalar values in a byte slice (continuation bytes skipped).
pub fn char_count(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| (b & 0xC0) != 0x80).count()
}

/// Borrow at most `max_chars` characters from the front of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}
