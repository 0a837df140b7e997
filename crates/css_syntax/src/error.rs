use std::fmt;

/// Recoverable grammar error. Parsing continues after reporting one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    /// Byte offset into the parsed text.
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}:{} (offset {})",
            self.message, self.line, self.column, self.offset
        )
    }
}

impl std::error::Error for SyntaxError {}
