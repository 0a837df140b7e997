//! Source spans attached to tree nodes.

use serde::Serialize;

/// Byte span into the original input text.
///
/// Invariant: `start <= end <= input.len()` for the text the tree was parsed
/// from. Spans are never shifted or synthesized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "span start must be <= end");
        Self { start, end }
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    pub fn len(self) -> usize {
        self.end - self.start
    }

    pub fn contains(self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Where a node's span came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SpanProvenance {
    /// Offsets reported by the grammar for the original input.
    Input,
    /// No trustworthy offsets; the node carries no span.
    None,
}

#[cfg(test)]
mod tests {
    use super::Span;

    #[test]
    fn containment() {
        let outer = Span::new(2, 10);
        assert!(outer.contains(Span::new(2, 10)));
        assert!(outer.contains(Span::new(4, 4)));
        assert!(!outer.contains(Span::new(1, 3)));
        assert_eq!(outer.len(), 8);
        assert!(Span::new(3, 3).is_empty());
    }
}
