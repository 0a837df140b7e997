//! Raw syntax tree -> public node model.
//!
//! Ids come from a counter owned by one build, assigned in pre-order starting
//! at 1. The walk uses an explicit frame stack so arbitrarily deep trees do
//! not consume native stack.

use crate::node::{CssNode, NodeId};
use crate::span::{Span, SpanProvenance};
use css_syntax::{Loc, RawNode};

struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    fn new() -> Self {
        Self { next: 1 }
    }

    fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Clone, Copy)]
struct SpanPolicy {
    capture: bool,
    input_len: usize,
}

impl SpanPolicy {
    fn span_for(self, loc: Option<Loc>) -> Option<Span> {
        if !self.capture {
            return None;
        }
        let loc = loc?;
        (loc.start <= loc.end && loc.end <= self.input_len).then(|| Span::new(loc.start, loc.end))
    }
}

struct Frame {
    node: CssNode,
    pending: std::vec::IntoIter<RawNode>,
}

fn open(raw: RawNode, ids: &mut IdAllocator, spans: SpanPolicy) -> Frame {
    let span = spans.span_for(raw.loc);
    let node = CssNode {
        id: ids.allocate(),
        kind: raw.kind,
        span_provenance: if span.is_some() {
            SpanProvenance::Input
        } else {
            SpanProvenance::None
        },
        span,
        detail: raw.detail,
        children: Vec::with_capacity(raw.children.len()),
    };
    Frame {
        node,
        pending: raw.children.into_iter(),
    }
}

/// Convert `root`, consuming it.
pub(crate) fn build_tree(root: RawNode, input_len: usize, capture_spans: bool) -> CssNode {
    let spans = SpanPolicy {
        capture: capture_spans,
        input_len,
    };
    let mut ids = IdAllocator::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut current = open(root, &mut ids, spans);

    loop {
        if let Some(child) = current.pending.next() {
            let frame = open(child, &mut ids, spans);
            stack.push(std::mem::replace(&mut current, frame));
            continue;
        }
        match stack.pop() {
            Some(mut parent) => {
                parent.node.children.push(current.node);
                current = parent;
            }
            None => return current.node,
        }
    }
}

/// Convert a public node back into a raw node, dropping ids and spans.
pub(crate) fn strip_tree(root: &CssNode) -> RawNode {
    struct StripFrame<'a> {
        raw: RawNode,
        pending: std::slice::Iter<'a, CssNode>,
    }

    fn strip_one(node: &CssNode) -> StripFrame<'_> {
        StripFrame {
            raw: RawNode::new(node.kind, None)
                .with_detail(node.detail.clone())
                .with_children(Vec::with_capacity(node.children.len())),
            pending: node.children.iter(),
        }
    }

    let mut stack: Vec<StripFrame<'_>> = Vec::new();
    let mut current = strip_one(root);
    loop {
        if let Some(child) = current.pending.next() {
            let frame = strip_one(child);
            stack.push(std::mem::replace(&mut current, frame));
            continue;
        }
        match stack.pop() {
            Some(mut parent) => {
                parent.raw.children.push(current.raw);
                current = parent;
            }
            None => return current.raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{build_tree, strip_tree};
    use crate::span::SpanProvenance;
    use css_syntax::{Loc, NodeType, RawNode};

    fn sample() -> RawNode {
        let leaf = |start| RawNode::new(NodeType::Identifier, Some(Loc { start, end: start + 1 }));
        RawNode::new(NodeType::Value, Some(Loc { start: 0, end: 5 })).with_children(vec![
            RawNode::new(NodeType::Parentheses, Some(Loc { start: 0, end: 3 }))
                .with_children(vec![leaf(1)]),
            leaf(4),
        ])
    }

    #[test]
    fn ids_are_preorder_from_one() {
        let root = build_tree(sample(), 5, true);
        assert_eq!(root.id.0, 1);
        assert_eq!(root.children[0].id.0, 2);
        assert_eq!(root.children[0].children[0].id.0, 3);
        assert_eq!(root.children[1].id.0, 4);
    }

    #[test]
    fn spans_follow_capture_flag_and_bounds() {
        let root = build_tree(sample(), 5, false);
        assert_eq!(root.span, None);
        assert_eq!(root.span_provenance, SpanProvenance::None);

        // A location past the input length is not trusted.
        let root = build_tree(sample(), 4, true);
        assert_eq!(root.span_provenance, SpanProvenance::None);
        assert_eq!(root.children[0].span_provenance, SpanProvenance::Input);
        assert_eq!(root.children[1].span_provenance, SpanProvenance::None);
    }

    #[test]
    fn strip_restores_raw_shape() {
        let raw = sample();
        let stripped = strip_tree(&build_tree(raw.clone(), 5, true));
        assert_eq!(stripped.kind, raw.kind);
        assert_eq!(stripped.children.len(), 2);
        assert_eq!(stripped.children[0].children[0].kind, NodeType::Identifier);
        assert_eq!(stripped.loc, None);
    }

    #[test]
    fn deep_chains_build_iteratively() {
        let mut raw = RawNode::new(NodeType::Identifier, None);
        for _ in 0..100_000 {
            raw = RawNode::new(NodeType::Parentheses, None).with_children(vec![raw]);
        }
        let root = build_tree(raw, 0, false);
        let mut depth = 1;
        let mut node = &root;
        while let Some(child) = node.children.first() {
            node = child;
            depth += 1;
        }
        assert_eq!(depth, 100_001);
        assert_eq!(node.id.0, 100_001);
        // Dropping nested trees recurses; unwind by hand.
        let mut pending = vec![root];
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}
