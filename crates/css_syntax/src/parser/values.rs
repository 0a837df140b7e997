//! Component values, at-rule preludes and media queries.

use super::GrammarParser;
use crate::ast::{NodeDetail, NodeType, RawNode};
use crate::tokenizer::TokenKind;

/// Byte length of the numeric part of a number-like token.
fn numeric_prefix_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        if bytes.get(j).is_some_and(u8::is_ascii_digit) {
            i = j;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
    }
    i
}

/// `,`, `/` and `:` absorb surrounding whitespace.
fn is_separator(node: &RawNode) -> bool {
    node.is_operator(",") || node.is_operator("/") || node.is_operator(":")
}

/// Collapse whitespace runs to one node and drop it at both ends and next
/// to separators.
fn normalize_whitespace(nodes: Vec<RawNode>) -> Vec<RawNode> {
    let mut out: Vec<RawNode> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if node.kind == NodeType::WhiteSpace {
            let skip = out
                .last()
                .is_none_or(|prev| prev.kind == NodeType::WhiteSpace || is_separator(prev));
            if !skip {
                out.push(node);
            }
            continue;
        }
        if is_separator(&node) && out.last().is_some_and(|prev| prev.kind == NodeType::WhiteSpace)
        {
            out.pop();
        }
        out.push(node);
    }
    if out.last().is_some_and(|last| last.kind == NodeType::WhiteSpace) {
        out.pop();
    }
    out
}

impl GrammarParser<'_, '_> {
    /// Generic component values over `[start, end)`, whitespace-normalized.
    pub(super) fn component_sequence(&mut self, start: usize, end: usize) -> Vec<RawNode> {
        let nodes = self.with_range(start, end, |p| {
            let mut nodes = Vec::new();
            while p.peek().is_some() {
                if let Some(node) = p.component() {
                    nodes.push(node);
                }
            }
            nodes
        });
        normalize_whitespace(nodes)
    }

    /// Consume one component value at the cursor. Comments yield `None`.
    fn component(&mut self) -> Option<RawNode> {
        let index = self.pos;
        let tokens = self.tokens;
        let token = &tokens[index];
        let text = self.text(index);
        let loc = self.loc(token.start, token.end);
        self.pos += 1;

        let node = match token.kind {
            TokenKind::Comment => return None,
            TokenKind::WhiteSpace => {
                RawNode::new(NodeType::WhiteSpace, loc).with_detail(NodeDetail::value(" "))
            }
            TokenKind::Ident => {
                RawNode::new(NodeType::Identifier, loc).with_detail(NodeDetail::name(text))
            }
            TokenKind::Number => {
                RawNode::new(NodeType::Number, loc).with_detail(NodeDetail::value(text))
            }
            TokenKind::Percentage => RawNode::new(NodeType::Percentage, loc)
                .with_detail(NodeDetail::value(&text[..text.len() - 1])),
            TokenKind::Dimension => {
                let split = numeric_prefix_len(text);
                RawNode::new(NodeType::Dimension, loc).with_detail(NodeDetail::Dimension {
                    value: text[..split].to_string(),
                    unit: text[split..].to_string(),
                })
            }
            TokenKind::String => RawNode::new(NodeType::String, loc)
                .with_detail(NodeDetail::value(token.unescaped.clone().unwrap_or_default())),
            TokenKind::Url => RawNode::new(NodeType::Url, loc)
                .with_detail(NodeDetail::value(token.unescaped.clone().unwrap_or_default())),
            TokenKind::Hash => {
                RawNode::new(NodeType::Hash, loc).with_detail(NodeDetail::value(&text[1..]))
            }
            TokenKind::Delim | TokenKind::Colon | TokenKind::Comma | TokenKind::Semicolon => {
                RawNode::new(NodeType::Operator, loc).with_detail(NodeDetail::value(text))
            }
            TokenKind::BadString => {
                self.error_at(token.start, "Unterminated string");
                RawNode::raw(text, loc)
            }
            TokenKind::BadUrl => {
                self.error_at(token.start, "Bad url");
                RawNode::raw(text, loc)
            }
            TokenKind::Function => return Some(self.function(index)),
            TokenKind::LeftParenthesis => return Some(self.simple_block(index, NodeType::Parentheses)),
            TokenKind::LeftSquareBracket => return Some(self.simple_block(index, NodeType::Brackets)),
            TokenKind::LeftCurlyBracket => {
                let end = self.component_end(index, self.limit);
                if self.tokens[index].close.is_none_or(|close| close >= self.limit) {
                    self.report_unclosed(index);
                }
                self.pos = end;
                self.raw_range(index, end)
            }
            TokenKind::AtKeyword
            | TokenKind::Cdo
            | TokenKind::Cdc
            | TokenKind::RightParenthesis
            | TokenKind::RightSquareBracket
            | TokenKind::RightCurlyBracket => RawNode::raw(text, loc),
        };
        Some(node)
    }

    /// Children of a `(`/`[`/function block; leaves the cursor after it.
    fn block_contents(&mut self, open: usize) -> (Vec<RawNode>, usize) {
        let inner_end = self.inner_end(open);
        let children = self.component_sequence(open + 1, inner_end);
        let end = match self.tokens[open].close {
            Some(close) if close == inner_end => {
                self.pos = close + 1;
                self.tokens[close].end
            }
            _ => {
                self.report_unclosed(open);
                self.pos = inner_end;
                self.end_offset(open, inner_end)
            }
        };
        (children, end)
    }

    fn simple_block(&mut self, open: usize, kind: NodeType) -> RawNode {
        let start = self.tokens[open].start;
        let (children, end) = self.block_contents(open);
        RawNode::new(kind, self.loc(start, end)).with_children(children)
    }

    fn function(&mut self, open: usize) -> RawNode {
        let start = self.tokens[open].start;
        let text = self.text(open);
        let name = &text[..text.len() - 1];
        let (children, end) = self.block_contents(open);
        let loc = self.loc(start, end);

        // `url("...")` is a url, not a function call.
        if name.eq_ignore_ascii_case("url")
            && children.len() == 1
            && children[0].kind == NodeType::String
        {
            let value = children[0].detail.value_str().unwrap_or_default().to_string();
            return RawNode::new(NodeType::Url, loc).with_detail(NodeDetail::value(value));
        }
        RawNode::new(NodeType::Function, loc)
            .with_detail(NodeDetail::name(name))
            .with_children(children)
    }

    /// Prelude of `@name` over the trimmed range `[start, end)`.
    pub(super) fn at_rule_prelude(&mut self, name: &str, start: usize, end: usize) -> RawNode {
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "media" | "custom-media" => {
                let list = self.media_query_list(start, end);
                RawNode::new(NodeType::AtrulePrelude, self.loc_tokens(start, end))
                    .with_children(vec![list])
            }
            "supports" | "container" => {
                let condition = self.condition(start, end);
                RawNode::new(NodeType::AtrulePrelude, self.loc_tokens(start, end))
                    .with_children(vec![condition])
            }
            _ => self.generic_prelude(start, end),
        }
    }

    pub(super) fn generic_prelude(&mut self, start: usize, end: usize) -> RawNode {
        let children = self.component_sequence(start, end);
        RawNode::new(NodeType::AtrulePrelude, self.loc_tokens(start, end)).with_children(children)
    }

    pub(super) fn media_query_list(&mut self, start: usize, end: usize) -> RawNode {
        let mut queries = Vec::new();
        for (part_start, part_end) in self.split_top_level(start, end, TokenKind::Comma) {
            let (from, to) = self.trim(part_start, part_end);
            if from == to {
                continue;
            }
            queries.push(self.media_query(from, to));
        }
        RawNode::new(NodeType::MediaQueryList, self.loc_tokens(start, end)).with_children(queries)
    }

    pub(super) fn media_query(&mut self, start: usize, end: usize) -> RawNode {
        let children = self.component_sequence(start, end);
        RawNode::new(NodeType::MediaQuery, self.loc_tokens(start, end)).with_children(children)
    }

    pub(super) fn condition(&mut self, start: usize, end: usize) -> RawNode {
        let children = self.component_sequence(start, end);
        RawNode::new(NodeType::Condition, self.loc_tokens(start, end)).with_children(children)
    }
}
