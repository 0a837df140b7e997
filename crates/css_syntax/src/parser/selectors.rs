//! Selector lists, compounds, attribute and pseudo selectors.
//!
//! A selector that fails to parse reports its error and yields `Err(())`;
//! callers fall back to a raw node for the whole list.

use super::GrammarParser;
use crate::ast::{AttributeValue, NodeDetail, NodeType, RawNode};
use crate::tokenizer::TokenKind;

type SelectorResult<T> = Result<T, ()>;

/// Pseudo-classes whose argument is itself a selector list.
fn takes_selector_list(name: &str) -> bool {
    ["not", "is", "where", "has", "matches", "-webkit-any", "-moz-any"]
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(name))
}

impl GrammarParser<'_, '_> {
    /// Comma-separated selectors over the trimmed range `[start, end)`.
    pub(super) fn selector_list(&mut self, start: usize, end: usize) -> SelectorResult<RawNode> {
        let mut selectors = Vec::new();
        for (part_start, part_end) in self.split_top_level(start, end, TokenKind::Comma) {
            let (from, to) = self.trim(part_start, part_end);
            if from == to {
                self.error_at_token(from, "Selector is expected");
                return Err(());
            }
            selectors.push(self.selector(from, to)?);
        }
        Ok(RawNode::new(NodeType::SelectorList, self.loc_tokens(start, end)).with_children(selectors))
    }

    /// One complex selector over the trimmed range `[start, end)`.
    pub(super) fn selector(&mut self, start: usize, end: usize) -> SelectorResult<RawNode> {
        let mut children: Vec<RawNode> = Vec::new();
        let mut pending_space: Option<usize> = None;
        let mut index = start;
        let tokens = self.tokens;

        while index < end {
            let token = &tokens[index];
            match token.kind {
                TokenKind::WhiteSpace => {
                    if !children.is_empty() && pending_space.is_none() {
                        pending_space = Some(index);
                    }
                    index += 1;
                    continue;
                }
                TokenKind::Comment => {
                    index += 1;
                    continue;
                }
                _ => {}
            }

            if let Some((name, next)) = self.explicit_combinator(index, end) {
                let loc = self.loc(token.start, tokens[next - 1].end);
                children.push(RawNode::new(NodeType::Combinator, loc).with_detail(NodeDetail::name(name)));
                pending_space = None;
                index = next;
                continue;
            }

            if let Some(space) = pending_space.take() {
                let after_combinator = children
                    .last()
                    .is_some_and(|last| last.kind == NodeType::Combinator);
                if !after_combinator {
                    let ws = &tokens[space];
                    children.push(
                        RawNode::new(NodeType::Combinator, self.loc(ws.start, ws.end))
                            .with_detail(NodeDetail::name(" ")),
                    );
                }
            }

            let (node, next) = self.simple_selector(index, end)?;
            children.push(node);
            index = next;
        }

        Ok(RawNode::new(NodeType::Selector, self.loc_tokens(start, end)).with_children(children))
    }

    /// `>`, `+`, `~` or `||` at `index`; returns the name and the next index.
    fn explicit_combinator(&self, index: usize, end: usize) -> Option<(&'static str, usize)> {
        match self.delim_at(index, end)? {
            '>' => Some((">", index + 1)),
            '+' => Some(("+", index + 1)),
            '~' => Some(("~", index + 1)),
            '|' if self.delim_at(index + 1, end) == Some('|') => Some(("||", index + 2)),
            _ => None,
        }
    }

    fn simple_selector(&mut self, index: usize, end: usize) -> SelectorResult<(RawNode, usize)> {
        let tokens = self.tokens;
        let token = &tokens[index];
        match token.kind {
            TokenKind::Ident => Ok(self.type_selector(index, end)),
            TokenKind::Delim if self.delim_at(index, end) == Some('*') => {
                Ok(self.type_selector(index, end))
            }
            TokenKind::Delim if self.delim_at(index, end) == Some('&') => Ok((
                RawNode::new(NodeType::NestingSelector, self.loc(token.start, token.end)),
                index + 1,
            )),
            TokenKind::Delim if self.delim_at(index, end) == Some('.') => {
                if self.kind_at(index + 1, end) != Some(TokenKind::Ident) {
                    self.error_at_token(index + 1, "Identifier is expected");
                    return Err(());
                }
                let name = self.text(index + 1);
                let loc = self.loc(token.start, tokens[index + 1].end);
                Ok((
                    RawNode::new(NodeType::ClassSelector, loc).with_detail(NodeDetail::name(name)),
                    index + 2,
                ))
            }
            TokenKind::Hash => {
                let name = &self.text(index)[1..];
                Ok((
                    RawNode::new(NodeType::IdSelector, self.loc(token.start, token.end))
                        .with_detail(NodeDetail::name(name)),
                    index + 1,
                ))
            }
            TokenKind::LeftSquareBracket => self.attribute_selector(index),
            TokenKind::Colon => self.pseudo_selector(index, end),
            _ => {
                self.error_at_token(index, "Selector is expected");
                Err(())
            }
        }
    }

    /// Type or universal selector with an optional `ns|` prefix.
    fn type_selector(&self, index: usize, end: usize) -> (RawNode, usize) {
        let mut last = index;
        let prefixed = self.delim_at(index + 1, end) == Some('|')
            && (self.kind_at(index + 2, end) == Some(TokenKind::Ident)
                || self.delim_at(index + 2, end) == Some('*'));
        if prefixed {
            last = index + 2;
        }
        let name = self.slice(index, last + 1);
        let loc = self.loc(self.tokens[index].start, self.tokens[last].end);
        (
            RawNode::new(NodeType::TypeSelector, loc).with_detail(NodeDetail::name(name)),
            last + 1,
        )
    }

    fn attribute_selector(&mut self, open: usize) -> SelectorResult<(RawNode, usize)> {
        let Some(close) = self.tokens[open].close else {
            self.report_unclosed(open);
            return Err(());
        };
        let significant: Vec<usize> = (open + 1..close)
            .filter(|&i| !self.tokens[i].kind.is_trivia())
            .collect();
        let mut cursor = significant.iter().copied().peekable();

        let name = match cursor.next() {
            Some(first) if self.tokens[first].kind == TokenKind::Ident => {
                let namespaced = self.delim_at(first + 1, close) == Some('|')
                    && self.kind_at(first + 2, close) == Some(TokenKind::Ident);
                if namespaced {
                    cursor.next();
                    cursor.next();
                    self.slice(first, first + 3)
                } else {
                    self.text(first)
                }
            }
            other => {
                self.error_at_token(other.unwrap_or(close), "Identifier is expected");
                return Err(());
            }
        };

        let mut matcher = None;
        let mut value = None;
        let mut flags = None;
        if let Some(op) = cursor.next() {
            matcher = match self.delim_at(op, close) {
                Some('=') => Some("=".to_string()),
                Some(c @ ('~' | '|' | '^' | '$' | '*'))
                    if self.delim_at(op + 1, close) == Some('=')
                        && self.tokens[op + 1].start == self.tokens[op].end =>
                {
                    cursor.next();
                    Some(format!("{c}="))
                }
                _ => None,
            };
            if matcher.is_none() {
                self.error_at_token(op, "Attribute selector (=, ~=, ^=, $=, *=, |=) is expected");
                return Err(());
            }

            value = match cursor.next() {
                Some(v) if self.tokens[v].kind == TokenKind::String => Some(AttributeValue::String(
                    self.tokens[v].unescaped.clone().unwrap_or_default(),
                )),
                Some(v) if self.tokens[v].kind == TokenKind::Ident => {
                    Some(AttributeValue::Identifier(self.text(v).to_string()))
                }
                other => {
                    self.error_at_token(other.unwrap_or(close), "Attribute value is expected");
                    return Err(());
                }
            };

            if let Some(&flag) = cursor.peek() {
                if self.tokens[flag].kind == TokenKind::Ident {
                    flags = Some(self.text(flag).to_string());
                    cursor.next();
                }
            }
        }

        if let Some(extra) = cursor.next() {
            self.error_at_token(extra, "] is expected");
            return Err(());
        }

        let loc = self.loc(self.tokens[open].start, self.tokens[close].end);
        let node = RawNode::new(NodeType::AttributeSelector, loc).with_detail(NodeDetail::Attribute {
            name: name.to_string(),
            matcher,
            value,
            flags,
        });
        Ok((node, close + 1))
    }

    fn pseudo_selector(&mut self, colon: usize, end: usize) -> SelectorResult<(RawNode, usize)> {
        let element = self.kind_at(colon + 1, end) == Some(TokenKind::Colon);
        let name_index = if element { colon + 2 } else { colon + 1 };
        let kind = if element {
            NodeType::PseudoElementSelector
        } else {
            NodeType::PseudoClassSelector
        };
        let start = self.tokens[colon].start;

        match self.kind_at(name_index, end) {
            Some(TokenKind::Ident) => {
                let name = self.text(name_index);
                let loc = self.loc(start, self.tokens[name_index].end);
                Ok((
                    RawNode::new(kind, loc).with_detail(NodeDetail::name(name)),
                    name_index + 1,
                ))
            }
            Some(TokenKind::Function) => {
                let text = self.text(name_index);
                let name = &text[..text.len() - 1];
                let Some(close) = self.tokens[name_index].close.filter(|&c| c < end) else {
                    self.report_unclosed(name_index);
                    return Err(());
                };
                let (from, to) = self.trim(name_index + 1, close);
                let argument = if !element && takes_selector_list(name) {
                    if from == to {
                        self.error_at_token(from, "Selector is expected");
                        return Err(());
                    }
                    self.selector_list(from, to)?
                } else {
                    self.raw_range(from, to)
                };
                let loc = self.loc(start, self.tokens[close].end);
                Ok((
                    RawNode::new(kind, loc)
                        .with_detail(NodeDetail::name(name))
                        .with_children(vec![argument]),
                    close + 1,
                ))
            }
            _ => {
                self.error_at_token(name_index, "Identifier is expected");
                Err(())
            }
        }
    }
}
