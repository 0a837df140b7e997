//! Context-sensitive recursive-descent grammar over a [`TokenList`].
//!
//! The parser works on token index ranges: every production receives (or
//! scopes itself to) a half-open range `[pos, limit)` of the flat token
//! vector, and nested blocks are entered through their paired close token.
//! Recursion depth is bounded by the tokenizer's nesting cap.
//!
//! Locations are reported only when `ParseConfig::positions` is set. Every
//! location is a byte range of the original text.

mod rules;
mod selectors;
mod values;

use crate::ast::{Loc, RawNode};
use crate::context::ParseContext;
use crate::error::SyntaxError;
use crate::tokenizer::{SyntaxToken, TokenKind, TokenList, tokenize};
use tools::text::LineIndex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseConfig {
    pub context: ParseContext,
    /// Attach byte locations to nodes.
    pub positions: bool,
}

impl ParseConfig {
    pub fn new(context: ParseContext) -> Self {
        Self {
            context,
            positions: false,
        }
    }

    pub fn with_positions(mut self, positions: bool) -> Self {
        self.positions = positions;
        self
    }
}

/// Parse an already tokenized `source` for `config.context`.
///
/// Syntax errors are passed to `on_error`; the returned tree always exists.
pub fn parse(
    source: &str,
    tokens: &TokenList,
    config: ParseConfig,
    on_error: &mut dyn FnMut(SyntaxError),
) -> RawNode {
    let mut parser = GrammarParser::new(source, tokens.tokens(), config.positions, on_error);
    for &offset in tokens.truncated() {
        parser.error_at(offset, "Nesting is too deep");
    }
    let root = parser.parse_context(config.context);
    log::debug!(
        target: "css.syntax",
        "parsed context={} tokens={}",
        config.context,
        tokens.len()
    );
    root
}

/// Tokenize and parse in one step.
pub fn parse_text(
    source: &str,
    config: ParseConfig,
    on_error: &mut dyn FnMut(SyntaxError),
) -> RawNode {
    let tokens = tokenize(source);
    parse(source, &tokens, config, on_error)
}

pub(crate) struct GrammarParser<'s, 'e> {
    source: &'s str,
    tokens: &'s [SyntaxToken],
    pos: usize,
    limit: usize,
    positions: bool,
    /// Number of enclosing style-rule blocks; at-rule blocks inside a style
    /// rule accept declarations.
    style_depth: usize,
    lines: Option<LineIndex>,
    on_error: &'e mut dyn FnMut(SyntaxError),
}

impl<'s, 'e> GrammarParser<'s, 'e> {
    fn new(
        source: &'s str,
        tokens: &'s [SyntaxToken],
        positions: bool,
        on_error: &'e mut dyn FnMut(SyntaxError),
    ) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
            limit: tokens.len(),
            positions,
            style_depth: 0,
            lines: None,
            on_error,
        }
    }

    fn parse_context(&mut self, context: ParseContext) -> RawNode {
        let (start, end) = self.trim(0, self.tokens.len());
        match context {
            ParseContext::Stylesheet => self.stylesheet(),
            ParseContext::Atrule => self.single_item(|p| match p.peek_kind() {
                Some(TokenKind::AtKeyword) => p.at_rule(),
                _ => p.raw_rest("At-rule is expected"),
            }),
            ParseContext::Rule => self.single_item(|p| match p.peek_kind() {
                Some(TokenKind::AtKeyword) => p.at_rule(),
                Some(_) => p.qualified_rule(false),
                None => p.raw_rest("Rule is expected"),
            }),
            ParseContext::AtrulePrelude => self.generic_prelude(start, end),
            ParseContext::MediaQueryList => self.media_query_list(start, end),
            ParseContext::MediaQuery => self.media_query(start, end),
            ParseContext::Condition => self.condition(start, end),
            ParseContext::SelectorList => self
                .selector_list(start, end)
                .unwrap_or_else(|()| self.raw_range(start, end)),
            ParseContext::Selector => {
                if start == end {
                    self.error_at_token(start, "Selector is expected");
                    return self.raw_range(start, end);
                }
                self.selector(start, end)
                    .unwrap_or_else(|()| self.raw_range(start, end))
            }
            ParseContext::Block => {
                let children = self.block_items();
                RawNode::new(crate::ast::NodeType::Block, self.loc(0, self.source.len()))
                    .with_children(children)
            }
            ParseContext::DeclarationList => {
                let children = self.block_items();
                RawNode::new(
                    crate::ast::NodeType::DeclarationList,
                    self.loc(0, self.source.len()),
                )
                .with_children(children)
            }
            ParseContext::Declaration => {
                let stop = self
                    .find_top_level(start, end, |kind| kind == TokenKind::Semicolon)
                    .unwrap_or(end);
                let node = self.declaration(start, stop);
                let rest = self.next_significant(stop.saturating_add(1).min(end), end);
                if stop < end && rest < end {
                    self.error_at_token(rest, "Unexpected input");
                }
                node
            }
            ParseContext::Value => {
                let children = self.component_sequence(start, end);
                RawNode::new(crate::ast::NodeType::Value, self.loc_tokens(start, end))
                    .with_children(children)
            }
        }
    }

    /// Parse one item, then report anything left over.
    fn single_item(&mut self, item: impl FnOnce(&mut Self) -> RawNode) -> RawNode {
        self.skip_trivia();
        let node = item(self);
        self.skip_trivia();
        if self.peek().is_some() {
            self.error_at_token(self.pos, "Unexpected input");
            self.pos = self.limit;
        }
        node
    }

    // --- cursor -----------------------------------------------------------

    fn peek(&self) -> Option<&'s SyntaxToken> {
        if self.pos < self.limit {
            self.tokens.get(self.pos)
        } else {
            None
        }
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    fn kind_at(&self, index: usize, end: usize) -> Option<TokenKind> {
        if index < end {
            self.tokens.get(index).map(|token| token.kind)
        } else {
            None
        }
    }

    fn delim_at(&self, index: usize, end: usize) -> Option<char> {
        if index < end {
            self.tokens.get(index)?.delim(self.source)
        } else {
            None
        }
    }

    fn text(&self, index: usize) -> &'s str {
        self.tokens[index].text(self.source)
    }

    fn skip_trivia(&mut self) {
        while self.peek_kind().is_some_and(TokenKind::is_trivia) {
            self.pos += 1;
        }
    }

    /// First non-trivia index in `[from, end)`, or `end`.
    fn next_significant(&self, from: usize, end: usize) -> usize {
        let mut index = from;
        while index < end && self.tokens[index].kind.is_trivia() {
            index += 1;
        }
        index
    }

    /// Shrink `[start, end)` past leading and trailing trivia.
    fn trim(&self, start: usize, end: usize) -> (usize, usize) {
        let start = self.next_significant(start, end);
        let mut end = end;
        while end > start && self.tokens[end - 1].kind.is_trivia() {
            end -= 1;
        }
        (start, end)
    }

    /// Index just past the component starting at `index` (whole block for
    /// openers), bounded by `end`.
    fn component_end(&self, index: usize, end: usize) -> usize {
        let token = &self.tokens[index];
        if token.kind.is_block_open() {
            match token.close {
                Some(close) if close < end => close + 1,
                _ => end,
            }
        } else {
            index + 1
        }
    }

    /// First top-level index in `[start, end)` whose kind satisfies `pred`.
    fn find_top_level(
        &self,
        start: usize,
        end: usize,
        pred: impl Fn(TokenKind) -> bool,
    ) -> Option<usize> {
        let mut index = start;
        while index < end {
            if pred(self.tokens[index].kind) {
                return Some(index);
            }
            index = self.component_end(index, end);
        }
        None
    }

    /// Split `[start, end)` at top-level `separator` tokens.
    fn split_top_level(&self, start: usize, end: usize, separator: TokenKind) -> Vec<(usize, usize)> {
        let mut parts = Vec::new();
        let mut part_start = start;
        let mut index = start;
        while index < end {
            if self.tokens[index].kind == separator {
                parts.push((part_start, index));
                part_start = index + 1;
                index += 1;
                continue;
            }
            index = self.component_end(index, end);
        }
        parts.push((part_start, end));
        parts
    }

    /// Exclusive end of an opener's content: its close token, or the current
    /// scope limit when unclosed.
    fn inner_end(&self, open: usize) -> usize {
        match self.tokens[open].close {
            Some(close) if close <= self.limit => close,
            _ => self.limit,
        }
    }

    fn with_range<T>(&mut self, start: usize, end: usize, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = (self.pos, self.limit);
        self.pos = start;
        self.limit = end;
        let out = f(self);
        self.pos = saved.0;
        self.limit = saved.1;
        out
    }

    // --- offsets and locations -------------------------------------------

    /// Start offset of token `index`, or the end of input past the last token.
    fn offset_of(&self, index: usize) -> usize {
        self.tokens
            .get(index)
            .map_or(self.source.len(), |token| token.start)
    }

    /// End offset of the token run `[start, end)`; for an empty run, the
    /// offset where it would begin.
    fn end_offset(&self, start: usize, end: usize) -> usize {
        if end > start {
            self.tokens[end - 1].end
        } else {
            self.offset_of(start)
        }
    }

    fn loc(&self, start: usize, end: usize) -> Option<Loc> {
        self.positions.then_some(Loc { start, end })
    }

    fn loc_tokens(&self, start: usize, end: usize) -> Option<Loc> {
        let from = self.offset_of(start);
        self.loc(from, self.end_offset(start, end).max(from))
    }

    fn slice(&self, start: usize, end: usize) -> &'s str {
        if end <= start {
            return "";
        }
        &self.source[self.tokens[start].start..self.tokens[end - 1].end]
    }

    fn raw_range(&self, start: usize, end: usize) -> RawNode {
        RawNode::raw(self.slice(start, end), self.loc_tokens(start, end))
    }

    /// Report `message` and swallow the rest of the scope as a raw node.
    fn raw_rest(&mut self, message: &str) -> RawNode {
        self.error_at_token(self.pos, message);
        let (start, end) = self.trim(self.pos, self.limit);
        self.pos = self.limit;
        self.raw_range(start, end)
    }

    // --- errors -----------------------------------------------------------

    fn error_at(&mut self, offset: usize, message: &str) {
        let source = self.source;
        let lines = self.lines.get_or_insert_with(|| LineIndex::new(source));
        let (line, column) = lines.line_column(source, offset);
        (self.on_error)(SyntaxError {
            message: message.to_string(),
            offset,
            line,
            column,
        });
    }

    fn error_at_token(&mut self, index: usize, message: &str) {
        let offset = self.offset_of(index);
        self.error_at(offset, message);
    }

    /// Report a block opener that reached the end of its scope unclosed.
    fn report_unclosed(&mut self, open: usize) {
        let message = match self.tokens[open].kind.closing() {
            Some(TokenKind::RightParenthesis) => ") is expected",
            Some(TokenKind::RightSquareBracket) => "] is expected",
            _ => "} is expected",
        };
        let offset = self.end_offset(open, self.limit);
        self.error_at(offset, message);
    }
}
