//! Stylesheets, rules, at-rules, blocks and declarations.

use super::GrammarParser;
use crate::ast::{NodeDetail, NodeType, RawNode};
use crate::tokenizer::TokenKind;

/// How an at-rule's `{}` block is parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AtruleBlock {
    Rules,
    Keyframes,
    Declarations,
}

fn block_kind_for(name: &str) -> AtruleBlock {
    let name = name.to_ascii_lowercase();
    let unprefixed = strip_vendor_prefix(&name);
    match unprefixed {
        "keyframes" => AtruleBlock::Keyframes,
        "media" | "supports" | "container" | "layer" | "scope" | "document"
        | "starting-style" => AtruleBlock::Rules,
        _ => AtruleBlock::Declarations,
    }
}

fn strip_vendor_prefix(name: &str) -> &str {
    for prefix in ["-webkit-", "-moz-", "-o-", "-ms-"] {
        if let Some(rest) = name.strip_prefix(prefix) {
            return rest;
        }
    }
    name
}

impl GrammarParser<'_, '_> {
    pub(super) fn stylesheet(&mut self) -> RawNode {
        let children = self.rule_list(true, false);
        RawNode::new(NodeType::StyleSheet, self.loc(0, self.source.len())).with_children(children)
    }

    /// Consume rules until the end of the current scope.
    fn rule_list(&mut self, top_level: bool, keyframes: bool) -> Vec<RawNode> {
        let mut rules = Vec::new();
        while let Some(kind) = self.peek_kind() {
            match kind {
                TokenKind::WhiteSpace | TokenKind::Comment => self.pos += 1,
                TokenKind::Cdo | TokenKind::Cdc if top_level => self.pos += 1,
                TokenKind::AtKeyword => rules.push(self.at_rule()),
                _ => rules.push(self.qualified_rule(keyframes)),
            }
        }
        rules
    }

    /// Consume a qualified rule at `pos`. Without a `{` block the rest of
    /// the scope becomes a raw node.
    pub(super) fn qualified_rule(&mut self, keyframes: bool) -> RawNode {
        let start = self.pos;
        let Some(open) =
            self.find_top_level(start, self.limit, |kind| kind == TokenKind::LeftCurlyBracket)
        else {
            let offset = self.end_offset(start, self.limit);
            self.error_at(offset, "Left curly bracket is expected");
            let (from, to) = self.trim(start, self.limit);
            self.pos = self.limit;
            return self.raw_range(from, to);
        };
        self.rule_at(start, open, keyframes)
    }

    /// Build a rule whose prelude spans `[start, open)` and whose block
    /// opens at `open`.
    fn rule_at(&mut self, start: usize, open: usize, keyframes: bool) -> RawNode {
        let prelude = self.rule_prelude(start, open, keyframes);
        let block = self.declaration_block(open);
        let end = block.loc.map(|loc| loc.end);
        let loc = match end {
            Some(end) => self.loc(self.offset_of(start), end),
            None => None,
        };
        RawNode::new(NodeType::Rule, loc).with_children(vec![prelude, block])
    }

    fn rule_prelude(&mut self, start: usize, end: usize, keyframes: bool) -> RawNode {
        let (start, end) = self.trim(start, end);
        if start == end {
            self.error_at_token(start, "Selector is expected");
            return self.raw_range(start, end);
        }
        if keyframes {
            return self.raw_range(start, end);
        }
        self.selector_list(start, end)
            .unwrap_or_else(|()| self.raw_range(start, end))
    }

    /// Consume an at-rule starting at the at-keyword under the cursor.
    pub(super) fn at_rule(&mut self) -> RawNode {
        let start = self.pos;
        let keyword = self.text(start);
        let name = keyword.strip_prefix('@').unwrap_or(keyword);
        self.pos += 1;

        let stop = self.find_top_level(self.pos, self.limit, |kind| {
            matches!(kind, TokenKind::LeftCurlyBracket | TokenKind::Semicolon)
        });
        let prelude_end = stop.unwrap_or(self.limit);
        let (prelude_start, prelude_stop) = self.trim(self.pos, prelude_end);
        let mut children = Vec::with_capacity(2);
        if prelude_start < prelude_stop {
            children.push(self.at_rule_prelude(name, prelude_start, prelude_stop));
        }

        let end_offset = match stop {
            Some(index) if self.tokens[index].kind == TokenKind::Semicolon => {
                self.pos = index + 1;
                self.tokens[index].end
            }
            Some(open) => {
                let block = match block_kind_for(name) {
                    AtruleBlock::Rules if self.style_depth > 0 => self.declaration_block(open),
                    AtruleBlock::Rules => self.rule_block(open, false),
                    AtruleBlock::Keyframes => self.rule_block(open, true),
                    AtruleBlock::Declarations => self.declaration_block(open),
                };
                let end = block
                    .loc
                    .map_or_else(|| self.end_offset(open, self.pos), |loc| loc.end);
                children.push(block);
                end
            }
            None => {
                let end = self.end_offset(start, prelude_stop);
                self.error_at(end, "Semicolon or block is expected");
                self.pos = self.limit;
                end
            }
        };

        RawNode::new(NodeType::Atrule, self.loc(self.offset_of(start), end_offset))
            .with_detail(NodeDetail::name(name))
            .with_children(children)
    }

    /// `{ ... }` containing rules only.
    fn rule_block(&mut self, open: usize, keyframes: bool) -> RawNode {
        let inner_end = self.inner_end(open);
        let children = self.with_range(open + 1, inner_end, |p| p.rule_list(false, keyframes));
        self.finish_block(open, inner_end, children)
    }

    /// `{ ... }` containing declarations and nested rules.
    fn declaration_block(&mut self, open: usize) -> RawNode {
        let inner_end = self.inner_end(open);
        self.style_depth += 1;
        let children = self.with_range(open + 1, inner_end, |p| p.block_items());
        self.style_depth -= 1;
        self.finish_block(open, inner_end, children)
    }

    fn finish_block(&mut self, open: usize, inner_end: usize, children: Vec<RawNode>) -> RawNode {
        let start = self.tokens[open].start;
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
        RawNode::new(NodeType::Block, self.loc(start, end)).with_children(children)
    }

    /// Declarations, at-rules and nested style rules until the scope ends.
    pub(super) fn block_items(&mut self) -> Vec<RawNode> {
        let mut items = Vec::new();
        while let Some(kind) = self.peek_kind() {
            match kind {
                TokenKind::WhiteSpace | TokenKind::Comment | TokenKind::Semicolon => self.pos += 1,
                TokenKind::AtKeyword => items.push(self.at_rule()),
                TokenKind::Ident if self.starts_declaration() => {
                    let end = self
                        .find_top_level(self.pos, self.limit, |k| k == TokenKind::Semicolon)
                        .unwrap_or(self.limit);
                    items.push(self.declaration(self.pos, end));
                    self.pos = end;
                }
                _ => {
                    let start = self.pos;
                    let stop = self.find_top_level(start, self.limit, |k| {
                        matches!(k, TokenKind::LeftCurlyBracket | TokenKind::Semicolon)
                    });
                    match stop {
                        Some(open) if self.tokens[open].kind == TokenKind::LeftCurlyBracket => {
                            items.push(self.rule_at(start, open, false));
                        }
                        _ if kind == TokenKind::Ident => {
                            let end = stop.unwrap_or(self.limit);
                            items.push(self.declaration(start, end));
                            self.pos = end;
                        }
                        _ => {
                            let end = stop.unwrap_or(self.limit);
                            self.error_at_token(start, "Unexpected input");
                            let (from, to) = self.trim(start, end);
                            items.push(self.raw_range(from, to));
                            self.pos = end;
                        }
                    }
                }
            }
        }
        items
    }

    /// An identifier followed by `:` starts a declaration unless a `{`
    /// block comes before the next `;` (a nested rule such as `a:hover{}`).
    /// Custom properties always parse as declarations.
    fn starts_declaration(&self) -> bool {
        let colon = self.next_significant(self.pos + 1, self.limit);
        if self.kind_at(colon, self.limit) != Some(TokenKind::Colon) {
            return false;
        }
        if self.text(self.pos).starts_with("--") {
            return true;
        }
        let stop = self.find_top_level(colon, self.limit, |k| {
            matches!(k, TokenKind::LeftCurlyBracket | TokenKind::Semicolon)
        });
        !matches!(stop, Some(index) if self.tokens[index].kind == TokenKind::LeftCurlyBracket)
    }

    /// Declaration over `[start, end)` (the range excludes any `;`).
    pub(super) fn declaration(&mut self, start: usize, end: usize) -> RawNode {
        let (start, end) = self.trim(start, end);
        if self.kind_at(start, end) != Some(TokenKind::Ident) {
            self.error_at_token(start, "Identifier is expected");
            return self.raw_range(start, end);
        }
        let property = self.text(start);
        let colon = self.next_significant(start + 1, end);
        if self.kind_at(colon, end) != Some(TokenKind::Colon) {
            self.error_at_token(colon, "Colon is expected");
            return self.raw_range(start, end);
        }

        let (value_start, mut value_end) = self.trim(colon + 1, end);
        let mut important = false;
        if value_end > value_start
            && self.tokens[value_end - 1].kind == TokenKind::Ident
            && self.text(value_end - 1).eq_ignore_ascii_case("important")
        {
            let (_, bang_end) = self.trim(value_start, value_end - 1);
            if bang_end > value_start && self.delim_at(bang_end - 1, end) == Some('!') {
                important = true;
                value_end = self.trim(value_start, bang_end - 1).1;
            }
        }

        let colon_end = self.tokens[colon].end;
        let value = if property.starts_with("--") {
            // Custom property values are kept verbatim, including any leading
            // whitespace after the colon.
            let value_stop = self.end_offset(value_start, value_end).max(colon_end);
            let text = if value_end > value_start {
                &self.source[colon_end..value_stop]
            } else {
                ""
            };
            RawNode::raw(text, self.loc(colon_end, value_stop))
        } else {
            let children = self.component_sequence(value_start, value_end);
            let loc = if value_end > value_start {
                self.loc_tokens(value_start, value_end)
            } else {
                self.loc(colon_end, colon_end)
            };
            RawNode::new(NodeType::Value, loc).with_children(children)
        };

        let decl_end = self.end_offset(start, end).max(colon_end);
        RawNode::new(NodeType::Declaration, self.loc(self.tokens[start].start, decl_end))
            .with_detail(NodeDetail::Declaration {
                property: property.to_string(),
                important,
            })
            .with_children(vec![value])
    }
}
