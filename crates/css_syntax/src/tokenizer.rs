//! Flat CSS Syntax token list built on `cssparser`.
//!
//! `cssparser` hands out nested blocks as scoped sub-parsers; this module
//! flattens them back into a single token vector with exact byte offsets and
//! explicit close tokens, so the grammar layer can index tokens freely.
//!
//! Invariants:
//! - Tokens are in source order and never overlap.
//! - `start < end` for every token, and `end <= source.len()`.
//! - A block opener's `close` points at its matching close token. Openers left
//!   unclosed at the end of their scope have `close == None`.
//! - Multi-character match operators (`~=`, `|=`, `^=`, `$=`, `*=`) are split
//!   into two adjacent delim tokens, as CSS Syntax defines them.

use cssparser::{ParseError, Parser, ParserInput, Token};

/// Deepest block nesting that is tokenized. Content of deeper blocks is
/// skipped and reported through [`TokenList::truncated`].
pub const MAX_BLOCK_DEPTH: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Ident,
    Function,
    AtKeyword,
    Hash,
    String,
    BadString,
    Url,
    BadUrl,
    Delim,
    Number,
    Percentage,
    Dimension,
    WhiteSpace,
    Cdo,
    Cdc,
    Colon,
    Semicolon,
    Comma,
    LeftSquareBracket,
    RightSquareBracket,
    LeftParenthesis,
    RightParenthesis,
    LeftCurlyBracket,
    RightCurlyBracket,
    Comment,
}

impl TokenKind {
    /// CSS Syntax token name, e.g. `ident-token` or `(-token`.
    pub fn raw_name(self) -> &'static str {
        match self {
            TokenKind::Ident => "ident-token",
            TokenKind::Function => "function-token",
            TokenKind::AtKeyword => "at-keyword-token",
            TokenKind::Hash => "hash-token",
            TokenKind::String => "string-token",
            TokenKind::BadString => "bad-string-token",
            TokenKind::Url => "url-token",
            TokenKind::BadUrl => "bad-url-token",
            TokenKind::Delim => "delim-token",
            TokenKind::Number => "number-token",
            TokenKind::Percentage => "percentage-token",
            TokenKind::Dimension => "dimension-token",
            TokenKind::WhiteSpace => "whitespace-token",
            TokenKind::Cdo => "CDO-token",
            TokenKind::Cdc => "CDC-token",
            TokenKind::Colon => "colon-token",
            TokenKind::Semicolon => "semicolon-token",
            TokenKind::Comma => "comma-token",
            TokenKind::LeftSquareBracket => "[-token",
            TokenKind::RightSquareBracket => "]-token",
            TokenKind::LeftParenthesis => "(-token",
            TokenKind::RightParenthesis => ")-token",
            TokenKind::LeftCurlyBracket => "{-token",
            TokenKind::RightCurlyBracket => "}-token",
            TokenKind::Comment => "comment-token",
        }
    }

    /// Token name without the `-token` suffix.
    pub fn name(self) -> &'static str {
        let raw = self.raw_name();
        raw.strip_suffix("-token").unwrap_or(raw)
    }

    /// True for tokens that open a simple block or function.
    pub fn is_block_open(self) -> bool {
        matches!(
            self,
            TokenKind::Function
                | TokenKind::LeftParenthesis
                | TokenKind::LeftSquareBracket
                | TokenKind::LeftCurlyBracket
        )
    }

    /// Close token kind for a block opener.
    pub fn closing(self) -> Option<TokenKind> {
        match self {
            TokenKind::Function | TokenKind::LeftParenthesis => Some(TokenKind::RightParenthesis),
            TokenKind::LeftSquareBracket => Some(TokenKind::RightSquareBracket),
            TokenKind::LeftCurlyBracket => Some(TokenKind::RightCurlyBracket),
            _ => None,
        }
    }

    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::WhiteSpace | TokenKind::Comment)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxToken {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    /// Index of the matching close token, for block openers.
    pub close: Option<usize>,
    /// Unescaped payload of string and url tokens.
    pub unescaped: Option<String>,
}

impl SyntaxToken {
    fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self {
            kind,
            start,
            end,
            close: None,
            unescaped: None,
        }
    }

    /// Source text covered by this token.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.start..self.end]
    }

    /// First character of the token text; meaningful for delim tokens.
    pub fn delim(&self, source: &str) -> Option<char> {
        if self.kind != TokenKind::Delim {
            return None;
        }
        self.text(source).chars().next()
    }
}

#[derive(Clone, Debug, Default)]
pub struct TokenList {
    tokens: Vec<SyntaxToken>,
    truncated: Vec<usize>,
}

impl TokenList {
    pub fn tokens(&self) -> &[SyntaxToken] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Byte offsets of blocks whose content exceeded [`MAX_BLOCK_DEPTH`].
    pub fn truncated(&self) -> &[usize] {
        &self.truncated
    }
}

/// Tokenize `source` into a flat list with paired blocks.
pub fn tokenize(source: &str) -> TokenList {
    let mut input = ParserInput::new(source);
    let mut parser = Parser::new(&mut input);
    let mut list = TokenList::default();
    collect(&mut parser, source.as_bytes(), &mut list, 0);
    log::trace!(
        target: "css.syntax",
        "tokenized {} bytes into {} tokens",
        source.len(),
        list.tokens.len()
    );
    list
}

struct Classified {
    kind: TokenKind,
    unescaped: Option<String>,
    /// Two-character match operator that must be split into two delims.
    split: bool,
}

fn classify(token: &Token<'_>) -> Classified {
    let mut unescaped = None;
    let mut split = false;
    #[allow(unreachable_patterns)]
    let kind = match token {
        Token::Ident(_) => TokenKind::Ident,
        Token::AtKeyword(_) => TokenKind::AtKeyword,
        Token::Hash(_) | Token::IDHash(_) => TokenKind::Hash,
        Token::QuotedString(value) => {
            unescaped = Some(value.to_string());
            TokenKind::String
        }
        Token::UnquotedUrl(value) => {
            unescaped = Some(value.to_string());
            TokenKind::Url
        }
        Token::Delim(_) => TokenKind::Delim,
        Token::Number { .. } => TokenKind::Number,
        Token::Percentage { .. } => TokenKind::Percentage,
        Token::Dimension { .. } => TokenKind::Dimension,
        Token::WhiteSpace(_) => TokenKind::WhiteSpace,
        Token::Comment(_) => TokenKind::Comment,
        Token::Colon => TokenKind::Colon,
        Token::Semicolon => TokenKind::Semicolon,
        Token::Comma => TokenKind::Comma,
        Token::IncludeMatch
        | Token::DashMatch
        | Token::PrefixMatch
        | Token::SuffixMatch
        | Token::SubstringMatch => {
            split = true;
            TokenKind::Delim
        }
        Token::CDO => TokenKind::Cdo,
        Token::CDC => TokenKind::Cdc,
        Token::Function(_) => TokenKind::Function,
        Token::ParenthesisBlock => TokenKind::LeftParenthesis,
        Token::SquareBracketBlock => TokenKind::LeftSquareBracket,
        Token::CurlyBracketBlock => TokenKind::LeftCurlyBracket,
        Token::BadUrl(_) => TokenKind::BadUrl,
        Token::BadString(_) => TokenKind::BadString,
        Token::CloseParenthesis => TokenKind::RightParenthesis,
        Token::CloseSquareBracket => TokenKind::RightSquareBracket,
        Token::CloseCurlyBracket => TokenKind::RightCurlyBracket,
        _ => TokenKind::Delim,
    };
    Classified {
        kind,
        unescaped,
        split,
    }
}

fn collect<'i>(parser: &mut Parser<'i, '_>, bytes: &[u8], list: &mut TokenList, depth: usize) {
    loop {
        let start = parser.position().byte_index();
        let classified = match parser.next_including_whitespace_and_comments() {
            Ok(token) => classify(token),
            Err(_) => break,
        };
        let end = parser.position().byte_index();
        if end <= start {
            break;
        }

        if classified.split && end - start == 2 {
            list.tokens.push(SyntaxToken::new(TokenKind::Delim, start, start + 1));
            list.tokens.push(SyntaxToken::new(TokenKind::Delim, start + 1, end));
            continue;
        }

        let mut token = SyntaxToken::new(classified.kind, start, end);
        token.unescaped = classified.unescaped;
        list.tokens.push(token);

        if classified.kind.is_block_open() {
            let open = list.tokens.len() - 1;
            collect_block(parser, bytes, list, open, depth + 1);
        }
    }
}

fn collect_block<'i>(
    parser: &mut Parser<'i, '_>,
    bytes: &[u8],
    list: &mut TokenList,
    open: usize,
    depth: usize,
) {
    let open_kind = list.tokens[open].kind;
    let open_end = list.tokens[open].end;
    let (close_kind, close_byte) = match open_kind.closing() {
        Some(TokenKind::RightParenthesis) => (TokenKind::RightParenthesis, b')'),
        Some(TokenKind::RightSquareBracket) => (TokenKind::RightSquareBracket, b']'),
        _ => (TokenKind::RightCurlyBracket, b'}'),
    };

    let _ = parser.parse_nested_block(|nested| {
        if depth > MAX_BLOCK_DEPTH {
            while nested.next_including_whitespace_and_comments().is_ok() {}
            list.truncated.push(open_end);
        } else {
            collect(nested, bytes, list, depth);
        }
        Ok::<(), ParseError<'i, ()>>(())
    });

    // The closer is consumed by `parse_nested_block`; it is present iff the
    // parser moved past the last inner token and landed right after it.
    let inner_end = if list.tokens.len() > open + 1 {
        list.tokens[list.tokens.len() - 1].end
    } else {
        open_end
    };
    let after = parser.position().byte_index();
    if after > inner_end && bytes.get(after - 1) == Some(&close_byte) {
        list.tokens[open].close = Some(list.tokens.len());
        list.tokens
            .push(SyntaxToken::new(close_kind, after - 1, after));
    }
}

#[cfg(test)]
mod tests {
    use super::{TokenKind, tokenize};

    fn kinds(source: &str) -> Vec<&'static str> {
        tokenize(source)
            .tokens()
            .iter()
            .map(|t| t.kind.name())
            .collect()
    }

    #[test]
    fn simple_rule_tokens_cover_source() {
        let source = ".a { color: red; }";
        let list = tokenize(source);
        let joined: String = list.tokens().iter().map(|t| t.text(source)).collect();
        assert_eq!(joined, source);
        assert_eq!(
            kinds(source),
            vec![
                "delim", "ident", "whitespace", "{", "whitespace", "ident", "colon", "whitespace",
                "ident", "semicolon", "whitespace", "}"
            ]
        );
    }

    #[test]
    fn blocks_are_paired() {
        let source = "a{b:f(1)}";
        let list = tokenize(source);
        let tokens = list.tokens();
        assert_eq!(tokens[1].kind, TokenKind::LeftCurlyBracket);
        let close = tokens[1].close.expect("curly block should be closed");
        assert_eq!(tokens[close].kind, TokenKind::RightCurlyBracket);
        assert_eq!(close, tokens.len() - 1);
        let function = tokens
            .iter()
            .position(|t| t.kind == TokenKind::Function)
            .expect("function token");
        let fclose = tokens[function].close.expect("function closed");
        assert_eq!(tokens[fclose].text(source), ")");
    }

    #[test]
    fn unclosed_blocks_have_no_close() {
        let source = "@media (min-width: 1px";
        let list = tokenize(source);
        let paren = list
            .tokens()
            .iter()
            .find(|t| t.kind == TokenKind::LeftParenthesis)
            .expect("paren");
        assert_eq!(paren.close, None);
        assert!(list.truncated().is_empty());
    }

    #[test]
    fn escaped_closer_does_not_close_block() {
        let source = "(\\)";
        let list = tokenize(source);
        assert_eq!(list.tokens()[0].close, None);
    }

    #[test]
    fn match_operators_split_into_delims() {
        let source = "[a~=b]";
        let list = tokenize(source);
        let texts: Vec<&str> = list.tokens().iter().map(|t| t.text(source)).collect();
        assert_eq!(texts, vec!["[", "a", "~", "=", "b", "]"]);
        assert_eq!(list.tokens()[2].kind, TokenKind::Delim);
    }

    #[test]
    fn strings_carry_unescaped_payload() {
        let source = r#"'a\"b'"#;
        let list = tokenize(source);
        assert_eq!(list.tokens()[0].kind, TokenKind::String);
        assert_eq!(list.tokens()[0].unescaped.as_deref(), Some("a\"b"));
    }

    #[test]
    fn deep_nesting_is_truncated() {
        let depth = super::MAX_BLOCK_DEPTH + 20;
        let source = format!("{}{}", "(".repeat(depth), ")".repeat(depth));
        let list = tokenize(&source);
        assert_eq!(list.truncated().len(), 1);
        assert!(list.len() < depth * 2);
    }

    #[test]
    fn raw_names_follow_css_syntax() {
        assert_eq!(TokenKind::Ident.raw_name(), "ident-token");
        assert_eq!(TokenKind::LeftParenthesis.name(), "(");
        assert_eq!(TokenKind::Cdo.name(), "CDO");
    }
}
