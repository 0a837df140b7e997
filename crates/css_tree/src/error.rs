use crate::budget::BudgetExceeded;
use crate::span::Span;
use css_syntax::SyntaxError;
use serde::Serialize;

/// Failure of a parse, tokenize or decode call. No partial result is
/// returned alongside any of these.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    BudgetExceeded(#[from] BudgetExceeded),
    #[error("unsupported parse context: {0}")]
    InvalidParseContext(String),
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),
    #[error("stream read failed: {0}")]
    StreamReadFailed(String),
}

impl Error {
    pub fn budget(&self) -> Option<&BudgetExceeded> {
        match self {
            Error::BudgetExceeded(exceeded) => Some(exceeded),
            _ => None,
        }
    }
}

/// Recoverable syntax error collected during a parse.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseError {
    pub code: &'static str,
    pub parse_error_id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl ParseError {
    pub const CODE: &'static str = "PARSER_ERROR";

    pub(crate) fn from_syntax(error: SyntaxError, input_len: usize) -> Self {
        let start = error.offset.min(input_len);
        let end = error.offset.saturating_add(1).min(input_len);
        Self {
            code: Self::CODE,
            parse_error_id: parse_error_id(&error.message),
            span: Some(Span::new(start, end)),
            line: (error.line > 0).then_some(error.line),
            column: (error.column > 0).then_some(error.column),
            message: error.message,
        }
    }
}

/// Stable slug for a syntax error message.
pub fn parse_error_id(message: &str) -> String {
    let mut slug = String::with_capacity(message.len());
    let mut pending_dash = false;
    for ch in message.chars() {
        let ch = ch.to_ascii_lowercase();
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("css-syntax-error");
    }
    slug
}
