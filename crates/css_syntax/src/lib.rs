//! CSS syntax layer: tokenization, context-sensitive grammar and generation.
//!
//! This crate knows nothing about node ids, budgets or tracing. It turns text
//! into a flat token list (`tokenize`), the token list into an untyped
//! [`RawNode`] tree for a chosen [`ParseContext`] (`parse`), and a raw tree
//! back into canonical CSS text (`generate`).
//!
//! Syntax errors never abort parsing; they are handed to the caller's
//! callback in source order of discovery and the offending input is kept as
//! `Raw` nodes where possible.

pub mod ast;
pub mod context;
pub mod error;
pub mod generate;
pub mod parser;
pub mod tokenizer;

pub use ast::{AttributeValue, Loc, NodeDetail, NodeType, RawNode};
pub use context::ParseContext;
pub use error::SyntaxError;
pub use generate::generate;
pub use parser::{ParseConfig, parse, parse_text};
pub use tokenizer::{MAX_BLOCK_DEPTH, SyntaxToken, TokenKind, TokenList, tokenize};
