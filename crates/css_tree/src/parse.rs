//! Parse orchestration: budgets, tokenization, grammar, node model, trace.

use crate::budget::{BudgetExceeded, BudgetName, Deadline, as_u64};
use crate::builder::build_tree;
use crate::encoding::{EncodingSniff, SniffOptions, SniffSource, decode_css_bytes};
use crate::error::{Error, ParseError};
use crate::node::{CssNode, NodeId};
use crate::options::{ParseOptions, TokenizeOptions};
use crate::trace::{DecodeSource, TraceKind, TraceRecorder};
use css_syntax::{ParseConfig, ParseContext, SyntaxToken};
use serde::Serialize;

const ERROR_HANDLING_SPEC_URL: &str = "https://drafts.csswg.org/css-syntax/#error-handling";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TreeKind {
    Stylesheet,
    Fragment,
}

/// Result of one parse call. Immutable once returned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTree {
    /// Equal to `root.id`.
    pub id: NodeId,
    pub kind: TreeKind,
    pub context: ParseContext,
    pub root: CssNode,
    pub errors: Vec<ParseError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<crate::trace::TraceEvent>>,
}

impl ParsedTree {
    /// Direct children of the root.
    pub fn children(&self) -> &[CssNode] {
        &self.root.children
    }

    /// Append events to an enabled trace, continuing its sequence.
    pub(crate) fn extend_trace(
        &mut self,
        options: &ParseOptions,
        append: impl FnOnce(&mut TraceRecorder) -> Result<(), BudgetExceeded>,
    ) -> Result<(), BudgetExceeded> {
        let Some(events) = self.trace.take() else {
            return Ok(());
        };
        let mut recorder = TraceRecorder::resume(Some(events), &options.budgets);
        let result = append(&mut recorder);
        self.trace = recorder.finish();
        result
    }
}

impl AsRef<CssNode> for ParsedTree {
    fn as_ref(&self) -> &CssNode {
        &self.root
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// CSS Syntax token name without the `-token` suffix.
    pub kind: &'static str,
    pub raw_kind: &'static str,
    /// Exact source slice.
    pub value: String,
    pub start: usize,
    pub end: usize,
}

impl Token {
    fn from_syntax(source: &str, token: &SyntaxToken) -> Self {
        Self {
            kind: token.kind.name(),
            raw_kind: token.kind.raw_name(),
            value: token.text(source).to_string(),
            start: token.start,
            end: token.end,
        }
    }
}

pub fn tokenize(text: &str, options: &TokenizeOptions) -> Result<Vec<Token>, Error> {
    let budgets = &options.budgets;
    let deadline = Deadline::start(budgets);
    budgets.check(BudgetName::MaxInputBytes, as_u64(text.len()))?;
    let tokens = css_syntax::tokenize(text);
    budgets.check(BudgetName::MaxTokens, as_u64(tokens.len()))?;
    deadline.check()?;
    Ok(tokens
        .tokens()
        .iter()
        .map(|token| Token::from_syntax(text, token))
        .collect())
}

/// Parse a complete stylesheet.
pub fn parse(text: &str, options: &ParseOptions) -> Result<ParsedTree, Error> {
    parse_in_context(text, ParseContext::Stylesheet, TreeKind::Stylesheet, options)
}

/// Parse `text` as the named grammar context (`declarationList`,
/// `selector-list`, ...). Unknown names fail before any work is done.
pub fn parse_fragment(text: &str, context_name: &str, options: &ParseOptions) -> Result<ParsedTree, Error> {
    let context = ParseContext::from_name(context_name)
        .ok_or_else(|| Error::InvalidParseContext(context_name.to_string()))?;
    parse_in_context(text, context, TreeKind::Fragment, options)
}

pub fn parse_rule_list(text: &str, options: &ParseOptions) -> Result<ParsedTree, Error> {
    parse_in_context(text, ParseContext::Rule, TreeKind::Fragment, options)
}

pub fn parse_declaration_list(text: &str, options: &ParseOptions) -> Result<ParsedTree, Error> {
    parse_in_context(text, ParseContext::DeclarationList, TreeKind::Fragment, options)
}

/// Reference to the CSS Syntax section describing error recovery.
pub fn parse_error_spec_ref(_parse_error_id: &str) -> &'static str {
    ERROR_HANDLING_SPEC_URL
}

/// Sniff, decode and parse a complete byte buffer as a stylesheet.
pub fn parse_bytes(bytes: &[u8], options: &ParseOptions) -> Result<ParsedTree, Error> {
    options
        .budgets
        .check(BudgetName::MaxInputBytes, as_u64(bytes.len()))?;
    let sniff_options = SniffOptions {
        transport_encoding_label: options.transport_encoding_label.clone(),
        ..SniffOptions::default()
    };
    let (text, sniff) = decode_css_bytes(bytes, &sniff_options)?;
    let mut tree = parse(&text, options)?;
    tree.extend_trace(options, |trace| trace.record(sniffed(&sniff)))?;
    Ok(tree)
}

pub(crate) fn sniffed(sniff: &EncodingSniff) -> TraceKind {
    TraceKind::Decode {
        source: DecodeSource::Sniff,
        encoding: sniff.name(),
        sniff_source: sniff.source,
    }
}

struct TreeMetrics {
    nodes: u64,
    max_depth: u64,
}

impl TreeMetrics {
    /// Node count and maximum depth, root at depth 1.
    fn measure(root: &CssNode) -> Self {
        let mut metrics = Self {
            nodes: 0,
            max_depth: 0,
        };
        let mut stack = vec![(root, 1u64)];
        while let Some((node, depth)) = stack.pop() {
            metrics.nodes += 1;
            metrics.max_depth = metrics.max_depth.max(depth);
            stack.extend(node.children.iter().map(|child| (child, depth + 1)));
        }
        metrics
    }
}

fn parse_in_context(
    text: &str,
    context: ParseContext,
    kind: TreeKind,
    options: &ParseOptions,
) -> Result<ParsedTree, Error> {
    let budgets = &options.budgets;
    let deadline = Deadline::start(budgets);
    let input_bytes = as_u64(text.len());
    budgets.check(BudgetName::MaxInputBytes, input_bytes)?;

    let mut trace = TraceRecorder::new(options.trace, budgets);
    trace.record(TraceKind::Decode {
        source: DecodeSource::Input,
        encoding: "utf-8".to_string(),
        sniff_source: SniffSource::Input,
    })?;
    trace.record_budget(BudgetName::MaxInputBytes, budgets.max_input_bytes, input_bytes)?;

    let tokens = css_syntax::tokenize(text);
    let token_count = as_u64(tokens.len());
    budgets.check(BudgetName::MaxTokens, token_count)?;
    deadline.check()?;
    trace.record(TraceKind::Token { count: token_count })?;

    let mut syntax_errors = Vec::new();
    let config = ParseConfig::new(context).with_positions(options.capture_spans);
    let raw = css_syntax::parse(text, &tokens, config, &mut |error| {
        syntax_errors.push(error)
    });
    drop(tokens);

    let root = build_tree(raw, text.len(), options.capture_spans);
    let metrics = TreeMetrics::measure(&root);
    budgets.check(BudgetName::MaxNodes, metrics.nodes)?;
    budgets.check(BudgetName::MaxDepth, metrics.max_depth)?;
    deadline.check()?;

    let errors: Vec<ParseError> = syntax_errors
        .into_iter()
        .map(|error| ParseError::from_syntax(error, text.len()))
        .collect();

    trace.record(TraceKind::Parse {
        context,
        node_count: metrics.nodes,
        error_count: as_u64(errors.len()),
    })?;
    for error in &errors {
        trace.record(TraceKind::ParseError {
            parse_error_id: error.parse_error_id.clone(),
            start_offset: error.span.map(|span| span.start),
            end_offset: error.span.map(|span| span.end),
        })?;
    }
    trace.record_budget(BudgetName::MaxTokens, budgets.max_tokens, token_count)?;
    trace.record_budget(BudgetName::MaxNodes, budgets.max_nodes, metrics.nodes)?;
    trace.record_budget(BudgetName::MaxDepth, budgets.max_depth, metrics.max_depth)?;

    log::debug!(
        target: "css.parse",
        "parsed context={context} bytes={input_bytes} tokens={token_count} nodes={} depth={} errors={} elapsed_ms={}",
        metrics.nodes,
        metrics.max_depth,
        errors.len(),
        deadline.elapsed_ms()
    );

    Ok(ParsedTree {
        id: root.id,
        kind,
        context,
        root,
        errors,
        trace: trace.finish(),
    })
}
