//! CSS document kernel.
//!
//! - [`tree`]: parsing (text, bytes, streams), budgets, tracing, patches,
//!   serialization and traversal over id- and span-stable trees.
//! - [`select`]: selector compilation and matching over any
//!   [`select::SelectorNode`] tree, and style signals.
//! - [`syntax`]: the tokenizer, grammar and generator underneath.

pub use css_select as select;
pub use css_syntax as syntax;
pub use css_tree as tree;

pub use css_select::{
    CompiledSelectorList, QueryOptions, SelectorNode, compile_selector_list, matches_selector,
    query_selector_all,
};
pub use css_tree::{
    Edit, Error, ParseOptions, ParsedTree, apply_patch_plan, compute_patch, parse, parse_bytes,
    parse_fragment, parse_stream, serialize,
};
