//! Selector compilation and matching over any tree that can describe its
//! elements, plus per-rule style signals (selector specificity and
//! declarations) extracted from stylesheets.

pub mod compile;
pub mod node;
pub mod query;
pub mod signals;
pub mod specificity;

pub use compile::{
    AttributeMatcher, Combinator, CompiledSelector, CompiledSelectorList, Compound, SimpleSelector,
    UnsupportedPart, compile_selector_list,
};
pub use node::SelectorNode;
pub use query::{QueryError, QueryOptions, SelectorSource, matches_selector, query_selector_all};
pub use signals::{
    DeclarationSignal, SignalError, StyleRuleSignal, StyleSignalOptions,
    extract_inline_style_signals, extract_style_rule_signals,
};
pub use specificity::Specificity;
