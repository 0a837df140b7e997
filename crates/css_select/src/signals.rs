//! Style signals: per-rule selector specificity and declaration order,
//! without resolving any cascade.

use crate::compile::compile_selector_nodes;
use crate::specificity::Specificity;
use css_tree::{
    Budgets, CssNode, NodeId, NodeType, ParseOptions, PreOrder, parse, parse_declaration_list,
    serialize,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleSignalOptions {
    /// Keep rules whose selector list has unsupported parts.
    pub include_unsupported_selectors: bool,
    /// Fail on the first unsupported selector list instead.
    pub strict_selectors: bool,
    pub budgets: Budgets,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignalError {
    #[error(transparent)]
    Parse(#[from] css_tree::Error),
    #[error("unsupported selector in strict mode: {selector_text}")]
    UnsupportedSelector { rule_id: NodeId, selector_text: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRuleSignal {
    pub rule_id: NodeId,
    /// Index of the rule among all style rules of the sheet.
    pub cascade_order: usize,
    pub selector_text: String,
    pub selector_supported: bool,
    /// One entry per selector in the list.
    pub specificities: Vec<Specificity>,
    pub specificity_max: Specificity,
    pub declarations: Vec<DeclarationSignal>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationSignal {
    pub node_id: NodeId,
    /// Lowercased property name.
    pub property: String,
    pub value: String,
    pub important: bool,
    pub declaration_order: usize,
}

/// Signals for every style rule in `css`, nested ones included, in
/// document order.
pub fn extract_style_rule_signals(
    css: &str,
    options: &StyleSignalOptions,
) -> Result<Vec<StyleRuleSignal>, SignalError> {
    let tree = parse(css, &parse_options(options))?;
    let style_rules = PreOrder::new(&tree.root)
        .map(|(node, _)| node)
        .filter(|node| node.is(NodeType::Rule))
        .filter_map(|rule| Some((rule, rule.child(NodeType::SelectorList)?)));

    let mut signals = Vec::new();
    for (cascade_order, (rule, prelude)) in style_rules.enumerate() {
        let selector_text = serialize(prelude);
        let compiled = compile_selector_nodes(&selector_text, prelude, Vec::new());
        if !compiled.supported {
            if options.strict_selectors {
                return Err(SignalError::UnsupportedSelector {
                    rule_id: rule.id,
                    selector_text,
                });
            }
            if !options.include_unsupported_selectors {
                log::trace!(target: "css.select", "skipping rule {}: {:?}", rule.id, selector_text);
                continue;
            }
        }

        let specificities: Vec<Specificity> =
            compiled.selectors.iter().map(|s| s.specificity()).collect();
        let declarations = rule
            .child(NodeType::Block)
            .map(declaration_signals)
            .unwrap_or_default();
        signals.push(StyleRuleSignal {
            rule_id: rule.id,
            cascade_order,
            selector_text,
            selector_supported: compiled.supported,
            specificity_max: specificities.iter().copied().max().unwrap_or_default(),
            specificities,
            declarations,
        });
    }
    Ok(signals)
}

/// Declarations of a `style` attribute value, in order.
pub fn extract_inline_style_signals(css: &str) -> Result<Vec<DeclarationSignal>, SignalError> {
    let tree = parse_declaration_list(css, &ParseOptions::default())?;
    Ok(declaration_signals(&tree.root))
}

fn parse_options(options: &StyleSignalOptions) -> ParseOptions {
    ParseOptions {
        budgets: options.budgets,
        ..ParseOptions::default()
    }
}

fn declaration_signals(block: &CssNode) -> Vec<DeclarationSignal> {
    block
        .children
        .iter()
        .filter(|child| child.is(NodeType::Declaration))
        .enumerate()
        .map(|(declaration_order, declaration)| DeclarationSignal {
            node_id: declaration.id,
            property: declaration.property().unwrap_or_default().to_lowercase(),
            value: declaration
                .children
                .first()
                .map(|value| serialize(value).trim().to_string())
                .unwrap_or_default(),
            important: declaration.important(),
            declaration_order,
        })
        .collect()
}
