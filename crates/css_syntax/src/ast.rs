//! Untyped syntax tree produced by the grammar layer.

use serde::Serialize;

/// Node type names. `as_str` yields the canonical CamelCase name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum NodeType {
    StyleSheet,
    Atrule,
    AtrulePrelude,
    Rule,
    SelectorList,
    Selector,
    TypeSelector,
    IdSelector,
    ClassSelector,
    AttributeSelector,
    PseudoClassSelector,
    PseudoElementSelector,
    NestingSelector,
    Combinator,
    Block,
    DeclarationList,
    Declaration,
    Value,
    Identifier,
    Number,
    Percentage,
    Dimension,
    String,
    Url,
    Hash,
    Function,
    Operator,
    Parentheses,
    Brackets,
    WhiteSpace,
    Raw,
    MediaQueryList,
    MediaQuery,
    Condition,
}

const ALL_NODE_TYPES: [NodeType; 34] = [
    NodeType::StyleSheet,
    NodeType::Atrule,
    NodeType::AtrulePrelude,
    NodeType::Rule,
    NodeType::SelectorList,
    NodeType::Selector,
    NodeType::TypeSelector,
    NodeType::IdSelector,
    NodeType::ClassSelector,
    NodeType::AttributeSelector,
    NodeType::PseudoClassSelector,
    NodeType::PseudoElementSelector,
    NodeType::NestingSelector,
    NodeType::Combinator,
    NodeType::Block,
    NodeType::DeclarationList,
    NodeType::Declaration,
    NodeType::Value,
    NodeType::Identifier,
    NodeType::Number,
    NodeType::Percentage,
    NodeType::Dimension,
    NodeType::String,
    NodeType::Url,
    NodeType::Hash,
    NodeType::Function,
    NodeType::Operator,
    NodeType::Parentheses,
    NodeType::Brackets,
    NodeType::WhiteSpace,
    NodeType::Raw,
    NodeType::MediaQueryList,
    NodeType::MediaQuery,
    NodeType::Condition,
];

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::StyleSheet => "StyleSheet",
            NodeType::Atrule => "Atrule",
            NodeType::AtrulePrelude => "AtrulePrelude",
            NodeType::Rule => "Rule",
            NodeType::SelectorList => "SelectorList",
            NodeType::Selector => "Selector",
            NodeType::TypeSelector => "TypeSelector",
            NodeType::IdSelector => "IdSelector",
            NodeType::ClassSelector => "ClassSelector",
            NodeType::AttributeSelector => "AttributeSelector",
            NodeType::PseudoClassSelector => "PseudoClassSelector",
            NodeType::PseudoElementSelector => "PseudoElementSelector",
            NodeType::NestingSelector => "NestingSelector",
            NodeType::Combinator => "Combinator",
            NodeType::Block => "Block",
            NodeType::DeclarationList => "DeclarationList",
            NodeType::Declaration => "Declaration",
            NodeType::Value => "Value",
            NodeType::Identifier => "Identifier",
            NodeType::Number => "Number",
            NodeType::Percentage => "Percentage",
            NodeType::Dimension => "Dimension",
            NodeType::String => "String",
            NodeType::Url => "Url",
            NodeType::Hash => "Hash",
            NodeType::Function => "Function",
            NodeType::Operator => "Operator",
            NodeType::Parentheses => "Parentheses",
            NodeType::Brackets => "Brackets",
            NodeType::WhiteSpace => "WhiteSpace",
            NodeType::Raw => "Raw",
            NodeType::MediaQueryList => "MediaQueryList",
            NodeType::MediaQuery => "MediaQuery",
            NodeType::Condition => "Condition",
        }
    }

    /// Resolve a type name, ASCII case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_NODE_TYPES
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
    }

    /// True for nodes that form a selector compound (simple selectors).
    pub fn is_simple_selector(self) -> bool {
        matches!(
            self,
            NodeType::TypeSelector
                | NodeType::IdSelector
                | NodeType::ClassSelector
                | NodeType::AttributeSelector
                | NodeType::PseudoClassSelector
                | NodeType::PseudoElementSelector
                | NodeType::NestingSelector
        )
    }
}

/// Byte offsets reported by the grammar for a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Loc {
    pub start: usize,
    pub end: usize,
}

/// Attribute selector value, kept apart so generation can re-quote strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum AttributeValue {
    Identifier(String),
    String(String),
}

impl AttributeValue {
    pub fn as_str(&self) -> &str {
        match self {
            AttributeValue::Identifier(value) | AttributeValue::String(value) => value,
        }
    }
}

/// Scalar payload of a node. Nested nodes live in `RawNode::children`.
///
/// - `Name`: identifiers, selectors, functions, at-rule names, combinators.
/// - `Value`: numbers, percentages (without `%`), hashes (without `#`),
///   strings and urls (unescaped), operators, whitespace and raw text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NodeDetail {
    #[default]
    None,
    Name {
        name: String,
    },
    Value {
        value: String,
    },
    Dimension {
        value: String,
        unit: String,
    },
    Declaration {
        property: String,
        important: bool,
    },
    Attribute {
        name: String,
        matcher: Option<String>,
        value: Option<AttributeValue>,
        flags: Option<String>,
    },
}

impl NodeDetail {
    pub fn name(name: impl Into<String>) -> Self {
        NodeDetail::Name { name: name.into() }
    }

    pub fn value(value: impl Into<String>) -> Self {
        NodeDetail::Value {
            value: value.into(),
        }
    }

    /// Name-like scalar: `name`, or the declaration property.
    pub fn name_str(&self) -> Option<&str> {
        match self {
            NodeDetail::Name { name } | NodeDetail::Attribute { name, .. } => Some(name),
            NodeDetail::Declaration { property, .. } => Some(property),
            _ => None,
        }
    }

    pub fn value_str(&self) -> Option<&str> {
        match self {
            NodeDetail::Value { value } | NodeDetail::Dimension { value, .. } => Some(value),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawNode {
    pub kind: NodeType,
    pub loc: Option<Loc>,
    pub detail: NodeDetail,
    pub children: Vec<RawNode>,
}

impl RawNode {
    pub fn new(kind: NodeType, loc: Option<Loc>) -> Self {
        Self {
            kind,
            loc,
            detail: NodeDetail::None,
            children: Vec::new(),
        }
    }

    pub fn with_detail(mut self, detail: NodeDetail) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_children(mut self, children: Vec<RawNode>) -> Self {
        self.children = children;
        self
    }

    pub fn raw(text: impl Into<String>, loc: Option<Loc>) -> Self {
        RawNode::new(NodeType::Raw, loc).with_detail(NodeDetail::value(text))
    }

    pub fn is_operator(&self, op: &str) -> bool {
        self.kind == NodeType::Operator && self.detail.value_str() == Some(op)
    }
}

#[cfg(test)]
mod tests {
    use super::{ALL_NODE_TYPES, NodeType};

    #[test]
    fn type_names_resolve_case_insensitively() {
        for kind in ALL_NODE_TYPES {
            assert_eq!(NodeType::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(NodeType::from_name("rule"), Some(NodeType::Rule));
        assert_eq!(NodeType::from_name("DECLARATION"), Some(NodeType::Declaration));
        assert_eq!(NodeType::from_name("element"), None);
    }
}
