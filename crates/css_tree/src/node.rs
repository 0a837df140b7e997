//! Public node model.

use crate::span::{Span, SpanProvenance};
use css_syntax::{NodeDetail, NodeType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Node identity, unique within the tree of one parse call.
///
/// Ids start at 1 and increase in pre-order. `NodeId::INVALID` (0) is never
/// assigned.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const INVALID: NodeId = NodeId(0);
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CssNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeType,
    pub span_provenance: SpanProvenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    #[serde(flatten)]
    pub detail: NodeDetail,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CssNode>,
}

impl CssNode {
    pub fn is(&self, kind: NodeType) -> bool {
        self.kind == kind
    }

    /// Identifier-like name (selectors, functions, at-rules, combinators).
    pub fn name(&self) -> Option<&str> {
        match &self.detail {
            NodeDetail::Name { name } | NodeDetail::Attribute { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Scalar value (numbers, strings, urls, operators, raw text).
    pub fn value(&self) -> Option<&str> {
        self.detail.value_str()
    }

    pub fn property(&self) -> Option<&str> {
        match &self.detail {
            NodeDetail::Declaration { property, .. } => Some(property),
            _ => None,
        }
    }

    pub fn important(&self) -> bool {
        matches!(self.detail, NodeDetail::Declaration { important: true, .. })
    }

    /// First direct child of `kind`.
    pub fn child(&self, kind: NodeType) -> Option<&CssNode> {
        self.children.iter().find(|child| child.kind == kind)
    }
}

impl AsRef<CssNode> for CssNode {
    fn as_ref(&self) -> &CssNode {
        self
    }
}
