//! Tree traversal. Every walk keeps its own stack, so depth is bounded only by
//! memory.

use crate::node::{CssNode, NodeId};

/// Pre-order iterator yielding each node with its depth (root at 0).
pub struct PreOrder<'a> {
    stack: Vec<(&'a CssNode, usize)>,
}

impl<'a> PreOrder<'a> {
    pub fn new(root: &'a CssNode) -> Self {
        Self {
            stack: vec![(root, 0)],
        }
    }
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = (&'a CssNode, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        Some((node, depth))
    }
}

fn type_matches(node: &CssNode, type_name: &str) -> bool {
    node.kind.as_str().eq_ignore_ascii_case(type_name)
}

/// Visit every node in pre-order with its depth.
pub fn walk<'a, T>(tree: &'a T, mut visitor: impl FnMut(&'a CssNode, usize))
where
    T: AsRef<CssNode> + ?Sized,
{
    for (node, depth) in PreOrder::new(tree.as_ref()) {
        visitor(node, depth);
    }
}

/// Visit nodes whose type name matches `type_name`, ASCII case-insensitively.
pub fn walk_by_type<'a, T>(tree: &'a T, type_name: &str, mut visitor: impl FnMut(&'a CssNode, usize))
where
    T: AsRef<CssNode> + ?Sized,
{
    for (node, depth) in PreOrder::new(tree.as_ref()) {
        if type_matches(node, type_name) {
            visitor(node, depth);
        }
    }
}

pub fn find_by_id<T>(tree: &T, id: NodeId) -> Option<&CssNode>
where
    T: AsRef<CssNode> + ?Sized,
{
    PreOrder::new(tree.as_ref())
        .map(|(node, _)| node)
        .find(|node| node.id == id)
}

/// Lazily yield nodes of one type in document order.
pub fn find_all_by_type<'a, T>(tree: &'a T, type_name: &'a str) -> impl Iterator<Item = &'a CssNode> + 'a
where
    T: AsRef<CssNode> + ?Sized,
{
    PreOrder::new(tree.as_ref())
        .map(|(node, _)| node)
        .filter(move |node| type_matches(node, type_name))
}
