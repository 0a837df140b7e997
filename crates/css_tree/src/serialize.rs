use crate::builder::strip_tree;
use crate::node::CssNode;
use css_syntax::{NodeDetail, NodeType, RawNode, generate};

/// Canonical CSS text for a tree or any node in it.
///
/// Ids and spans are dropped before generation. Output is deterministic,
/// and serializing a parse of the output returns the same text.
pub fn serialize<T>(tree: &T) -> String
where
    T: AsRef<CssNode> + ?Sized,
{
    let mut raw = strip_tree(tree.as_ref());
    pad_custom_property_values(&mut raw);
    generate(&raw)
}

/// Custom property values are raw text; one leading space keeps
/// `--x: 1` from regenerating as `--x:1`, which would change the value.
fn pad_custom_property_values(root: &mut RawNode) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        let custom = matches!(
            &node.detail,
            NodeDetail::Declaration { property, .. } if property.starts_with("--")
        );
        if custom {
            for child in node.children.iter_mut() {
                if child.kind != NodeType::Raw {
                    continue;
                }
                if let NodeDetail::Value { value } = &mut child.detail {
                    if !value.is_empty() && !value.starts_with(char::is_whitespace) {
                        value.insert(0, ' ');
                    }
                }
            }
        }
        stack.extend(node.children.iter_mut());
    }
}
