//! What the query engine needs to know about a node.

use serde_json::Value;

/// Read-only view of a tree node for selector matching.
///
/// Only element-like nodes (kind `element`, any ASCII case) take part in
/// matching; every other node is still walked for its children.
pub trait SelectorNode {
    fn kind(&self) -> Option<&str>;

    /// Element tag name. Compared ASCII-case-insensitively.
    fn tag_name(&self) -> Option<&str>;

    /// Value of the attribute called `name` (already lowercased by the
    /// caller). Attribute names compare ASCII-case-insensitively.
    fn attribute(&self, name: &str) -> Option<&str>;

    fn children(&self) -> impl Iterator<Item = &Self>;

    fn is_element(&self) -> bool {
        self.kind()
            .is_some_and(|kind| kind.eq_ignore_ascii_case("element"))
    }
}

/// JSON trees shaped like
/// `{"kind": "element", "tagName": "p", "attributes": [{"name": "class",
/// "value": "x"}], "children": [...]}`. `type` is accepted in place of
/// `kind`; attributes whose name or value is not a string are ignored, and
/// non-object children are skipped.
impl SelectorNode for Value {
    fn kind(&self) -> Option<&str> {
        self.get("kind")
            .and_then(Value::as_str)
            .or_else(|| self.get("type").and_then(Value::as_str))
    }

    fn tag_name(&self) -> Option<&str> {
        self.get("tagName").and_then(Value::as_str)
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.get("attributes")?
            .as_array()?
            .iter()
            .filter_map(|attribute| {
                let key = attribute.get("name")?.as_str()?;
                let value = attribute.get("value")?.as_str()?;
                Some((key, value))
            })
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    fn children(&self) -> impl Iterator<Item = &Self> {
        self.get("children")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter(|child| child.is_object())
    }
}
