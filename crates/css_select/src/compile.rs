//! Selector lists compiled into compounds and combinators.
//!
//! Anything the matcher cannot evaluate is kept as an `UnsupportedPart`
//! rather than rejected, so callers decide between skipping and failing.

use css_syntax::NodeType;
use css_tree::{CssNode, NodeDetail, ParseError, ParseOptions, parse_fragment};
use serde::Serialize;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledSelectorList {
    pub source: String,
    pub parse_errors: Vec<ParseError>,
    pub selectors: Vec<CompiledSelector>,
    /// No parse errors, at least one selector, and nothing unsupported.
    pub supported: bool,
    pub unsupported_parts: Vec<UnsupportedPart>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledSelector {
    pub selector_index: usize,
    pub compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`.
    pub combinators: Vec<Combinator>,
    pub supported: bool,
    pub unsupported_parts: Vec<UnsupportedPart>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Compound {
    pub simple_selectors: Vec<SimpleSelector>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SimpleSelector {
    /// Lowercased tag name; `universal` for `*`.
    Type { name: String, universal: bool },
    Id { value: String },
    Class { value: String },
    Attribute {
        /// Lowercased attribute name.
        name: String,
        /// `None` tests presence only.
        matcher: Option<AttributeMatcher>,
        value: Option<String>,
        flags: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum AttributeMatcher {
    #[serde(rename = "=")]
    Equals,
    #[serde(rename = "~=")]
    Includes,
    #[serde(rename = "|=")]
    DashMatch,
    #[serde(rename = "^=")]
    Prefix,
    #[serde(rename = "$=")]
    Suffix,
    #[serde(rename = "*=")]
    Substring,
}

impl AttributeMatcher {
    pub fn from_operator(operator: &str) -> Option<Self> {
        Some(match operator {
            "=" => AttributeMatcher::Equals,
            "~=" => AttributeMatcher::Includes,
            "|=" => AttributeMatcher::DashMatch,
            "^=" => AttributeMatcher::Prefix,
            "$=" => AttributeMatcher::Suffix,
            "*=" => AttributeMatcher::Substring,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttributeMatcher::Equals => "=",
            AttributeMatcher::Includes => "~=",
            AttributeMatcher::DashMatch => "|=",
            AttributeMatcher::Prefix => "^=",
            AttributeMatcher::Suffix => "$=",
            AttributeMatcher::Substring => "*=",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Combinator {
    #[serde(rename = " ")]
    Descendant,
    #[serde(rename = ">")]
    Child,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsupportedPart {
    pub selector_index: usize,
    /// Node type of the offending part, or `Combinator` / `Selector` for
    /// structural problems.
    pub part_type: String,
    pub detail: String,
}

impl UnsupportedPart {
    fn new(selector_index: usize, part_type: &str, detail: impl Into<String>) -> Self {
        Self {
            selector_index,
            part_type: part_type.to_string(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for UnsupportedPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.part_type, self.detail)
    }
}

/// Compile `text` as a selector list. Never fails: parse errors and
/// unsupported constructs are reported on the result.
pub fn compile_selector_list(text: &str) -> CompiledSelectorList {
    match parse_fragment(text, "selectorList", &ParseOptions::default()) {
        Ok(tree) => compile_selector_nodes(text, &tree.root, tree.errors),
        // Only budgets or an unknown context can fail a parse; neither
        // applies here, but the list must still come back.
        Err(err) => {
            let unsupported = vec![UnsupportedPart::new(0, "Selector", err.to_string())];
            CompiledSelectorList {
                source: text.to_string(),
                parse_errors: Vec::new(),
                selectors: Vec::new(),
                supported: false,
                unsupported_parts: unsupported,
            }
        }
    }
}

/// Compile the `Selector` children of an already parsed selector list node.
pub(crate) fn compile_selector_nodes(
    source: &str,
    list: &CssNode,
    parse_errors: Vec<ParseError>,
) -> CompiledSelectorList {
    let selectors: Vec<CompiledSelector> = list
        .children
        .iter()
        .filter(|child| child.is(NodeType::Selector))
        .enumerate()
        .map(|(index, selector)| compile_selector(selector, index))
        .collect();

    let unsupported_parts: Vec<UnsupportedPart> = selectors
        .iter()
        .flat_map(|selector| selector.unsupported_parts.iter().cloned())
        .collect();
    let supported = parse_errors.is_empty() && !selectors.is_empty() && unsupported_parts.is_empty();

    log::debug!(
        target: "css.select",
        "compiled {:?}: selectors={} unsupported={} parse_errors={}",
        source,
        selectors.len(),
        unsupported_parts.len(),
        parse_errors.len()
    );

    CompiledSelectorList {
        source: source.to_string(),
        parse_errors,
        selectors,
        supported,
        unsupported_parts,
    }
}

fn compile_selector(selector: &CssNode, selector_index: usize) -> CompiledSelector {
    let mut unsupported = Vec::new();
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();
    let mut current = Vec::new();

    for child in &selector.children {
        if child.is(NodeType::Combinator) {
            if current.is_empty() {
                unsupported.push(UnsupportedPart::new(
                    selector_index,
                    "Combinator",
                    "combinator without left compound",
                ));
                continue;
            }
            compounds.push(Compound {
                simple_selectors: std::mem::take(&mut current),
            });
            combinators.push(combinator(child, selector_index, &mut unsupported));
            continue;
        }
        if let Some(simple) = simple_selector(child, selector_index, &mut unsupported) {
            current.push(simple);
        }
    }

    if !current.is_empty() {
        compounds.push(Compound {
            simple_selectors: current,
        });
    } else if !combinators.is_empty() {
        unsupported.push(UnsupportedPart::new(
            selector_index,
            "Combinator",
            "selector ends with combinator",
        ));
    }

    if compounds.is_empty() {
        unsupported.push(UnsupportedPart::new(selector_index, "Selector", "empty selector"));
    } else if combinators.len() != compounds.len() - 1 {
        unsupported.push(UnsupportedPart::new(
            selector_index,
            "Selector",
            "invalid combinator count",
        ));
    }

    CompiledSelector {
        selector_index,
        compounds,
        combinators,
        supported: unsupported.is_empty(),
        unsupported_parts: unsupported,
    }
}

fn combinator(node: &CssNode, selector_index: usize, unsupported: &mut Vec<UnsupportedPart>) -> Combinator {
    let name = node.name().unwrap_or_default().trim();
    match name {
        ">" => Combinator::Child,
        "" => Combinator::Descendant,
        other => {
            unsupported.push(UnsupportedPart::new(
                selector_index,
                "Combinator",
                format!("unsupported combinator {other}"),
            ));
            Combinator::Descendant
        }
    }
}

fn simple_selector(
    node: &CssNode,
    selector_index: usize,
    unsupported: &mut Vec<UnsupportedPart>,
) -> Option<SimpleSelector> {
    let part_type = node.kind.as_str();
    let mut reject = |detail: String| {
        unsupported.push(UnsupportedPart::new(selector_index, part_type, detail));
        None
    };
    let name = node.name().unwrap_or_default();

    match (&node.kind, &node.detail) {
        (NodeType::TypeSelector, _) if name.is_empty() => reject("missing type name".into()),
        (NodeType::TypeSelector, _) => Some(SimpleSelector::Type {
            name: name.to_lowercase(),
            universal: name == "*",
        }),
        (NodeType::IdSelector, _) if name.is_empty() => reject("missing id value".into()),
        (NodeType::IdSelector, _) => Some(SimpleSelector::Id {
            value: name.to_string(),
        }),
        (NodeType::ClassSelector, _) if name.is_empty() => reject("missing class value".into()),
        (NodeType::ClassSelector, _) => Some(SimpleSelector::Class {
            value: name.to_string(),
        }),
        (
            NodeType::AttributeSelector,
            NodeDetail::Attribute {
                name,
                matcher,
                value,
                flags,
            },
        ) => {
            if name.is_empty() {
                return reject("missing attribute name".into());
            }
            let matcher = match matcher.as_deref() {
                None => None,
                Some(operator) => match AttributeMatcher::from_operator(operator) {
                    Some(matcher) => Some(matcher),
                    None => return reject(format!("unsupported matcher {operator}")),
                },
            };
            Some(SimpleSelector::Attribute {
                name: name.to_lowercase(),
                matcher,
                value: value.as_ref().map(|value| value.as_str().to_string()),
                flags: flags.clone(),
            })
        }
        (NodeType::AttributeSelector, _) => reject("missing attribute name".into()),
        _ => reject("unsupported simple selector".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::{AttributeMatcher, Combinator, SimpleSelector, compile_selector_list};

    #[test]
    fn compiles_compounds_and_combinators() {
        let list = compile_selector_list("DIV.note > p#x[data-k|=\"en\" i] span, *");
        assert!(list.supported, "{:?}", list.unsupported_parts);
        assert_eq!(list.selectors.len(), 2);

        let first = &list.selectors[0];
        assert_eq!(first.compounds.len(), 3);
        assert_eq!(first.combinators, vec![Combinator::Child, Combinator::Descendant]);
        assert_eq!(
            first.compounds[0].simple_selectors,
            vec![
                SimpleSelector::Type {
                    name: "div".into(),
                    universal: false
                },
                SimpleSelector::Class {
                    value: "note".into()
                },
            ]
        );
        assert_eq!(
            first.compounds[1].simple_selectors[2],
            SimpleSelector::Attribute {
                name: "data-k".into(),
                matcher: Some(AttributeMatcher::DashMatch),
                value: Some("en".into()),
                flags: Some("i".into()),
            }
        );

        let universal = &list.selectors[1];
        assert_eq!(universal.selector_index, 1);
        assert_eq!(
            universal.compounds[0].simple_selectors,
            vec![SimpleSelector::Type {
                name: "*".into(),
                universal: true
            }]
        );
    }

    #[test]
    fn unsupported_parts_are_recorded() {
        let list = compile_selector_list("a:hover, b + c, d");
        assert!(!list.supported);
        assert!(list.parse_errors.is_empty());
        let parts: Vec<(usize, String)> = list
            .unsupported_parts
            .iter()
            .map(|part| (part.selector_index, part.to_string()))
            .collect();
        assert_eq!(
            parts,
            vec![
                (0, "PseudoClassSelector unsupported simple selector".to_string()),
                (1, "Combinator unsupported combinator +".to_string()),
            ]
        );
        assert!(!list.selectors[0].supported);
        assert!(list.selectors[2].supported);
    }

    #[test]
    fn leading_combinator_and_parse_errors() {
        let leading = compile_selector_list("> a");
        assert_eq!(
            leading.unsupported_parts[0].detail,
            "combinator without left compound"
        );

        let broken = compile_selector_list("a[");
        assert!(!broken.parse_errors.is_empty());
        assert!(broken.selectors.is_empty());
        assert!(!broken.supported);

        let empty = compile_selector_list("");
        assert!(empty.selectors.is_empty());
        assert!(!empty.supported);
    }

    #[test]
    fn serializes_matchers_as_operators() {
        let list = compile_selector_list("[href^=http] > a");
        let json = serde_json::to_value(&list).unwrap();
        let selector = &json["selectors"][0];
        assert_eq!(selector["combinators"][0], ">");
        assert_eq!(selector["compounds"][0]["simpleSelectors"][0]["kind"], "attribute");
        assert_eq!(selector["compounds"][0]["simpleSelectors"][0]["matcher"], "^=");
    }
}
