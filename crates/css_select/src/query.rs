//! Right-to-left selector matching over `SelectorNode` trees.

use crate::compile::{
    AttributeMatcher, Combinator, CompiledSelector, CompiledSelectorList, Compound, SimpleSelector,
    compile_selector_list,
};
use crate::node::SelectorNode;
use css_tree::budget::{as_u64, enforce};
use css_tree::{BudgetExceeded, BudgetName};
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryOptions {
    /// Fail on parse errors or unsupported parts instead of treating the
    /// affected selectors as never matching.
    pub strict: bool,
    /// Upper bound on nodes visited while indexing the tree.
    pub max_visited_nodes: Option<u64>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error(transparent)]
    Budget(#[from] BudgetExceeded),
    #[error("{0}")]
    Strict(String),
}

/// Selector text to compile, or an already compiled list.
#[derive(Clone, Copy, Debug)]
pub enum SelectorSource<'a> {
    Text(&'a str),
    Compiled(&'a CompiledSelectorList),
}

impl<'a> From<&'a str> for SelectorSource<'a> {
    fn from(text: &'a str) -> Self {
        SelectorSource::Text(text)
    }
}

impl<'a> From<&'a String> for SelectorSource<'a> {
    fn from(text: &'a String) -> Self {
        SelectorSource::Text(text)
    }
}

impl<'a> From<&'a CompiledSelectorList> for SelectorSource<'a> {
    fn from(compiled: &'a CompiledSelectorList) -> Self {
        SelectorSource::Compiled(compiled)
    }
}

impl<'a> SelectorSource<'a> {
    fn resolve(self) -> Cow<'a, CompiledSelectorList> {
        match self {
            SelectorSource::Text(text) => Cow::Owned(compile_selector_list(text)),
            SelectorSource::Compiled(compiled) => Cow::Borrowed(compiled),
        }
    }
}

/// True if `node` (found under `root`) matches any selector in the list.
/// Nodes outside `root` and non-element nodes never match.
pub fn matches_selector<'a, N>(
    selector: impl Into<SelectorSource<'a>>,
    node: &N,
    root: &N,
    options: &QueryOptions,
) -> Result<bool, QueryError>
where
    N: SelectorNode,
{
    let compiled = selector.into().resolve();
    check_strict(&compiled, options.strict)?;

    let index = TreeIndex::build(root, options)?;
    let Some(position) = index.position(node) else {
        return Ok(false);
    };
    if !node.is_element() {
        return Ok(false);
    }
    Ok(compiled
        .selectors
        .iter()
        .any(|selector| index.matches(selector, position)))
}

/// Every element under `root` (root included) matching any selector in the
/// list, in document order.
pub fn query_selector_all<'a, 'n, N>(
    selector: impl Into<SelectorSource<'a>>,
    root: &'n N,
    options: &QueryOptions,
) -> Result<Vec<&'n N>, QueryError>
where
    N: SelectorNode,
{
    let compiled = selector.into().resolve();
    check_strict(&compiled, options.strict)?;

    let index = TreeIndex::build(root, options)?;
    let matches: Vec<&N> = index
        .elements
        .iter()
        .copied()
        .filter(|&position| {
            compiled
                .selectors
                .iter()
                .any(|selector| index.matches(selector, position))
        })
        .map(|position| index.nodes[position])
        .collect();
    log::trace!(
        target: "css.select",
        "query {:?}: {} of {} elements matched",
        compiled.source,
        matches.len(),
        index.elements.len()
    );
    Ok(matches)
}

fn check_strict(compiled: &CompiledSelectorList, strict: bool) -> Result<(), QueryError> {
    if !strict {
        return Ok(());
    }
    if let Some(error) = compiled.parse_errors.first() {
        return Err(QueryError::Strict(format!(
            "selector parse failed in strict mode: {}",
            error.message
        )));
    }
    if !compiled.supported {
        let detail = compiled
            .unsupported_parts
            .first()
            .map_or_else(|| "Selector empty selector list".to_string(), ToString::to_string);
        return Err(QueryError::Strict(format!(
            "selector unsupported in strict mode: {detail}"
        )));
    }
    Ok(())
}

/// Pre-order node list with parent links, built by one iterative walk.
struct TreeIndex<'n, N> {
    nodes: Vec<&'n N>,
    parents: Vec<Option<usize>>,
    /// Positions of element nodes, in document order.
    elements: Vec<usize>,
    by_address: HashMap<*const N, usize>,
}

impl<'n, N: SelectorNode> TreeIndex<'n, N> {
    fn build(root: &'n N, options: &QueryOptions) -> Result<Self, BudgetExceeded> {
        let mut index = TreeIndex {
            nodes: Vec::new(),
            parents: Vec::new(),
            elements: Vec::new(),
            by_address: HashMap::new(),
        };
        let mut stack: Vec<(&'n N, Option<usize>)> = vec![(root, None)];
        while let Some((node, parent)) = stack.pop() {
            let position = index.nodes.len();
            enforce(BudgetName::MaxNodes, options.max_visited_nodes, as_u64(position) + 1)?;

            index.nodes.push(node);
            index.parents.push(parent);
            index.by_address.insert(std::ptr::from_ref(node), position);
            if node.is_element() {
                index.elements.push(position);
            }

            let children: Vec<&'n N> = node.children().collect();
            stack.extend(children.into_iter().rev().map(|child| (child, Some(position))));
        }
        Ok(index)
    }

    fn position(&self, node: &N) -> Option<usize> {
        self.by_address.get(&std::ptr::from_ref(node)).copied()
    }

    /// Depth-first search over (compound, candidate) pairs, starting from the
    /// rightmost compound at `position` and moving left through ancestors.
    /// Each pair is queued at most once, so the work is bounded by the number
    /// of compounds times the depth of `position`.
    fn matches(&self, selector: &CompiledSelector, position: usize) -> bool {
        if !selector.supported || selector.compounds.is_empty() {
            return false;
        }

        let start = (selector.compounds.len() - 1, position);
        let mut queued = HashSet::from([start]);
        let mut pending = vec![start];
        while let Some((compound_index, candidate)) = pending.pop() {
            if !self.matches_compound(&selector.compounds[compound_index], candidate) {
                continue;
            }
            if compound_index == 0 {
                return true;
            }

            let next = compound_index - 1;
            match selector.combinators[next] {
                Combinator::Child => {
                    if let Some(parent) = self.element_parent(candidate) {
                        if queued.insert((next, parent)) {
                            pending.push((next, parent));
                        }
                    }
                }
                Combinator::Descendant => {
                    let mut ancestors = Vec::new();
                    let mut cursor = self.parents[candidate];
                    while let Some(ancestor) = cursor {
                        if self.nodes[ancestor].is_element() {
                            // Pairs for `next` only come from this walk, so
                            // everything above a queued ancestor is queued too.
                            if !queued.insert((next, ancestor)) {
                                break;
                            }
                            ancestors.push((next, ancestor));
                        }
                        cursor = self.parents[ancestor];
                    }
                    // Nearest ancestor is tried first.
                    pending.extend(ancestors.into_iter().rev());
                }
            }
        }
        false
    }

    fn element_parent(&self, position: usize) -> Option<usize> {
        self.parents[position].filter(|&parent| self.nodes[parent].is_element())
    }

    fn matches_compound(&self, compound: &Compound, position: usize) -> bool {
        let node = self.nodes[position];
        !compound.simple_selectors.is_empty()
            && node.is_element()
            && compound
                .simple_selectors
                .iter()
                .all(|simple| matches_simple(node, simple))
    }
}

fn matches_simple<N: SelectorNode>(node: &N, simple: &SimpleSelector) -> bool {
    match simple {
        SimpleSelector::Type { universal: true, .. } => true,
        SimpleSelector::Type { name, .. } => node
            .tag_name()
            .is_some_and(|tag| tag.to_lowercase() == *name),
        SimpleSelector::Id { value } => node.attribute("id") == Some(value.as_str()),
        SimpleSelector::Class { value } => node
            .attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|class| class == value)),
        SimpleSelector::Attribute {
            name,
            matcher,
            value,
            flags,
        } => node.attribute(name).is_some_and(|actual| {
            matches_attribute(actual, *matcher, value.as_deref(), flags.as_deref())
        }),
    }
}

fn matches_attribute(
    actual: &str,
    matcher: Option<AttributeMatcher>,
    expected: Option<&str>,
    flags: Option<&str>,
) -> bool {
    let Some(matcher) = matcher else {
        return true;
    };
    let Some(expected) = expected else {
        return false;
    };

    let case_insensitive = flags.is_some_and(|flags| flags.to_lowercase().contains('i'));
    let (actual, expected): (Cow<'_, str>, Cow<'_, str>) = if case_insensitive {
        (actual.to_lowercase().into(), expected.to_lowercase().into())
    } else {
        (actual.into(), expected.into())
    };
    let (actual, expected) = (actual.as_ref(), expected.as_ref());

    match matcher {
        AttributeMatcher::Equals => actual == expected,
        AttributeMatcher::Includes => actual.split_whitespace().any(|token| token == expected),
        AttributeMatcher::DashMatch => {
            actual == expected
                || actual
                    .strip_prefix(expected)
                    .is_some_and(|rest| rest.starts_with('-'))
        }
        AttributeMatcher::Prefix => actual.starts_with(expected),
        AttributeMatcher::Suffix => actual.ends_with(expected),
        AttributeMatcher::Substring => actual.contains(expected),
    }
}

#[cfg(test)]
mod tests;
