use crate::compile::{CompiledSelector, SimpleSelector};
use serde::Serialize;

/// Selector specificity as `(ids, classes and attributes, types)`.
/// Compares lexicographically.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Specificity {
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

impl Specificity {
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        Self { a, b, c }
    }

    fn add(&mut self, simple: &SimpleSelector) {
        match simple {
            SimpleSelector::Type { universal: true, .. } => {}
            SimpleSelector::Type { .. } => self.c += 1,
            SimpleSelector::Id { .. } => self.a += 1,
            SimpleSelector::Class { .. } | SimpleSelector::Attribute { .. } => self.b += 1,
        }
    }
}

impl CompiledSelector {
    /// Specificity of the supported parts. Combinators add nothing.
    pub fn specificity(&self) -> Specificity {
        let mut specificity = Specificity::default();
        for simple in self.compounds.iter().flat_map(|c| &c.simple_selectors) {
            specificity.add(simple);
        }
        specificity
    }
}
