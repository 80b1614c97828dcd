//! # Rule Engine
//!
//! Evaluates qualifying relationship rules against a [`ConceptGraph`]:
//!
//! ```text
//! apply(rule) = ({start} ∪ desc(start)) \ ⋃ₑ ({e} ∪ desc(e))
//! ```
//!
//! The union of the exception closures is built first and subtracted once,
//! so the order exceptions are listed in cannot change the result. Closures
//! come from the graph's memo, so an exception shared by several rules is
//! only walked once.

use crate::graph::{ConceptGraph, DescendantDepth};
use crate::model::*;

/// Rule evaluation over a fully loaded graph.
#[derive(Debug, Clone, Copy)]
pub struct RuleEngine<'g> {
    graph: &'g ConceptGraph,
    depth: DescendantDepth,
}

impl<'g> RuleEngine<'g> {
    /// Engine using unlimited-depth closures.
    pub fn new(graph: &'g ConceptGraph) -> Self {
        Self { graph, depth: DescendantDepth::Unlimited }
    }

    pub fn with_depth(mut self, depth: DescendantDepth) -> Self {
        self.depth = depth;
        self
    }

    /// Concepts the rule selects.
    pub fn apply(&self, rule: &QualifyingRelationshipRule) -> ConceptSet {
        let mut excluded = ConceptSet::new();
        for &exception in &rule.exceptions {
            excluded.insert(exception);
            excluded.extend(self.graph.descendants(exception, self.depth).iter().copied());
        }

        let mut selected = ConceptSet::new();
        if !excluded.contains(&rule.start_point) {
            selected.insert(rule.start_point);
        }
        selected.extend(
            self.graph
                .descendants(rule.start_point, self.depth)
                .iter()
                .copied()
                .filter(|c| !excluded.contains(c)),
        );
        selected
    }

    /// Union of every rule of the attribute. A concept reached by several
    /// rules appears once.
    pub fn targets(&self, attribute: &QualifyingRelationshipAttribute) -> ConceptSet {
        let mut targets = ConceptSet::new();
        for rule in &attribute.rules {
            targets.extend(self.apply(rule));
        }
        targets
    }
}
