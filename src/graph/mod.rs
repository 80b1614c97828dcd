//! # Concept Graph
//!
//! In-memory is-a hierarchy of concepts, owned by one conversion run.
//!
//! ## Layout
//!
//! Concepts live in an arena (`Vec<Concept>`); the registry maps a
//! `ConceptId` to its arena slot, so each id has exactly one `Concept` per
//! graph. Is-a edges point child → parent, so a reverse adjacency list
//! (`children`) is kept alongside for closure queries.
//!
//! ## Closures
//!
//! `descendants()` is an iterative BFS with a visited set keyed by arena
//! slot. It terminates on cycles, reports a diamond-reachable concept once,
//! and never recurses. Results are memoized per `(concept, depth)` behind a
//! `RwLock`, so queries take `&self` and the graph can be shared read-only.
//! Adding an edge drops the memo, because a closure computed against a
//! partially loaded hierarchy is wrong.

pub mod loader;

use std::collections::VecDeque;
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use parking_lot::RwLock;
use smallvec::SmallVec;

use crate::model::*;

pub use loader::{HierarchyRecord, LoadStats};

// ============================================================================
// Depth specification
// ============================================================================

/// How far below the start concept a closure query descends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DescendantDepth {
    /// Full transitive closure.
    #[default]
    Unlimited,
    /// Only concepts at most this many is-a hops below the start.
    Levels(usize),
}

impl DescendantDepth {
    fn allows(self, depth: usize) -> bool {
        match self {
            DescendantDepth::Unlimited => true,
            DescendantDepth::Levels(max) => depth <= max,
        }
    }
}

// ============================================================================
// ConceptGraph
// ============================================================================

/// Concept registry plus is-a adjacency for one run.
#[derive(Debug, Default)]
pub struct ConceptGraph {
    concepts: Vec<Concept>,
    registry: HashMap<ConceptId, usize>,
    /// arena slot → slots of concepts that are-a this one
    children: Vec<SmallVec<[usize; 4]>>,
    edge_count: usize,
    closures: RwLock<HashMap<(usize, DescendantDepth), Arc<ConceptSet>>>,
}

impl ConceptGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-create the concept for `id`.
    pub fn register(&mut self, id: ConceptId) -> &Concept {
        let slot = self.intern(id);
        &self.concepts[slot]
    }

    fn intern(&mut self, id: ConceptId) -> usize {
        if let Some(&slot) = self.registry.get(&id) {
            return slot;
        }
        let slot = self.concepts.len();
        self.concepts.push(Concept::new(id));
        self.children.push(SmallVec::new());
        self.registry.insert(id, slot);
        slot
    }

    /// Append an outbound edge to the relationship's source concept.
    ///
    /// Both endpoints are registered on demand. Active is-a edges are also
    /// indexed as parent → child for closure queries.
    pub fn add_edge(&mut self, relationship: Relationship) {
        let src = self.intern(relationship.source);
        let dst = self.intern(relationship.destination);

        if relationship.is_a() && relationship.active {
            self.children[dst].push(src);
        }
        self.concepts[src].attributes.push(relationship);
        self.edge_count += 1;

        self.closures.get_mut().clear();
    }

    pub fn concept(&self, id: ConceptId) -> Option<&Concept> {
        self.registry.get(&id).map(|&slot| &self.concepts[slot])
    }

    pub fn contains(&self, id: ConceptId) -> bool {
        self.registry.contains_key(&id)
    }

    /// All registered concepts, in registration order.
    pub fn concepts(&self) -> impl Iterator<Item = &Concept> {
        self.concepts.iter()
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Direct is-a children of `id`.
    pub fn children(&self, id: ConceptId) -> Vec<ConceptId> {
        match self.registry.get(&id) {
            Some(&slot) => self.children[slot].iter().map(|&c| self.concepts[c].id).collect(),
            None => Vec::new(),
        }
    }

    // ========================================================================
    // Closure
    // ========================================================================

    /// Concepts below `id` in the is-a hierarchy, excluding `id` itself.
    ///
    /// An id never seen by this graph has no descendants.
    pub fn descendants(&self, id: ConceptId, depth: DescendantDepth) -> Arc<ConceptSet> {
        let Some(&slot) = self.registry.get(&id) else {
            return Arc::new(ConceptSet::new());
        };

        if let Some(hit) = self.closures.read().get(&(slot, depth)) {
            return Arc::clone(hit);
        }

        let closure = Arc::new(self.walk_down(slot, depth));
        self.closures
            .write()
            .entry((slot, depth))
            .or_insert_with(|| Arc::clone(&closure));
        closure
    }

    /// BFS over the reverse is-a adjacency. BFS reaches every concept at its
    /// shallowest depth first, so the depth cutoff is exact.
    fn walk_down(&self, start: usize, depth: DescendantDepth) -> ConceptSet {
        let mut visited: HashSet<usize> = HashSet::new();
        let mut queue: VecDeque<(usize, usize)> = VecDeque::new();
        let mut result = ConceptSet::new();

        visited.insert(start);
        queue.push_back((start, 0));

        while let Some((slot, level)) = queue.pop_front() {
            let next = level + 1;
            if !depth.allows(next) {
                continue;
            }
            for &child in &self.children[slot] {
                if visited.insert(child) {
                    result.insert(self.concepts[child].id);
                    queue.push_back((child, next));
                }
            }
        }
        result
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    /// True if the concept already asserts the attribute's (type, destination),
    /// in any group.
    pub fn has_attribute(&self, id: ConceptId, attribute: &QualifyingRelationshipAttribute) -> bool {
        self.asserts(id, attribute.type_id, attribute.destination)
    }

    pub fn asserts(&self, id: ConceptId, type_id: ConceptId, destination: ConceptId) -> bool {
        self.concept(id)
            .is_some_and(|c| c.has_attribute(type_id, destination))
    }
}

// ============================================================================
// Tests
// ============================================================================
