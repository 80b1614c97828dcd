//! Relationship (typed edge) between two concepts.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ConceptId, IS_A};

/// Content-derived relationship identity.
///
/// Produced by [`IdentityAssigner`](crate::IdentityAssigner); equal tuples
/// always carry equal identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipIdentity(pub Uuid);

impl std::fmt::Display for RelationshipIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The content tuple a relationship's identity is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipKey {
    pub source: ConceptId,
    pub destination: ConceptId,
    pub type_id: ConceptId,
    pub group: u32,
}

/// A directed relationship in the hierarchy snapshot or a synthesized one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: ConceptId,
    pub destination: ConceptId,
    pub type_id: ConceptId,
    pub group: u32,
    pub active: bool,
    pub identity: RelationshipIdentity,
    /// Externally visible numeric identifier, blank until reconciled.
    pub sctid: Option<u64>,
}

impl Relationship {
    pub fn new(key: RelationshipKey, identity: RelationshipIdentity) -> Self {
        Self {
            source: key.source,
            destination: key.destination,
            type_id: key.type_id,
            group: key.group,
            active: true,
            identity,
            sctid: None,
        }
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_sctid(mut self, sctid: Option<u64>) -> Self {
        self.sctid = sctid;
        self
    }

    pub fn key(&self) -> RelationshipKey {
        RelationshipKey {
            source: self.source,
            destination: self.destination,
            type_id: self.type_id,
            group: self.group,
        }
    }

    pub fn is_a(&self) -> bool {
        self.type_id == IS_A
    }

    #[cfg(test)]
    pub(crate) fn test_edge(source: u64, destination: u64, type_id: u64, group: u32) -> Self {
        crate::IdentityAssigner::new().relationship(
            ConceptId(source),
            ConceptId(destination),
            ConceptId(type_id),
            group,
        )
    }
}

/// Release files are sorted on source, group, type, destination.
impl Ord for RelationshipKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.source
            .cmp(&other.source)
            .then(self.group.cmp(&other.group))
            .then(self.type_id.cmp(&other.type_id))
            .then(self.destination.cmp(&other.destination))
    }
}

impl PartialOrd for RelationshipKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for RelationshipKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[S: {}, D: {}, T: {}, G: {}]",
            self.source, self.destination, self.type_id, self.group
        )
    }
}
