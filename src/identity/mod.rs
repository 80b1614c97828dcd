//! # Relationship Identity
//!
//! Two kinds of identity are handed out here:
//!
//! | Identity | Source | Stable across |
//! |----------|--------|---------------|
//! | `RelationshipIdentity` | name-based (v5) UUID of the content tuple | every run, machine and release |
//! | numeric SCTID | previous release export, or an identifier pool | releases, via reconciliation |
//!
//! The assigner and the previous-release lookup are built once per run and
//! are read-only afterwards, so they can be shared freely.

pub mod pool;
pub mod previous;

use uuid::Uuid;

use crate::model::*;

pub use pool::{
    release_index, AllocationMode, IdentifierPool, IdentifierPoolManager, SubsetAllocation,
    BASELINE_SUBSET_VERSION, EPOCH_YEAR,
};
pub use previous::{PreviousRelease, RelationshipIdLookup, SubsetHistory};

/// Namespace every relationship identity is derived under.
pub const RELATIONSHIP_NAMESPACE: Uuid = Uuid::from_u128(0x3c5e_9a2d_71f4_4b0e_8d62_f1a0_c47b_9e13);

/// Computes content-derived relationship identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityAssigner {
    namespace: Uuid,
}

impl Default for IdentityAssigner {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityAssigner {
    pub fn new() -> Self {
        Self { namespace: RELATIONSHIP_NAMESPACE }
    }

    pub fn with_namespace(namespace: Uuid) -> Self {
        Self { namespace }
    }

    /// v5 UUID over `source \t destination \t type \t group` in decimal.
    pub fn assign(
        &self,
        source: ConceptId,
        destination: ConceptId,
        type_id: ConceptId,
        group: u32,
    ) -> RelationshipIdentity {
        let name = format!("{source}\t{destination}\t{type_id}\t{group}");
        RelationshipIdentity(Uuid::new_v5(&self.namespace, name.as_bytes()))
    }

    pub fn assign_key(&self, key: &RelationshipKey) -> RelationshipIdentity {
        self.assign(key.source, key.destination, key.type_id, key.group)
    }

    /// Build an active relationship carrying its content identity.
    pub fn relationship(
        &self,
        source: ConceptId,
        destination: ConceptId,
        type_id: ConceptId,
        group: u32,
    ) -> Relationship {
        let key = RelationshipKey { source, destination, type_id, group };
        Relationship::new(key, self.assign_key(&key))
    }
}
