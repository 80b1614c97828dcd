//! # Terminology Model
//!
//! Plain data shared by the graph, the rule engine and the synthesizer:
//! concepts, relationships, qualifying rules and laterality flags.
//!
//! Design rule: no I/O and no graph state here. Parsing of external
//! documents into these types lives next to the types, but reading files
//! is the caller's job.

pub mod concept;
pub mod relationship;
pub mod rule;
pub mod laterality;

pub use concept::{Concept, ConceptId, ConceptSet};
pub use relationship::{Relationship, RelationshipKey, RelationshipIdentity};
pub use rule::{QualifyingRelationshipAttribute, QualifyingRelationshipRule, Refinability};
pub use laterality::LateralityIndicators;

// ============================================================================
// Well-known concepts
// ============================================================================

/// `116680003 |Is a|`: the hierarchy relationship type.
pub const IS_A: ConceptId = ConceptId(116_680_003);

/// `138875005 |SNOMED CT Concept|`: root of the terminology.
pub const ROOT: ConceptId = ConceptId(138_875_005);

/// `272741003 |Laterality|`: attribute type of lateralized qualifiers.
pub const LATERALITY: ConceptId = ConceptId(272_741_003);

/// `182353008 |Side|`: value of lateralized qualifiers.
pub const SIDE: ConceptId = ConceptId(182_353_008);

/// Relationship group of attributes that are not grouped.
pub const UNGROUPED: u32 = 0;

/// RF1 characteristic type written for every synthesized record.
pub const QUALIFIER_CHARACTERISTIC: u8 = 1;
