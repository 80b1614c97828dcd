//! # snomed-qualify
//!
//! Builds an in-memory is-a hierarchy of terminology concepts, evaluates
//! exception-aware expansion rules over it, and emits "qualifying"
//! relationships whose identities stay stable from one release to the next.
//!
//! ## Design Principles
//!
//! 1. **Graph owned by the run**: `ConceptGraph` is created, filled and
//!    dropped by a single conversion pass. No global registry.
//! 2. **Identity is content**: a relationship's identity is a pure function
//!    of `(source, destination, type, group)`.
//! 3. **Identifiers come from a pool**: numeric identifiers are either reused
//!    from the previous release or taken front-to-back from a pool file.
//!    They are never minted ad hoc.
//! 4. **All or nothing**: records are buffered and only appended to the
//!    output after every phase succeeded.
//!
//! ## Quick Start
//!
//! ```rust
//! use snomed_qualify::{
//!     ConceptGraph, ConceptId, IdentityAssigner, QualifyingRelationshipAttribute,
//!     QualifyingRelationshipRule, Refinability, RelationshipSynthesizer, IS_A,
//! };
//!
//! # fn example() -> snomed_qualify::Result<()> {
//! let assigner = IdentityAssigner::new();
//! let mut graph = ConceptGraph::new();
//! graph.add_edge(assigner.relationship(ConceptId(2), ConceptId(1), IS_A, 0));
//!
//! let attribute = QualifyingRelationshipAttribute::new(
//!     ConceptId(10), ConceptId(20), Refinability::Optional,
//! ).with_rule(QualifyingRelationshipRule::new(ConceptId(1)));
//!
//! let synthesis = RelationshipSynthesizer::new(&graph, &assigner)
//!     .qualifying(std::slice::from_ref(&attribute));
//! assert_eq!(synthesis.records.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Role |
//! |--------|------|
//! | `model` | Concepts, relationships, rules, laterality flags |
//! | `graph` | `ConceptGraph` and the relationship snapshot loader |
//! | `rules` | `RuleEngine`, exception-aware closure arithmetic |
//! | `identity` | Content identity, identifier pools, previous-release lookup |
//! | `synthesis` | `RelationshipSynthesizer` and the `Conversion` run |
//! | `export` | RF1 relationship record output |
//! | `config` | Run configuration, release dates, editions |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod graph;
pub mod rules;
pub mod identity;
pub mod synthesis;
pub mod export;
pub mod config;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    Concept, ConceptId, ConceptSet, Relationship, RelationshipKey, RelationshipIdentity,
    QualifyingRelationshipAttribute, QualifyingRelationshipRule, Refinability,
    LateralityIndicators, IS_A, ROOT, LATERALITY, SIDE, UNGROUPED,
};

// ============================================================================
// Re-exports: Graph, rules, identity
// ============================================================================

pub use graph::{ConceptGraph, DescendantDepth};
pub use rules::RuleEngine;
pub use identity::{
    IdentityAssigner, IdentifierPool, IdentifierPoolManager, AllocationMode,
    SubsetAllocation, PreviousRelease, RelationshipIdLookup, SubsetHistory,
    release_index,
};

// ============================================================================
// Re-exports: Synthesis, export, config
// ============================================================================

pub use synthesis::{
    Conversion, RelationshipSynthesizer, QualifyingRelationship, Synthesis,
    SynthesisStats, SynthesisReport,
};
pub use export::{RelationshipSink, Rf1RelationshipWriter};
pub use config::{SynthesisConfig, ReleaseDate, Edition, EditionConfig, Dialect};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A record in an external resource could not be parsed.
    #[error("Format error in {resource}{}: {message}", line_suffix(.line))]
    Format {
        resource: String,
        line: Option<usize>,
        message: String,
    },

    /// An identifier pool cannot satisfy the requested allocation.
    #[error("Identifier pool exhausted: requested {requested}, only {available} available")]
    ResourceExhausted { requested: usize, available: usize },

    #[error("Inconsistent state: {0}")]
    InconsistentState(String),

    #[error("IO error on {resource}: {source}")]
    Io {
        resource: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Format error for a single line of a delimited resource.
    pub(crate) fn format_at(resource: &str, line: usize, message: impl Into<String>) -> Self {
        Error::Format {
            resource: resource.to_string(),
            line: Some(line),
            message: message.into(),
        }
    }

    pub(crate) fn io(resource: impl std::fmt::Display, source: std::io::Error) -> Self {
        Error::Io { resource: resource.to_string(), source }
    }
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|l| format!(" at line {l}")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, Error>;
