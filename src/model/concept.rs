//! Concept in the terminology hierarchy.

use std::str::FromStr;

use hashbrown::HashSet;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use smallvec::SmallVec;

use super::Relationship;

/// Terminology identifier (SCTID) of a concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ConceptId(pub u64);

impl std::fmt::Display for ConceptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConceptId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ConceptId)
    }
}

/// Rule documents carry ids either as JSON numbers or as strings.
impl<'de> Deserialize<'de> for ConceptId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Ok(ConceptId(n)),
            RawId::Text(s) => s
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid concept id '{s}'"))),
        }
    }
}

/// Set of concepts produced by closure queries and rule evaluation.
pub type ConceptSet = HashSet<ConceptId>;

/// A concept and its outbound (defining) relationships.
#[derive(Debug, Clone, PartialEq)]
pub struct Concept {
    pub id: ConceptId,
    pub attributes: SmallVec<[Relationship; 4]>,
}

impl Concept {
    pub fn new(id: ConceptId) -> Self {
        Self { id, attributes: SmallVec::new() }
    }

    /// True if any active outbound relationship has this type and
    /// destination. Relationship group is ignored.
    pub fn has_attribute(&self, type_id: ConceptId, destination: ConceptId) -> bool {
        self.attributes
            .iter()
            .any(|r| r.active && r.type_id == type_id && r.destination == destination)
    }

    /// Destinations of this concept's active is-a relationships.
    pub fn parents(&self) -> impl Iterator<Item = ConceptId> + '_ {
        self.attributes
            .iter()
            .filter(|r| r.active && r.is_a())
            .map(|r| r.destination)
    }
}
