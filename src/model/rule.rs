//! Qualifying relationship rules and the attributes they assert.
//!
//! A rule document is a JSON array of attributes:
//!
//! ```text
//! [
//!   { "type": "363698007", "destination": "39057004", "refinability": 1,
//!     "rules": [ { "startPoint": "123037004", "exceptions": ["91723000"] } ] }
//! ]
//! ```
//!
//! Ids may be strings or numbers. The document is parsed into these types up
//! front so a malformed document fails before any evaluation starts.

use std::io::Read;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::ConceptId;
use crate::{Error, Result};

/// RF1 refinability code of a synthesized relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCode", into = "u8")]
pub enum Refinability {
    NotRefinable,
    Optional,
    Mandatory,
}

impl Refinability {
    pub fn code(self) -> u8 {
        match self {
            Refinability::NotRefinable => 0,
            Refinability::Optional => 1,
            Refinability::Mandatory => 2,
        }
    }
}

impl TryFrom<u8> for Refinability {
    type Error = String;

    fn try_from(code: u8) -> std::result::Result<Self, String> {
        match code {
            0 => Ok(Refinability::NotRefinable),
            1 => Ok(Refinability::Optional),
            2 => Ok(Refinability::Mandatory),
            other => Err(format!("unknown refinability code {other}")),
        }
    }
}

impl From<Refinability> for u8 {
    fn from(r: Refinability) -> u8 {
        r.code()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCode {
    Number(u8),
    Text(String),
}

impl TryFrom<RawCode> for Refinability {
    type Error = String;

    fn try_from(raw: RawCode) -> std::result::Result<Self, String> {
        match raw {
            RawCode::Number(n) => Refinability::try_from(n),
            RawCode::Text(s) => s
                .trim()
                .parse::<u8>()
                .map_err(|_| format!("invalid refinability '{s}'"))
                .and_then(Refinability::try_from),
        }
    }
}

/// "Every descendant of `start_point`, and `start_point` itself, unless it
/// falls under one of the exceptions."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifyingRelationshipRule {
    #[serde(rename = "startPoint")]
    pub start_point: ConceptId,
    #[serde(default)]
    pub exceptions: Vec<ConceptId>,
}

impl QualifyingRelationshipRule {
    pub fn new(start_point: ConceptId) -> Self {
        Self { start_point, exceptions: Vec::new() }
    }

    pub fn with_exceptions(mut self, exceptions: impl IntoIterator<Item = ConceptId>) -> Self {
        self.exceptions.extend(exceptions);
        self
    }
}

/// An attribute (type + value) to assert on every concept its rules select.
///
/// This is the unit of deduplication: a concept receives at most one
/// synthesized relationship per attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifyingRelationshipAttribute {
    #[serde(rename = "type")]
    pub type_id: ConceptId,
    pub destination: ConceptId,
    pub refinability: Refinability,
    #[serde(default)]
    pub rules: Vec<QualifyingRelationshipRule>,
}

impl QualifyingRelationshipAttribute {
    pub fn new(type_id: ConceptId, destination: ConceptId, refinability: Refinability) -> Self {
        Self { type_id, destination, refinability, rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: QualifyingRelationshipRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Parse a rule document.
    ///
    /// Attributes repeating a (type, destination) pair are merged into the
    /// first occurrence; a merge with a different refinability is rejected.
    pub fn load_document(reader: impl Read, resource: &str) -> Result<Vec<Self>> {
        let parsed: Vec<Self> = serde_json::from_reader(reader).map_err(|e| Error::Format {
            resource: resource.to_string(),
            line: Some(e.line()).filter(|&l| l > 0),
            message: e.to_string(),
        })?;

        let mut merged: Vec<Self> = Vec::with_capacity(parsed.len());
        let mut by_key: HashMap<(ConceptId, ConceptId), usize> = HashMap::new();
        for attribute in parsed {
            let key = (attribute.type_id, attribute.destination);
            match by_key.get(&key) {
                Some(&idx) => {
                    let existing = &mut merged[idx];
                    if existing.refinability != attribute.refinability {
                        return Err(Error::Format {
                            resource: resource.to_string(),
                            line: None,
                            message: format!(
                                "attribute {}={} declared with refinability {} and {}",
                                key.0,
                                key.1,
                                existing.refinability.code(),
                                attribute.refinability.code(),
                            ),
                        });
                    }
                    existing.rules.extend(attribute.rules);
                }
                None => {
                    by_key.insert(key, merged.len());
                    merged.push(attribute);
                }
            }
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_document() {
        let json = r#"[
            {"type": "363698007", "destination": 39057004, "refinability": 1,
             "rules": [{"startPoint": "123037004", "exceptions": ["91723000", 1000]}]}
        ]"#;
        let attrs = QualifyingRelationshipAttribute::load_document(json.as_bytes(), "rules.json").unwrap();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].type_id, ConceptId(363_698_007));
        assert_eq!(attrs[0].destination, ConceptId(39_057_004));
        assert_eq!(attrs[0].refinability, Refinability::Optional);
        assert_eq!(attrs[0].rules[0].start_point, ConceptId(123_037_004));
        assert_eq!(attrs[0].rules[0].exceptions, vec![ConceptId(91_723_000), ConceptId(1000)]);
    }

    #[test]
    fn test_duplicate_attributes_merge_rules() {
        let json = r#"[
            {"type": 1, "destination": 2, "refinability": "2", "rules": [{"startPoint": 10}]},
            {"type": 3, "destination": 4, "refinability": 0, "rules": []},
            {"type": 1, "destination": 2, "refinability": 2, "rules": [{"startPoint": 11}]}
        ]"#;
        let attrs = QualifyingRelationshipAttribute::load_document(json.as_bytes(), "rules.json").unwrap();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].rules.len(), 2);
        assert_eq!(attrs[0].refinability, Refinability::Mandatory);
        assert_eq!(attrs[1].type_id, ConceptId(3));
    }

    #[test]
    fn test_conflicting_refinability_is_format_error() {
        let json = r#"[
            {"type": 1, "destination": 2, "refinability": 1},
            {"type": 1, "destination": 2, "refinability": 2}
        ]"#;
        let err = QualifyingRelationshipAttribute::load_document(json.as_bytes(), "rules.json").unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }

    #[test]
    fn test_unknown_refinability_is_format_error() {
        let json = r#"[{"type": 1, "destination": 2, "refinability": 7, "rules": []}]"#;
        let err = QualifyingRelationshipAttribute::load_document(json.as_bytes(), "rules.json").unwrap_err();
        assert!(matches!(err, Error::Format { resource, .. } if resource == "rules.json"));
    }

    #[test]
    fn test_missing_start_point_is_format_error() {
        let json = r#"[{"type": 1, "destination": 2, "refinability": 1, "rules": [{"exceptions": []}]}]"#;
        assert!(QualifyingRelationshipAttribute::load_document(json.as_bytes(), "r").is_err());
    }
}
