//! Laterality indicators: which concepts need a body-side qualifier.
//!
//! The reference file is tab-delimited with one header line. The first
//! column is the concept id, the last column the indicator
//! (`1`/`Y`/`YES`/`TRUE` or `0`/`N`/`NO`/`FALSE`, any case).

use std::io::BufRead;

use hashbrown::HashMap;

use super::ConceptId;
use crate::{Error, Result};

/// Per-concept laterality flags, loaded once per run.
#[derive(Debug, Clone, Default)]
pub struct LateralityIndicators {
    flags: HashMap<ConceptId, bool>,
}

impl LateralityIndicators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, concept: ConceptId, applicable: bool) {
        self.flags.insert(concept, applicable);
    }

    /// True only for concepts explicitly flagged as applicable.
    pub fn is_applicable(&self, concept: ConceptId) -> bool {
        self.flags.get(&concept).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn load(reader: impl BufRead, resource: &str) -> Result<Self> {
        let mut indicators = Self::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| Error::io(resource, e))?;
            // header
            if idx == 0 {
                continue;
            }
            let line_no = idx + 1;
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 2 {
                return Err(Error::format_at(resource, line_no, "expected at least 2 columns"));
            }
            let concept: ConceptId = fields[0]
                .parse()
                .map_err(|_| Error::format_at(resource, line_no, format!("invalid concept id '{}'", fields[0])))?;
            let flag = fields[fields.len() - 1].trim();
            let applicable = match flag.to_ascii_uppercase().as_str() {
                "1" | "Y" | "YES" | "TRUE" => true,
                "0" | "N" | "NO" | "FALSE" => false,
                _ => {
                    return Err(Error::format_at(
                        resource,
                        line_no,
                        format!("invalid laterality indicator '{flag}'"),
                    ));
                }
            };
            indicators.set(concept, applicable);
        }
        tracing::debug!(resource, count = indicators.len(), "laterality indicators loaded");
        Ok(indicators)
    }
}
