//! Previous-release reconciliation.
//!
//! The previous release is read from its extracted directory:
//!
//! - `der1_Subsets*` files give the highest subset id and version issued.
//! - `sct1_Relationships*` files give the numeric id of every relationship
//!   tuple, so a synthesized relationship with the same tuple keeps its id.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::pool::BASELINE_SUBSET_VERSION;
use super::IdentityAssigner;
use crate::model::*;
use crate::{Error, Result};

const SUBSETS_MARKER: &str = "der1_Subsets";
const RELATIONSHIPS_MARKER: &str = "sct1_Relationships";

const RF1_IDX_SUBSETID: usize = 0;
const RF1_IDX_SUBSETVERSION: usize = 2;

const RF1_IDX_RELATIONSHIPID: usize = 0;
const RF1_IDX_CONCEPTID1: usize = 1;
const RF1_IDX_RELATIONSHIPTYPE: usize = 2;
const RF1_IDX_CONCEPTID2: usize = 3;
const RF1_IDX_RELATIONSHIPGROUP: usize = 6;

// ============================================================================
// SubsetHistory
// ============================================================================

/// Highest subset id and version seen in the previous release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsetHistory {
    pub max_subset_id: Option<u64>,
    pub version: u32,
}

impl Default for SubsetHistory {
    fn default() -> Self {
        Self { max_subset_id: None, version: BASELINE_SUBSET_VERSION }
    }
}

impl SubsetHistory {
    /// Fold one subset list (header line first) into the history.
    pub fn scan(&mut self, reader: impl BufRead, resource: &str) -> Result<()> {
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| Error::io(resource, e))?;
            if idx == 0 || line.trim().is_empty() {
                continue;
            }
            let line_no = idx + 1;
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() <= RF1_IDX_SUBSETVERSION {
                return Err(Error::format_at(resource, line_no, "subset row has too few columns"));
            }
            let subset_id: u64 = fields[RF1_IDX_SUBSETID].trim().parse().map_err(|_| {
                Error::format_at(resource, line_no, format!("invalid subset id '{}'", fields[RF1_IDX_SUBSETID]))
            })?;
            let version: u32 = fields[RF1_IDX_SUBSETVERSION].trim().parse().map_err(|_| {
                Error::format_at(
                    resource,
                    line_no,
                    format!("invalid subset version '{}'", fields[RF1_IDX_SUBSETVERSION]),
                )
            })?;

            self.max_subset_id = Some(self.max_subset_id.map_or(subset_id, |m| m.max(subset_id)));
            self.version = self.version.max(version);
        }
        Ok(())
    }
}

// ============================================================================
// RelationshipIdLookup
// ============================================================================

/// Content identity → numeric id issued by the previous release.
///
/// An id belongs to exactly one tuple; the reverse map rejects an export
/// that records the same id for two different tuples.
#[derive(Debug, Clone, Default)]
pub struct RelationshipIdLookup {
    ids: HashMap<RelationshipIdentity, u64>,
    owners: HashMap<u64, RelationshipIdentity>,
}

impl RelationshipIdLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issued id. The first id recorded for a tuple wins; an id
    /// already owned by another tuple is an error.
    pub fn insert(&mut self, identity: RelationshipIdentity, sctid: u64) -> Result<bool> {
        if let Some(&owner) = self.owners.get(&sctid) {
            if owner != identity {
                return Err(Error::InconsistentState(format!(
                    "relationship id {sctid} issued to {owner} and {identity}"
                )));
            }
        }
        match self.ids.get(&identity) {
            Some(&existing) => {
                if existing != sctid {
                    tracing::warn!(%identity, existing, ignored = sctid, "tuple issued twice in previous release");
                }
                Ok(false)
            }
            None => {
                self.ids.insert(identity, sctid);
                self.owners.insert(sctid, identity);
                Ok(true)
            }
        }
    }

    pub fn lookup(&self, identity: RelationshipIdentity) -> Option<u64> {
        self.ids.get(&identity).copied()
    }

    /// Attach the previously issued id, or leave it blank.
    pub fn reconcile(&self, relationship: Relationship) -> Relationship {
        let sctid = self.lookup(relationship.identity);
        relationship.with_sctid(sctid)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Fold one RF1 relationship export (header line first) into the lookup.
    pub fn scan(&mut self, reader: impl BufRead, resource: &str, assigner: &IdentityAssigner) -> Result<()> {
        let mut blank = 0usize;
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| Error::io(resource, e))?;
            if idx == 0 || line.trim().is_empty() {
                continue;
            }
            let line_no = idx + 1;
            let fields: Vec<&str> = line.trim_end_matches('\r').split('\t').collect();
            if fields.len() <= RF1_IDX_RELATIONSHIPGROUP {
                return Err(Error::format_at(resource, line_no, "relationship row has too few columns"));
            }

            let raw_id = fields[RF1_IDX_RELATIONSHIPID].trim();
            if raw_id.is_empty() {
                blank += 1;
                continue;
            }
            let sctid: u64 = raw_id
                .parse()
                .map_err(|_| Error::format_at(resource, line_no, format!("invalid relationship id '{raw_id}'")))?;

            let concept = |idx: usize| -> Result<ConceptId> {
                fields[idx]
                    .parse()
                    .map_err(|_| Error::format_at(resource, line_no, format!("invalid concept id '{}'", fields[idx])))
            };
            let group: u32 = fields[RF1_IDX_RELATIONSHIPGROUP].trim().parse().map_err(|_| {
                Error::format_at(
                    resource,
                    line_no,
                    format!("invalid relationship group '{}'", fields[RF1_IDX_RELATIONSHIPGROUP]),
                )
            })?;

            let identity = assigner.assign(
                concept(RF1_IDX_CONCEPTID1)?,
                concept(RF1_IDX_CONCEPTID2)?,
                concept(RF1_IDX_RELATIONSHIPTYPE)?,
                group,
            );
            if self.owners.get(&sctid).is_some_and(|&owner| owner != identity) {
                return Err(Error::format_at(
                    resource,
                    line_no,
                    format!("relationship id {sctid} already issued to a different tuple"),
                ));
            }
            self.insert(identity, sctid)?;
        }
        if blank > 0 {
            tracing::warn!(resource, blank, "previous relationships without an id were skipped");
        }
        Ok(())
    }
}

// ============================================================================
// PreviousRelease
// ============================================================================

/// Everything reconciliation needs from the previous release.
#[derive(Debug, Clone, Default)]
pub struct PreviousRelease {
    pub subsets: SubsetHistory,
    pub relationships: RelationshipIdLookup,
}

impl PreviousRelease {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every subset list and relationship export found under `dir`.
    pub fn load_dir(dir: &Path, assigner: &IdentityAssigner) -> Result<Self> {
        let mut files = Vec::new();
        collect_files(dir, &mut files)?;
        files.sort();

        let mut previous = Self::new();
        for path in files {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let resource = path.display().to_string();
            if name.contains(SUBSETS_MARKER) {
                tracing::debug!(%resource, "scanning previous subsets");
                previous.subsets.scan(open(&path)?, &resource)?;
            } else if name.contains(RELATIONSHIPS_MARKER) {
                tracing::debug!(%resource, "scanning previous relationships");
                previous.relationships.scan(open(&path)?, &resource, assigner)?;
            }
        }

        tracing::info!(
            dir = %dir.display(),
            max_subset_id = ?previous.subsets.max_subset_id,
            subset_version = previous.subsets.version,
            relationships = previous.relationships.len(),
            "previous release loaded"
        );
        Ok(previous)
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| Error::io(path.display(), e))
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir.display(), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir.display(), e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| Error::io(path.display(), e))?;
        if file_type.is_symlink() {
            tracing::debug!(path = %path.display(), "symlink skipped");
        } else if file_type.is_dir() {
            collect_files(&path, out)?;
        } else if file_type.is_file() {
            out.push(path);
        }
    }
    Ok(())
}
