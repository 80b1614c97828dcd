//! Identifier pools and the two ways of allocating from them.
//!
//! A pool file is a pre-generated, ordered list of unused SCTIDs, one per
//! line. Entries are consumed strictly front-to-back.
//!
//! ```text
//! Deterministic   (no previous release)
//!   index = (year - 2016) * 10 + month
//!   skip index - 1 entries, take N            version = 29 + index
//!
//! Reconciliation  (previous release supplied)
//!   skip entries <= max previous subset id, take N
//!                                             version = previous + 1
//! ```
//!
//! Monthly releases therefore get disjoint, increasing slices without any
//! shared state between runs.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::previous::SubsetHistory;
use crate::config::ReleaseDate;
use crate::{Error, Result};

/// First year of the release index.
pub const EPOCH_YEAR: i32 = 2016;

/// Subset version of the 2016-01-31 release, the last one before the
/// release index starts counting.
pub const BASELINE_SUBSET_VERSION: u32 = 29;

/// Release index of a year/month. 2016-01 is 1, 2017-01 is 11.
pub fn release_index(year: i32, month: u32) -> i64 {
    i64::from(year - EPOCH_YEAR) * 10 + i64::from(month)
}

// ============================================================================
// IdentifierPool
// ============================================================================

/// An ordered pool of unused identifiers with a consumption cursor.
#[derive(Debug, Clone)]
pub struct IdentifierPool {
    resource: String,
    entries: Vec<u64>,
    cursor: usize,
}

impl IdentifierPool {
    pub fn from_entries(resource: impl Into<String>, entries: Vec<u64>) -> Self {
        Self { resource: resource.into(), entries, cursor: 0 }
    }

    /// Parse a pool: one identifier per line, blank lines ignored.
    pub fn load(reader: impl BufRead, resource: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| Error::io(resource, e))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let id = trimmed.parse::<u64>().map_err(|_| {
                Error::format_at(resource, idx + 1, format!("invalid identifier '{trimmed}'"))
            })?;
            entries.push(id);
        }
        tracing::debug!(resource, entries = entries.len(), "identifier pool loaded");
        Ok(Self::from_entries(resource, entries))
    }

    pub fn open(path: &Path) -> Result<Self> {
        let resource = path.display().to_string();
        let file = File::open(path).map_err(|e| Error::io(&resource, e))?;
        Self::load(BufReader::new(file), &resource)
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn remaining(&self) -> usize {
        self.entries.len() - self.cursor
    }

    pub fn consumed(&self) -> usize {
        self.cursor
    }

    /// Advance past `n` entries without using them.
    pub fn skip(&mut self, n: usize) {
        self.cursor = self.cursor.saturating_add(n).min(self.entries.len());
    }

    /// Take the next `n` entries. On failure nothing is consumed.
    pub fn take(&mut self, n: usize) -> Result<Vec<u64>> {
        if self.remaining() < n {
            return Err(Error::ResourceExhausted { requested: n, available: self.remaining() });
        }
        let taken = self.entries[self.cursor..self.cursor + n].to_vec();
        self.cursor += n;
        Ok(taken)
    }

    /// Take the next `n` entries strictly greater than `floor`, passing over
    /// the ones at or below it. On failure nothing is consumed.
    pub fn take_above(&mut self, floor: u64, n: usize) -> Result<Vec<u64>> {
        let mut taken = Vec::with_capacity(n);
        let mut pos = self.cursor;
        while pos < self.entries.len() && taken.len() < n {
            let id = self.entries[pos];
            if id > floor {
                taken.push(id);
            }
            pos += 1;
        }
        if taken.len() < n {
            return Err(Error::ResourceExhausted { requested: n, available: taken.len() });
        }
        self.cursor = pos;
        Ok(taken)
    }
}

// ============================================================================
// Allocation
// ============================================================================

/// How a run chooses its pool slice. Selected once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationMode {
    Deterministic { release_index: u32 },
    Reconciliation { history: SubsetHistory },
}

/// Identifiers and version counter handed to one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsetAllocation {
    pub ids: Vec<u64>,
    pub version: u32,
}

#[derive(Debug, Clone)]
pub struct IdentifierPoolManager {
    mode: AllocationMode,
}

impl IdentifierPoolManager {
    /// Stateless mode keyed by the release's year and month.
    pub fn deterministic(release: &ReleaseDate) -> Result<Self> {
        let index = release_index(release.year(), release.month());
        let release_index = u32::try_from(index)
            .ok()
            .filter(|&i| i >= 1)
            .ok_or_else(|| {
                Error::InconsistentState(format!(
                    "release {release} predates the identifier epoch {EPOCH_YEAR}-01"
                ))
            })?;
        Ok(Self { mode: AllocationMode::Deterministic { release_index } })
    }

    pub fn reconciling(history: SubsetHistory) -> Self {
        Self { mode: AllocationMode::Reconciliation { history } }
    }

    pub fn mode(&self) -> &AllocationMode {
        &self.mode
    }

    /// Allocate `n` identifiers (one per dialect) and the new version counter.
    pub fn allocate(&self, pool: &mut IdentifierPool, n: usize) -> Result<SubsetAllocation> {
        let allocation = match &self.mode {
            AllocationMode::Deterministic { release_index } => {
                pool.skip(*release_index as usize - 1);
                SubsetAllocation {
                    ids: pool.take(n)?,
                    version: BASELINE_SUBSET_VERSION + release_index,
                }
            }
            AllocationMode::Reconciliation { history } => {
                let ids = match history.max_subset_id {
                    Some(max) => pool.take_above(max, n)?,
                    None => pool.take(n)?,
                };
                SubsetAllocation { ids, version: history.version + 1 }
            }
        };

        tracing::info!(
            pool = pool.resource(),
            mode = ?self.mode,
            ids = ?allocation.ids,
            version = allocation.version,
            "subset identifiers allocated"
        );
        Ok(allocation)
    }
}
