//! # Relationship Synthesis
//!
//! Turns rule targets and laterality flags into new qualifying relationship
//! records, then hands them to a [`RelationshipSink`].
//!
//! ## Pipeline
//!
//! ```text
//! LoadHierarchy ─► LoadRulesAndIndicators ─► AllocateSubsetIds
//!      │
//!      ▼
//! Evaluate ─► DeduplicateAgainstExisting ─► AssignIdentity/Reconcile ─► Emit
//! ```
//!
//! Every phase before `Emit` works in memory. Records are buffered in a
//! [`Synthesis`] and only appended once all phases succeeded, so a failed
//! run leaves the output untouched.
//!
//! ## Modes
//!
//! | Mode | Targets | Refinability | Reconciled |
//! |------|---------|--------------|------------|
//! | rule attribute | `RuleEngine::targets(attribute)` | attribute's | with a previous release |
//! | laterality | concepts under the root flagged applicable | mandatory | with a previous release |

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::config::{Edition, SynthesisConfig};
use crate::export::{RelationshipSink, Rf1RelationshipWriter};
use crate::graph::{ConceptGraph, DescendantDepth, LoadStats};
use crate::identity::{IdentifierPool, IdentifierPoolManager, IdentityAssigner, PreviousRelease, RelationshipIdLookup, SubsetAllocation};
use crate::model::*;
use crate::rules::RuleEngine;
use crate::{Error, Result};

// ============================================================================
// Records
// ============================================================================

/// A synthesized relationship ready for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifyingRelationship {
    pub relationship: Relationship,
    pub characteristic: u8,
    pub refinability: Refinability,
}

impl QualifyingRelationship {
    pub fn new(relationship: Relationship, refinability: Refinability) -> Self {
        Self { relationship, characteristic: QUALIFIER_CHARACTERISTIC, refinability }
    }
}

/// Counters for one synthesis mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisStats {
    /// Concepts selected before deduplication.
    pub candidates: usize,
    /// Candidates that already assert the attribute.
    pub skipped_existing: usize,
    /// Candidates whose tuple was already emitted in this synthesis.
    pub duplicates: usize,
    pub emitted: usize,
    /// Records that got their id from the previous release.
    pub reconciled: usize,
    /// Records left without an id although a previous release was given.
    pub unreconciled: usize,
}

impl std::ops::AddAssign for SynthesisStats {
    fn add_assign(&mut self, rhs: Self) {
        self.candidates += rhs.candidates;
        self.skipped_existing += rhs.skipped_existing;
        self.duplicates += rhs.duplicates;
        self.emitted += rhs.emitted;
        self.reconciled += rhs.reconciled;
        self.unreconciled += rhs.unreconciled;
    }
}

/// Buffered output of one or more synthesis modes.
///
/// A tuple is held at most once; a second record with the same identity is
/// counted as a duplicate and dropped.
#[derive(Debug, Clone, Default)]
pub struct Synthesis {
    pub records: Vec<QualifyingRelationship>,
    pub stats: SynthesisStats,
    seen: HashSet<RelationshipIdentity>,
}

impl Synthesis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn push(&mut self, record: QualifyingRelationship) -> bool {
        if !self.seen.insert(record.relationship.identity) {
            self.stats.duplicates += 1;
            return false;
        }
        self.stats.emitted += 1;
        self.records.push(record);
        true
    }

    /// Append another synthesis after this one, dropping tuples already held.
    ///
    /// Returns `other`'s counters as merged: `emitted` counts only the
    /// records kept, dropped ones move to `duplicates`.
    pub fn extend(&mut self, other: Synthesis) -> SynthesisStats {
        let incoming = other.stats;
        let mut merged = SynthesisStats { emitted: 0, ..incoming };
        for record in other.records {
            if self.push(record) {
                merged.emitted += 1;
            } else {
                merged.duplicates += 1;
            }
        }
        self.stats += SynthesisStats { emitted: 0, ..incoming };
        merged
    }

    /// Feed every record to `sink` in order.
    pub fn emit(&self, sink: &mut impl RelationshipSink) -> Result<usize> {
        for record in &self.records {
            sink.append(record)?;
        }
        sink.finish()?;
        Ok(self.records.len())
    }
}

// ============================================================================
// RelationshipSynthesizer
// ============================================================================

/// Evaluates both synthesis modes over a fully loaded graph.
#[derive(Debug, Clone, Copy)]
pub struct RelationshipSynthesizer<'a> {
    graph: &'a ConceptGraph,
    assigner: &'a IdentityAssigner,
    previous: Option<&'a RelationshipIdLookup>,
}

impl<'a> RelationshipSynthesizer<'a> {
    pub fn new(graph: &'a ConceptGraph, assigner: &'a IdentityAssigner) -> Self {
        Self { graph, assigner, previous: None }
    }

    /// Reconcile numeric ids against a previous release.
    pub fn with_previous(mut self, previous: &'a RelationshipIdLookup) -> Self {
        self.previous = Some(previous);
        self
    }

    pub fn is_reconciling(&self) -> bool {
        self.previous.is_some()
    }

    /// Rule-attribute mode. Attributes are processed in the given order,
    /// targets of each attribute in ascending concept order.
    pub fn qualifying(&self, attributes: &[QualifyingRelationshipAttribute]) -> Synthesis {
        let engine = RuleEngine::new(self.graph);
        let mut synthesis = Synthesis::new();

        for attribute in attributes {
            let mut targets: Vec<ConceptId> = engine.targets(attribute).into_iter().collect();
            targets.sort_unstable();
            let before = synthesis.stats;

            for concept in targets {
                self.offer(
                    &mut synthesis,
                    concept,
                    attribute.type_id,
                    attribute.destination,
                    attribute.refinability,
                );
            }

            tracing::debug!(
                type_id = %attribute.type_id,
                destination = %attribute.destination,
                rules = attribute.rules.len(),
                candidates = synthesis.stats.candidates - before.candidates,
                emitted = synthesis.stats.emitted - before.emitted,
                "attribute evaluated"
            );
        }
        synthesis
    }

    /// Laterality mode: every concept under the root that is flagged
    /// applicable and does not yet assert `Laterality = Side`.
    pub fn laterality(&self, indicators: &LateralityIndicators) -> Synthesis {
        let mut concepts: Vec<ConceptId> = self
            .graph
            .descendants(ROOT, DescendantDepth::Unlimited)
            .iter()
            .copied()
            .filter(|&c| indicators.is_applicable(c))
            .collect();
        concepts.sort_unstable();

        let mut synthesis = Synthesis::new();
        for concept in concepts {
            self.offer(&mut synthesis, concept, LATERALITY, SIDE, Refinability::Mandatory);
        }
        synthesis
    }

    fn offer(
        &self,
        synthesis: &mut Synthesis,
        concept: ConceptId,
        type_id: ConceptId,
        destination: ConceptId,
        refinability: Refinability,
    ) {
        synthesis.stats.candidates += 1;
        if self.graph.asserts(concept, type_id, destination) {
            synthesis.stats.skipped_existing += 1;
            return;
        }

        let mut relationship = self.assigner.relationship(concept, destination, type_id, UNGROUPED);
        if let Some(previous) = self.previous {
            relationship = previous.reconcile(relationship);
            if relationship.sctid.is_some() {
                synthesis.stats.reconciled += 1;
            } else {
                synthesis.stats.unreconciled += 1;
            }
        }
        synthesis.push(QualifyingRelationship::new(relationship, refinability));
    }
}

// ============================================================================
// Conversion
// ============================================================================

/// Summary of one conversion pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisReport {
    pub edition: Edition,
    pub concepts: usize,
    pub hierarchy_rows: usize,
    pub hierarchy_loaded: usize,
    pub attributes: usize,
    pub laterality_flags: usize,
    pub reconciling: bool,
    pub allocation: Option<SubsetAllocation>,
    pub qualifying: SynthesisStats,
    pub laterality: SynthesisStats,
    /// Records appended to the relationship output.
    pub written: usize,
}

/// One complete, all-or-nothing conversion pass driven by a [`SynthesisConfig`].
#[derive(Debug, Clone, Default)]
pub struct Conversion {
    assigner: IdentityAssigner,
}

impl Conversion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assigner(mut self, assigner: IdentityAssigner) -> Self {
        self.assigner = assigner;
        self
    }

    pub fn run(&self, config: &SynthesisConfig) -> Result<SynthesisReport> {
        // LoadHierarchy
        let mut graph = ConceptGraph::new();
        let hierarchy = load_hierarchy(&mut graph, &config.hierarchy_snapshot, &self.assigner)?;

        // LoadRulesAndIndicators
        let attributes = match &config.qualifying_rules {
            Some(path) => {
                let resource = path.display().to_string();
                let attributes = QualifyingRelationshipAttribute::load_document(open(path)?, &resource)?;
                tracing::info!(%resource, attributes = attributes.len(), "qualifying rules loaded");
                attributes
            }
            None => Vec::new(),
        };
        let indicators = match &config.laterality_indicators {
            Some(path) => {
                let resource = path.display().to_string();
                let indicators = LateralityIndicators::load(open(path)?, &resource)?;
                tracing::info!(%resource, flags = indicators.len(), "laterality indicators loaded");
                Some(indicators)
            }
            None => None,
        };

        let edition = config.resolve_edition()?;
        let previous = config
            .previous_release
            .as_deref()
            .map(|dir| PreviousRelease::load_dir(dir, &self.assigner))
            .transpose()?;

        // AllocateSubsetIds
        let allocation = match &config.subset_id_pool {
            Some(path) => {
                let manager = match (&previous, &config.release_date) {
                    (Some(previous), _) => IdentifierPoolManager::reconciling(previous.subsets),
                    (None, Some(date)) => IdentifierPoolManager::deterministic(date)?,
                    (None, None) => {
                        return Err(Error::InconsistentState(
                            "deterministic subset allocation needs a release date".into(),
                        ));
                    }
                };
                let mut pool = IdentifierPool::open(path)?;
                Some(manager.allocate(&mut pool, edition.config().dialects.len())?)
            }
            None => None,
        };

        // Evaluate, deduplicate, assign/reconcile
        let mut synthesizer = RelationshipSynthesizer::new(&graph, &self.assigner);
        if let Some(previous) = &previous {
            synthesizer = synthesizer.with_previous(&previous.relationships);
        }
        let mut synthesis = synthesizer.qualifying(&attributes);
        let qualifying = synthesis.stats;
        let laterality = match &indicators {
            Some(indicators) => synthesis.extend(synthesizer.laterality(indicators)),
            None => SynthesisStats::default(),
        };
        tracing::info!(
            qualifying = qualifying.emitted,
            laterality = laterality.emitted,
            skipped_existing = qualifying.skipped_existing + laterality.skipped_existing,
            reconciled = synthesis.stats.reconciled,
            unreconciled = synthesis.stats.unreconciled,
            "relationships synthesized"
        );

        // Emit
        let written = append_records(&config.relationship_output, &synthesis)?;

        Ok(SynthesisReport {
            edition,
            concepts: graph.len(),
            hierarchy_rows: hierarchy.rows,
            hierarchy_loaded: hierarchy.loaded,
            attributes: attributes.len(),
            laterality_flags: indicators.as_ref().map_or(0, LateralityIndicators::len),
            reconciling: previous.is_some(),
            allocation,
            qualifying,
            laterality,
            written,
        })
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| Error::io(path.display(), e))
}

fn load_hierarchy(graph: &mut ConceptGraph, path: &Path, assigner: &IdentityAssigner) -> Result<LoadStats> {
    let resource = path.display().to_string();
    graph.load_snapshot(open(path)?, &resource, assigner)
}

/// Append to the output file, creating it (with a header) and its parent
/// directories when missing.
fn append_records(path: &Path, synthesis: &Synthesis) -> Result<usize> {
    let resource = path.display().to_string();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent.display(), e))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::io(&resource, e))?;
    let original_len = file.metadata().map_err(|e| Error::io(&resource, e))?.len();
    let handle = file.try_clone().map_err(|e| Error::io(&resource, e))?;

    let writer = Rf1RelationshipWriter::new(BufWriter::new(handle), resource.as_str());
    let written = emit_or_rollback(&file, original_len, writer, synthesis, &resource)?;
    tracing::info!(%resource, written, "relationships appended");
    Ok(written)
}

/// Emit through `writer`, which appends to `file`. On failure `file` is cut
/// back to `original_len` so no partial export survives.
fn emit_or_rollback<W: Write>(
    file: &File,
    original_len: u64,
    mut writer: Rf1RelationshipWriter<W>,
    synthesis: &Synthesis,
    resource: &str,
) -> Result<usize> {
    let header = if original_len == 0 { writer.write_header() } else { Ok(()) };
    let err = match header.and_then(|()| synthesis.emit(&mut writer)) {
        Ok(written) => return Ok(written),
        Err(err) => err,
    };

    // a buffered writer flushes on drop; truncate only after that
    drop(writer);
    if let Err(truncate) = file.set_len(original_len) {
        tracing::error!(resource, original_len, error = %truncate, "could not roll back partial export");
    } else {
        tracing::warn!(resource, original_len, "partial export rolled back");
    }
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn is_a(graph: &mut ConceptGraph, child: u64, parent: u64) {
        graph.add_edge(Relationship::test_edge(child, parent, IS_A.0, 0));
    }

    fn attribute(start: u64) -> QualifyingRelationshipAttribute {
        QualifyingRelationshipAttribute::new(ConceptId(900), ConceptId(901), Refinability::Optional)
            .with_rule(QualifyingRelationshipRule::new(ConceptId(start)))
    }

    fn sources(synthesis: &Synthesis) -> Vec<u64> {
        synthesis.records.iter().map(|r| r.relationship.source.0).collect()
    }

    #[test]
    fn test_targets_emitted_in_ascending_order() {
        let mut g = ConceptGraph::new();
        is_a(&mut g, 30, 1);
        is_a(&mut g, 10, 1);
        is_a(&mut g, 20, 10);
        let assigner = IdentityAssigner::new();
        let synthesis = RelationshipSynthesizer::new(&g, &assigner).qualifying(&[attribute(1)]);
        assert_eq!(sources(&synthesis), vec![1, 10, 20, 30]);
        for record in &synthesis.records {
            assert_eq!(record.characteristic, QUALIFIER_CHARACTERISTIC);
            assert_eq!(record.refinability, Refinability::Optional);
            assert_eq!(record.relationship.group, UNGROUPED);
            assert_eq!(record.relationship.sctid, None);
        }
    }

    #[test]
    fn test_existing_attribute_in_any_group_is_skipped() {
        let mut g = ConceptGraph::new();
        is_a(&mut g, 2, 1);
        is_a(&mut g, 3, 1);
        g.add_edge(Relationship::test_edge(3, 901, 900, 4));
        let assigner = IdentityAssigner::new();
        let synthesis = RelationshipSynthesizer::new(&g, &assigner).qualifying(&[attribute(1)]);
        assert_eq!(sources(&synthesis), vec![1, 2]);
        assert_eq!(synthesis.stats.skipped_existing, 1);
    }

    #[test]
    fn test_inactive_existing_attribute_does_not_block() {
        let mut g = ConceptGraph::new();
        is_a(&mut g, 2, 1);
        g.add_edge(Relationship::test_edge(2, 901, 900, 0).with_active(false));
        let assigner = IdentityAssigner::new();
        let synthesis = RelationshipSynthesizer::new(&g, &assigner).qualifying(&[attribute(1)]);
        assert_eq!(sources(&synthesis), vec![1, 2]);
    }

    #[test]
    fn test_same_tuple_from_two_attributes_emitted_once() {
        let mut g = ConceptGraph::new();
        is_a(&mut g, 2, 1);
        let assigner = IdentityAssigner::new();
        let synthesis = RelationshipSynthesizer::new(&g, &assigner).qualifying(&[attribute(1), attribute(2)]);
        assert_eq!(sources(&synthesis), vec![1, 2]);
        assert_eq!(synthesis.stats.duplicates, 1);
    }

    #[test]
    fn test_laterality_mode() {
        let mut g = ConceptGraph::new();
        is_a(&mut g, 10, ROOT.0);
        is_a(&mut g, 11, 10);
        is_a(&mut g, 12, 10);
        is_a(&mut g, 13, 99); // outside the root
        g.add_edge(Relationship::test_edge(12, SIDE.0, LATERALITY.0, 1));

        let mut flags = LateralityIndicators::new();
        flags.set(ConceptId(10), false);
        flags.set(ConceptId(11), true);
        flags.set(ConceptId(12), true);
        flags.set(ConceptId(13), true);

        let assigner = IdentityAssigner::new();
        let synthesis = RelationshipSynthesizer::new(&g, &assigner).laterality(&flags);
        assert_eq!(sources(&synthesis), vec![11]);
        let record = &synthesis.records[0];
        assert_eq!(record.refinability, Refinability::Mandatory);
        assert_eq!(record.relationship.type_id, LATERALITY);
        assert_eq!(record.relationship.destination, SIDE);
        assert_eq!(synthesis.stats.skipped_existing, 1);
    }

    #[test]
    fn test_reconciliation_reuses_and_blanks() {
        let mut g = ConceptGraph::new();
        is_a(&mut g, 2, 1);
        let assigner = IdentityAssigner::new();
        let mut previous = RelationshipIdLookup::new();
        previous.insert(assigner.assign(ConceptId(2), ConceptId(901), ConceptId(900), 0), 5_550_001).unwrap();

        let synthesis = RelationshipSynthesizer::new(&g, &assigner)
            .with_previous(&previous)
            .qualifying(&[attribute(1)]);
        let ids: Vec<Option<u64>> = synthesis.records.iter().map(|r| r.relationship.sctid).collect();
        assert_eq!(ids, vec![None, Some(5_550_001)]);
        assert_eq!((synthesis.stats.reconciled, synthesis.stats.unreconciled), (1, 1));
    }

    #[test]
    fn test_extend_drops_held_tuples() {
        let mut g = ConceptGraph::new();
        is_a(&mut g, 10, ROOT.0);
        let assigner = IdentityAssigner::new();
        let lateral_rule = QualifyingRelationshipAttribute::new(LATERALITY, SIDE, Refinability::Optional)
            .with_rule(QualifyingRelationshipRule::new(ConceptId(10)));
        let synthesizer = RelationshipSynthesizer::new(&g, &assigner);

        let mut synthesis = synthesizer.qualifying(&[lateral_rule]);
        let mut flags = LateralityIndicators::new();
        flags.set(ConceptId(10), true);
        let merged = synthesis.extend(synthesizer.laterality(&flags));

        assert_eq!((merged.emitted, merged.duplicates), (0, 1));
        assert_eq!(synthesis.len(), 1);
        assert_eq!(synthesis.records[0].refinability, Refinability::Optional);
        assert_eq!(synthesis.stats.duplicates, 1);
        assert_eq!(synthesis.stats.emitted, 1);
    }

    #[test]
    fn test_emit_into_vec_sink() {
        let mut g = ConceptGraph::new();
        is_a(&mut g, 2, 1);
        let assigner = IdentityAssigner::new();
        let synthesis = RelationshipSynthesizer::new(&g, &assigner).qualifying(&[attribute(1)]);
        let mut sink: Vec<QualifyingRelationship> = Vec::new();
        assert_eq!(synthesis.emit(&mut sink).unwrap(), 2);
        assert_eq!(sink, synthesis.records);
    }

    /// Passes `budget` bytes through to the file, then fails.
    struct ShortWrite {
        inner: File,
        budget: usize,
    }

    impl Write for ShortWrite {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.budget == 0 {
                return Err(std::io::Error::other("device full"));
            }
            let n = self.inner.write(&buf[..buf.len().min(self.budget)])?;
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.inner.flush()
        }
    }

    #[test]
    fn test_failed_emit_truncates_partial_records() {
        let mut g = ConceptGraph::new();
        is_a(&mut g, 2, 1);
        is_a(&mut g, 3, 1);
        let assigner = IdentityAssigner::new();
        let synthesis = RelationshipSynthesizer::new(&g, &assigner).qualifying(&[attribute(1)]);
        assert_eq!(synthesis.len(), 3);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rels.txt");
        fs::write(&path, "existing\r\n").unwrap();
        let file = OpenOptions::new().append(true).open(&path).unwrap();
        let original_len = file.metadata().unwrap().len();

        // first record fits, the second is cut off midway
        let sink = ShortWrite { inner: file.try_clone().unwrap(), budget: 25 };
        let writer = Rf1RelationshipWriter::new(sink, "rels.txt");
        let err = emit_or_rollback(&file, original_len, writer, &synthesis, "rels.txt").unwrap_err();

        assert!(matches!(err, Error::Io { .. }), "{err}");
        assert_eq!(fs::read_to_string(&path).unwrap(), "existing\r\n");
    }

    #[test]
    fn test_failed_emit_into_new_file_leaves_it_empty() {
        let mut g = ConceptGraph::new();
        is_a(&mut g, 2, 1);
        let assigner = IdentityAssigner::new();
        let synthesis = RelationshipSynthesizer::new(&g, &assigner).qualifying(&[attribute(1)]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rels.txt");
        let file = OpenOptions::new().create(true).append(true).open(&path).unwrap();

        // the header alone is longer than the budget
        let sink = ShortWrite { inner: file.try_clone().unwrap(), budget: 10 };
        let writer = Rf1RelationshipWriter::new(BufWriter::new(sink), "rels.txt");
        assert!(emit_or_rollback(&file, 0, writer, &synthesis, "rels.txt").is_err());
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_laterality_stats_exclude_tuples_dropped_on_merge() {
        let mut g = ConceptGraph::new();
        is_a(&mut g, 10, ROOT.0);
        is_a(&mut g, 11, ROOT.0);
        let assigner = IdentityAssigner::new();
        let lateral_rule = QualifyingRelationshipAttribute::new(LATERALITY, SIDE, Refinability::Optional)
            .with_rule(QualifyingRelationshipRule::new(ConceptId(10)));
        let synthesizer = RelationshipSynthesizer::new(&g, &assigner);

        let mut flags = LateralityIndicators::new();
        flags.set(ConceptId(10), true);
        flags.set(ConceptId(11), true);
        let mut synthesis = synthesizer.qualifying(&[lateral_rule]);
        let laterality = synthesis.extend(synthesizer.laterality(&flags));

        assert_eq!(laterality.candidates, 2);
        assert_eq!(laterality.emitted, 1);
        assert_eq!(laterality.duplicates, 1);
        assert_eq!(synthesis.stats.emitted, 2);
    }

    #[test]
    fn test_run_without_release_date_and_pool_fails_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("snapshot.txt");
        let pool = dir.path().join("pool.txt");
        let output = dir.path().join("out").join("rels.txt");
        fs::write(&snapshot, "header\n").unwrap();
        fs::write(&pool, "1\n2\n3\n").unwrap();

        let config = SynthesisConfig {
            hierarchy_snapshot: snapshot,
            subset_id_pool: Some(pool),
            relationship_output: output.clone(),
            ..SynthesisConfig::default()
        };
        let err = Conversion::new().run(&config).unwrap_err();
        assert!(matches!(err, Error::InconsistentState(_)));
        assert!(!output.exists());
    }
}
