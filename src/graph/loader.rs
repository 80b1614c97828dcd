//! Relationship snapshot loader.
//!
//! Reads the tab-delimited RF2 relationship snapshot:
//!
//! ```text
//! id  effectiveTime  active  moduleId  sourceId  destinationId  relationshipGroup  typeId  characteristicTypeId  modifierId
//! ```
//!
//! The whole snapshot must be loaded before the first closure query; the
//! graph drops its memo on every edge, so an early query is recomputed, but
//! the synthesizer never issues one.

use std::io::BufRead;

use super::ConceptGraph;
use crate::identity::IdentityAssigner;
use crate::model::ConceptId;
use crate::{Error, Result};

const IDX_ACTIVE: usize = 2;
const IDX_SOURCE: usize = 4;
const IDX_DESTINATION: usize = 5;
const IDX_GROUP: usize = 6;
const IDX_TYPE: usize = 7;
const COLUMNS: usize = 10;

/// One row of the hierarchy snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HierarchyRecord {
    pub source: ConceptId,
    pub destination: ConceptId,
    pub type_id: ConceptId,
    pub group: u32,
    pub active: bool,
}

impl HierarchyRecord {
    /// Parse one snapshot line. Inactive rows are recognised from the
    /// active column alone and returned as `None` without further parsing.
    pub fn parse_line(line: &str, resource: &str, line_no: usize) -> Result<Option<Self>> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < COLUMNS {
            return Err(Error::format_at(
                resource,
                line_no,
                format!("expected {COLUMNS} columns, found {}", fields.len()),
            ));
        }

        match fields[IDX_ACTIVE].trim() {
            "0" => return Ok(None),
            "1" => {}
            other => {
                return Err(Error::format_at(resource, line_no, format!("invalid active flag '{other}'")));
            }
        }

        let id = |idx: usize, what: &str| -> Result<ConceptId> {
            fields[idx]
                .parse()
                .map_err(|_| Error::format_at(resource, line_no, format!("invalid {what} '{}'", fields[idx])))
        };

        Ok(Some(Self {
            source: id(IDX_SOURCE, "sourceId")?,
            destination: id(IDX_DESTINATION, "destinationId")?,
            type_id: id(IDX_TYPE, "typeId")?,
            group: fields[IDX_GROUP].trim().parse().map_err(|_| {
                Error::format_at(resource, line_no, format!("invalid relationshipGroup '{}'", fields[IDX_GROUP]))
            })?,
            active: true,
        }))
    }
}

/// Counts from a snapshot load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub rows: usize,
    pub loaded: usize,
    pub skipped_inactive: usize,
}

impl ConceptGraph {
    /// Add records in order. Inactive records are skipped.
    pub fn load_records(
        &mut self,
        records: impl IntoIterator<Item = HierarchyRecord>,
        assigner: &IdentityAssigner,
    ) -> LoadStats {
        let mut stats = LoadStats::default();
        for record in records {
            stats.rows += 1;
            if !record.active {
                stats.skipped_inactive += 1;
                continue;
            }
            self.add_edge(assigner.relationship(
                record.source,
                record.destination,
                record.type_id,
                record.group,
            ));
            stats.loaded += 1;
        }
        stats
    }

    /// Load a snapshot file body (header line first).
    pub fn load_snapshot(
        &mut self,
        reader: impl BufRead,
        resource: &str,
        assigner: &IdentityAssigner,
    ) -> Result<LoadStats> {
        let mut stats = LoadStats::default();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| Error::io(resource, e))?;
            if idx == 0 || line.is_empty() {
                continue;
            }
            stats.rows += 1;
            match HierarchyRecord::parse_line(line.trim_end_matches('\r'), resource, idx + 1)? {
                Some(record) => {
                    self.add_edge(assigner.relationship(
                        record.source,
                        record.destination,
                        record.type_id,
                        record.group,
                    ));
                    stats.loaded += 1;
                }
                None => stats.skipped_inactive += 1,
            }
        }

        tracing::info!(
            resource,
            rows = stats.rows,
            loaded = stats.loaded,
            concepts = self.len(),
            "hierarchy snapshot loaded"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DescendantDepth;

    const HEADER: &str = "id\teffectiveTime\tactive\tmoduleId\tsourceId\tdestinationId\trelationshipGroup\ttypeId\tcharacteristicTypeId\tmodifierId";

    fn row(active: u8, source: u64, destination: u64, group: u32, type_id: u64) -> String {
        format!("1\t20160131\t{active}\t900000000000207008\t{source}\t{destination}\t{group}\t{type_id}\t900000000000011006\t900000000000451002")
    }

    #[test]
    fn test_load_snapshot_skips_inactive() {
        let text = [
            HEADER.to_string(),
            row(1, 2, 1, 0, 116_680_003),
            row(0, 3, 1, 0, 116_680_003),
            row(1, 3, 2, 0, 116_680_003),
        ]
        .join("\r\n");

        let mut graph = ConceptGraph::new();
        let stats = graph
            .load_snapshot(text.as_bytes(), "snapshot.txt", &IdentityAssigner::new())
            .unwrap();
        assert_eq!(stats, LoadStats { rows: 3, loaded: 2, skipped_inactive: 1 });
        assert_eq!(graph.descendants(ConceptId(1), DescendantDepth::Unlimited).len(), 2);
    }

    #[test]
    fn test_inactive_row_is_not_parsed() {
        let line = "x\tx\t0\tx\tnot-a-number\tx\tx\tx\tx\tx";
        assert_eq!(HierarchyRecord::parse_line(line, "s", 2).unwrap(), None);
    }

    #[test]
    fn test_short_row_is_format_error() {
        let err = HierarchyRecord::parse_line("1\t2\t1", "snapshot.txt", 7).unwrap_err();
        assert!(matches!(err, Error::Format { line: Some(7), .. }));
    }

    #[test]
    fn test_bad_source_is_format_error() {
        let line = row(1, 2, 1, 0, 116_680_003).replace("\t2\t1\t", "\tabc\t1\t");
        assert!(HierarchyRecord::parse_line(&line, "s", 2).is_err());
    }

    #[test]
    fn test_load_records() {
        let records = vec![
            HierarchyRecord { source: ConceptId(2), destination: ConceptId(1), type_id: crate::IS_A, group: 0, active: true },
            HierarchyRecord { source: ConceptId(3), destination: ConceptId(1), type_id: crate::IS_A, group: 0, active: false },
        ];
        let mut graph = ConceptGraph::new();
        let stats = graph.load_records(records, &IdentityAssigner::new());
        assert_eq!(stats.loaded, 1);
        assert_eq!(stats.skipped_inactive, 1);
        assert_eq!(graph.children(ConceptId(1)), vec![ConceptId(2)]);
    }
}
