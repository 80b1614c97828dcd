//! RF1 relationship export.
//!
//! Synthesized records are appended to the relationship file the base
//! conversion already produced, in its record shape:
//!
//! ```text
//! RELATIONSHIPID  CONCEPTID1  RELATIONSHIPTYPE  CONCEPTID2  CHARACTERISTICTYPE  REFINABILITY  RELATIONSHIPGROUP
//! ```
//!
//! Fields are tab-separated, lines end in CRLF, and an unassigned
//! `RELATIONSHIPID` is written as an empty field.

use std::io::Write;

use crate::synthesis::QualifyingRelationship;
use crate::{Error, Result};

pub const RF1_RELATIONSHIP_HEADER: &str = "RELATIONSHIPID\tCONCEPTID1\tRELATIONSHIPTYPE\tCONCEPTID2\tCHARACTERISTICTYPE\tREFINABILITY\tRELATIONSHIPGROUP";

/// Append-only destination for synthesized records.
pub trait RelationshipSink {
    fn append(&mut self, record: &QualifyingRelationship) -> Result<()>;

    /// Push buffered records out. Called once after the last append.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl RelationshipSink for Vec<QualifyingRelationship> {
    fn append(&mut self, record: &QualifyingRelationship) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Writes records as RF1 relationship lines.
pub struct Rf1RelationshipWriter<W: Write> {
    inner: W,
    resource: String,
    written: usize,
}

impl<W: Write> Rf1RelationshipWriter<W> {
    pub fn new(inner: W, resource: impl Into<String>) -> Self {
        Self { inner, resource: resource.into(), written: 0 }
    }

    pub fn write_header(&mut self) -> Result<()> {
        write!(self.inner, "{RF1_RELATIONSHIP_HEADER}\r\n").map_err(|e| Error::io(&self.resource, e))
    }

    /// Records appended so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> RelationshipSink for Rf1RelationshipWriter<W> {
    fn append(&mut self, record: &QualifyingRelationship) -> Result<()> {
        let rel = &record.relationship;
        let id = rel.sctid.map(|id| id.to_string()).unwrap_or_default();
        write!(
            self.inner,
            "{id}\t{}\t{}\t{}\t{}\t{}\t{}\r\n",
            rel.source,
            rel.type_id,
            rel.destination,
            record.characteristic,
            record.refinability.code(),
            rel.group,
        )
        .map_err(|e| Error::io(&self.resource, e))?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.inner.flush().map_err(|e| Error::io(&self.resource, e))
    }
}
