//! Run configuration.
//!
//! [`SynthesisConfig`] names every external resource a conversion pass reads
//! or appends to, and which synthesis modes run. It is plain serde data and
//! can be loaded from a JSON file.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ============================================================================
// ReleaseDate
// ============================================================================

/// Release effective date, written `YYYYMMDD` in file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReleaseDate(NaiveDate);

impl ReleaseDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl FromStr for ReleaseDate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.len() != 8 {
            return Err(Error::Format {
                resource: "release date".into(),
                line: None,
                message: format!("expected YYYYMMDD, got '{s}'"),
            });
        }
        NaiveDate::parse_from_str(trimmed, "%Y%m%d")
            .map(ReleaseDate)
            .map_err(|e| Error::Format {
                resource: "release date".into(),
                line: None,
                message: format!("'{s}': {e}"),
            })
    }
}

impl TryFrom<String> for ReleaseDate {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ReleaseDate> for String {
    fn from(date: ReleaseDate) -> String {
        date.to_string()
    }
}

impl std::fmt::Display for ReleaseDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y%m%d"))
    }
}

// ============================================================================
// Editions
// ============================================================================

/// A language dialect published by an edition; each one needs its own
/// subset identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub lang_refset_id: u64,
    pub lang_code: &'static str,
}

pub const DIALECT_ES: Dialect = Dialect { lang_refset_id: 450_828_004, lang_code: "es" };
pub const DIALECT_GB: Dialect = Dialect { lang_refset_id: 900_000_000_000_508_004, lang_code: "en-GB" };
pub const DIALECT_US: Dialect = Dialect { lang_refset_id: 900_000_000_000_509_007, lang_code: "en-US" };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edition {
    #[default]
    International,
    Spanish,
}

/// Naming and dialect details of an edition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditionConfig {
    /// Extension name in RF2 file names; empty for the International Edition.
    pub edition_name: &'static str,
    pub lang_code: &'static str,
    pub output_name: &'static str,
    pub dialects: &'static [Dialect],
}

const INTERNATIONAL: EditionConfig = EditionConfig {
    edition_name: "",
    lang_code: "en",
    output_name: "RF1Release",
    dialects: &[DIALECT_GB, DIALECT_US],
};

const SPANISH: EditionConfig = EditionConfig {
    edition_name: "SpanishExtension",
    lang_code: "es",
    output_name: "SpanishRelease-es",
    dialects: &[DIALECT_ES],
};

impl Edition {
    pub const ALL: [Edition; 2] = [Edition::International, Edition::Spanish];

    pub fn config(self) -> &'static EditionConfig {
        match self {
            Edition::International => &INTERNATIONAL,
            Edition::Spanish => &SPANISH,
        }
    }

    /// Name of the description file whose presence identifies this edition.
    pub fn determiner_file(self, release: &ReleaseDate) -> String {
        let cfg = self.config();
        format!("sct2_Description_{}Full-{}_INT_{release}.txt", cfg.edition_name, cfg.lang_code)
    }

    /// Identify the edition of an extracted release from its file names.
    ///
    /// With `enforce` set, finding any other edition is an error.
    pub fn detect<'a>(
        file_names: impl IntoIterator<Item = &'a str>,
        release: &ReleaseDate,
        enforce: Option<Edition>,
    ) -> Result<Edition> {
        let names: Vec<&str> = file_names.into_iter().collect();
        for edition in Edition::ALL {
            let target = edition.determiner_file(release);
            if names.iter().any(|n| *n == target) {
                if let Some(wanted) = enforce.filter(|w| *w != edition) {
                    return Err(Error::InconsistentState(format!(
                        "needed {wanted:?} edition, instead found {edition:?}"
                    )));
                }
                return Ok(edition);
            }
        }
        Err(Error::InconsistentState(format!(
            "no file matching any known edition for release {release}"
        )))
    }

    /// Detect the edition from the file names in an extracted release directory.
    pub fn detect_in_dir(dir: &Path, release: &ReleaseDate, enforce: Option<Edition>) -> Result<Edition> {
        let entries = std::fs::read_dir(dir).map_err(|e| Error::io(dir.display(), e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(dir.display(), e))?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Edition::detect(names.iter().map(String::as_str), release, enforce)
    }
}

// ============================================================================
// SynthesisConfig
// ============================================================================

/// Everything one conversion pass needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub release_date: Option<ReleaseDate>,
    /// Edition the release must be. Also the edition used when no
    /// `release_dir` is available for detection.
    pub edition: Option<Edition>,
    /// Extracted RF2 release, used to detect the edition.
    pub release_dir: Option<PathBuf>,
    /// RF2 relationship snapshot the hierarchy is built from.
    pub hierarchy_snapshot: PathBuf,
    pub qualifying_rules: Option<PathBuf>,
    pub laterality_indicators: Option<PathBuf>,
    /// Pool the subset identifiers are allocated from.
    pub subset_id_pool: Option<PathBuf>,
    /// Extracted previous release; enables reconciliation mode.
    pub previous_release: Option<PathBuf>,
    /// RF1 relationship file the synthesized records are appended to.
    pub relationship_output: PathBuf,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            release_date: None,
            edition: None,
            release_dir: None,
            hierarchy_snapshot: PathBuf::from("sct2_Relationship_Snapshot.txt"),
            qualifying_rules: None,
            laterality_indicators: None,
            subset_id_pool: None,
            previous_release: None,
            relationship_output: PathBuf::from("sct1_Relationships_Core.txt"),
        }
    }
}

impl SynthesisConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let resource = path.display().to_string();
        let file = File::open(path).map_err(|e| Error::io(&resource, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::Format {
            resource,
            line: Some(e.line()).filter(|&l| l > 0),
            message: e.to_string(),
        })
    }

    pub fn reconciling(&self) -> bool {
        self.previous_release.is_some()
    }

    /// Resolve the edition: detected from `release_dir` when given
    /// (checked against `edition`), otherwise `edition` or International.
    pub fn resolve_edition(&self) -> Result<Edition> {
        match (&self.release_dir, &self.release_date) {
            (Some(dir), Some(date)) => Edition::detect_in_dir(dir, date, self.edition),
            (Some(_), None) => Err(Error::InconsistentState(
                "edition detection needs a release date".into(),
            )),
            (None, _) => Ok(self.edition.unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_date_parse() {
        let date: ReleaseDate = "20170131".parse().unwrap();
        assert_eq!((date.year(), date.month()), (2017, 1));
        assert_eq!(date.to_string(), "20170131");
    }

    #[test]
    fn test_release_date_rejects_garbage() {
        assert!("2017-01-31".parse::<ReleaseDate>().is_err());
        assert!("20171331".parse::<ReleaseDate>().is_err());
        assert!("2017013".parse::<ReleaseDate>().is_err());
    }

    #[test]
    fn test_dialect_counts() {
        assert_eq!(Edition::International.config().dialects.len(), 2);
        assert_eq!(Edition::Spanish.config().dialects, &[DIALECT_ES]);
    }

    #[test]
    fn test_detect_edition() {
        let date: ReleaseDate = "20160430".parse().unwrap();
        let files = ["sct2_Concept_SpanishExtensionFull_INT_20160430.txt",
                     "sct2_Description_SpanishExtensionFull-es_INT_20160430.txt"];
        assert_eq!(Edition::detect(files, &date, None).unwrap(), Edition::Spanish);

        let int = ["sct2_Description_Full-en_INT_20160430.txt"];
        assert_eq!(Edition::detect(int, &date, Some(Edition::International)).unwrap(), Edition::International);
    }

    #[test]
    fn test_enforced_edition_mismatch() {
        let date: ReleaseDate = "20160430".parse().unwrap();
        let files = ["sct2_Description_SpanishExtensionFull-es_INT_20160430.txt"];
        let err = Edition::detect(files, &date, Some(Edition::International)).unwrap_err();
        assert!(matches!(err, Error::InconsistentState(_)));
    }

    #[test]
    fn test_no_edition_found() {
        let date: ReleaseDate = "20160430".parse().unwrap();
        let err = Edition::detect(["readme.txt"], &date, None).unwrap_err();
        assert!(matches!(err, Error::InconsistentState(_)));
    }

    #[test]
    fn test_config_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(
            &path,
            r#"{"release_date": "20160731", "edition": "spanish",
                "hierarchy_snapshot": "snap.txt", "relationship_output": "out.txt",
                "previous_release": "prev"}"#,
        )
        .unwrap();
        let cfg = SynthesisConfig::from_json_file(&path).unwrap();
        assert_eq!(cfg.release_date, Some("20160731".parse().unwrap()));
        assert_eq!(cfg.resolve_edition().unwrap(), Edition::Spanish);
        assert!(cfg.reconciling());
        assert_eq!(cfg.qualifying_rules, None);
    }

    #[test]
    fn test_config_bad_date_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, r#"{"release_date": "July 2016"}"#).unwrap();
        assert!(matches!(SynthesisConfig::from_json_file(&path), Err(Error::Format { .. })));
    }
}
