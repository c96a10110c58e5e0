//! Color index module
//!
//! The index maps an image reference to the [`ColorSignature`] recorded for it
//! in previously persisted output. It is rebuilt at the start of every run and
//! only read afterwards, so an unchanged reference is never analyzed twice
//! across runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::csv_store::{self, CsvStoreError};
use crate::record::{normalize_reference, RecordAccessor};
use crate::signature::ColorSignature;

/// Index loading error types
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Failed to read index file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed index file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: CsvStoreError,
    },
}

pub type Result<T> = std::result::Result<T, IndexError>;

/// Reference -> signature lookup built from prior output
#[derive(Debug, Clone, Default)]
pub struct ColorIndex {
    entries: HashMap<String, ColorSignature>,
}

impl ColorIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from records
    ///
    /// A record contributes only when its reference is non-empty and all four
    /// signature fields parse. The first record for a reference wins.
    pub fn from_records<'a, R, I>(records: I, column: &str) -> Self
    where
        R: RecordAccessor + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        let mut entries = HashMap::new();
        for record in records {
            let Some(raw) = record.lookup(column) else {
                continue;
            };
            let reference = normalize_reference(raw);
            if reference.is_empty() || entries.contains_key(reference) {
                continue;
            }
            let signature =
                ColorSignature::from_fields(|key| record.get_exact(key).map(normalize_reference));
            if let Ok(signature) = signature {
                entries.insert(reference.to_string(), signature);
            }
        }
        Self { entries }
    }

    /// Load an index from a previously written CSV file
    ///
    /// A missing file yields an empty index.
    pub fn load_csv(path: &Path, column: &str) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(source) => {
                return Err(IndexError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let table = csv_store::parse_table(&text).map_err(|source| IndexError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_records(&table.records, column))
    }

    /// Signature recorded for an exact reference
    pub fn get(&self, reference: &str) -> Option<&ColorSignature> {
        self.entries.get(reference)
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.entries.contains_key(reference)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use tempfile::tempdir;

    fn row(image: &str, hue: &str) -> Record {
        Record::from_pairs([
            ("image", image),
            ("dominantHue", hue),
            ("secondaryHue", "240"),
            ("weight", "0.75"),
            ("saturation", "1"),
        ])
    }

    #[test]
    fn test_from_records_complete_rows_only() {
        let partial = Record::from_pairs([("image", "b.png"), ("dominantHue", "10")]);
        let records = vec![row("a.png", "0"), partial];
        let index = ColorIndex::from_records(&records, "image");

        assert_eq!(index.len(), 1);
        assert_eq!(index.get("a.png").unwrap().dominant_hue, 0);
        assert!(index.get("b.png").is_none());
    }

    #[test]
    fn test_first_occurrence_wins() {
        let records = vec![row("a.png", "10"), row("a.png", "20")];
        let index = ColorIndex::from_records(&records, "image");
        assert_eq!(index.get("a.png").unwrap().dominant_hue, 10);
    }

    #[test]
    fn test_skips_invalid_and_empty_references() {
        let records = vec![row("", "10"), row("c.png", "abc"), row("d.png", "400")];
        let index = ColorIndex::from_records(&records, "image");
        assert!(index.is_empty());
    }

    #[test]
    fn test_reference_normalized_and_case_sensitive() {
        let mut record = row("x", "30");
        record.rename("image", " Image ");
        record.set(" Image ", " \"/img/A.png\" ");
        let index = ColorIndex::from_records(&[record], "image");

        assert!(index.contains("/img/A.png"));
        assert!(!index.contains("/img/a.png"));
    }

    #[test]
    fn test_signature_fields_match_exact_names() {
        let mut record = row("a.png", "10");
        record.rename("weight", "Weight");
        let index = ColorIndex::from_records(&[record], "image");
        assert!(index.is_empty());
    }

    #[test]
    fn test_load_csv_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let index = ColorIndex::load_csv(&dir.path().join("none.csv"), "image").unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_load_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(
            &path,
            "id,image,dominantHue,secondaryHue,weight,saturation\n1,a.png,0,240,0.75,1\n2,b.png,,,,\n",
        )
        .unwrap();

        let index = ColorIndex::load_csv(&path, "image").unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("a.png").unwrap().secondary_hue, 240);
    }

    #[test]
    fn test_load_csv_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "").unwrap();

        let result = ColorIndex::load_csv(&path, "image");
        assert!(matches!(result, Err(IndexError::Malformed { .. })));
    }
}
