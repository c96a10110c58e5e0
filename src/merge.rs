//! Index Merge Engine module
//!
//! Attaches color signatures to records without recomputing known values.
//! For each record, in priority order:
//!
//! 1. a non-empty reference with all four signature fields filled is trusted
//! 2. a reference found in the [`ColorIndex`] reuses the indexed signature
//! 3. a reference already resolved earlier in the same run reuses that result
//! 4. a reference the [`ImageSource`] can resolve is analyzed fresh
//! 5. anything else is left exactly as found
//!
//! Failed resolutions are remembered for the run as well, so a broken
//! reference shared by several records is fetched once.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::analyzer::HueAnalyzer;
use crate::index::ColorIndex;
use crate::pipeline::ProgressCallback;
use crate::record::{normalize_reference, Record, RecordAccessor};
use crate::signature::{ColorSignature, SIGNATURE_KEYS};
use crate::source::{self, ImageSource, SourceError};

/// How a record's signature was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    /// No reference field, or an empty reference
    NoReference,
    /// All signature fields were already present
    TrustedInput,
    /// Signature copied from the index
    ReusedIndex,
    /// Signature copied from an earlier record in this run
    ReusedRun,
    /// Signature computed from the image
    Analyzed,
    /// Reference could not be analyzed; fields untouched
    Unresolved,
}

impl MergeDecision {
    /// Whether this decision wrote signature fields into the record
    pub fn attached(&self) -> bool {
        matches!(
            self,
            MergeDecision::ReusedIndex | MergeDecision::ReusedRun | MergeDecision::Analyzed
        )
    }
}

/// Result of merging a record set
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    /// One decision per input record, in input order
    pub decisions: Vec<MergeDecision>,
    /// Number of fresh analyses performed
    pub analyzed: usize,
}

impl MergeReport {
    /// Number of records with the given decision
    pub fn count(&self, decision: MergeDecision) -> usize {
        self.decisions.iter().filter(|d| **d == decision).count()
    }
}

/// Signature merge engine
pub struct MergeEngine<S: ImageSource> {
    source: S,
    analyzer: HueAnalyzer,
    index_column: String,
    canonical_keys: bool,
}

impl<S: ImageSource> MergeEngine<S> {
    /// Create an engine reading references from `index_column`
    pub fn new(source: S, analyzer: HueAnalyzer, index_column: impl Into<String>) -> Self {
        Self {
            source,
            analyzer,
            index_column: index_column.into(),
            canonical_keys: false,
        }
    }

    /// Rename a differently-cased reference field to the configured column name
    pub fn with_canonical_keys(mut self, enabled: bool) -> Self {
        self.canonical_keys = enabled;
        self
    }

    pub fn index_column(&self) -> &str {
        &self.index_column
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Resolve and analyze one reference
    pub fn signature_for(&self, reference: &str) -> source::Result<ColorSignature> {
        let grid = self.source.pixels(reference)?;
        Ok(self.analyzer.analyze(grid.pixels()))
    }

    /// Merge signatures into `records` in place
    pub fn merge<P: ProgressCallback + ?Sized>(
        &self,
        records: &mut [Record],
        index: &ColorIndex,
        progress: &P,
    ) -> MergeReport {
        let total = records.len();
        let mut memo: HashMap<String, Option<ColorSignature>> = HashMap::new();
        let mut report = MergeReport {
            decisions: Vec::with_capacity(total),
            analyzed: 0,
        };

        progress.on_step_start("Merging color signatures...");
        for (i, record) in records.iter_mut().enumerate() {
            let decision = self.merge_record(record, index, &mut memo, &mut report.analyzed);
            report.decisions.push(decision);
            progress.on_step_progress(i + 1, total);
        }
        progress.on_step_complete(
            "Merging color signatures",
            &format!("{} records, {} analyzed", total, report.analyzed),
        );

        report
    }

    fn merge_record(
        &self,
        record: &mut Record,
        index: &ColorIndex,
        memo: &mut HashMap<String, Option<ColorSignature>>,
        analyzed: &mut usize,
    ) -> MergeDecision {
        let Some(key) = record.resolve_key(&self.index_column).map(str::to_string) else {
            return MergeDecision::NoReference;
        };
        if self.canonical_keys && key != self.index_column {
            record.rename(&key, &self.index_column);
        }

        let reference = match record.lookup(&self.index_column) {
            Some(raw) => normalize_reference(raw).to_string(),
            None => return MergeDecision::NoReference,
        };
        if reference.is_empty() {
            return MergeDecision::NoReference;
        }

        if has_complete_signature(record) {
            debug!(reference = %reference, "trusting existing signature");
            return MergeDecision::TrustedInput;
        }

        if let Some(signature) = index.get(&reference) {
            debug!(reference = %reference, "reusing indexed signature");
            attach_signature(record, signature);
            return MergeDecision::ReusedIndex;
        }

        if let Some(previous) = memo.get(&reference) {
            return match previous {
                Some(signature) => {
                    debug!(reference = %reference, "reusing signature from this run");
                    attach_signature(record, signature);
                    MergeDecision::ReusedRun
                }
                None => MergeDecision::Unresolved,
            };
        }

        match self.signature_for(&reference) {
            Ok(signature) => {
                debug!(reference = %reference, ?signature, "analyzed");
                attach_signature(record, &signature);
                memo.insert(reference, Some(signature));
                *analyzed += 1;
                MergeDecision::Analyzed
            }
            Err(err) => {
                log_unresolved(&reference, &err);
                memo.insert(reference, None);
                MergeDecision::Unresolved
            }
        }
    }
}

fn log_unresolved(reference: &str, err: &SourceError) {
    if err.is_not_analyzable() {
        debug!(reference, error = %err, "reference not analyzable");
    } else {
        warn!(reference, error = %err, "skipping reference");
    }
}

/// Whether all four signature fields are present and non-empty
///
/// Signature fields are matched by exact name; only the reference column is
/// looked up case-insensitively.
pub fn has_complete_signature<R: RecordAccessor>(record: &R) -> bool {
    SIGNATURE_KEYS.iter().all(|key| {
        record
            .get_exact(key)
            .map(|value| !normalize_reference(value).is_empty())
            .unwrap_or(false)
    })
}

/// Write a signature into a record under the exact signature field names
pub fn attach_signature(record: &mut Record, signature: &ColorSignature) {
    for (key, value) in signature.to_fields() {
        record.set(key, value);
    }
}

/// Output column order
///
/// Seed columns first (a seed matching the reference column case-insensitively
/// is canonicalized when the exact name is absent), then first-seen record
/// keys, then the reference column and the exact signature columns if still
/// absent.
pub fn output_columns(seed: &[String], records: &[Record], index_column: &str) -> Vec<String> {
    let wanted = index_column.trim().to_lowercase();
    let has_exact = seed.iter().any(|c| c == index_column);

    let mut columns: Vec<String> = Vec::new();
    let push = |columns: &mut Vec<String>, name: &str| {
        if !columns.iter().any(|c| c == name) {
            columns.push(name.to_string());
        }
    };

    for name in seed {
        if !has_exact && name.trim().to_lowercase() == wanted {
            push(&mut columns, index_column);
        } else {
            push(&mut columns, name);
        }
    }
    for record in records {
        for name in record.keys() {
            push(&mut columns, name);
        }
    }

    push(&mut columns, index_column);
    for key in SIGNATURE_KEYS {
        push(&mut columns, key);
    }
    columns
}
