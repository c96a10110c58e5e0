//! Pipeline processing module
//!
//! Provides the update runs behind the CLI, separating business logic from
//! argument handling.
//!
//! ## Modes
//!
//! - **CSV**: read a table (local file or URL), build the index from the
//!   previous output file, merge, and write the output only when it changed
//! - **Markdown**: read every document matched by a glob (sorted), build the
//!   index from their front matter, merge, and rewrite each document whose
//!   signature changed

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analyzer::{AnalyzerOptions, HueAnalyzer};
use crate::csv_store::{self, CsvSource, CsvStoreError};
use crate::frame::{FfmpegExtractor, DEFAULT_FFMPEG};
use crate::front_matter::MarkdownDocument;
use crate::http_client::{HttpClient, HttpOptions};
use crate::index::ColorIndex;
use crate::merge::{output_columns, MergeDecision, MergeEngine, MergeReport};
use crate::record::{Record, RecordAccessor};
use crate::sampler::{PixelSampler, DEFAULT_SAMPLE_SIZE};
use crate::signature::ColorSignature;
use crate::source::{
    SourceError, SourceOptions, SourceResolver, DEFAULT_IMAGE_EXTENSIONS,
    DEFAULT_VIDEO_EXTENSIONS,
};
use crate::util::write_if_changed;

/// Default reference column / front matter key
pub const DEFAULT_INDEX_COLUMN: &str = "image";

/// Default markdown glob
pub const DEFAULT_CONTENT_GLOB: &str = "content/*.md";

/// Progress callback for pipeline steps
pub trait ProgressCallback: Send + Sync {
    /// Called when a new step starts
    fn on_step_start(&self, step: &str);
    /// Called to report progress within a step
    fn on_step_progress(&self, current: usize, total: usize);
    /// Called when a step completes
    fn on_step_complete(&self, step: &str, message: &str);
    /// Called for debug/verbose messages
    fn on_debug(&self, message: &str);
}

/// No-op progress callback (silent mode)
pub struct SilentProgress;

impl ProgressCallback for SilentProgress {
    fn on_step_start(&self, _step: &str) {}
    fn on_step_progress(&self, _current: usize, _total: usize) {}
    fn on_step_complete(&self, _step: &str, _message: &str) {}
    fn on_debug(&self, _message: &str) {}
}

/// Pipeline processing error
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(#[from] glob::PatternError),

    #[error("Failed to walk glob matches: {0}")]
    GlobIo(#[from] glob::GlobError),

    #[error("Failed to read CSV source: {0}")]
    CsvSource(#[from] CsvStoreError),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Analysis failed: {0}")]
    Source(#[from] SourceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root for relative references, globs and CSV paths
    pub repo_root: PathBuf,
    /// Reference column / front matter key
    pub index_column: String,
    /// Sampling grid edge length
    pub sample_size: u32,
    /// Analyzer thresholds
    pub analysis: AnalyzerOptions,
    /// Raster extensions
    pub image_extensions: Vec<String>,
    /// Video extensions
    pub video_extensions: Vec<String>,
    /// Frame extraction program
    pub ffmpeg: PathBuf,
    /// HTTP timeouts and limits
    pub http: HttpOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            repo_root: PathBuf::from("."),
            index_column: DEFAULT_INDEX_COLUMN.to_string(),
            sample_size: DEFAULT_SAMPLE_SIZE,
            analysis: AnalyzerOptions::default(),
            image_extensions: DEFAULT_IMAGE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            video_extensions: DEFAULT_VIDEO_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            ffmpeg: PathBuf::from(DEFAULT_FFMPEG),
            http: HttpOptions::default(),
        }
    }
}

impl PipelineConfig {
    /// Convert to JSON string for display
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Builder pattern: set repository root
    pub fn with_repo_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.repo_root = root.into();
        self
    }

    /// Builder pattern: set reference column
    pub fn with_index_column(mut self, column: impl Into<String>) -> Self {
        self.index_column = column.into();
        self
    }

    /// Builder pattern: set sampling grid size
    pub fn with_sample_size(mut self, size: u32) -> Self {
        self.sample_size = size;
        self
    }

    /// Builder pattern: set analyzer thresholds
    pub fn with_analysis(mut self, analysis: AnalyzerOptions) -> Self {
        self.analysis = analysis;
        self
    }

    /// Builder pattern: set frame extraction program
    pub fn with_ffmpeg(mut self, program: impl Into<PathBuf>) -> Self {
        self.ffmpeg = program.into();
        self
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.sample_size == 0 {
            return Err(PipelineError::InvalidConfig(
                "sample_size must be at least 1".to_string(),
            ));
        }
        if self.index_column.trim().is_empty() {
            return Err(PipelineError::InvalidConfig(
                "index column must not be empty".to_string(),
            ));
        }
        if self.image_extensions.is_empty() && self.video_extensions.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "at least one image or video extension is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of an update run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Records seen (CSV rows or markdown documents with front matter)
    pub records: usize,
    /// Fresh analyses performed
    pub analyzed: usize,
    /// Records whose signature came from the index
    pub reused: usize,
    /// Records with a reference that could not be analyzed
    pub unresolved: usize,
    /// Inputs skipped as malformed (no header / no front matter)
    pub skipped: usize,
    /// Files written because their content changed
    pub updated_paths: Vec<PathBuf>,
    /// Processing time in seconds
    pub elapsed_seconds: f64,
}

impl RunSummary {
    fn from_report(records: usize, report: &MergeReport) -> Self {
        Self {
            records,
            analyzed: report.analyzed,
            reused: report.count(MergeDecision::ReusedIndex),
            unresolved: report.count(MergeDecision::Unresolved),
            ..Default::default()
        }
    }

    /// Whether any file was written
    pub fn output_changed(&self) -> bool {
        !self.updated_paths.is_empty()
    }
}

/// Color index update pipeline
pub struct IndexPipeline {
    config: PipelineConfig,
    http: HttpClient,
}

impl IndexPipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let http = HttpClient::new(&config.http);
        Ok(Self { config, http })
    }

    /// Get the pipeline configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Merge engine over the configured sources
    pub fn engine(&self) -> MergeEngine<SourceResolver> {
        let options = SourceOptions {
            repo_root: self.config.repo_root.clone(),
            image_extensions: self.config.image_extensions.clone(),
            video_extensions: self.config.video_extensions.clone(),
        };
        let resolver = SourceResolver::with_extractor(
            options,
            PixelSampler::new(self.config.sample_size),
            self.http.clone(),
            FfmpegExtractor::new(&self.config.ffmpeg),
        );
        MergeEngine::new(
            resolver,
            HueAnalyzer::new(self.config.analysis.clone()),
            self.config.index_column.clone(),
        )
    }

    /// Resolve a path against the repository root
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config.repo_root.join(path)
        }
    }

    /// Analyze a single reference
    pub fn analyze_reference(&self, reference: &str) -> Result<ColorSignature, PipelineError> {
        Ok(self.engine().signature_for(reference)?)
    }

    /// Update a CSV table, writing the merged result to `output`
    ///
    /// The previous content of `output` is the index. A source without a
    /// header row is skipped and nothing is written.
    pub fn run_csv<P: ProgressCallback + ?Sized>(
        &self,
        source: &CsvSource,
        output: &Path,
        progress: &P,
    ) -> Result<RunSummary, PipelineError> {
        let start_time = Instant::now();
        let column = &self.config.index_column;

        progress.on_step_start(&format!("Reading {}...", source));
        let table = match csv_store::read_table(source, &self.http) {
            Ok(table) => table,
            Err(err @ (CsvStoreError::MissingHeader | CsvStoreError::Parse(_))) => {
                warn!(source = %source, error = %err, "skipping malformed CSV");
                return Ok(RunSummary {
                    skipped: 1,
                    elapsed_seconds: start_time.elapsed().as_secs_f64(),
                    ..Default::default()
                });
            }
            Err(err) => return Err(err.into()),
        };
        progress.on_step_complete("Reading CSV", &format!("{} rows", table.records.len()));

        let index = match ColorIndex::load_csv(output, column) {
            Ok(index) => index,
            Err(err) => {
                warn!(error = %err, "ignoring unreadable index");
                ColorIndex::new()
            }
        };
        info!(entries = index.len(), "index loaded");
        progress.on_debug(&format!("Index entries: {}", index.len()));

        let mut records = table.records;
        let engine = self.engine().with_canonical_keys(true);
        let report = engine.merge(&mut records, &index, progress);

        let columns = output_columns(&table.headers, &records, column);
        let text = csv_store::render_table(&columns, &records)?;

        let mut summary = RunSummary::from_report(records.len(), &report);
        let changed = write_if_changed(output, &text).map_err(|source| PipelineError::Write {
            path: output.to_path_buf(),
            source,
        })?;
        if changed {
            info!(path = %output.display(), "output updated");
            summary.updated_paths.push(output.to_path_buf());
        } else {
            debug!(path = %output.display(), "output unchanged");
        }

        summary.elapsed_seconds = start_time.elapsed().as_secs_f64();
        Ok(summary)
    }

    /// Update markdown documents matched by `pattern` in place
    ///
    /// Relative patterns are resolved against the repository root. Documents
    /// without front matter are skipped and never rewritten.
    pub fn run_markdown<P: ProgressCallback + ?Sized>(
        &self,
        pattern: &str,
        progress: &P,
    ) -> Result<RunSummary, PipelineError> {
        let start_time = Instant::now();
        let column = &self.config.index_column;

        let paths = self.collect_documents(pattern)?;
        progress.on_step_start(&format!("Reading {} documents...", paths.len()));

        let mut documents: Vec<(PathBuf, MarkdownDocument)> = Vec::with_capacity(paths.len());
        let mut skipped = 0;
        for path in paths {
            let text = match std::fs::read_to_string(&path) {
                Ok(text) => text,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable document");
                    skipped += 1;
                    continue;
                }
            };
            match MarkdownDocument::parse(&text) {
                Some(doc) if doc.front_matter.has_entries() => documents.push((path, doc)),
                _ => {
                    debug!(path = %path.display(), "no front matter, skipping");
                    skipped += 1;
                }
            }
        }
        progress.on_step_complete(
            "Reading documents",
            &format!("{} with front matter, {} skipped", documents.len(), skipped),
        );

        let index = ColorIndex::from_records(documents.iter().map(|(_, d)| &d.front_matter), column);
        progress.on_debug(&format!("Index entries: {}", index.len()));

        let mut records: Vec<Record> = documents
            .iter()
            .map(|(_, doc)| doc.front_matter.to_record())
            .collect();
        let report = self.engine().merge(&mut records, &index, progress);

        let mut summary = RunSummary::from_report(records.len(), &report);
        summary.skipped = skipped;

        for (((path, mut doc), record), decision) in documents
            .into_iter()
            .zip(records.iter())
            .zip(report.decisions.iter())
        {
            if *decision == MergeDecision::NoReference {
                continue;
            }
            if let Some(found) = doc.front_matter.resolve_key(column).map(str::to_string) {
                doc.front_matter.rename_key(&found, column);
            }
            if decision.attached() {
                doc.front_matter.apply_signature(record);
            }
            let changed = write_if_changed(&path, &doc.render()).map_err(|source| {
                PipelineError::Write {
                    path: path.clone(),
                    source,
                }
            })?;
            if changed {
                info!(path = %path.display(), "document updated");
                summary.updated_paths.push(path);
            }
        }

        summary.elapsed_seconds = start_time.elapsed().as_secs_f64();
        Ok(summary)
    }

    /// Sorted document paths matching `pattern`
    pub fn collect_documents(&self, pattern: &str) -> Result<Vec<PathBuf>, PipelineError> {
        let full = self.resolve_path(Path::new(pattern));
        let full = full.to_string_lossy();

        let mut paths = Vec::new();
        for entry in glob::glob(&full)? {
            let path = entry?;
            if path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::fs;
    use tempfile::{tempdir, TempDir};

    const HEADER: &str = "id,image,dominantHue,secondaryHue,weight,saturation";

    fn write_image(root: &Path, rel: &str, pixels: &[[u8; 3]]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut img = RgbImage::new(pixels.len() as u32, 1);
        for (x, p) in pixels.iter().enumerate() {
            img.put_pixel(x as u32, 0, Rgb(*p));
        }
        img.save(&path).unwrap();
    }

    /// Repo with a 2x2 red/blue image at img/rb.png and a solid green image
    fn repo() -> TempDir {
        let dir = tempdir().unwrap();
        let path = dir.path().join("img/rb.png");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut img = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));
        img.put_pixel(1, 1, Rgb([0, 0, 255]));
        img.save(&path).unwrap();
        write_image(dir.path(), "img/green.png", &[[0, 255, 0]; 4]);
        dir
    }

    fn pipeline(root: &Path) -> IndexPipeline {
        IndexPipeline::new(
            PipelineConfig::default()
                .with_repo_root(root)
                .with_sample_size(2),
        )
        .unwrap()
    }

    // ============ PipelineConfig Tests ============

    #[test]
    fn test_pipeline_config_default() {
        let config = PipelineConfig::default();

        assert_eq!(config.index_column, "image");
        assert_eq!(config.sample_size, 64);
        assert_eq!(config.analysis, AnalyzerOptions::default());
        assert_eq!(config.video_extensions, vec!["webm".to_string()]);
        assert_eq!(config.ffmpeg, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn test_pipeline_config_to_json() {
        let json = PipelineConfig::default().to_json();

        assert!(json.contains("\"index_column\": \"image\""));
        assert!(json.contains("\"sample_size\": 64"));
    }

    #[test]
    fn test_pipeline_config_validate() {
        assert!(PipelineConfig::default().validate().is_ok());

        let zero = PipelineConfig::default().with_sample_size(0);
        assert!(matches!(zero.validate(), Err(PipelineError::InvalidConfig(_))));

        let blank = PipelineConfig::default().with_index_column("  ");
        assert!(IndexPipeline::new(blank).is_err());
    }

    // ============ CSV Tests ============

    #[test]
    fn test_run_csv_analyzes_and_writes() {
        let dir = repo();
        let input = dir.path().join("items.csv");
        let output = dir.path().join("out/items.csv");
        fs::write(&input, "id,image,title\n1,/img/rb.png,Red\n2,,Empty\n").unwrap();

        let p = pipeline(dir.path());
        let summary = p
            .run_csv(&CsvSource::Path(input), &output, &SilentProgress)
            .unwrap();

        assert_eq!(summary.records, 2);
        assert_eq!(summary.analyzed, 1);
        assert!(summary.output_changed());
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "id,image,title,dominantHue,secondaryHue,weight,saturation\n\
             1,/img/rb.png,Red,0,240,0.75,1\n\
             2,,Empty,,,,\n"
        );
    }

    #[test]
    fn test_run_csv_second_run_is_unchanged() {
        let dir = repo();
        let input = dir.path().join("items.csv");
        let output = dir.path().join("items.out.csv");
        fs::write(&input, "id,image\n1,img/rb.png\n2,img/green.png\n").unwrap();

        let p = pipeline(dir.path());
        let source = CsvSource::Path(input);
        let first = p.run_csv(&source, &output, &SilentProgress).unwrap();
        let written = fs::read_to_string(&output).unwrap();
        let second = p.run_csv(&source, &output, &SilentProgress).unwrap();

        assert_eq!(first.analyzed, 2);
        assert_eq!(second.analyzed, 0);
        assert_eq!(second.reused, 2);
        assert!(!second.output_changed());
        assert_eq!(fs::read_to_string(&output).unwrap(), written);
    }

    #[test]
    fn test_run_csv_unresolvable_row_untouched() {
        let dir = repo();
        let input = dir.path().join("items.csv");
        let output = dir.path().join("out.csv");
        fs::write(&input, format!("{}\n1,img/missing.png,,,,\n", HEADER)).unwrap();

        let summary = pipeline(dir.path())
            .run_csv(&CsvSource::Path(input), &output, &SilentProgress)
            .unwrap();

        assert_eq!(summary.unresolved, 1);
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            format!("{}\n1,img/missing.png,,,,\n", HEADER)
        );
    }

    #[test]
    fn test_run_csv_renames_reference_column() {
        let dir = repo();
        let input = dir.path().join("items.csv");
        let output = dir.path().join("out.csv");
        fs::write(&input, "id,Image\n1,img/green.png\n").unwrap();

        pipeline(dir.path())
            .run_csv(&CsvSource::Path(input), &output, &SilentProgress)
            .unwrap();

        let text = fs::read_to_string(&output).unwrap();
        assert!(text.starts_with("id,image,dominantHue,secondaryHue,weight,saturation\n"));
        assert!(text.contains("1,img/green.png,120,120,1,1\n"));
    }

    #[test]
    fn test_run_csv_keeps_unrelated_weight_column() {
        let dir = repo();
        let input = dir.path().join("items.csv");
        let output = dir.path().join("out.csv");
        fs::write(&input, "id,image,Weight\n1,img/green.png,2kg\n").unwrap();

        pipeline(dir.path())
            .run_csv(&CsvSource::Path(input), &output, &SilentProgress)
            .unwrap();

        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "id,image,Weight,dominantHue,secondaryHue,weight,saturation\n1,img/green.png,2kg,120,120,1,1\n"
        );
    }

    #[test]
    fn test_run_csv_malformed_index_ignored() {
        let dir = repo();
        let input = dir.path().join("items.csv");
        let output = dir.path().join("out.csv");
        fs::write(&input, "id,image\n1,img/green.png\n").unwrap();
        fs::write(&output, "").unwrap();

        let summary = pipeline(dir.path())
            .run_csv(&CsvSource::Path(input), &output, &SilentProgress)
            .unwrap();

        assert_eq!(summary.analyzed, 1);
        assert!(summary.output_changed());
    }

    #[test]
    fn test_run_csv_missing_header_writes_nothing() {
        let dir = repo();
        let input = dir.path().join("items.csv");
        let output = dir.path().join("out.csv");
        fs::write(&input, "").unwrap();

        let summary = pipeline(dir.path())
            .run_csv(&CsvSource::Path(input), &output, &SilentProgress)
            .unwrap();

        assert_eq!(summary.skipped, 1);
        assert!(!output.exists());
    }

    #[test]
    fn test_run_csv_missing_source_is_fatal() {
        let dir = repo();
        let result = pipeline(dir.path()).run_csv(
            &CsvSource::Path(dir.path().join("nope.csv")),
            &dir.path().join("out.csv"),
            &SilentProgress,
        );
        assert!(matches!(result, Err(PipelineError::CsvSource(_))));
    }

    // ============ Markdown Tests ============

    #[test]
    fn test_run_markdown_updates_documents() {
        let dir = repo();
        let content = dir.path().join("content");
        fs::create_dir_all(&content).unwrap();
        fs::write(
            content.join("b.md"),
            "---\ntitle: B\n# hero\nimage: \"/img/rb.png\"\n---\nBody B\n",
        )
        .unwrap();
        fs::write(content.join("a.md"), "No front matter\n").unwrap();
        fs::write(content.join("c.md"), "---\ntitle: C\n---\nBody C\n").unwrap();

        let summary = pipeline(dir.path())
            .run_markdown(DEFAULT_CONTENT_GLOB, &SilentProgress)
            .unwrap();

        assert_eq!(summary.records, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.analyzed, 1);
        assert_eq!(summary.updated_paths, vec![content.join("b.md")]);
        assert_eq!(
            fs::read_to_string(content.join("b.md")).unwrap(),
            "---\ntitle: B\n# hero\nimage: \"/img/rb.png\"\ndominantHue: 0\nsecondaryHue: 240\nweight: 0.75\nsaturation: 1\n---\nBody B\n"
        );
        assert_eq!(fs::read_to_string(content.join("a.md")).unwrap(), "No front matter\n");
        assert_eq!(
            fs::read_to_string(content.join("c.md")).unwrap(),
            "---\ntitle: C\n---\nBody C\n"
        );
    }

    #[test]
    fn test_run_markdown_reuses_signature_from_other_document() {
        let dir = repo();
        let content = dir.path().join("content");
        fs::create_dir_all(&content).unwrap();
        fs::write(
            content.join("a.md"),
            "---\nimage: img/green.png\ndominantHue: 1\nsecondaryHue: 2\nweight: 0.3\nsaturation: 0.4\n---\n",
        )
        .unwrap();
        fs::write(content.join("b.md"), "---\nimage: img/green.png\n---\n").unwrap();

        let p = pipeline(dir.path());
        let summary = p.run_markdown("content/*.md", &SilentProgress).unwrap();

        assert_eq!(summary.analyzed, 0);
        assert_eq!(summary.reused, 1);
        assert!(fs::read_to_string(content.join("b.md"))
            .unwrap()
            .contains("dominantHue: 1\nsecondaryHue: 2\nweight: 0.3\nsaturation: 0.4\n"));

        let again = p.run_markdown("content/*.md", &SilentProgress).unwrap();
        assert!(!again.output_changed());
    }

    #[test]
    fn test_run_markdown_skips_unreadable_document() {
        let dir = repo();
        let content = dir.path().join("content");
        fs::create_dir_all(&content).unwrap();
        fs::write(content.join("a.md"), [0xff, 0xfe, 0x00]).unwrap();
        fs::write(content.join("b.md"), "---\nimage: img/green.png\n---\n").unwrap();

        let summary = pipeline(dir.path())
            .run_markdown("content/*.md", &SilentProgress)
            .unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.records, 1);
        assert_eq!(summary.updated_paths, vec![content.join("b.md")]);
        assert_eq!(fs::read(content.join("a.md")).unwrap(), vec![0xff, 0xfe, 0x00]);
    }

    #[test]
    fn test_run_markdown_renames_reference_key() {
        let dir = repo();
        let content = dir.path().join("content");
        fs::create_dir_all(&content).unwrap();
        fs::write(content.join("a.md"), "---\nImage: img/green.png\n---\n").unwrap();
        fs::write(
            content.join("b.md"),
            "---\nIMAGE: img/rb.png\ndominantHue: 1\nsecondaryHue: 2\nweight: 0.3\nsaturation: 0.4\n---\n",
        )
        .unwrap();

        let summary = pipeline(dir.path())
            .run_markdown("content/*.md", &SilentProgress)
            .unwrap();

        assert_eq!(summary.updated_paths.len(), 2);
        assert_eq!(
            fs::read_to_string(content.join("a.md")).unwrap(),
            "---\nimage: img/green.png\ndominantHue: 120\nsecondaryHue: 120\nweight: 1\nsaturation: 1\n---\n"
        );
        assert_eq!(
            fs::read_to_string(content.join("b.md")).unwrap(),
            "---\nimage: img/rb.png\ndominantHue: 1\nsecondaryHue: 2\nweight: 0.3\nsaturation: 0.4\n---\n"
        );
    }

    #[test]
    fn test_run_markdown_invalid_glob() {
        let dir = repo();
        let result = pipeline(dir.path()).run_markdown("content/[.md", &SilentProgress);
        assert!(matches!(result, Err(PipelineError::InvalidGlob(_))));
    }

    #[test]
    fn test_collect_documents_sorted() {
        let dir = repo();
        let content = dir.path().join("content");
        fs::create_dir_all(&content).unwrap();
        for name in ["z.md", "a.md", "m.md"] {
            fs::write(content.join(name), "x").unwrap();
        }

        let paths = pipeline(dir.path()).collect_documents("content/*.md").unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.md", "m.md", "z.md"]);
    }

    #[test]
    fn test_analyze_reference() {
        let dir = repo();
        let p = pipeline(dir.path());

        let sig = p.analyze_reference("/img/rb.png").unwrap();
        assert_eq!(sig, ColorSignature::new(0, 240, 0.75, 1.0));

        let err = p.analyze_reference("/img/none.png").unwrap_err();
        assert!(matches!(err, PipelineError::Source(SourceError::NotFound(_))));
    }
}
