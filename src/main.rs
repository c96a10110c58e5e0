//! hue-index - incremental color signatures for image references
//!
//! CLI entry point

use clap::Parser;
use hue_index::{
    logging,
    // CLI
    AnalyzeArgs, Cli, Commands, ExitCode, UpdateArgs,
    // Config
    Config, ConfigError,
    // Pipeline
    CsvSource, IndexPipeline, PipelineConfig, PipelineError, ProgressCallback, RunSummary,
    SourceError,
};
use indicatif::ProgressBar;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose, cli.quiet) {
        eprintln!("Warning: {}", e);
    }

    let result = match &cli.command {
        Commands::Update(args) => run_update(&cli, args),
        Commands::Analyze(args) => run_analyze(&cli, args),
        Commands::Info => run_info(&cli),
    };

    match result {
        Ok(()) => ExitCode::Success.into(),
        Err(e) => {
            eprintln!("Error: {}", e);
            exit_code_for(e.as_ref()).into()
        }
    }
}

/// Map a command failure to its exit code category
fn exit_code_for(err: &(dyn Error + 'static)) -> ExitCode {
    if let Some(err) = err.downcast_ref::<PipelineError>() {
        return match err {
            PipelineError::InvalidConfig(_) | PipelineError::InvalidGlob(_) => {
                ExitCode::InvalidArgs
            }
            PipelineError::CsvSource(_)
            | PipelineError::Source(SourceError::NotFound(_)) => ExitCode::InputNotFound,
            PipelineError::Write { .. } => ExitCode::OutputError,
            _ => ExitCode::GeneralError,
        };
    }
    if let Some(err) = err.downcast_ref::<ConfigError>() {
        return match err {
            ConfigError::NotFound(_) => ExitCode::InputNotFound,
            _ => ExitCode::InvalidArgs,
        };
    }
    ExitCode::GeneralError
}

// ============ Progress Callback Implementation ============

/// Progress bar on stderr; hidden with `--quiet` or when stderr is not a terminal
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            hue_index::create_progress_bar(0)
        };
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for BarProgress {
    fn on_step_start(&self, step: &str) {
        self.bar.set_message(step.to_string());
    }

    fn on_step_progress(&self, current: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(current as u64);
    }

    fn on_step_complete(&self, step: &str, message: &str) {
        tracing::info!("{}: {}", step, message);
    }

    fn on_debug(&self, message: &str) {
        tracing::debug!("{}", message);
    }
}

// ============ Update Command ============

fn load_pipeline_config(
    cli: &Cli,
    overrides: &hue_index::CliOverrides,
) -> Result<PipelineConfig, Box<dyn Error>> {
    let file_config = Config::load_with(cli.config.as_deref())?;
    Ok(file_config.merge_with_cli(overrides))
}

fn run_update(cli: &Cli, args: &UpdateArgs) -> Result<(), Box<dyn Error>> {
    let config = load_pipeline_config(cli, &args.overrides())?;
    let pipeline = IndexPipeline::new(config)?;

    match &args.csv {
        Some(location) => {
            let source = CsvSource::parse(location, &pipeline.config().repo_root);
            let output = csv_output_path(&pipeline, &source, args.output.as_deref())?;

            if args.dry_run {
                print_csv_plan(&pipeline, &source, &output);
                return Ok(());
            }

            let progress = BarProgress::new(cli.quiet);
            let summary = pipeline.run_csv(&source, &output, &progress);
            progress.finish();
            print_csv_summary(&summary?, &output);
        }
        None => {
            let pattern = args.effective_glob();

            if args.dry_run {
                print_markdown_plan(&pipeline, pattern)?;
                return Ok(());
            }

            let progress = BarProgress::new(cli.quiet);
            let summary = pipeline.run_markdown(pattern, &progress);
            progress.finish();
            print_markdown_summary(&summary?, pattern, &pipeline.config().repo_root);
        }
    }

    Ok(())
}

/// Explicit output, or the CSV source itself when it is a local file
fn csv_output_path(
    pipeline: &IndexPipeline,
    source: &CsvSource,
    output: Option<&Path>,
) -> Result<PathBuf, PipelineError> {
    match (output, source.local_path()) {
        (Some(output), _) => Ok(pipeline.resolve_path(output)),
        (None, Some(path)) => Ok(path.to_path_buf()),
        (None, None) => Err(PipelineError::InvalidConfig(
            "--output is required when --csv is a URL".to_string(),
        )),
    }
}

fn print_csv_summary(summary: &RunSummary, output: &Path) {
    if summary.skipped > 0 {
        println!("Skipped malformed CSV (no header row)");
    }
    println!("Records: {}", summary.records);
    println!("Freshly analyzed: {}", summary.analyzed);
    println!("Reused from index: {}", summary.reused);
    if summary.unresolved > 0 {
        println!("Unresolved references: {}", summary.unresolved);
    }
    println!("Output: {} ({})", output.display(), output_state(summary));
    println!("Elapsed: {}", elapsed(summary));
}

fn print_markdown_summary(summary: &RunSummary, pattern: &str, repo_root: &Path) {
    for path in &summary.updated_paths {
        println!(
            "Updated color index: {}",
            hue_index::util::relative_to(path, repo_root).display()
        );
    }
    println!("Records: {}", summary.records);
    println!("Freshly analyzed: {}", summary.analyzed);
    if summary.unresolved > 0 {
        println!("Unresolved references: {}", summary.unresolved);
    }
    println!("Output: {} ({})", pattern, output_state(summary));
    println!(
        "Done. Files updated: {} ({})",
        summary.updated_paths.len(),
        elapsed(summary)
    );
}

fn output_state(summary: &RunSummary) -> &'static str {
    if summary.output_changed() {
        "updated"
    } else {
        "unchanged"
    }
}

fn elapsed(summary: &RunSummary) -> String {
    hue_index::format_duration(Duration::from_secs_f64(summary.elapsed_seconds))
}

fn print_csv_plan(pipeline: &IndexPipeline, source: &CsvSource, output: &Path) {
    println!("=== Dry Run - Execution Plan ===");
    println!();
    println!("Mode: CSV");
    println!("Source: {}", source);
    println!("Output: {}", output.display());
    println!(
        "Index: {}",
        if output.exists() {
            "previous output"
        } else {
            "empty (no previous output)"
        }
    );
    println!();
    print_config(pipeline.config());
}

fn print_markdown_plan(pipeline: &IndexPipeline, pattern: &str) -> Result<(), Box<dyn Error>> {
    let documents = pipeline.collect_documents(pattern)?;
    let root = &pipeline.config().repo_root;

    println!("=== Dry Run - Execution Plan ===");
    println!();
    println!("Mode: Markdown");
    println!("Content glob: {}", pattern);
    println!("Documents: {}", documents.len());
    println!();
    print_config(pipeline.config());
    println!();
    println!("Files:");
    for (i, doc) in documents.iter().enumerate() {
        println!(
            "  {}. {}",
            i + 1,
            hue_index::util::relative_to(doc, root).display()
        );
    }
    Ok(())
}

fn print_config(config: &PipelineConfig) {
    println!("Pipeline Configuration:");
    println!("{}", config.to_json());
}

// ============ Analyze Command ============

fn run_analyze(cli: &Cli, args: &AnalyzeArgs) -> Result<(), Box<dyn Error>> {
    let config = load_pipeline_config(cli, &args.source.overrides())?;
    let pipeline = IndexPipeline::new(config)?;

    let signature = pipeline.analyze_reference(&args.reference)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&signature)?);
    } else {
        for (key, value) in signature.to_fields() {
            println!("{}: {}", key, value);
        }
    }
    Ok(())
}

// ============ Info Command ============

fn run_info(cli: &Cli) -> Result<(), Box<dyn Error>> {
    println!("hue-index v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("System Information:");
    println!("  Platform: {}", std::env::consts::OS);
    println!("  Arch: {}", std::env::consts::ARCH);

    let config = match Config::load_with(cli.config.as_deref()) {
        Ok(config) => config.to_pipeline_config(),
        Err(e) => {
            println!("  Config: failed to load ({})", e);
            PipelineConfig::default()
        }
    };

    println!();
    println!("Video Tools:");
    check_tool_with_version(&config.ffmpeg, "FFmpeg", &["-version"]);

    println!();
    println!("Sources:");
    println!("  Image extensions: {}", config.image_extensions.join(", "));
    println!("  Video extensions: {}", config.video_extensions.join(", "));
    println!("  Sample size: {}", config.sample_size);
    println!("  Reference key: {}", config.index_column);

    println!();
    println!("Config File Locations:");
    if let Some(explicit) = &cli.config {
        println!("  Explicit: {}", explicit.display());
    }
    for path in Config::search_paths() {
        let marker = if path.exists() { " (found)" } else { "" };
        println!("  {}{}", path.display(), marker);
    }

    Ok(())
}

fn check_tool_with_version(cmd: &Path, name: &str, version_args: &[&str]) {
    match which::which(cmd) {
        Ok(path) => {
            if let Ok(output) = std::process::Command::new(&path).args(version_args).output() {
                let version_str = String::from_utf8_lossy(&output.stdout);
                let first_line = version_str.lines().next().unwrap_or("");
                if !first_line.is_empty() && first_line.len() < 80 {
                    println!("  {}: {} ({})", name, first_line.trim(), path.display());
                } else {
                    println!("  {}: {} (found)", name, path.display());
                }
            } else {
                println!("  {}: {} (found)", name, path.display());
            }
        }
        Err(_) => println!("  {}: Not found (video references will be skipped)", name),
    }
}
