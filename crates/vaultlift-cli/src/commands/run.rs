//! Run Command - migrate images of one note or a folder of notes
//!
//! Builds the image index once, then runs every discovered note through
//! the document pipeline with at most `document_workers` notes in flight.
//! A note that fails is reported and counted; the others carry on.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::cli::RunArgs;
use crate::{output, storage};
use vaultlift_config::MigrationConfig;
use vaultlift_core::{CoordinatorConfig, ImageIndex};
use vaultlift_pipeline::{DocumentJob, DocumentPipeline, DocumentReport, PipelineConfig};

/// Totals over a whole run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub documents: usize,
    pub converted: usize,
    pub failed_documents: Vec<(PathBuf, String)>,
    pub images_attempted: usize,
    pub images_migrated: usize,
    pub images_failed: usize,
}

impl RunSummary {
    fn record(&mut self, report: &DocumentReport) {
        self.converted += 1;
        self.images_attempted += report.attempted;
        self.images_migrated += report.migrated;
        self.images_failed += report.failures.len();
    }

    /// Whether any document failed as a whole
    pub fn has_failures(&self) -> bool {
        !self.failed_documents.is_empty()
    }
}

/// Document tasks keyed back to the note each one works on
struct DocumentTasks<T> {
    tasks: JoinSet<Result<T>>,
    sources: HashMap<Id, PathBuf>,
}

impl<T: Send + 'static> DocumentTasks<T> {
    fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
            sources: HashMap::new(),
        }
    }

    fn spawn<F>(&mut self, source: PathBuf, work: F)
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let handle = self.tasks.spawn(work);
        self.sources.insert(handle.id(), source);
    }

    /// Next finished document; a panicked or cancelled task becomes an error for its note
    async fn join_next(&mut self) -> Option<(PathBuf, Result<T>)> {
        let joined = self.tasks.join_next_with_id().await?;
        Some(match joined {
            Ok((id, result)) => (self.source(id), result),
            Err(e) => (
                self.source(e.id()),
                Err(anyhow::Error::new(e).context("Document task failed")),
            ),
        })
    }

    fn source(&mut self, id: Id) -> PathBuf {
        self.sources
            .remove(&id)
            .unwrap_or_else(|| PathBuf::from("<unknown>"))
    }
}

/// Execute the run command
pub async fn execute(config: MigrationConfig, args: RunArgs) -> Result<RunSummary> {
    let target = args.path.as_path();
    if !target.exists() {
        bail!("Path not found: {}", target.display());
    }
    let target = std::fs::canonicalize(target)
        .with_context(|| format!("Failed to resolve path: {}", target.display()))?;

    info!("Image root: {}", config.image_root.display());
    let index = Arc::new(ImageIndex::build(&config.image_root).with_context(|| {
        format!(
            "Failed to index images under {}",
            config.image_root.display()
        )
    })?);

    let writes_output = !config.overwrite && !args.dry_run;
    if writes_output {
        std::fs::create_dir_all(&config.output_dir).with_context(|| {
            format!(
                "Failed to create output folder: {}",
                config.output_dir.display()
            )
        })?;
    }
    let output_dir = absolute(&config.output_dir);

    let (run_root, files) = if target.is_dir() {
        let files = discover_markdown_files(&target, Some(&output_dir));
        (target.clone(), files)
    } else {
        let root = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        (root, vec![target.clone()])
    };

    if files.is_empty() {
        bail!("No markdown files in {}", target.display());
    }
    info!("Found {} markdown files", files.len());

    let uploader = storage::create_uploader(&config)?;
    let pipeline = Arc::new(DocumentPipeline::with_config(
        index,
        uploader,
        PipelineConfig {
            coordinator: CoordinatorConfig {
                concurrency_limit: config.concurrency_limit,
                timeout: config.upload_timeout(),
            },
            overwrite: config.overwrite,
            dry_run: args.dry_run,
        },
    ));

    if args.dry_run {
        println!("{}", "Dry run - nothing will be uploaded or written".yellow().bold());
    }

    let pb = ProgressBar::new(files.len() as u64);
    if args.no_progress {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut summary = RunSummary {
        documents: files.len(),
        ..Default::default()
    };

    let semaphore = Arc::new(Semaphore::new(config.document_workers.max(1)));
    let mut tasks = DocumentTasks::new();

    for file in files {
        let job = DocumentJob::new(&run_root, &file, &output_dir);
        let pipeline = Arc::clone(&pipeline);
        let semaphore = Arc::clone(&semaphore);

        tasks.spawn(job.source.clone(), async move {
            match semaphore.acquire_owned().await {
                Ok(_permit) => pipeline.process(&job).await,
                Err(e) => Err(anyhow::Error::new(e).context("Document scheduler closed")),
            }
        });
    }

    while let Some((source, result)) = tasks.join_next().await {
        let name = display_name(&source);

        match result {
            Ok(report) => {
                pb.suspend(|| {
                    println!(
                        "{}",
                        output::finished_line(&name, report.migrated, report.attempted)
                    );
                    for failure in &report.failures {
                        println!(
                            "    {} line {}: {} ({})",
                            "skipped".yellow(),
                            failure.line,
                            failure.name,
                            failure.error
                        );
                    }
                });
                summary.record(&report);
            }
            Err(err) => {
                warn!("Failed to process {}: {:#}", source.display(), err);
                pb.suspend(|| println!("{}", output::failed_line(&name, &err)));
                summary.failed_documents.push((source, format!("{err:#}")));
            }
        }

        pb.inc(1);
        pb.set_message(name);
    }

    pb.finish_and_clear();
    print_summary(&summary, args.dry_run);

    Ok(summary)
}

fn print_summary(summary: &RunSummary, dry_run: bool) {
    println!();
    println!("Total converts: {}", summary.converted);
    if dry_run {
        println!("Images that would be uploaded: {}", summary.images_attempted);
        return;
    }
    println!(
        "Images migrated: {}/{}",
        summary.images_migrated, summary.images_attempted
    );
    if summary.images_failed > 0 {
        output::warning(&format!(
            "{} images could not be uploaded; their lines were left unchanged",
            summary.images_failed
        ));
    }
    if summary.has_failures() {
        output::error(&format!(
            "{} of {} documents failed",
            summary.failed_documents.len(),
            summary.documents
        ));
    } else {
        output::success("vaultlift finished successfully");
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Best-effort absolute form of a path that may not exist yet
fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    })
}

/// Find markdown files below `root`, skipping tool folders and `exclude`
pub fn discover_markdown_files(root: &Path, exclude: Option<&Path>) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e.path()) && Some(e.path()) != exclude)
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!("Skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|e| e.file_type().is_file() && is_markdown_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Check if a directory should be excluded from file discovery
fn is_excluded_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| matches!(name, ".git" | ".obsidian" | ".trash" | "node_modules"))
        .unwrap_or(false)
}

/// Check if a path is a markdown file
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}
