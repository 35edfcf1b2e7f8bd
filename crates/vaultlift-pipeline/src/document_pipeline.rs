//! Document Pipeline Orchestrator
//!
//! ## Pipeline Architecture
//!
//! ```text
//! DocumentPipeline (orchestration)
//!   ├─> ReferenceExtractor (Phase 1: image references per line)
//!   ├─> ImageIndex         (Phase 2: name → local path)
//!   ├─> UploadCoordinator  (Phase 3: bounded uploads, one deadline)
//!   └─> rewrite_document   (Phase 4: temp file, then rename)
//! ```
//!
//! A document either completes all four phases or fails as a whole with
//! the document path attached. Individual upload failures are not document
//! failures; they show up in [`DocumentReport::failures`] and leave their
//! lines untouched.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use vaultlift_core::{
    resolve, rewrite_document, CoordinatorConfig, DocumentId, ImageIndex, RewriteSummary,
    RewriteTarget, UploadCoordinator, UploadOutcome, Uploader,
};
use vaultlift_parser::ReferenceExtractor;

/// Configuration for pipeline behavior
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Upload concurrency and deadline
    pub coordinator: CoordinatorConfig,
    /// Replace source documents instead of writing to the output directory
    pub overwrite: bool,
    /// Extract and resolve only; no uploads, no writes
    pub dry_run: bool,
}

/// One document to migrate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentJob {
    /// Markdown file to read
    pub source: PathBuf,
    /// Identity used for storage keys
    pub document_id: DocumentId,
    /// Where the rewritten copy goes when not overwriting
    pub output_path: PathBuf,
}

impl DocumentJob {
    /// Job for `source` discovered under `run_root`
    ///
    /// The output path mirrors the source's position below `run_root`
    /// inside `output_dir`. For a single-file run pass the file's parent
    /// directory as `run_root`; the document id is then the file stem.
    pub fn new(run_root: &Path, source: &Path, output_dir: &Path) -> Self {
        let relative = source
            .strip_prefix(run_root)
            .ok()
            .filter(|r| !r.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .or_else(|| source.file_name().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("document.md"));

        Self {
            source: source.to_path_buf(),
            document_id: DocumentId::from_relative_path(run_root, source),
            output_path: output_dir.join(relative),
        }
    }
}

/// An upload that did not make it, kept for the run summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedUpload {
    pub name: String,
    /// One-based, as shown to users
    pub line: usize,
    pub error: String,
    pub timed_out: bool,
}

/// What happened to one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub source: PathBuf,
    pub document_id: String,
    /// References found by extraction, external ones included
    pub extracted: usize,
    /// External references passed through untouched
    pub external: usize,
    /// Local references whose image is not in the index
    pub unresolved: usize,
    /// Uploads attempted (or, in a dry run, that would be attempted)
    pub attempted: usize,
    /// Uploads that succeeded
    pub migrated: usize,
    pub failures: Vec<FailedUpload>,
    /// Absent in dry runs
    pub rewrite: Option<RewriteSummary>,
    pub dry_run: bool,
}

impl DocumentReport {
    /// Short file name for progress lines
    pub fn display_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }

    /// Lines rewritten in the output
    pub fn lines_rewritten(&self) -> usize {
        self.rewrite.as_ref().map_or(0, |r| r.lines_rewritten)
    }
}

/// The per-document orchestrator
///
/// Cheap to share: all state is behind `Arc`s and the image index is
/// read-only, so one pipeline serves every document of a run concurrently.
pub struct DocumentPipeline {
    extractor: ReferenceExtractor,
    index: Arc<ImageIndex>,
    coordinator: UploadCoordinator,
    config: PipelineConfig,
}

impl DocumentPipeline {
    /// Create a pipeline with default configuration
    pub fn new(index: Arc<ImageIndex>, uploader: Arc<dyn Uploader>) -> Self {
        Self::with_config(index, uploader, PipelineConfig::default())
    }

    /// Create a pipeline with custom configuration
    pub fn with_config(
        index: Arc<ImageIndex>,
        uploader: Arc<dyn Uploader>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            extractor: ReferenceExtractor::new(),
            coordinator: UploadCoordinator::new(uploader, config.coordinator),
            index,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run all phases for one document
    ///
    /// # Errors
    ///
    /// Fails when the document cannot be read or its output cannot be
    /// written. Upload failures are reported, not returned.
    pub async fn process(&self, job: &DocumentJob) -> Result<DocumentReport> {
        // Phase 1: Extract
        let references = self
            .extractor
            .extract_file(&job.source)
            .with_context(|| format!("Failed to read document: {}", job.source.display()))?;
        let external = references.iter().filter(|r| r.external).count();
        debug!(
            "Extracted {} image references ({} external) from {}",
            references.len(),
            external,
            job.source.display()
        );

        // Phase 2: Resolve
        let resolved = resolve(&references, &self.index);
        let unresolved = references.len() - external - resolved.len();

        let mut report = DocumentReport {
            source: job.source.clone(),
            document_id: job.document_id.to_string(),
            extracted: references.len(),
            external,
            unresolved,
            attempted: resolved.len(),
            migrated: 0,
            failures: Vec::new(),
            rewrite: None,
            dry_run: self.config.dry_run,
        };

        if self.config.dry_run {
            for reference in &resolved {
                info!(
                    "[dry run] {}:{} would upload {}",
                    job.source.display(),
                    reference.line_number() + 1,
                    reference.local_path.display()
                );
            }
            return Ok(report);
        }

        // Phase 3: Upload
        let results = self
            .coordinator
            .upload_all(&job.document_id, resolved)
            .await;

        for result in &results {
            match &result.outcome {
                UploadOutcome::Uploaded(_) => report.migrated += 1,
                UploadOutcome::Failed(err) => report.failures.push(FailedUpload {
                    name: result.reference.name().to_string(),
                    line: result.reference.line_number() + 1,
                    error: err.to_string(),
                    timed_out: err.is_timeout(),
                }),
            }
        }

        // Phase 4: Rewrite
        let target = RewriteTarget::from_flag(&job.output_path, self.config.overwrite);
        let summary = rewrite_document(&job.source, &target, &results)
            .with_context(|| format!("Failed to rewrite document: {}", job.source.display()))?;
        report.rewrite = Some(summary);

        info!(
            "Finished {} ({}/{} images migrated)",
            job.source.display(),
            report.migrated,
            report.attempted
        );

        Ok(report)
    }
}
