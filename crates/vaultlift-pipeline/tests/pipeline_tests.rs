//! DocumentPipeline integration tests

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use vaultlift_core::test_support::mocks::MockUploader;
use vaultlift_core::{ImageIndex, UploadError};
use vaultlift_pipeline::{DocumentJob, DocumentPipeline, PipelineConfig};

struct Vault {
    _temp: TempDir,
    root: std::path::PathBuf,
}

impl Vault {
    fn new(images: &[&str]) -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        std::fs::create_dir_all(root.join("images")).unwrap();
        for name in images {
            let path = root.join("images").join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, b"img").unwrap();
        }
        Self { _temp: temp, root }
    }

    fn note(&self, relative: &str, content: &str) -> std::path::PathBuf {
        let path = self.root.join("notes").join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    fn index(&self) -> Arc<ImageIndex> {
        Arc::new(ImageIndex::build(self.root.join("images")).unwrap())
    }

    fn job(&self, source: &Path) -> DocumentJob {
        DocumentJob::new(&self.root.join("notes"), source, &self.root.join("out"))
    }
}

#[tokio::test]
async fn test_process_reports_counts() {
    let vault = Vault::new(&["a.png", "b.png"]);
    let doc = vault.note(
        "trip/day1.md",
        "![[a.png]]\n![[b.png|beach]]\n![[c.png]]\n![x](https://example.com/d.png)\n",
    );
    let uploader = Arc::new(MockUploader::new().with_failure("b.png", UploadError::transport("reset")));

    let pipeline = DocumentPipeline::new(vault.index(), uploader.clone());
    let report = pipeline.process(&vault.job(&doc)).await.unwrap();

    assert_eq!(report.document_id, "trip/day1");
    assert_eq!(report.extracted, 4);
    assert_eq!(report.external, 1);
    assert_eq!(report.unresolved, 1);
    assert_eq!(report.attempted, 2);
    assert_eq!(report.migrated, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].name, "b.png");
    assert_eq!(report.failures[0].line, 2);
    assert!(!report.failures[0].timed_out);
    assert_eq!(report.lines_rewritten(), 1);
    assert_eq!(report.display_name(), "day1.md");

    let written = std::fs::read_to_string(vault.root.join("out/trip/day1.md")).unwrap();
    assert!(written.starts_with("![](https://cdn.example/trip/day1/a.png)\n![[b.png|beach]]\n"));
    assert_eq!(uploader.attempts("trip/day1/a.png"), 1);
}

#[tokio::test]
async fn test_dry_run_touches_nothing() {
    let vault = Vault::new(&["a.png"]);
    let doc = vault.note("doc.md", "![[a.png]]\n");
    let uploader = Arc::new(MockUploader::new());

    let pipeline = DocumentPipeline::with_config(
        vault.index(),
        uploader.clone(),
        PipelineConfig {
            dry_run: true,
            ..Default::default()
        },
    );
    let report = pipeline.process(&vault.job(&doc)).await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.attempted, 1);
    assert_eq!(report.migrated, 0);
    assert!(report.rewrite.is_none());
    assert_eq!(uploader.total_attempts(), 0);
    assert!(!vault.root.join("out").exists());
}

#[tokio::test]
async fn test_overwrite_mode() {
    let vault = Vault::new(&["a.png"]);
    let doc = vault.note("doc.md", "# t\n![[a.png]]\n");

    let pipeline = DocumentPipeline::with_config(
        vault.index(),
        Arc::new(MockUploader::new()),
        PipelineConfig {
            overwrite: true,
            ..Default::default()
        },
    );
    pipeline.process(&vault.job(&doc)).await.unwrap();

    assert_eq!(
        std::fs::read_to_string(&doc).unwrap(),
        "# t\n![](https://cdn.example/doc/a.png)\n"
    );
    assert!(!vault.root.join("out").exists());
}

#[tokio::test]
async fn test_missing_document_is_an_error_with_path() {
    let vault = Vault::new(&[]);
    let missing = vault.root.join("notes/missing.md");

    let pipeline = DocumentPipeline::new(vault.index(), Arc::new(MockUploader::new()));
    let err = pipeline.process(&vault.job(&missing)).await.unwrap_err();

    assert!(err.to_string().contains("missing.md"));
}

#[tokio::test]
async fn test_report_serializes() {
    let vault = Vault::new(&["a.png"]);
    let doc = vault.note("doc.md", "![[a.png]]\n");

    let pipeline = DocumentPipeline::new(vault.index(), Arc::new(MockUploader::new()));
    let report = pipeline.process(&vault.job(&doc)).await.unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["migrated"], 1);
    assert_eq!(json["rewrite"]["lines_rewritten"], 1);
}
