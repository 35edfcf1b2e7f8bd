//! Vaultlift Pipeline
//!
//! Per-document orchestration of an image migration.
//!
//! This crate provides the [`DocumentPipeline`] which coordinates:
//! 1. **Extract**: find image references line by line (vaultlift-parser)
//! 2. **Resolve**: keep references to indexed local images
//! 3. **Upload**: push them through the injected `Uploader`, bounded and with a deadline
//! 4. **Rewrite**: point migrated lines at their remote copies
//!
//! The pipeline only coordinates. Extraction, indexing, transport and file
//! rewriting live in the crates it is handed.

pub mod document_pipeline;

pub use document_pipeline::{
    DocumentJob, DocumentPipeline, DocumentReport, FailedUpload, PipelineConfig,
};
