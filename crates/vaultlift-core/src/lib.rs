//! Vaultlift Core
//!
//! The migration engine: index local images, resolve extracted references
//! against the index, upload them with bounded concurrency, and rewrite
//! documents to point at the remote copies.
//!
//! Storage backends plug in through the [`Uploader`] trait; this crate
//! never talks to a network itself.

pub mod error;
pub mod index;
pub mod resolver;
pub mod rewrite;
pub mod upload;

pub mod test_support;

pub use error::{IndexError, IndexResult, RewriteError, RewriteResult, UploadError};
pub use index::ImageIndex;
pub use resolver::{resolve, ResolvedReference};
pub use rewrite::{
    format_remote_line, plan_line_replacements, rewrite, rewrite_document, RewriteSummary,
    RewriteTarget,
};
pub use upload::{
    CoordinatorConfig, DocumentId, RemoteLocation, StorageKey, UploadCoordinator, UploadOutcome,
    UploadResult, Uploader,
};

// Re-export the parser so callers need a single dependency
pub use vaultlift_parser as parser;
