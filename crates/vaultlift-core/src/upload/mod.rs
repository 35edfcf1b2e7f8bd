//! Upload capability and naming
//!
//! The [`Uploader`] trait is the only seam to remote storage. Everything a
//! store needs to know about an image is its local path and the
//! [`StorageKey`] it should live under; the store answers with a
//! [`RemoteLocation`] or an [`UploadError`].
//!
//! ## Key derivation
//!
//! Keys are `{document_id}/{image name}`. The same document and image always
//! map to the same key, so re-running a migration overwrites objects instead
//! of duplicating them.

pub mod coordinator;

pub use coordinator::{
    CoordinatorConfig, UploadCoordinator, UploadOutcome, UploadResult, DEFAULT_CONCURRENCY_LIMIT,
    DEFAULT_UPLOAD_TIMEOUT,
};

use crate::error::UploadError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};

/// Remote storage capability
///
/// Implementations must be safe to call concurrently; the coordinator keeps
/// up to its concurrency limit of calls in flight at once.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &'static str;

    /// Store the file at `local_path` under `key`
    ///
    /// Returns the location the file can be fetched from afterwards.
    async fn upload(&self, local_path: &Path, key: &StorageKey)
        -> Result<RemoteLocation, UploadError>;
}

/// Stable identity of a document within a run
///
/// Built from the document's path relative to the run root, without its
/// extension and with `/` separators, e.g. `journal/2024-01-05`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    /// Create an identifier from an already-normalized string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identify a document by its file stem alone
    pub fn from_stem(document: &Path) -> Self {
        let stem = document
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        Self(stem)
    }

    /// Identify a document by its path relative to `root`
    ///
    /// Falls back to [`DocumentId::from_stem`] when `document` is not under
    /// `root`.
    pub fn from_relative_path(root: &Path, document: &Path) -> Self {
        let Ok(relative) = document.strip_prefix(root) else {
            return Self::from_stem(document);
        };

        let mut segments: Vec<String> = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        match segments.pop() {
            Some(_) => {
                segments.push(Self::from_stem(relative).0);
                Self(segments.join("/"))
            }
            None => Self::from_stem(document),
        }
    }

    /// The identifier as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Object key an image is stored under
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageKey(String);

impl StorageKey {
    /// Derive the key for `name` referenced from `document`
    pub fn new(document: &DocumentId, name: &str) -> Self {
        Self(format!("{}/{}", document.as_str(), name))
    }

    /// The raw key
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The key with every path segment percent-encoded and `/` kept
    pub fn url_path(&self) -> String {
        self.0
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Key segments, for building a relative filesystem path
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty() && *s != "." && *s != "..")
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an uploaded image can be fetched from (usually a URL)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteLocation(String);

impl RemoteLocation {
    /// Wrap a URL or URI
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    /// Join a base URL and a key, percent-encoding the key
    pub fn from_base_url(base_url: &str, key: &StorageKey) -> Self {
        Self(format!("{}/{}", base_url.trim_end_matches('/'), key.url_path()))
    }

    /// The location as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
