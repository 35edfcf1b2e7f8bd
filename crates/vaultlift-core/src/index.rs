//! Image Index
//!
//! A name → path map of every image below an image root, built once per run
//! and shared read-only (usually behind an `Arc`) by all document pipelines.
//!
//! ## Name collisions
//!
//! Images are keyed by bare file name, so `a/x.png` and `b/x.png` collide.
//! The walk is sorted by file name within each directory, which makes the
//! winner deterministic: the entry scanned last replaces earlier ones. Keep
//! image names unique across the root to avoid depending on this.

use crate::error::{IndexError, IndexResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use vaultlift_parser::is_image_extension;
use walkdir::WalkDir;

/// Immutable map from image file name to absolute path
#[derive(Debug, Clone, Default)]
pub struct ImageIndex {
    root: PathBuf,
    entries: HashMap<String, PathBuf>,
    collisions: usize,
}

impl ImageIndex {
    /// Scan `root` recursively and index every image file
    ///
    /// Fails only when the root itself is missing, not a directory, or not
    /// readable. Unreadable entries deeper in the tree are logged and
    /// skipped. A root without images yields an empty index.
    pub fn build(root: impl AsRef<Path>) -> IndexResult<Self> {
        let root = root.as_ref();

        let metadata = std::fs::metadata(root).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => IndexError::RootNotFound {
                path: root.to_path_buf(),
            },
            _ => IndexError::Unreadable {
                path: root.to_path_buf(),
                source,
            },
        })?;
        if !metadata.is_dir() {
            return Err(IndexError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        let root = std::fs::canonicalize(root).map_err(|source| IndexError::Unreadable {
            path: root.to_path_buf(),
            source,
        })?;
        std::fs::read_dir(&root).map_err(|source| IndexError::Unreadable {
            path: root.clone(),
            source,
        })?;

        let mut index = Self {
            root: root.clone(),
            entries: HashMap::new(),
            collisions: 0,
        };

        for entry in WalkDir::new(&root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!("Skipping unreadable entry under {}: {}", root.display(), err);
                    None
                }
            })
        {
            if !entry.file_type().is_file() || !is_image_extension(entry.path()) {
                continue;
            }

            let Some(name) = entry.file_name().to_str() else {
                debug!("Skipping non UTF-8 image name: {}", entry.path().display());
                continue;
            };

            index.insert(name.to_string(), entry.into_path());
        }

        info!(
            "Indexed {} images under {} ({} name collisions)",
            index.len(),
            index.root.display(),
            index.collisions
        );

        Ok(index)
    }

    /// Build an index from explicit entries, applying the same
    /// last-writer-wins rule as [`ImageIndex::build`]
    pub fn from_entries<I, N, P>(root: impl Into<PathBuf>, entries: I) -> Self
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: Into<PathBuf>,
    {
        let mut index = Self {
            root: root.into(),
            entries: HashMap::new(),
            collisions: 0,
        };
        for (name, path) in entries {
            index.insert(name.into(), path.into());
        }
        index
    }

    fn insert(&mut self, name: String, path: PathBuf) {
        if let Some(previous) = self.entries.insert(name.clone(), path) {
            self.collisions += 1;
            debug!(
                "Image name collision for {}: {} replaced by {}",
                name,
                previous.display(),
                self.entries[&name].display()
            );
        }
    }

    /// Path for an image name, if indexed
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.entries.get(name).map(PathBuf::as_path)
    }

    /// Whether an image name is indexed
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of indexed names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no images
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical root the index was built from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// How many entries were replaced by a later file with the same name
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// Iterate over `(name, path)` pairs in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_path()))
    }
}
