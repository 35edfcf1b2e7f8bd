//! Local directory uploader
//!
//! Copies images into a folder, typically one served by a web server or
//! synced to a bucket by another tool.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;
use vaultlift_core::{RemoteLocation, StorageKey, UploadError, Uploader};

/// Copies images to `{directory}/{key}`
#[derive(Debug, Clone)]
pub struct DirectoryUploader {
    directory: PathBuf,
    public_base_url: Option<String>,
}

impl DirectoryUploader {
    pub fn new(directory: impl Into<PathBuf>, public_base_url: Option<String>) -> Self {
        Self {
            directory: directory.into(),
            public_base_url,
        }
    }

    /// Destination file for a key
    pub fn destination(&self, key: &StorageKey) -> PathBuf {
        key.segments()
            .fold(self.directory.clone(), |path, segment| path.join(segment))
    }
}

/// `file://` URL for an absolute path, each segment percent-encoded
fn file_url(path: &Path) -> String {
    let encoded: Vec<String> = path
        .to_string_lossy()
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .map(|s| urlencoding::encode(s).into_owned())
        .collect();
    format!("file:///{}", encoded.join("/"))
}

#[async_trait]
impl Uploader for DirectoryUploader {
    fn name(&self) -> &'static str {
        "directory"
    }

    async fn upload(
        &self,
        local_path: &Path,
        key: &StorageKey,
    ) -> Result<RemoteLocation, UploadError> {
        let destination = self.destination(key);
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(local_path, &destination).await?;
        debug!("Copied {} to {}", local_path.display(), destination.display());

        match &self.public_base_url {
            Some(base) => Ok(RemoteLocation::from_base_url(base, key)),
            None => {
                let absolute = tokio::fs::canonicalize(&destination).await?;
                Ok(RemoteLocation::new(file_url(&absolute)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vaultlift_core::DocumentId;

    #[tokio::test]
    async fn test_copies_under_key() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.png");
        std::fs::write(&source, b"png-bytes").unwrap();
        let uploader = DirectoryUploader::new(
            temp.path().join("published"),
            Some("https://static.example/img".to_string()),
        );
        let key = StorageKey::new(&DocumentId::new("notes/day 1"), "a.png");

        let location = uploader.upload(&source, &key).await.unwrap();

        assert_eq!(
            location.as_str(),
            "https://static.example/img/notes/day%201/a.png"
        );
        assert_eq!(
            std::fs::read(temp.path().join("published/notes/day 1/a.png")).unwrap(),
            b"png-bytes"
        );
    }

    #[tokio::test]
    async fn test_file_url_without_base() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("a.png");
        std::fs::write(&source, b"x").unwrap();
        let uploader = DirectoryUploader::new(temp.path().join("out"), None);

        let location = uploader
            .upload(&source, &StorageKey::new(&DocumentId::new("doc"), "a.png"))
            .await
            .unwrap();

        assert!(location.as_str().starts_with("file:///"));
        assert!(location.as_str().ends_with("/out/doc/a.png"));
    }

    #[tokio::test]
    async fn test_missing_source_is_io_error() {
        let temp = TempDir::new().unwrap();
        let uploader = DirectoryUploader::new(temp.path(), None);

        let err = uploader
            .upload(
                &temp.path().join("missing.png"),
                &StorageKey::new(&DocumentId::new("doc"), "missing.png"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Io(_)));
    }

    #[test]
    fn test_destination_ignores_traversal() {
        let uploader = DirectoryUploader::new("/srv", None);
        let key = StorageKey::new(&DocumentId::new("../etc"), "a.png");

        assert_eq!(uploader.destination(&key), PathBuf::from("/srv/etc/a.png"));
    }
}
