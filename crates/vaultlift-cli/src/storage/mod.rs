//! Concrete uploaders and the factory that picks one from config

pub mod directory;
pub mod http;

pub use directory::DirectoryUploader;
pub use http::HttpUploader;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use vaultlift_config::{MigrationConfig, StorageBackend};
use vaultlift_core::Uploader;

/// Build the uploader selected by `config.storage.backend`
pub fn create_uploader(config: &MigrationConfig) -> Result<Arc<dyn Uploader>> {
    let storage = &config.storage;

    let uploader: Arc<dyn Uploader> = match storage.backend {
        StorageBackend::Http => {
            let endpoint = storage
                .endpoint
                .as_deref()
                .context("storage.endpoint is required for the http backend")?;
            info!("Uploading to {}", endpoint);
            Arc::new(HttpUploader::new(
                endpoint,
                storage.public_base_url(),
                storage.bearer_token.clone(),
                config.upload_timeout(),
            )?)
        }
        StorageBackend::Directory => {
            let directory = storage
                .directory
                .clone()
                .context("storage.directory is required for the directory backend")?;
            info!("Copying images into {}", directory.display());
            Arc::new(DirectoryUploader::new(
                directory,
                storage.public_base_url.clone(),
            ))
        }
    };

    Ok(uploader)
}
