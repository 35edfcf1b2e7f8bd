//! Mock Implementations for Testing
//!
//! [`MockUploader`] stands in for a remote store. It is:
//!
//! - **Deterministic**: the location for a key is always
//!   `https://cdn.example/{key}`
//! - **Scriptable**: per-image failures and delays
//! - **Observable**: attempt counts and peak concurrency for assertions
//!
//! # Example
//!
//! ```rust
//! use std::path::Path;
//! use vaultlift_core::test_support::mocks::MockUploader;
//! use vaultlift_core::upload::{DocumentId, StorageKey, Uploader};
//! use vaultlift_core::UploadError;
//!
//! # async fn example() {
//! let uploader = MockUploader::new().with_failure("broken.png", UploadError::transport("reset"));
//!
//! let key = StorageKey::new(&DocumentId::new("doc1"), "a.png");
//! let location = uploader.upload(Path::new("/images/a.png"), &key).await.unwrap();
//! assert_eq!(location.as_str(), "https://cdn.example/doc1/a.png");
//! assert_eq!(uploader.attempts("doc1/a.png"), 1);
//! # }
//! ```

use crate::error::UploadError;
use crate::upload::{RemoteLocation, StorageKey, Uploader};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Base URL of every location the mock hands out
pub const MOCK_BASE_URL: &str = "https://cdn.example";

#[derive(Debug, Default)]
struct MockUploaderState {
    attempts: HashMap<String, usize>,
    in_flight: usize,
    max_in_flight: usize,
}

/// In-memory [`Uploader`] with scripted behaviour
///
/// Failures and delays are keyed by image file name (the last segment of
/// the storage key), so they apply regardless of which document uploads
/// the image.
#[derive(Debug, Clone, Default)]
pub struct MockUploader {
    failures: HashMap<String, UploadError>,
    delays: HashMap<String, Duration>,
    default_delay: Option<Duration>,
    state: Arc<Mutex<MockUploaderState>>,
}

impl MockUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every upload of `name` with `error`
    pub fn with_failure(mut self, name: impl Into<String>, error: UploadError) -> Self {
        self.failures.insert(name.into(), error);
        self
    }

    /// Sleep for `delay` before answering uploads of `name`
    pub fn with_delay(mut self, name: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(name.into(), delay);
        self
    }

    /// Sleep for `delay` before answering any upload without its own delay
    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = Some(delay);
        self
    }

    /// Number of attempts made for a storage key
    pub fn attempts(&self, key: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .attempts
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    /// Number of attempts across all keys
    pub fn total_attempts(&self) -> usize {
        self.state.lock().unwrap().attempts.values().sum()
    }

    /// Highest number of uploads observed running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.state.lock().unwrap().max_in_flight
    }

    /// Location the mock returns for `key`
    pub fn location_for(key: &StorageKey) -> RemoteLocation {
        RemoteLocation::from_base_url(MOCK_BASE_URL, key)
    }
}

struct InFlightGuard(Arc<Mutex<MockUploaderState>>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut state) = self.0.lock() {
            state.in_flight -= 1;
        }
    }
}

#[async_trait]
impl Uploader for MockUploader {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn upload(
        &self,
        _local_path: &Path,
        key: &StorageKey,
    ) -> Result<RemoteLocation, UploadError> {
        let name = key.as_str().rsplit('/').next().unwrap_or_default().to_string();

        let _guard = {
            let mut state = self.state.lock().unwrap();
            *state.attempts.entry(key.as_str().to_string()).or_insert(0) += 1;
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
            InFlightGuard(Arc::clone(&self.state))
        };

        if let Some(delay) = self.delays.get(&name).copied().or(self.default_delay) {
            tokio::time::sleep(delay).await;
        }

        match self.failures.get(&name) {
            Some(err) => Err(err.clone()),
            None => Ok(Self::location_for(key)),
        }
    }
}
