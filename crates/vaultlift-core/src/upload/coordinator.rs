//! Bounded-concurrency upload coordination
//!
//! One task per resolved reference, gated by a semaphore so at most
//! `concurrency_limit` uploads run at once. The whole batch shares a single
//! deadline: whatever has not finished when it passes is aborted and
//! reported as [`UploadError::Timeout`]. Every reference gets exactly one
//! result and at most one upload attempt.

use super::{DocumentId, RemoteLocation, StorageKey, Uploader};
use crate::error::UploadError;
use crate::resolver::ResolvedReference;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default number of uploads in flight per document
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 8;

/// Default wait bound for a document's uploads
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Coordinator settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Maximum uploads in flight at once, clamped to at least 1
    pub concurrency_limit: usize,
    /// Deadline for all uploads of one batch, measured from its start
    pub timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            timeout: DEFAULT_UPLOAD_TIMEOUT,
        }
    }
}

/// What happened to one upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum UploadOutcome {
    Uploaded(RemoteLocation),
    Failed(#[serde(serialize_with = "serialize_error")] UploadError),
}

fn serialize_error<S: serde::Serializer>(err: &UploadError, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&err.to_string())
}

/// Outcome of uploading one resolved reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    pub reference: ResolvedReference,
    pub key: StorageKey,
    pub outcome: UploadOutcome,
}

impl UploadResult {
    /// Remote location when the upload succeeded
    pub fn remote_location(&self) -> Option<&RemoteLocation> {
        match &self.outcome {
            UploadOutcome::Uploaded(location) => Some(location),
            UploadOutcome::Failed(_) => None,
        }
    }

    /// The failure, if any
    pub fn error(&self) -> Option<&UploadError> {
        match &self.outcome {
            UploadOutcome::Uploaded(_) => None,
            UploadOutcome::Failed(err) => Some(err),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, UploadOutcome::Uploaded(_))
    }
}

/// Uploads a document's resolved references through an [`Uploader`]
pub struct UploadCoordinator {
    uploader: Arc<dyn Uploader>,
    config: CoordinatorConfig,
}

impl UploadCoordinator {
    pub fn new(uploader: Arc<dyn Uploader>, config: CoordinatorConfig) -> Self {
        Self { uploader, config }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Upload every reference once and collect one result per reference
    ///
    /// Results are ordered by the reference's ordinal in the document, not by
    /// completion time. A failed upload never affects the others.
    pub async fn upload_all(
        &self,
        document: &DocumentId,
        references: Vec<ResolvedReference>,
    ) -> Vec<UploadResult> {
        if references.is_empty() {
            return Vec::new();
        }

        let total = references.len();
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency_limit.max(1)));
        let mut tasks = JoinSet::new();
        let mut pending: HashMap<usize, (ResolvedReference, StorageKey)> =
            HashMap::with_capacity(total);
        let mut slots_by_task = HashMap::with_capacity(total);

        for (slot, reference) in references.into_iter().enumerate() {
            let key = StorageKey::new(document, reference.name());
            let uploader = Arc::clone(&self.uploader);
            let semaphore = Arc::clone(&semaphore);
            let local_path = reference.local_path.clone();
            let task_key = key.clone();

            let handle = tasks.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => uploader.upload(&local_path, &task_key).await,
                    Err(err) => Err(UploadError::Aborted(err.to_string())),
                };
                (slot, outcome)
            });

            slots_by_task.insert(handle.id(), slot);
            pending.insert(slot, (reference, key));
        }

        // A timeout too large to represent as an instant means no deadline
        let deadline = Instant::now().checked_add(self.config.timeout);
        let mut results = Vec::with_capacity(total);

        loop {
            let joined = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, tasks.join_next()).await,
                None => Ok(tasks.join_next().await),
            };
            match joined {
                Ok(Some(Ok((slot, outcome)))) => {
                    if let Some((reference, key)) = pending.remove(&slot) {
                        results.push(self.record(reference, key, outcome));
                    }
                }
                Ok(Some(Err(join_err))) => {
                    let slot = slots_by_task.get(&join_err.id()).copied();
                    if let Some((reference, key)) = slot.and_then(|s| pending.remove(&s)) {
                        let err = UploadError::Aborted(join_err.to_string());
                        results.push(self.record(reference, key, Err(err)));
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        "Upload deadline of {:?} passed for {} with {} of {} uploads unfinished",
                        self.config.timeout,
                        document,
                        pending.len(),
                        total
                    );
                    tasks.abort_all();
                    break;
                }
            }
        }

        let duration_ms = self.config.timeout.as_millis() as u64;
        for (_, (reference, key)) in pending.drain() {
            results.push(self.record(reference, key, Err(UploadError::Timeout { duration_ms })));
        }

        results.sort_by_key(|result| result.reference.reference.ordinal);

        let uploaded = results.iter().filter(|r| r.is_success()).count();
        info!(
            "Uploaded {}/{} images for {} via {}",
            uploaded,
            total,
            document,
            self.uploader.name()
        );

        results
    }

    fn record(
        &self,
        reference: ResolvedReference,
        key: StorageKey,
        outcome: Result<RemoteLocation, UploadError>,
    ) -> UploadResult {
        let outcome = match outcome {
            Ok(location) => {
                debug!("Uploaded {} to {}", reference.local_path.display(), location);
                UploadOutcome::Uploaded(location)
            }
            Err(err) => {
                warn!(
                    "Failed to upload {} (line {}): {}",
                    reference.name(),
                    reference.line_number() + 1,
                    err
                );
                UploadOutcome::Failed(err)
            }
        };

        UploadResult {
            reference,
            key,
            outcome,
        }
    }
}
