//! Orphaned image cleanup.
//!
//! After a post edit is persisted, every object in the owner's namespace that
//! no post of that owner references any more is deleted. The live set is the
//! union of `featured_image` and `images` across all of the owner's posts,
//! drafts included, plus the images of the post that was just saved.
//!
//! Runs are not synchronized with concurrent edits by the same owner: an image
//! referenced only by an edit that commits after the live set was read can be
//! deleted.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ObjectKey;
use crate::error::DomainError;
use crate::ports::{Job, JobFuture, JobHandler, JobResult, ObjectStore, PostRepository};

/// Job type routed to [`ImageCleanup::handle_job`].
pub const IMAGE_CLEANUP_JOB: &str = "image_cleanup";

/// Attempts per cleanup job; skipped runs are retried until this is reached.
pub const CLEANUP_MAX_ATTEMPTS: u32 = 3;

/// Payload of a cleanup job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupRequest {
    pub owner_id: Uuid,
    /// Image references of the post as it was just saved.
    #[serde(default)]
    pub just_saved_images: Vec<String>,
}

impl CleanupRequest {
    pub fn into_job(self) -> Result<Job, serde_json::Error> {
        let payload = serde_json::to_value(self)?;
        Ok(Job::new(IMAGE_CLEANUP_JOB, payload).with_max_attempts(CLEANUP_MAX_ATTEMPTS))
    }
}

/// What a cleanup run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupReport {
    /// Nothing was deleted because the inputs could not be read.
    Skipped(String),
    /// The namespace was swept.
    Swept {
        deleted: Vec<ObjectKey>,
        failed: Vec<ObjectKey>,
    },
}

impl CleanupReport {
    pub fn deleted(&self) -> &[ObjectKey] {
        match self {
            CleanupReport::Skipped(_) => &[],
            CleanupReport::Swept { deleted, .. } => deleted,
        }
    }

    pub fn failed(&self) -> &[ObjectKey] {
        match self {
            CleanupReport::Skipped(_) => &[],
            CleanupReport::Swept { failed, .. } => failed,
        }
    }
}

/// Image reference tracker and orphan cleanup.
#[derive(Clone)]
pub struct ImageCleanup {
    posts: Arc<dyn PostRepository>,
    images: Arc<dyn ObjectStore>,
}

impl ImageCleanup {
    pub fn new(posts: Arc<dyn PostRepository>, images: Arc<dyn ObjectStore>) -> Self {
        Self { posts, images }
    }

    /// Keys of every image referenced by any post of the owner.
    pub async fn compute_live_image_set(
        &self,
        owner_id: Uuid,
    ) -> Result<HashSet<ObjectKey>, DomainError> {
        let posts = self.posts.find_by_author(owner_id).await?;

        Ok(posts
            .iter()
            .flat_map(|post| post.image_references())
            .filter_map(|reference| self.images.resolve(reference))
            .collect())
    }

    /// Delete the owner's stored images that no post references.
    ///
    /// Never fails: read errors skip the run, delete errors are logged per
    /// object and the sweep continues.
    pub async fn cleanup_orphans(
        &self,
        owner_id: Uuid,
        just_saved_images: &[String],
    ) -> CleanupReport {
        let mut live = match self.compute_live_image_set(owner_id).await {
            Ok(live) => live,
            Err(e) => {
                tracing::warn!(owner_id = %owner_id, error = %e, "Skipping image cleanup, posts unavailable");
                return CleanupReport::Skipped(e.to_string());
            }
        };
        live.extend(
            just_saved_images
                .iter()
                .filter_map(|reference| self.images.resolve(reference)),
        );

        let stored = match self.images.list(owner_id).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(owner_id = %owner_id, error = %e, "Skipping image cleanup, listing failed");
                return CleanupReport::Skipped(e.to_string());
            }
        };

        let mut deleted = Vec::new();
        let mut failed = Vec::new();

        for key in stored {
            if !key.belongs_to(owner_id) {
                tracing::warn!(owner_id = %owner_id, key = %key, "Listed object outside owner namespace, leaving it");
                continue;
            }
            if live.contains(&key) {
                continue;
            }

            match self.images.delete(&key).await {
                Ok(()) => {
                    tracing::debug!(owner_id = %owner_id, key = %key, "Deleted orphaned image");
                    deleted.push(key);
                }
                Err(e) => {
                    tracing::warn!(owner_id = %owner_id, key = %key, error = %e, "Failed to delete orphaned image");
                    failed.push(key);
                }
            }
        }

        tracing::info!(
            owner_id = %owner_id,
            live = live.len(),
            deleted = deleted.len(),
            failed = failed.len(),
            "Image cleanup finished"
        );

        CleanupReport::Swept { deleted, failed }
    }

    /// Run a queued cleanup job.
    pub async fn handle_job(&self, job: Job) -> JobResult {
        let request: CleanupRequest = match serde_json::from_value(job.payload) {
            Ok(request) => request,
            Err(e) => return JobResult::Failed(format!("Invalid cleanup payload: {e}")),
        };

        match self
            .cleanup_orphans(request.owner_id, &request.just_saved_images)
            .await
        {
            CleanupReport::Skipped(reason) => JobResult::Retry(reason),
            CleanupReport::Swept { .. } => JobResult::Success,
        }
    }

    /// Worker handler for the job queue.
    pub fn into_job_handler(self) -> JobHandler {
        let cleanup = Arc::new(self);
        Box::new(move |job: Job| -> JobFuture {
            let cleanup = cleanup.clone();
            Box::pin(async move {
                if job.job_type != IMAGE_CLEANUP_JOB {
                    return JobResult::Failed(format!("Unknown job type '{}'", job.job_type));
                }
                cleanup.handle_job(job).await
            })
        })
    }
}
