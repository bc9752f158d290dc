//! In-memory job queue implementation.
//!
//! Jobs are stored in a bounded channel and processed by local worker tasks.
//! Note: Jobs are lost on server restart. Cleanup jobs are idempotent, so a
//! lost job only delays removal of orphaned images until the next edit.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use archive_core::ports::{Job, JobHandler, JobQueue, JobQueueError, JobResult, QueueStats};

/// In-memory job queue configuration.
#[derive(Debug, Clone)]
pub struct InMemoryJobQueueConfig {
    /// Maximum queue size (0 = unlimited).
    pub max_size: usize,
    /// Number of worker tasks.
    pub workers: usize,
}

impl Default for InMemoryJobQueueConfig {
    fn default() -> Self {
        Self {
            max_size: 10000,
            workers: 4,
        }
    }
}

impl InMemoryJobQueueConfig {
    pub fn from_env() -> Self {
        Self {
            max_size: std::env::var("JOB_QUEUE_MAX_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10000),
            workers: std::env::var("JOB_QUEUE_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(4),
        }
    }
}

/// In-memory job queue.
pub struct InMemoryJobQueue {
    stats: Arc<JobStats>,
    config: InMemoryJobQueueConfig,
    job_sender: mpsc::Sender<Job>,
    job_receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
    started: AtomicBool,
}

#[derive(Default)]
struct JobStats {
    pending: AtomicUsize,
    processing: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl InMemoryJobQueue {
    pub fn new(config: InMemoryJobQueueConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.max_size.max(100));

        Self {
            stats: Arc::new(JobStats::default()),
            config,
            job_sender: tx,
            job_receiver: Arc::new(Mutex::new(rx)),
            started: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError> {
        if self.config.max_size > 0 {
            let current_size = self.stats.pending.load(Ordering::Relaxed);
            if current_size >= self.config.max_size {
                return Err(JobQueueError::QueueFull);
            }
        }

        self.stats.pending.fetch_add(1, Ordering::Relaxed);

        if let Err(e) = self.job_sender.send(job).await {
            self.stats.pending.fetch_sub(1, Ordering::Relaxed);
            return Err(JobQueueError::EnqueueError(e.to_string()));
        }

        tracing::debug!(
            "Job enqueued. Queue size: {}",
            self.stats.pending.load(Ordering::Relaxed)
        );

        Ok(())
    }

    async fn start_worker(&self, handler: JobHandler) -> Result<(), JobQueueError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(JobQueueError::WorkerRunning);
        }

        let handler: Arc<JobHandler> = Arc::new(handler);

        for worker_id in 0..self.config.workers.max(1) {
            let handler = handler.clone();
            let receiver = self.job_receiver.clone();
            let stats = self.stats.clone();
            let sender = self.job_sender.clone();

            tokio::spawn(async move {
                tracing::info!("Job worker {} started", worker_id);

                loop {
                    let job = {
                        let mut rx = receiver.lock().await;
                        rx.recv().await
                    };

                    let Some(mut job) = job else {
                        tracing::info!("Job worker {} shutting down", worker_id);
                        break;
                    };

                    stats.pending.fetch_sub(1, Ordering::Relaxed);
                    stats.processing.fetch_add(1, Ordering::Relaxed);

                    tracing::debug!(
                        worker = worker_id,
                        job_id = %job.id,
                        job_type = %job.job_type,
                        "Processing job"
                    );

                    job.attempts += 1;
                    let result = handler(job.clone()).await;

                    stats.processing.fetch_sub(1, Ordering::Relaxed);

                    match result {
                        JobResult::Success => {
                            stats.completed.fetch_add(1, Ordering::Relaxed);
                            tracing::debug!(job_id = %job.id, "Job completed successfully");
                        }
                        JobResult::Retry(reason) if job.attempts < job.max_attempts => {
                            tracing::warn!(
                                job_id = %job.id,
                                attempt = job.attempts,
                                max_attempts = job.max_attempts,
                                reason = %reason,
                                "Job failed, will retry"
                            );
                            stats.pending.fetch_add(1, Ordering::Relaxed);
                            let sender = sender.clone();
                            let stats = stats.clone();
                            tokio::spawn(async move {
                                tokio::time::sleep(tokio::time::Duration::from_millis(
                                    100 * job.attempts as u64,
                                ))
                                .await;
                                if let Err(e) = sender.send(job).await {
                                    stats.pending.fetch_sub(1, Ordering::Relaxed);
                                    tracing::error!("Failed to re-enqueue job for retry: {}", e);
                                }
                            });
                        }
                        JobResult::Retry(reason) => {
                            stats.failed.fetch_add(1, Ordering::Relaxed);
                            tracing::error!(
                                job_id = %job.id,
                                reason = %reason,
                                "Job failed after max retries"
                            );
                        }
                        JobResult::Failed(reason) => {
                            stats.failed.fetch_add(1, Ordering::Relaxed);
                            tracing::warn!(job_id = %job.id, job_type = %job.job_type, reason = %reason, "Job failed permanently");
                        }
                    }
                }
            });
        }

        Ok(())
    }

    async fn stats(&self) -> Result<QueueStats, JobQueueError> {
        Ok(QueueStats {
            pending: self.stats.pending.load(Ordering::Relaxed),
            processing: self.stats.processing.load(Ordering::Relaxed),
            completed: self.stats.completed.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archive_core::ports::JobFuture;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    fn queue(max_size: usize) -> InMemoryJobQueue {
        InMemoryJobQueue::new(InMemoryJobQueueConfig {
            max_size,
            workers: 2,
        })
    }

    #[tokio::test]
    async fn test_worker_processes_enqueued_jobs() {
        let queue = queue(100);
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        queue
            .start_worker(Box::new(move |job: Job| -> JobFuture {
                let tx = tx.clone();
                Box::pin(async move {
                    tx.send(job.job_type).ok();
                    JobResult::Success
                })
            }))
            .await
            .unwrap();

        queue
            .enqueue(Job::new("image_cleanup", serde_json::json!({})))
            .await
            .unwrap();

        let seen = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap();
        assert_eq!(seen.as_deref(), Some("image_cleanup"));
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let queue = queue(100);
        let calls = Arc::new(AtomicU32::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel::<u32>();

        let counter = calls.clone();
        queue
            .start_worker(Box::new(move |job: Job| -> JobFuture {
                let counter = counter.clone();
                let tx = tx.clone();
                Box::pin(async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 2 {
                        JobResult::Retry("store offline".to_string())
                    } else {
                        tx.send(job.attempts).ok();
                        JobResult::Success
                    }
                })
            }))
            .await
            .unwrap();

        queue
            .enqueue(Job::new("flaky", serde_json::json!(null)))
            .await
            .unwrap();

        let attempts = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap();
        assert_eq!(attempts, Some(2));
    }

    #[tokio::test]
    async fn test_queue_full_without_workers() {
        let queue = queue(1);
        queue
            .enqueue(Job::new("a", serde_json::json!(null)))
            .await
            .unwrap();

        let result = queue.enqueue(Job::new("b", serde_json::json!(null))).await;
        assert!(matches!(result, Err(JobQueueError::QueueFull)));
        assert_eq!(queue.stats().await.unwrap().pending, 1);
    }

    #[tokio::test]
    async fn test_worker_starts_once() {
        let queue = queue(10);
        let noop = || -> JobHandler {
            Box::new(|_job: Job| -> JobFuture { Box::pin(async { JobResult::Success }) })
        };

        queue.start_worker(noop()).await.unwrap();
        let second = queue.start_worker(noop()).await;
        assert!(matches!(second, Err(JobQueueError::WorkerRunning)));
    }
}
