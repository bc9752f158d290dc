//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod job_queue;
mod object_store;
mod repository;

pub use auth::{AuthError, TokenClaims, TokenService};
pub use job_queue::{
    Job, JobFuture, JobHandler, JobQueue, JobQueueError, JobResult, QueueStats,
};
pub use object_store::{ObjectStore, StorageError, StoredObject};
pub use repository::{BaseRepository, PostRepository, ProfileRepository};
