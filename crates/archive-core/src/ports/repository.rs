use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Post, Profile};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Every post of an author, drafts included, newest first. No pagination.
    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, RepoError>;

    /// All published posts, newest first.
    async fn find_published(&self) -> Result<Vec<Post>, RepoError>;

    /// Posts carrying the given slug, newest first.
    async fn find_by_slug(&self, slug: &str) -> Result<Vec<Post>, RepoError>;
}

/// Profile repository.
#[async_trait]
pub trait ProfileRepository: BaseRepository<Profile, Uuid> {
    /// Profiles for a set of users; unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Profile>, RepoError>;
}
