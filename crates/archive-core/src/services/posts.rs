//! Post authoring and reading.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use uuid::Uuid;

use super::image_cleanup::CleanupRequest;
use super::profiles::ensure_profile;
use crate::domain::{Account, Post, PostBuckets, PostInput, Profile};
use crate::error::DomainError;
use crate::ports::{JobQueue, PostRepository, ProfileRepository};

/// A post together with its author's profile, as listed in the archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub post: Post,
    pub author: Option<Profile>,
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    profiles: Arc<dyn ProfileRepository>,
    jobs: Arc<dyn JobQueue>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        profiles: Arc<dyn ProfileRepository>,
        jobs: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            posts,
            profiles,
            jobs,
        }
    }

    /// Create a post. A brand-new post cannot orphan anything, so no cleanup runs.
    pub async fn create_post(
        &self,
        account: &Account,
        input: PostInput,
    ) -> Result<Post, DomainError> {
        let input = input.normalize()?;
        ensure_profile(self.profiles.as_ref(), account).await?;

        let post = self.posts.save(Post::new(account.user_id, input)).await?;
        tracing::info!(post_id = %post.id, author_id = %post.author_id, published = post.published, "Post created");

        Ok(post)
    }

    /// Update one of the caller's posts and schedule orphan cleanup.
    pub async fn update_post(
        &self,
        account: &Account,
        post_id: Uuid,
        input: PostInput,
    ) -> Result<Post, DomainError> {
        let input = input.normalize()?;
        let mut post = self.owned_post(account, post_id).await?;
        ensure_profile(self.profiles.as_ref(), account).await?;

        post.apply(input);
        let post = self.posts.save(post).await?;
        tracing::info!(post_id = %post.id, author_id = %post.author_id, published = post.published, "Post updated");

        let just_saved = post.image_references().map(str::to_string).collect();
        self.schedule_cleanup(post.author_id, just_saved).await;

        Ok(post)
    }

    /// Delete one of the caller's posts and schedule orphan cleanup.
    pub async fn delete_post(&self, account: &Account, post_id: Uuid) -> Result<(), DomainError> {
        let post = self.owned_post(account, post_id).await?;
        self.posts.delete(post.id).await?;
        tracing::info!(post_id = %post.id, author_id = %post.author_id, "Post deleted");

        self.schedule_cleanup(post.author_id, Vec::new()).await;
        Ok(())
    }

    /// Published posts, newest first, with their authors.
    pub async fn list_archive(&self) -> Result<Vec<ArchiveEntry>, DomainError> {
        let posts = self.posts.find_published().await?;
        self.with_authors(posts).await
    }

    /// Newest post with the slug the viewer may see.
    ///
    /// Drafts are only visible to their author.
    pub async fn get_post_by_slug(
        &self,
        slug: &str,
        viewer: Option<&Account>,
    ) -> Result<ArchiveEntry, DomainError> {
        let post = self
            .posts
            .find_by_slug(slug)
            .await?
            .into_iter()
            .find(|post| post.published || viewer.is_some_and(|v| v.user_id == post.author_id))
            .ok_or_else(|| DomainError::not_found("post", slug))?;

        let author = self.profiles.find_by_id(post.author_id).await?;
        Ok(ArchiveEntry { post, author })
    }

    /// The caller's posts split into published and drafts.
    pub async fn my_posts(&self, account: &Account) -> Result<PostBuckets, DomainError> {
        let posts = self.posts.find_by_author(account.user_id).await?;
        Ok(PostBuckets::split(posts))
    }

    async fn owned_post(&self, account: &Account, post_id: Uuid) -> Result<Post, DomainError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))?;

        if post.author_id != account.user_id {
            tracing::warn!(post_id = %post_id, user_id = %account.user_id, "Rejected edit of another user's post");
            return Err(DomainError::Forbidden(
                "Only the author can modify this post".to_string(),
            ));
        }

        Ok(post)
    }

    async fn with_authors(&self, posts: Vec<Post>) -> Result<Vec<ArchiveEntry>, DomainError> {
        let author_ids: Vec<Uuid> = posts
            .iter()
            .map(|post| post.author_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let authors: HashMap<Uuid, Profile> = self
            .profiles
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|profile| (profile.id, profile))
            .collect();

        Ok(posts
            .into_iter()
            .map(|post| ArchiveEntry {
                author: authors.get(&post.author_id).cloned(),
                post,
            })
            .collect())
    }

    /// Hand cleanup to the job queue. Failures here never reach the caller.
    async fn schedule_cleanup(&self, owner_id: Uuid, just_saved_images: Vec<String>) {
        let job = match (CleanupRequest {
            owner_id,
            just_saved_images,
        })
        .into_job()
        {
            Ok(job) => job,
            Err(e) => {
                tracing::error!(owner_id = %owner_id, error = %e, "Failed to encode image cleanup job");
                return;
            }
        };

        if let Err(e) = self.jobs.enqueue(job).await {
            tracing::warn!(owner_id = %owner_id, error = %e, "Failed to schedule image cleanup");
        }
    }
}
