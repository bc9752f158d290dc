//! In-memory repositories for development and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use archive_core::domain::{Post, Profile};
use archive_core::error::RepoError;
use archive_core::ports::{BaseRepository, PostRepository, ProfileRepository};

fn newest_first(mut posts: Vec<Post>) -> Vec<Post> {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    posts
}

/// Post repository backed by a `HashMap`.
#[derive(Default, Clone)]
pub struct InMemoryPostRepository {
    posts: Arc<RwLock<HashMap<Uuid, Post>>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn collect(&self, keep: impl Fn(&Post) -> bool) -> Vec<Post> {
        let posts = self.posts.read().await;
        newest_first(posts.values().filter(|p| keep(p)).cloned().collect())
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: Post) -> Result<Post, RepoError> {
        self.posts.write().await.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        match self.posts.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_by_author(&self, author_id: Uuid) -> Result<Vec<Post>, RepoError> {
        Ok(self.collect(|p| p.author_id == author_id).await)
    }

    async fn find_published(&self) -> Result<Vec<Post>, RepoError> {
        Ok(self.collect(|p| p.published).await)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Vec<Post>, RepoError> {
        Ok(self.collect(|p| p.slug == slug).await)
    }
}

/// Profile repository backed by a `HashMap`.
#[derive(Default, Clone)]
pub struct InMemoryProfileRepository {
    profiles: Arc<RwLock<HashMap<Uuid, Profile>>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<Profile, Uuid> for InMemoryProfileRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>, RepoError> {
        Ok(self.profiles.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: Profile) -> Result<Profile, RepoError> {
        self.profiles
            .write()
            .await
            .insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        match self.profiles.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Profile>, RepoError> {
        let profiles = self.profiles.read().await;
        Ok(ids.iter().filter_map(|id| profiles.get(id).cloned()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archive_core::domain::PostInput;
    use chrono::Duration;

    fn post(author_id: Uuid, title: &str, published: bool, age_minutes: i64) -> Post {
        let mut post = Post::new(
            author_id,
            PostInput {
                title: title.to_string(),
                content: "body".to_string(),
                published,
                ..Default::default()
            },
        );
        post.created_at -= Duration::minutes(age_minutes);
        post
    }

    #[tokio::test]
    async fn test_find_published_is_newest_first() {
        let repo = InMemoryPostRepository::new();
        let author = Uuid::new_v4();

        repo.save(post(author, "Old", true, 30)).await.unwrap();
        repo.save(post(author, "New", true, 1)).await.unwrap();
        repo.save(post(author, "Draft", false, 0)).await.unwrap();

        let titles: Vec<_> = repo
            .find_published()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();

        assert_eq!(titles, vec!["New", "Old"]);
    }

    #[tokio::test]
    async fn test_find_by_author_includes_drafts() {
        let repo = InMemoryPostRepository::new();
        let author = Uuid::new_v4();

        repo.save(post(author, "Mine", false, 0)).await.unwrap();
        repo.save(post(Uuid::new_v4(), "Theirs", true, 0))
            .await
            .unwrap();

        let posts = repo.find_by_author(author).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Mine");
    }

    #[tokio::test]
    async fn test_find_by_slug() {
        let repo = InMemoryPostRepository::new();
        let author = Uuid::new_v4();

        repo.save(post(author, "Hello World", true, 0)).await.unwrap();

        assert_eq!(repo.find_by_slug("hello-world").await.unwrap().len(), 1);
        assert!(repo.find_by_slug("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_post() {
        let repo = InMemoryPostRepository::new();
        assert!(matches!(
            repo.delete(Uuid::new_v4()).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_find_profiles_by_ids_skips_unknown() {
        let repo = InMemoryProfileRepository::new();
        let known = Profile::new(Uuid::new_v4(), "a@school.test".to_string());
        repo.save(known.clone()).await.unwrap();

        let found = repo.find_by_ids(&[known.id, Uuid::new_v4()]).await.unwrap();

        assert_eq!(found, vec![known]);
    }
}
