//! Profile and avatar management.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{Account, PostBuckets, Profile, ProfileOverview, UploadFile, UploadPolicy};
use crate::error::DomainError;
use crate::ports::{ObjectStore, PostRepository, ProfileRepository, StorageError};

/// Fetch the caller's profile, creating it on first use.
pub(crate) async fn ensure_profile(
    profiles: &dyn ProfileRepository,
    account: &Account,
) -> Result<Profile, DomainError> {
    if let Some(profile) = profiles.find_by_id(account.user_id).await? {
        return Ok(profile);
    }

    tracing::info!(user_id = %account.user_id, "Creating profile for new user");
    let profile = Profile::new(account.user_id, account.email.clone());
    Ok(profiles.save(profile).await?)
}

#[derive(Clone)]
pub struct ProfileService {
    profiles: Arc<dyn ProfileRepository>,
    posts: Arc<dyn PostRepository>,
    avatars: Arc<dyn ObjectStore>,
    policy: UploadPolicy,
}

impl ProfileService {
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        posts: Arc<dyn PostRepository>,
        avatars: Arc<dyn ObjectStore>,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            profiles,
            posts,
            avatars,
            policy,
        }
    }

    pub async fn ensure_profile(&self, account: &Account) -> Result<Profile, DomainError> {
        ensure_profile(self.profiles.as_ref(), account).await
    }

    /// The caller's profile with published and draft counts.
    pub async fn get_profile(&self, account: &Account) -> Result<ProfileOverview, DomainError> {
        let profile = self.ensure_profile(account).await?;
        let buckets = PostBuckets::split(self.posts.find_by_author(account.user_id).await?);

        Ok(ProfileOverview {
            profile,
            published_count: buckets.published.len(),
            draft_count: buckets.drafts.len(),
        })
    }

    pub async fn update_profile(
        &self,
        account: &Account,
        full_name: Option<String>,
    ) -> Result<Profile, DomainError> {
        let mut profile = self.ensure_profile(account).await?;
        profile.full_name = full_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        profile.updated_at = Utc::now();

        Ok(self.profiles.save(profile).await?)
    }

    /// Replace the caller's avatar. The previous avatar object is removed
    /// once the profile points at the new one.
    pub async fn upload_avatar(
        &self,
        account: &Account,
        file: UploadFile,
    ) -> Result<Profile, DomainError> {
        self.policy.check(&file)?;
        let mut profile = self.ensure_profile(account).await?;

        let stored = self.avatars.upload(account.user_id, file).await?;
        let previous = profile.avatar_url.replace(stored.url);
        profile.updated_at = Utc::now();

        let saved = match self.profiles.save(profile).await {
            Ok(saved) => saved,
            Err(e) => {
                self.discard_avatar(&stored.key.to_string()).await;
                return Err(e.into());
            }
        };

        if let Some(previous) = previous {
            self.discard_avatar(&previous).await;
        }

        Ok(saved)
    }

    /// Remove the caller's avatar object and clear the profile field.
    pub async fn delete_avatar(&self, account: &Account) -> Result<Profile, DomainError> {
        let mut profile = self.ensure_profile(account).await?;
        let Some(avatar_url) = profile.avatar_url.take() else {
            return Ok(profile);
        };

        if let Some(key) = self.avatars.resolve(&avatar_url) {
            if !key.belongs_to(account.user_id) {
                return Err(DomainError::Forbidden(
                    "Avatar belongs to another user".to_string(),
                ));
            }
            match self.avatars.delete(&key).await {
                Ok(()) | Err(StorageError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }

        profile.updated_at = Utc::now();
        Ok(self.profiles.save(profile).await?)
    }

    async fn discard_avatar(&self, reference: &str) {
        let Some(key) = self.avatars.resolve(reference) else {
            return;
        };
        if let Err(e) = self.avatars.delete(&key).await {
            tracing::warn!(key = %key, error = %e, "Failed to delete avatar object");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{FakeObjectStore, FakePostRepository, FakeProfileRepository};
    use uuid::Uuid;

    struct Fixture {
        account: Account,
        profiles: Arc<FakeProfileRepository>,
        avatars: Arc<FakeObjectStore>,
        service: ProfileService,
    }

    fn fixture() -> Fixture {
        let profiles = Arc::new(FakeProfileRepository::default());
        let avatars = Arc::new(FakeObjectStore::default());
        let service = ProfileService::new(
            profiles.clone(),
            Arc::new(FakePostRepository::default()),
            avatars.clone(),
            UploadPolicy::default(),
        );
        Fixture {
            account: Account::new(Uuid::new_v4(), "ana@school.edu"),
            profiles,
            avatars,
            service,
        }
    }

    fn png() -> UploadFile {
        UploadFile {
            filename: "me.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    #[tokio::test]
    async fn test_ensure_profile_creates_once() {
        let fx = fixture();
        let first = fx.service.ensure_profile(&fx.account).await.unwrap();
        let second = fx.service.ensure_profile(&fx.account).await.unwrap();

        assert_eq!(first.id, fx.account.user_id);
        assert_eq!(first.email, "ana@school.edu");
        assert_eq!(first.created_at, second.created_at);
    }

    #[tokio::test]
    async fn test_update_profile_blank_name_clears() {
        let fx = fixture();
        let named = fx
            .service
            .update_profile(&fx.account, Some("  Ana Reyes ".to_string()))
            .await
            .unwrap();
        assert_eq!(named.full_name.as_deref(), Some("Ana Reyes"));
        assert_eq!(named.display_name(), "Ana Reyes");

        let cleared = fx
            .service
            .update_profile(&fx.account, Some("   ".to_string()))
            .await
            .unwrap();
        assert_eq!(cleared.full_name, None);
        assert_eq!(cleared.display_name(), "ana@school.edu");
    }

    #[tokio::test]
    async fn test_upload_avatar_replaces_previous_object() {
        let fx = fixture();
        let first = fx.service.upload_avatar(&fx.account, png()).await.unwrap();
        let first_url = first.avatar_url.clone().unwrap();

        let second = fx.service.upload_avatar(&fx.account, png()).await.unwrap();

        assert_ne!(second.avatar_url.as_deref(), Some(first_url.as_str()));
        assert_eq!(fx.avatars.keys().len(), 1);
        assert_eq!(
            fx.profiles.get(fx.account.user_id).unwrap().avatar_url,
            second.avatar_url
        );
    }

    #[tokio::test]
    async fn test_upload_avatar_rejects_non_images() {
        let fx = fixture();
        let file = UploadFile {
            content_type: "application/pdf".to_string(),
            ..png()
        };
        let result = fx.service.upload_avatar(&fx.account, file).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(fx.avatars.keys().is_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_is_surfaced() {
        let fx = fixture();
        fx.avatars.fail_uploads(true);
        let result = fx.service.upload_avatar(&fx.account, png()).await;
        assert!(matches!(result, Err(DomainError::Storage(_))));
    }

    #[tokio::test]
    async fn test_delete_avatar_removes_object_and_url() {
        let fx = fixture();
        fx.service.upload_avatar(&fx.account, png()).await.unwrap();

        let profile = fx.service.delete_avatar(&fx.account).await.unwrap();

        assert_eq!(profile.avatar_url, None);
        assert!(fx.avatars.keys().is_empty());
    }

    #[tokio::test]
    async fn test_delete_avatar_failure_keeps_url() {
        let fx = fixture();
        let profile = fx.service.upload_avatar(&fx.account, png()).await.unwrap();
        let key = fx.avatars.keys().pop().unwrap();
        fx.avatars.fail_delete_of(key.as_str());

        let result = fx.service.delete_avatar(&fx.account).await;

        assert!(matches!(result, Err(DomainError::Storage(_))));
        assert_eq!(
            fx.profiles.get(fx.account.user_id).unwrap().avatar_url,
            profile.avatar_url
        );
    }

    #[tokio::test]
    async fn test_delete_without_avatar_is_noop() {
        let fx = fixture();
        let profile = fx.service.delete_avatar(&fx.account).await.unwrap();
        assert_eq!(profile.avatar_url, None);
    }
}
