use std::sync::Arc;

use crate::domain::{Account, UploadFile, UploadPolicy};
use crate::error::DomainError;
use crate::ports::{ObjectStore, StoredObject};

/// Uploads of images embedded in posts.
#[derive(Clone)]
pub struct ImageService {
    images: Arc<dyn ObjectStore>,
    policy: UploadPolicy,
}

impl ImageService {
    pub fn new(images: Arc<dyn ObjectStore>, policy: UploadPolicy) -> Self {
        Self { images, policy }
    }

    /// Store an image in the caller's namespace.
    ///
    /// The object is unreferenced until a post embeds it; an edit that drops
    /// it lets the next cleanup remove it.
    pub async fn upload_post_image(
        &self,
        account: &Account,
        file: UploadFile,
    ) -> Result<StoredObject, DomainError> {
        self.policy.check(&file)?;

        let size = file.bytes.len();
        let stored = self.images.upload(account.user_id, file).await?;
        tracing::info!(user_id = %account.user_id, key = %stored.key, size, "Post image uploaded");

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::FakeObjectStore;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_upload_lands_in_caller_namespace() {
        let store = Arc::new(FakeObjectStore::default());
        let service = ImageService::new(store.clone(), UploadPolicy::default());
        let account = Account::new(Uuid::new_v4(), "ben@school.edu");

        let stored = service
            .upload_post_image(
                &account,
                UploadFile {
                    filename: "fair.webp".to_string(),
                    content_type: "image/webp".to_string(),
                    bytes: vec![0; 16],
                },
            )
            .await
            .unwrap();

        assert!(stored.key.belongs_to(account.user_id));
        assert_eq!(stored.url, store.public_url(&stored.key));
        assert!(store.contains(stored.key.as_str()));
    }

    #[tokio::test]
    async fn test_oversized_upload_never_reaches_store() {
        let store = Arc::new(FakeObjectStore::default());
        let service = ImageService::new(store.clone(), UploadPolicy { max_bytes: 8 });
        let account = Account::new(Uuid::new_v4(), "ben@school.edu");

        let result = service
            .upload_post_image(
                &account,
                UploadFile {
                    filename: "big.png".to_string(),
                    content_type: "image/png".to_string(),
                    bytes: vec![0; 9],
                },
            )
            .await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(store.keys().is_empty());
    }
}
