//! In-memory object store - used when no storage API is configured.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use archive_core::domain::{ObjectKey, UploadFile};
use archive_core::ports::{ObjectStore, StorageError, StoredObject};

struct StoredBlob {
    content_type: String,
    bytes: Vec<u8>,
}

/// Object store backed by a map, one instance per bucket.
///
/// Note: Data is lost on process restart.
pub struct InMemoryObjectStore {
    public_base: String,
    objects: RwLock<BTreeMap<ObjectKey, StoredBlob>>,
}

impl InMemoryObjectStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            public_base: format!("memory://{bucket}"),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    /// Content type and bytes of a stored object.
    pub async fn get(&self, key: &ObjectKey) -> Option<(String, Vec<u8>)> {
        let objects = self.objects.read().await;
        objects
            .get(key)
            .map(|blob| (blob.content_type.clone(), blob.bytes.clone()))
    }

    pub async fn contains(&self, key: &ObjectKey) -> bool {
        self.objects.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn upload(&self, owner_id: Uuid, file: UploadFile) -> Result<StoredObject, StorageError> {
        let key = ObjectKey::generate(owner_id, &file.filename, &file.content_type);

        let mut objects = self.objects.write().await;
        objects.insert(
            key.clone(),
            StoredBlob {
                content_type: file.content_type,
                bytes: file.bytes,
            },
        );

        Ok(StoredObject {
            url: self.public_url(&key),
            key,
        })
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<ObjectKey>, StorageError> {
        let objects = self.objects.read().await;
        Ok(objects
            .keys()
            .filter(|key| key.belongs_to(owner_id))
            .cloned()
            .collect())
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), StorageError> {
        let mut objects = self.objects.write().await;
        objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn public_url(&self, key: &ObjectKey) -> String {
        format!("{}/{}", self.public_base, key)
    }

    fn resolve(&self, reference: &str) -> Option<ObjectKey> {
        ObjectKey::from_reference(reference, &self.public_base)
    }
}
