//! Object store port - where image bytes live.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{ObjectKey, UploadFile};

/// An object that was written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: ObjectKey,
    /// Publicly fetchable URL for the object.
    pub url: String,
}

/// Object store trait - abstraction over blob storage (storage API, in-memory).
///
/// Objects are namespaced per owner: every key starts with the owner's id,
/// and listing is always scoped to a single owner.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store a file under a fresh key in the owner's namespace.
    async fn upload(&self, owner_id: Uuid, file: UploadFile) -> Result<StoredObject, StorageError>;

    /// List every key in the owner's namespace.
    async fn list(&self, owner_id: Uuid) -> Result<Vec<ObjectKey>, StorageError>;

    /// Delete a single object.
    async fn delete(&self, key: &ObjectKey) -> Result<(), StorageError>;

    /// Public URL under which a key is served.
    fn public_url(&self, key: &ObjectKey) -> String;

    /// Map an image reference (key or public URL) to a key of this store.
    ///
    /// Returns `None` for malformed references and URLs served from elsewhere.
    fn resolve(&self, reference: &str) -> Option<ObjectKey>;
}

/// Object store errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Listing failed: {0}")]
    List(String),

    #[error("Delete failed for {key}: {reason}")]
    Delete { key: String, reason: String },

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Connection failed: {0}")]
    Connection(String),
}
