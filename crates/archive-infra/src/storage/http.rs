//! Object store over the hosted storage REST API.
//!
//! One instance serves one bucket. Objects live at
//! `/storage/v1/object/{bucket}/{key}` and are publicly served from
//! `/storage/v1/object/public/{bucket}/{key}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use archive_core::domain::{ObjectKey, UploadFile};
use archive_core::ports::{ObjectStore, StorageError, StoredObject};

/// Storage API configuration.
#[derive(Debug, Clone)]
pub struct StorageApiConfig {
    /// Project URL, e.g. `https://xyz.example.co`.
    pub base_url: String,
    /// Service key sent as bearer token and `apikey` header.
    pub service_key: String,
    pub bucket: String,
    pub timeout: Duration,
    /// Entries fetched per list request.
    pub page_size: usize,
}

impl StorageApiConfig {
    /// Load configuration for a bucket. Returns `None` when `STORAGE_URL` is unset.
    pub fn from_env(bucket: &str) -> Option<Self> {
        let base_url = std::env::var("STORAGE_URL").ok()?;

        Some(Self {
            base_url,
            service_key: std::env::var("STORAGE_SERVICE_KEY").unwrap_or_default(),
            bucket: bucket.to_string(),
            timeout: Duration::from_secs(
                std::env::var("STORAGE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            page_size: 100,
        })
    }
}

#[derive(Serialize)]
struct ListRequest<'a> {
    prefix: &'a str,
    limit: usize,
    offset: usize,
    #[serde(rename = "sortBy")]
    sort_by: SortBy,
}

#[derive(Serialize)]
struct SortBy {
    column: &'static str,
    order: &'static str,
}

#[derive(Debug, Deserialize)]
struct ListEntry {
    name: String,
    /// Folders come back without an id.
    id: Option<String>,
}

/// Append path segments under `storage/v1/object`, percent-encoding each one.
fn object_endpoint<'a>(base: &Url, segments: impl IntoIterator<Item = &'a str>) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty()
            .extend(["storage", "v1", "object"])
            .extend(segments);
    }
    url
}

/// Storage API client for a single bucket.
pub struct StorageApiObjectStore {
    client: Client,
    base: Url,
    public_base: String,
    config: StorageApiConfig,
}

impl StorageApiObjectStore {
    pub fn new(config: StorageApiConfig) -> Result<Self, StorageError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| StorageError::Connection(format!("invalid storage URL: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(StorageError::Connection(format!(
                "invalid storage URL: {}",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let public_base = object_endpoint(&base, ["public", config.bucket.as_str()]).to_string();

        tracing::info!(bucket = %config.bucket, "Storage API object store configured");

        Ok(Self {
            client,
            base,
            public_base,
            config,
        })
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        object_endpoint(&self.base, segments)
    }

    fn object_url(&self, key: &ObjectKey) -> Url {
        self.endpoint(std::iter::once(self.config.bucket.as_str()).chain(key.as_str().split('/')))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.config.service_key)
            .header("apikey", &self.config.service_key)
    }
}

#[async_trait]
impl ObjectStore for StorageApiObjectStore {
    async fn upload(&self, owner_id: Uuid, file: UploadFile) -> Result<StoredObject, StorageError> {
        let key = ObjectKey::generate(owner_id, &file.filename, &file.content_type);

        let response = self
            .authorized(self.client.post(self.object_url(&key)))
            .header(reqwest::header::CONTENT_TYPE, file.content_type)
            .header(reqwest::header::CACHE_CONTROL, "max-age=3600")
            .header("x-upsert", "false")
            .body(file.bytes)
            .send()
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Upload(format!("{status}: {body}")));
        }

        tracing::debug!(bucket = %self.config.bucket, key = %key, "Object uploaded");

        Ok(StoredObject {
            url: self.public_url(&key),
            key,
        })
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<ObjectKey>, StorageError> {
        let prefix = owner_id.to_string();
        let url = self.endpoint(["list", self.config.bucket.as_str()]);
        let mut keys = Vec::new();
        let mut offset = 0;

        loop {
            let request = ListRequest {
                prefix: &prefix,
                limit: self.config.page_size,
                offset,
                sort_by: SortBy {
                    column: "name",
                    order: "asc",
                },
            };

            let response = self
                .authorized(self.client.post(url.clone()))
                .json(&request)
                .send()
                .await
                .map_err(|e| StorageError::List(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(StorageError::List(format!("{status}: {body}")));
            }

            let entries: Vec<ListEntry> = response
                .json()
                .await
                .map_err(|e| StorageError::List(e.to_string()))?;
            let page_len = entries.len();

            keys.extend(
                entries
                    .into_iter()
                    .filter(|entry| entry.id.is_some())
                    .filter_map(|entry| ObjectKey::parse(&format!("{prefix}/{}", entry.name))),
            );

            if page_len < self.config.page_size {
                break;
            }
            offset += page_len;
        }

        Ok(keys)
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), StorageError> {
        let response = self
            .authorized(self.client.delete(self.object_url(key)))
            .send()
            .await
            .map_err(|e| StorageError::Delete {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(StorageError::NotFound(key.to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(StorageError::Delete {
                    key: key.to_string(),
                    reason: format!("{status}: {body}"),
                })
            }
        }
    }

    fn public_url(&self, key: &ObjectKey) -> String {
        let segments = ["public", self.config.bucket.as_str()]
            .into_iter()
            .chain(key.as_str().split('/'));
        self.endpoint(segments).to_string()
    }

    fn resolve(&self, reference: &str) -> Option<ObjectKey> {
        ObjectKey::from_reference(reference, &self.public_base)
    }
}
