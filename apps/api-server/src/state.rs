//! Application state - shared across all handlers.

use std::sync::Arc;

use archive_core::domain::UploadPolicy;
use archive_core::ports::{JobQueue, ObjectStore, PostRepository, ProfileRepository};
use archive_core::services::{ImageCleanup, ImageService, PostService, ProfileService};
use archive_infra::{
    InMemoryJobQueue, InMemoryObjectStore, InMemoryPostRepository, InMemoryProfileRepository,
};

#[cfg(feature = "postgres")]
use archive_infra::{DatabaseConnections, PostgresPostRepository, PostgresProfileRepository};

#[cfg(feature = "storage-api")]
use archive_infra::{StorageApiConfig, StorageApiObjectStore};

use crate::config::AppConfig;

/// The concrete adapters behind every port.
pub struct Adapters {
    pub posts: Arc<dyn PostRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub post_images: Arc<dyn ObjectStore>,
    pub avatars: Arc<dyn ObjectStore>,
    pub jobs: Arc<dyn JobQueue>,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub profiles: ProfileService,
    pub images: ImageService,
    pub jobs: Arc<dyn JobQueue>,
    /// Largest request body accepted by the upload routes.
    pub upload_limit: usize,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let (posts, profiles) = Self::repositories(config).await;

        let adapters = Adapters {
            posts,
            profiles,
            post_images: Self::object_store(&config.post_images_bucket),
            avatars: Self::object_store(&config.avatars_bucket),
            jobs: Arc::new(InMemoryJobQueue::new(config.jobs.clone())),
        };

        Self::from_adapters(adapters, config.upload_policy()).await
    }

    /// Wire services over the given adapters and start the image cleanup worker.
    pub async fn from_adapters(adapters: Adapters, policy: UploadPolicy) -> Self {
        let cleanup = ImageCleanup::new(adapters.posts.clone(), adapters.post_images.clone());
        if let Err(e) = adapters.jobs.start_worker(cleanup.into_job_handler()).await {
            tracing::error!(error = %e, "Failed to start image cleanup worker");
        }

        tracing::info!("Application state initialized");

        Self {
            posts: PostService::new(
                adapters.posts.clone(),
                adapters.profiles.clone(),
                adapters.jobs.clone(),
            ),
            profiles: ProfileService::new(
                adapters.profiles,
                adapters.posts,
                adapters.avatars,
                policy,
            ),
            images: ImageService::new(adapters.post_images, policy),
            jobs: adapters.jobs,
            upload_limit: policy.max_bytes,
        }
    }

    #[cfg(feature = "postgres")]
    async fn repositories(
        config: &AppConfig,
    ) -> (Arc<dyn PostRepository>, Arc<dyn ProfileRepository>) {
        let Some(db_config) = config.database.as_ref() else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return Self::in_memory_repositories();
        };

        match DatabaseConnections::init(db_config).await {
            Ok(connections) => (
                Arc::new(PostgresPostRepository::new(connections.main.clone())),
                Arc::new(PostgresProfileRepository::new(connections.main)),
            ),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                Self::in_memory_repositories()
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn repositories(
        _config: &AppConfig,
    ) -> (Arc<dyn PostRepository>, Arc<dyn ProfileRepository>) {
        tracing::info!("Running without postgres feature - using in-memory repositories");
        Self::in_memory_repositories()
    }

    fn in_memory_repositories() -> (Arc<dyn PostRepository>, Arc<dyn ProfileRepository>) {
        (
            Arc::new(InMemoryPostRepository::new()),
            Arc::new(InMemoryProfileRepository::new()),
        )
    }

    #[cfg(feature = "storage-api")]
    fn object_store(bucket: &str) -> Arc<dyn ObjectStore> {
        let Some(config) = StorageApiConfig::from_env(bucket) else {
            tracing::warn!(bucket, "STORAGE_URL not set. Keeping images in memory.");
            return Arc::new(InMemoryObjectStore::new(bucket));
        };

        match StorageApiObjectStore::new(config) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::error!(bucket, "Failed to configure storage API: {}. Using in-memory fallback.", e);
                Arc::new(InMemoryObjectStore::new(bucket))
            }
        }
    }

    #[cfg(not(feature = "storage-api"))]
    fn object_store(bucket: &str) -> Arc<dyn ObjectStore> {
        tracing::info!(bucket, "Running without storage-api feature - keeping images in memory");
        Arc::new(InMemoryObjectStore::new(bucket))
    }
}
