//! Application configuration loaded from environment variables.

use std::env;

use archive_core::domain::{DEFAULT_MAX_UPLOAD_BYTES, UploadPolicy};
use archive_infra::InMemoryJobQueueConfig;

#[cfg(feature = "postgres")]
use archive_infra::DatabaseConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    #[cfg(feature = "postgres")]
    pub database: Option<DatabaseConfig>,
    /// Bucket holding images embedded in posts.
    pub post_images_bucket: String,
    /// Bucket holding profile avatars.
    pub avatars_bucket: String,
    pub max_upload_bytes: usize,
    pub jobs: InMemoryJobQueueConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            #[cfg(feature = "postgres")]
            database: DatabaseConfig::from_env(),
            post_images_bucket: env::var("POST_IMAGES_BUCKET")
                .unwrap_or_else(|_| "post-images".to_string()),
            avatars_bucket: env::var("AVATARS_BUCKET").unwrap_or_else(|_| "avatars".to_string()),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            jobs: InMemoryJobQueueConfig::from_env(),
        }
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy {
            max_bytes: self.max_upload_bytes,
        }
    }
}
