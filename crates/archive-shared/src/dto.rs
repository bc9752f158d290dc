//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /api/posts` and `PUT /api/posts/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    /// Image references embedded in the post, in display order.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub published: bool,
}

/// Author details shown next to a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// A full post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub images: Vec<String>,
    pub published: bool,
    pub reading_time_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post as shown in listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub published: bool,
    pub reading_time_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorSummary>,
    pub created_at: DateTime<Utc>,
}

/// The caller's posts split by visibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostBucketsResponse {
    pub published: Vec<PostSummary>,
    pub drafts: Vec<PostSummary>,
}

/// Result of an image upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUploadResponse {
    pub key: String,
    pub url: String,
}

/// Query string of the raw-body upload endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadQuery {
    pub filename: String,
}

/// A user's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_count: Option<usize>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `PUT /api/profile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub full_name: Option<String>,
}
