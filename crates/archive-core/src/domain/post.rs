use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::slug::generate_slug;
use crate::error::DomainError;

/// Maximum number of images a single post may embed.
pub const MAX_IMAGES_PER_POST: usize = 10;

const WORDS_PER_MINUTE: usize = 200;

/// Post entity - an article in the archive, published or draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    /// Embedded image references in insertion order.
    pub images: Vec<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post from already normalized input.
    pub fn new(author_id: Uuid, input: PostInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            slug: generate_slug(&input.title),
            title: input.title,
            content: input.content,
            excerpt: input.excerpt,
            featured_image: input.featured_image,
            images: input.images,
            published: input.published,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the editable fields, re-deriving the slug.
    pub fn apply(&mut self, input: PostInput) {
        self.slug = generate_slug(&input.title);
        self.title = input.title;
        self.content = input.content;
        self.excerpt = input.excerpt;
        self.featured_image = input.featured_image;
        self.images = input.images;
        self.published = input.published;
        self.updated_at = Utc::now();
    }

    /// Every image this post keeps alive: the featured image and all embedded ones.
    pub fn image_references(&self) -> impl Iterator<Item = &str> {
        self.featured_image
            .as_deref()
            .into_iter()
            .chain(self.images.iter().map(String::as_str))
    }

    pub fn reading_time_minutes(&self) -> u32 {
        let words = self.content.split_whitespace().count();
        words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
    }
}

/// Fields submitted by the authoring form.
#[derive(Debug, Clone, Default)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub images: Vec<String>,
    pub published: bool,
}

impl PostInput {
    /// Trim and validate the form.
    ///
    /// Without an explicit featured image the first embedded image is used.
    pub fn normalize(self) -> Result<Self, DomainError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::Validation("Title is required".to_string()));
        }
        if generate_slug(&title).is_empty() {
            return Err(DomainError::Validation(
                "Title must contain at least one letter or digit".to_string(),
            ));
        }

        let content = self.content.trim().to_string();
        if content.is_empty() {
            return Err(DomainError::Validation("Content is required".to_string()));
        }

        if self.images.len() > MAX_IMAGES_PER_POST {
            return Err(DomainError::Validation(format!(
                "A post can embed at most {MAX_IMAGES_PER_POST} images"
            )));
        }

        let images: Vec<String> = self
            .images
            .into_iter()
            .map(|image| image.trim().to_string())
            .collect();
        if images.iter().any(String::is_empty) {
            return Err(DomainError::Validation(
                "Image references must not be blank".to_string(),
            ));
        }

        let featured_image = non_blank(self.featured_image).or_else(|| images.first().cloned());

        Ok(Self {
            title,
            content,
            excerpt: non_blank(self.excerpt),
            featured_image,
            images,
            published: self.published,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A user's posts split by visibility.
#[derive(Debug, Clone, Default)]
pub struct PostBuckets {
    pub published: Vec<Post>,
    pub drafts: Vec<Post>,
}

impl PostBuckets {
    /// Partition posts by their published flag, preserving order.
    pub fn split(posts: Vec<Post>) -> Self {
        let (published, drafts) = posts.into_iter().partition(|post| post.published);
        Self { published, drafts }
    }
}
