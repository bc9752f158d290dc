use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Profile entity - public information about a registered user.
///
/// The id is the auth provider's user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Create an empty profile for a freshly verified user.
    pub fn new(id: Uuid, email: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            email,
            full_name: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Name shown next to the user's posts.
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.email)
    }
}

/// A profile together with the owner's post counts.
#[derive(Debug, Clone)]
pub struct ProfileOverview {
    pub profile: Profile,
    pub published_count: usize,
    pub draft_count: usize,
}
