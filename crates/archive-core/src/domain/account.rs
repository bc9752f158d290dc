use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The caller of an operation, as verified by the auth provider.
///
/// The core never validates credentials itself; it trusts whatever identity
/// the transport layer hands it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub user_id: Uuid,
    pub email: String,
}

impl Account {
    pub fn new(user_id: Uuid, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }
}
