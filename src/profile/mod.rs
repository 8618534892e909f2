//! Profile records and the stores that serve them.

pub mod postgres;
pub mod rest;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Application-level user record, keyed 1:1 by user id. Mirrors the `profiles` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    /// Authorization tag, e.g. `"admin"`.
    pub role: Option<String>,
    pub updated_at: Option<String>,
}

impl Profile {
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("profile not found: {0}")]
    NotFound(Uuid),
    #[error("profile store error: {0}")]
    Store(String),
}

impl From<sqlx::Error> for ProfileError {
    fn from(e: sqlx::Error) -> Self {
        Self::Store(e.to_string())
    }
}

/// Fetch-by-id access to profiles.
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    async fn fetch_by_id(&self, user_id: Uuid) -> Result<Profile, ProfileError>;
}
