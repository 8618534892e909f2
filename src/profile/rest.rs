//! Hosted REST profile store (`/rest/v1/profiles`).

use async_trait::async_trait;
use uuid::Uuid;

use super::{Profile, ProfileError, ProfileStore};
use crate::rest::RestClient;

pub struct RestProfileStore {
    client: RestClient,
}

impl RestProfileStore {
    #[must_use]
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProfileStore for RestProfileStore {
    async fn fetch_by_id(&self, user_id: Uuid) -> Result<Profile, ProfileError> {
        let response = self
            .client
            .get(&format!("rest/v1/profiles?id=eq.{user_id}&select=*"))
            .send()
            .await
            .map_err(|e| ProfileError::Store(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProfileError::Store(e.to_string()))?;
        if !status.is_success() {
            return Err(ProfileError::Store(format!("{status}: {text}")));
        }

        parse_single(&text, user_id)
    }
}

/// Rows come back as an array; exactly one match is expected.
fn parse_single(body: &str, user_id: Uuid) -> Result<Profile, ProfileError> {
    let mut rows: Vec<Profile> = serde_json::from_str(body).map_err(|e| ProfileError::Store(e.to_string()))?;
    if rows.len() > 1 {
        return Err(ProfileError::Store(format!("expected one profile for {user_id}, got {}", rows.len())));
    }
    rows.pop().ok_or(ProfileError::NotFound(user_id))
}
