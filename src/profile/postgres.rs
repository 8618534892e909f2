//! Postgres profile store.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{Profile, ProfileError, ProfileStore};

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn fetch_by_id(&self, user_id: Uuid) -> Result<Profile, ProfileError> {
        let row = sqlx::query(
            r#"SELECT id, display_name, avatar_url, role,
                      to_char(updated_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at
               FROM profiles WHERE id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ProfileError::NotFound(user_id))?;

        Ok(Profile {
            id: row.get("id"),
            display_name: row.get("display_name"),
            avatar_url: row.get("avatar_url"),
            role: row.get("role"),
            updated_at: row.get("updated_at"),
        })
    }
}
