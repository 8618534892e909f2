//! Postgres-backed auth provider over the `sessions` / `users` tables.
//!
//! ARCHITECTURE
//! ============
//! The provider holds the opaque token the process signed in with. A session
//! is only "current" while its row exists and `expires_at > now()`, so
//! expiry is enforced by the database rather than by the client.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use super::{AuthError, AuthProvider, Session, SessionEvents, Subscription, User};

pub struct PgAuthProvider {
    pool: PgPool,
    token: RwLock<Option<String>>,
    events: SessionEvents,
}

impl PgAuthProvider {
    #[must_use]
    pub fn new(pool: PgPool, token: Option<String>) -> Self {
        Self { pool, token: RwLock::new(token), events: SessionEvents::new() }
    }

    /// Adopt `token` as the current credential and notify listeners.
    ///
    /// Returns the resolved session, or `None` if the token is unknown or
    /// expired. A rejected token leaves the current session untouched.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Db`] if the lookup fails.
    pub async fn sign_in(&self, token: &str) -> Result<Option<Session>, AuthError> {
        let Some(session) = validate_token(&self.pool, token).await? else {
            warn!("sign-in rejected: unknown or expired token");
            return Ok(None);
        };
        *self.token.write().await = Some(session.access_token.clone());
        info!(user_id = %session.user.id, "signed in");
        self.events.publish(Some(session.clone()));
        Ok(Some(session))
    }

    /// Listener registry, exposed for diagnostics.
    #[must_use]
    pub fn events(&self) -> &SessionEvents {
        &self.events
    }
}

#[async_trait]
impl AuthProvider for PgAuthProvider {
    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(token) = self.token.read().await.clone() else {
            return Ok(None);
        };
        validate_token(&self.pool, &token).await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let token = self.token.write().await.take();
        let deleted = match token {
            Some(token) => sqlx::query("DELETE FROM sessions WHERE token = $1")
                .bind(&token)
                .execute(&self.pool)
                .await
                .map(|_| ()),
            None => Ok(()),
        };
        // The local token is gone either way; listeners must follow.
        if let Err(e) = &deleted {
            warn!(error = %e, "session row delete failed");
        }
        info!("signed out");
        self.events.publish(None);
        deleted.map_err(AuthError::from)
    }

    fn subscribe(&self) -> Subscription {
        self.events.subscribe()
    }
}

/// Resolve a token to its session, `None` when unknown or expired.
async fn validate_token(pool: &PgPool, token: &str) -> Result<Option<Session>, AuthError> {
    let row = sqlx::query(
        r"SELECT u.id, u.email
          FROM sessions s
          JOIN users u ON u.id = s.user_id
          WHERE s.token = $1 AND s.expires_at > now()",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| {
        let id: Uuid = r.get("id");
        let email: Option<String> = r.get("email");
        Session::new(token, User { id, email })
    }))
}

#[cfg(test)]
#[path = "postgres_test.rs"]
mod tests;
