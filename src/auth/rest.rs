//! Hosted REST auth provider (`/auth/v1`).
//!
//! The current user is resolved from the access token on every call; a
//! rejected token (401/403) means "no session", not an error. Pure parsing
//! lives in `parse_user` for testability.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::{AuthError, AuthProvider, Session, SessionEvents, Subscription, User};
use crate::rest::RestClient;

pub struct RestAuthProvider {
    client: RestClient,
    access_token: RwLock<Option<String>>,
    events: SessionEvents,
}

impl RestAuthProvider {
    #[must_use]
    pub fn new(client: RestClient, access_token: Option<String>) -> Self {
        Self { client, access_token: RwLock::new(access_token), events: SessionEvents::new() }
    }

    /// Swap the access token (sign-in or refresh) and notify listeners with
    /// the session it resolves to. A rejected token leaves the current
    /// session untouched and returns `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the user lookup fails.
    pub async fn set_access_token(&self, token: String) -> Result<Option<Session>, AuthError> {
        let Some(session) = self.fetch_session(&token).await? else {
            warn!("access token rejected");
            return Ok(None);
        };
        *self.access_token.write().await = Some(token);
        self.events.publish(Some(session.clone()));
        Ok(Some(session))
    }

    #[must_use]
    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    async fn fetch_session(&self, token: &str) -> Result<Option<Session>, AuthError> {
        let response = self
            .client
            .get("auth/v1/user")
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        if matches!(status, 401 | 403) {
            return Ok(None);
        }
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;
        if status != 200 {
            return Err(AuthError::Response { status, body: text });
        }

        let user = parse_user(&text)?;
        Ok(Some(Session::new(token, user)))
    }

    async fn remote_logout(&self, token: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .post("auth/v1/logout")
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Response { status, body });
        }
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for RestAuthProvider {
    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(token) = self.access_token.read().await.clone() else {
            return Ok(None);
        };
        self.fetch_session(&token).await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let token = self.access_token.write().await.take();
        let remote = match token {
            Some(token) => self.remote_logout(&token).await,
            None => Ok(()),
        };
        // The local token is already gone; a remote failure only leaves a
        // dangling server-side session.
        if let Err(e) = &remote {
            warn!(error = %e, "remote logout failed");
        }
        info!("signed out");
        self.events.publish(None);
        remote
    }

    fn subscribe(&self) -> Subscription {
        self.events.subscribe()
    }
}

pub(crate) fn parse_user(body: &str) -> Result<User, AuthError> {
    serde_json::from_str::<User>(body).map_err(|e| AuthError::Parse(e.to_string()))
}
