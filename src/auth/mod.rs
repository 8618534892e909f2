//! Authentication collaborators: sessions, users, change notifications.
//!
//! ARCHITECTURE
//! ============
//! The bootstrapper only sees the [`AuthProvider`] trait. Concrete providers
//! (`postgres`, `rest`) own a [`SessionEvents`] registry and publish a new
//! session (or `None`) on every sign-in, token swap, or sign-out.

pub mod events;
pub mod postgres;
pub mod rest;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use events::{SessionEvents, Subscription};

// =============================================================================
// SESSION / USER
// =============================================================================

/// Authenticated identity carried by a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Credential bundle issued by an [`AuthProvider`]. Replaced wholesale on
/// every auth-state change, never mutated in place.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: User,
}

impl Session {
    #[must_use]
    pub fn new(access_token: impl Into<String>, user: User) -> Self {
        Self { access_token: access_token.into(), user }
    }
}

// Keep tokens out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("auth request failed: {0}")]
    Request(String),
    #[error("auth response error: status {status}")]
    Response { status: u16, body: String },
    #[error("auth response parse failed: {0}")]
    Parse(String),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

// =============================================================================
// PROVIDER TRAIT
// =============================================================================

/// Issues sessions and notifies listeners when the session changes.
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve the current session, `None` when nobody is signed in.
    /// May be slow; callers bound it with [`crate::timeout::race`].
    async fn current_session(&self) -> Result<Option<Session>, AuthError>;

    /// End the current session and publish `None` to listeners.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Register a durable listener for subsequent session changes.
    fn subscribe(&self) -> Subscription;
}
