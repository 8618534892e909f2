//! Bootstrap failure taxonomy.
//!
//! Each variant is built at its failure site; `Display` is the text shown
//! on the loading screen, while the payloads keep the detail for logs.

use tokio::task::JoinError;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::profile::ProfileError;

pub const TIMEOUT_MESSAGE: &str = "Session check timed out. Please try logging in again.";
pub const FALLBACK_MESSAGE: &str = "An error occurred during startup. Redirecting to login.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BootstrapError {
    /// The initial session check exceeded its bound.
    #[error("Session check timed out. Please try logging in again.")]
    Timeout { bound_ms: u64 },

    /// The auth provider failed for a reason other than the timeout.
    #[error("Session check failed: {0}")]
    SessionFetch(String),

    /// The profile store could not produce the signed-in user's profile.
    #[error("Error loading profile: {detail}")]
    ProfileFetch { user_id: Uuid, detail: String },

    /// Anything else, e.g. a collaborator task that panicked.
    #[error("An error occurred during startup. Redirecting to login.")]
    Unknown { detail: String },
}

impl BootstrapError {
    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "E_SESSION_TIMEOUT",
            Self::SessionFetch(_) => "E_SESSION_FETCH",
            Self::ProfileFetch { .. } => "E_PROFILE_FETCH",
            Self::Unknown { .. } => "E_UNKNOWN",
        }
    }

    pub(crate) fn profile_fetch(user_id: Uuid, err: &ProfileError) -> Self {
        Self::ProfileFetch { user_id, detail: err.to_string() }
    }
}

impl From<AuthError> for BootstrapError {
    fn from(e: AuthError) -> Self {
        Self::SessionFetch(e.to_string())
    }
}

impl From<JoinError> for BootstrapError {
    fn from(e: JoinError) -> Self {
        Self::Unknown { detail: e.to_string() }
    }
}
