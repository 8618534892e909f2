//! Observable bootstrap state and the transitions applied to it.
//!
//! DESIGN
//! ======
//! Transitions are plain `&mut BootstrapState` methods so they can be applied
//! atomically inside `watch::Sender::send_modify` and unit-tested without a
//! runtime. Each one keeps `profile.is_some() => user.is_some()`.

use super::error::BootstrapError;
use crate::auth::{Session, User};
use crate::profile::Profile;

pub const MSG_CHECKING_SESSION: &str = "Checking user session...";
pub const MSG_FETCHING_PROFILE: &str = "Fetching user profile...";
pub const MSG_PROFILE_LOADED: &str = "Profile loaded. Preparing application...";
pub const MSG_PROFILE_ERROR: &str = "Error loading profile. Redirecting to login.";
pub const MSG_NO_SESSION: &str = "No active session. Redirecting to login...";
pub const MSG_READY: &str = "Application ready!";

/// What happens to `session`/`user` when a profile fetch fails after an
/// auth-change notification. The initialization sequence always demotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DemotionPolicy {
    /// Demote on every profile failure.
    #[default]
    Always,
    /// Demote only during initialization; listener failures keep the session.
    InitialOnly,
}

/// Snapshot of the resolved session, consumed by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapState {
    pub session: Option<Session>,
    pub user: Option<User>,
    pub profile: Option<Profile>,
    pub loading: bool,
    /// 0..=100
    pub progress: u8,
    pub message: String,
    pub error: Option<BootstrapError>,
}

impl Default for BootstrapState {
    fn default() -> Self {
        Self {
            session: None,
            user: None,
            profile: None,
            loading: true,
            progress: 0,
            message: String::new(),
            error: None,
        }
    }
}

impl BootstrapState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub(crate) fn set_progress(&mut self, progress: u8, message: &str) {
        self.progress = progress.min(100);
        message.clone_into(&mut self.message);
    }

    /// Replace the identity from a session (or its absence). Drops any
    /// profile belonging to a previous user.
    pub(crate) fn set_session(&mut self, session: Option<Session>) {
        let user = session.as_ref().map(|s| s.user.clone());
        if self.profile.as_ref().map(|p| p.id) != user.as_ref().map(|u| u.id) {
            self.profile = None;
        }
        self.user = user;
        self.session = session;
    }

    /// Attach a profile. Ignored unless it belongs to the current user.
    pub(crate) fn set_profile(&mut self, profile: Profile) -> bool {
        if self.user.as_ref().map(|u| u.id) != Some(profile.id) {
            return false;
        }
        self.profile = Some(profile);
        true
    }

    /// Revert to the unauthenticated state.
    pub(crate) fn demote(&mut self) {
        self.session = None;
        self.user = None;
        self.profile = None;
    }

    /// The single exit point of initialization.
    pub(crate) fn finish(&mut self) {
        self.set_progress(100, MSG_READY);
        self.loading = false;
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
