//! Session bootstrap. Resolves the signed-in user and profile at startup and
//! tracks auth changes for the rest of the process.
//!
//! ARCHITECTURE
//! ============
//! Two tasks write one `watch` channel:
//! - the initialization task runs exactly once: session check (bounded by
//!   [`timeout::race`]), profile fetch, then `finish()` unconditionally;
//! - the listener task drains the provider's [`Subscription`] and applies
//!   each notification in order.
//!
//! Every write goes through `send_modify`, so observers only ever see whole
//! transitions.
//!
//! ORDERING
//! ========
//! Each applied notification bumps an identity epoch. Initialization captures
//! the epoch before its session check and only writes identity fields while it
//! is unchanged; a notification that lands mid-initialization wins.
//!
//! LIFECYCLE
//! =========
//! [`SessionBootstrapper::start`] acquires the subscription;
//! [`SessionBootstrapper::stop`] (or drop) releases it.

pub mod error;
pub mod state;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::auth::{AuthError, AuthProvider, Session, Subscription};
use crate::profile::{Profile, ProfileStore};
use crate::timeout;
pub use error::BootstrapError;
pub use state::{BootstrapState, DemotionPolicy};
use state::{MSG_CHECKING_SESSION, MSG_FETCHING_PROFILE, MSG_NO_SESSION, MSG_PROFILE_ERROR, MSG_PROFILE_LOADED};

pub const DEFAULT_SESSION_TIMEOUT_MS: u64 = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// Bound on the initial session check.
    pub session_timeout: Duration,
    pub demotion: DemotionPolicy,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self { session_timeout: Duration::from_millis(DEFAULT_SESSION_TIMEOUT_MS), demotion: DemotionPolicy::default() }
    }
}

// =============================================================================
// SHARED CONTEXT
// =============================================================================

struct Shared {
    state: watch::Sender<BootstrapState>,
    epoch: AtomicU64,
    auth: Arc<dyn AuthProvider>,
    profiles: Arc<dyn ProfileStore>,
    config: BootstrapConfig,
}

impl Shared {
    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn update(&self, f: impl FnOnce(&mut BootstrapState)) {
        self.state.send_modify(|s| {
            f(s);
            debug!(progress = s.progress, message = %s.message, authenticated = s.is_authenticated(), "bootstrap state");
        });
    }
}

// =============================================================================
// BOOTSTRAPPER
// =============================================================================

/// Owner of the process-wide [`BootstrapState`].
pub struct SessionBootstrapper {
    shared: Arc<Shared>,
    init: Option<JoinHandle<()>>,
    listener: Option<JoinHandle<()>>,
}

impl SessionBootstrapper {
    /// Begin initialization and register the auth-change listener.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn start(auth: Arc<dyn AuthProvider>, profiles: Arc<dyn ProfileStore>, config: BootstrapConfig) -> Self {
        let (state, _) = watch::channel(BootstrapState::default());
        let shared = Arc::new(Shared { state, epoch: AtomicU64::new(0), auth, profiles, config });

        let init = tokio::spawn(initialize(shared.clone()));
        let subscription = shared.auth.subscribe();
        let listener = tokio::spawn(listen(shared.clone(), subscription));

        Self { shared, init: Some(init), listener: Some(listener) }
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> BootstrapState {
        self.shared.state.borrow().clone()
    }

    /// Reactive view; `changed()` fires on every transition.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<BootstrapState> {
        self.shared.state.subscribe()
    }

    /// Wait until initialization has finished (`loading == false`).
    pub async fn ready(&self) -> BootstrapState {
        let mut rx = self.watch();
        match rx.wait_for(|s| !s.loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.snapshot(),
        }
    }

    /// Sign out through the provider. State follows via the listener.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if sign-out fails.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.shared.auth.sign_out().await
    }

    /// Release the auth subscription and stop both tasks. Once this returns,
    /// no further notification can touch the state.
    pub async fn stop(mut self) {
        for handle in [self.listener.take(), self.init.take()].into_iter().flatten() {
            handle.abort();
            let _ = handle.await;
        }
        info!("session bootstrapper stopped");
    }
}

impl Drop for SessionBootstrapper {
    fn drop(&mut self) {
        for handle in [self.listener.take(), self.init.take()].into_iter().flatten() {
            handle.abort();
        }
    }
}

// =============================================================================
// INITIALIZATION
// =============================================================================

async fn initialize(shared: Arc<Shared>) {
    let epoch = shared.epoch();
    shared.update(|s| s.set_progress(25, MSG_CHECKING_SESSION));

    if let Err(err) = resolve_initial(&shared, epoch).await {
        error!(error = %err, code = err.code(), "session bootstrap failed");
        shared.update(|s| {
            if shared.epoch() == epoch {
                s.demote();
            }
            s.message = err.to_string();
            s.error = Some(err);
        });
    }

    // Let observers see the last step before finish.
    tokio::task::yield_now().await;
    shared.update(BootstrapState::finish);
    info!(authenticated = shared.state.borrow().is_authenticated(), "application ready");
}

async fn resolve_initial(shared: &Shared, epoch: u64) -> Result<(), BootstrapError> {
    let auth = shared.auth.clone();
    let bound = shared.config.session_timeout;
    let bound_ms = u64::try_from(bound.as_millis()).unwrap_or(u64::MAX);
    let session = timeout::race(
        async move { auth.current_session().await.map_err(BootstrapError::from) },
        bound,
        BootstrapError::Timeout { bound_ms },
    )
    .await?;

    let Some(session) = session else {
        shared.update(|s| {
            if shared.epoch() == epoch {
                s.set_session(None);
            }
            s.set_progress(75, MSG_NO_SESSION);
        });
        return Ok(());
    };

    let user_id = session.user.id;
    shared.update(|s| {
        if shared.epoch() == epoch {
            s.set_session(Some(session));
        }
        s.set_progress(50, MSG_FETCHING_PROFILE);
    });

    match fetch_profile(shared, user_id).await {
        Ok(profile) => shared.update(|s| {
            if shared.epoch() == epoch && !s.set_profile(profile) {
                warn!(%user_id, "profile id does not match session user");
            }
            s.set_progress(75, MSG_PROFILE_LOADED);
        }),
        Err(err @ BootstrapError::ProfileFetch { .. }) => shared.update(|s| {
            if shared.epoch() == epoch {
                s.demote();
            }
            MSG_PROFILE_ERROR.clone_into(&mut s.message);
            s.error = Some(err);
        }),
        Err(err) => return Err(err),
    }
    Ok(())
}

// =============================================================================
// AUTH-CHANGE LISTENER
// =============================================================================

async fn listen(shared: Arc<Shared>, mut subscription: Subscription) {
    while let Some(session) = subscription.recv().await {
        apply_change(&shared, session).await;
    }
    debug!("auth listener closed");
}

/// Apply one notification. Never touches progress, message, or loading.
async fn apply_change(shared: &Shared, session: Option<Session>) {
    let user_id = session.as_ref().map(|s| s.user.id);
    shared.update(|s| {
        shared.epoch.fetch_add(1, Ordering::SeqCst);
        if session.is_none() {
            s.error = None;
        }
        s.set_session(session);
    });

    let Some(user_id) = user_id else {
        info!("auth change: signed out");
        return;
    };
    info!(%user_id, "auth change: signed in");

    match fetch_profile(shared, user_id).await {
        Ok(profile) => shared.update(|s| {
            if s.set_profile(profile) {
                s.error = None;
            } else {
                warn!(%user_id, "profile id does not match session user");
            }
        }),
        Err(err) => {
            let demotion = shared.config.demotion;
            shared.update(|s| {
                s.profile = None;
                if demotion == DemotionPolicy::Always {
                    s.demote();
                }
                s.error = Some(err);
            });
        }
    }
}

/// Fetch on a separate task so a panicking store surfaces as
/// [`BootstrapError::Unknown`] instead of unwinding the caller.
async fn fetch_profile(shared: &Shared, user_id: Uuid) -> Result<Profile, BootstrapError> {
    let profiles = shared.profiles.clone();
    match tokio::spawn(async move { profiles.fetch_by_id(user_id).await }).await {
        Ok(Ok(profile)) => Ok(profile),
        Ok(Err(e)) => {
            error!(error = %e, %user_id, "error fetching profile");
            Err(BootstrapError::profile_fetch(user_id, &e))
        }
        Err(e) => {
            error!(error = %e, %user_id, "profile fetch task failed");
            Err(BootstrapError::from(e))
        }
    }
}

#[cfg(test)]
#[path = "bootstrap_test.rs"]
mod tests;
