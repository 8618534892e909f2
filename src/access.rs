//! Role-gated access decisions over the bootstrap state.

use crate::bootstrap::BootstrapState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Bootstrap still running; decide later.
    Pending,
    Denied,
    Granted,
}

/// Decide whether the resolved profile may enter an area restricted to `allowed_roles`.
#[must_use]
pub fn authorize(state: &BootstrapState, allowed_roles: &[&str]) -> Access {
    if state.loading {
        return Access::Pending;
    }
    match &state.profile {
        Some(profile) if allowed_roles.iter().any(|role| profile.has_role(role)) => Access::Granted,
        _ => Access::Denied,
    }
}
