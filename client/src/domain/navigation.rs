//! Session-gated access decisions for views.

use super::SessionState;

/// Access a view requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    /// Anyone, signed in or not.
    Public,
    /// Any signed-in user.
    Authenticated,
    /// Signed-in administrators only.
    Administrative,
}

/// Where a refused visitor is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    /// Login entry point.
    Login,
    /// Student dashboard.
    Dashboard,
}

impl RouteTarget {
    /// Path of the target view.
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
        }
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Render the view.
    Allow,
    /// Session still resolving; render a neutral placeholder.
    Pending,
    /// Navigate elsewhere.
    Redirect(RouteTarget),
}

/// Decide whether `state` may open a view requiring `required`.
///
/// Protected views never redirect while the session is resolving.
///
/// # Examples
/// ```
/// use portal_client::domain::{guard, AccessLevel, GuardDecision, RouteTarget, SessionState};
///
/// assert_eq!(guard(&SessionState::Resolving, AccessLevel::Authenticated), GuardDecision::Pending);
/// assert_eq!(
///     guard(&SessionState::Anonymous, AccessLevel::Authenticated),
///     GuardDecision::Redirect(RouteTarget::Login)
/// );
/// ```
pub fn guard(state: &SessionState, required: AccessLevel) -> GuardDecision {
    match (required, state) {
        (AccessLevel::Public, _) => GuardDecision::Allow,
        (_, SessionState::Resolving) => GuardDecision::Pending,
        (_, SessionState::Anonymous) => GuardDecision::Redirect(RouteTarget::Login),
        (AccessLevel::Authenticated, SessionState::Authenticated(_)) => GuardDecision::Allow,
        (AccessLevel::Administrative, SessionState::Authenticated(session)) => {
            if session.identity.is_admin() {
                GuardDecision::Allow
            } else {
                GuardDecision::Redirect(RouteTarget::Dashboard)
            }
        }
    }
}
