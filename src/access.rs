//! Access Control Evaluator
//!
//! Pure decision logic mapping a resolved `SessionState` and a required `Capability`
//! to a `Decision`. No I/O, no side effects besides `debug` logging of denials.
//! Callers turn non-allowed decisions into a `Notice` and render it; nothing here
//! redirects or throws.

use std::fmt;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::models::{Permission, SessionState};

/// Capability
///
/// What a route demands from the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    /// No requirement at all.
    Public,
    /// Any resolved session.
    Authenticated,
    /// Only viewers without a session (sign-in / sign-up forms).
    GuestOnly,
    Permission(Permission),
    Role(String),
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Public => f.write_str("public"),
            Capability::Authenticated => f.write_str("authenticated"),
            Capability::GuestOnly => f.write_str("guest-only"),
            Capability::Permission(permission) => write!(f, "permission:{}", permission),
            Capability::Role(role) => write!(f, "role:{}", role),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthenticatedReason {
    /// No session: anonymous viewer, expired or invalid token.
    NoSession,
    /// The session provider failed; the viewer may well be signed in.
    SessionError,
}

/// Decision
///
/// Outcome of an access check. `Pending` is only produced while the session is still
/// loading, so the UI shows a placeholder instead of a premature denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Pending,
    Unauthenticated(UnauthenticatedReason),
    Forbidden,
    AlreadyAuthenticated,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

/// evaluate
///
/// Decides whether `state` satisfies `required`.
pub fn evaluate(state: &SessionState, required: &Capability) -> Decision {
    let decision = match (state, required) {
        (_, Capability::Public) => Decision::Allowed,
        (SessionState::Loading, _) => Decision::Pending,

        (SessionState::Authenticated(_), Capability::GuestOnly) => Decision::AlreadyAuthenticated,
        (_, Capability::GuestOnly) => Decision::Allowed,

        (SessionState::Unauthenticated, _) => {
            Decision::Unauthenticated(UnauthenticatedReason::NoSession)
        }
        (SessionState::Failed(_), _) => {
            Decision::Unauthenticated(UnauthenticatedReason::SessionError)
        }

        (SessionState::Authenticated(_), Capability::Authenticated) => Decision::Allowed,
        (SessionState::Authenticated(session), Capability::Permission(permission)) => {
            if session.has_permission(permission) {
                Decision::Allowed
            } else {
                Decision::Forbidden
            }
        }
        (SessionState::Authenticated(session), Capability::Role(role)) => {
            if session.has_role(role) {
                Decision::Allowed
            } else {
                Decision::Forbidden
            }
        }
    };

    if !matches!(decision, Decision::Allowed | Decision::Pending) {
        tracing::debug!(capability = %required, ?decision, "access denied");
    }
    decision
}

/// Notice
///
/// A determinate, labelled outcome rendered in place of a page body. Each variant has a
/// stable `label` that tests and assistive tech can target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "notice", rename_all = "snake_case")]
#[ts(export)]
pub enum Notice {
    NotFound,
    Unauthenticated {
        session_error: bool,
        sign_in_href: String,
    },
    Forbidden {
        required: String,
    },
    AlreadyAuthenticated {
        redirect_to: String,
    },
    /// The feature view failed to load its data.
    LoadFailed,
}

pub const SIGN_IN_HREF: &str = "/auth/sign-in";

impl Notice {
    /// Maps a non-allowed decision to its notice. `Allowed` and `Pending` have none.
    pub fn from_decision(
        decision: Decision,
        required: &Capability,
        home_href: &str,
    ) -> Option<Notice> {
        match decision {
            Decision::Allowed | Decision::Pending => None,
            Decision::Unauthenticated(reason) => Some(Notice::Unauthenticated {
                session_error: reason == UnauthenticatedReason::SessionError,
                sign_in_href: SIGN_IN_HREF.to_string(),
            }),
            Decision::Forbidden => Some(Notice::Forbidden {
                required: match required {
                    Capability::Permission(permission) => permission.to_string(),
                    other => other.to_string(),
                },
            }),
            Decision::AlreadyAuthenticated => Some(Notice::AlreadyAuthenticated {
                redirect_to: home_href.to_string(),
            }),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Notice::NotFound => "not-found",
            Notice::Unauthenticated { .. } => "unauthenticated",
            Notice::Forbidden { .. } => "forbidden",
            Notice::AlreadyAuthenticated { .. } => "already-authenticated",
            Notice::LoadFailed => "load-failed",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Notice::NotFound => StatusCode::NOT_FOUND,
            Notice::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Notice::Forbidden { .. } => StatusCode::FORBIDDEN,
            Notice::AlreadyAuthenticated { .. } => StatusCode::SEE_OTHER,
            Notice::LoadFailed => StatusCode::BAD_GATEWAY,
        }
    }
}
