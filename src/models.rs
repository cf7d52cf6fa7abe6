use std::{collections::BTreeSet, fmt, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::SessionError;

// --- Identity & Capability Schemas ---

/// Permission
///
/// An opaque capability string. By convention `resource:action`, e.g. `users:read`.
/// Compared by exact string equality; there is no wildcard expansion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(String);

/// PermissionAction
///
/// The two actions the admin console gates on: reading (list/detail pages) and
/// writing (create/edit pages).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    Read,
    Write,
}

impl PermissionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionAction::Read => "read",
            PermissionAction::Write => "write",
        }
    }
}

impl Permission {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Builds the `resource_name:action` permission guarding a resource.
    pub fn for_resource(resource_name: &str, action: PermissionAction) -> Self {
        Self(format!("{}:{}", resource_name, action.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role
///
/// A coarse grouping attached to a session. Permissions are the enforcement unit;
/// roles are only consulted by routes that explicitly require one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Session
///
/// The resolved identity and capability snapshot of the current viewer.
/// Built by a `SessionProvider` for a single request and never mutated afterwards;
/// a refreshed session is a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub permissions: BTreeSet<Permission>,
    pub roles: BTreeSet<Role>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            email: None,
            permissions: BTreeSet::new(),
            roles: BTreeSet::new(),
            expires_at: None,
        }
    }

    pub fn with_permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Permission::new));
        self
    }

    pub fn with_roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Role::new));
        self
    }

    pub fn has_permission(&self, permission: &Permission) -> bool {
        self.permissions.contains(permission)
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|role| role.name == name)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| expires <= now)
    }
}

/// SessionState
///
/// What the access evaluator is allowed to observe: either still loading, or a fully
/// resolved snapshot. A partially-populated session is not representable.
#[derive(Debug, Clone)]
pub enum SessionState {
    Loading,
    Unauthenticated,
    Authenticated(Arc<Session>),
    /// The provider failed. Treated as unauthenticated for decisions, reported distinctly.
    Failed(SessionError),
}

impl SessionState {
    pub fn session(&self) -> Option<&Arc<Session>> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

impl From<Option<Session>> for SessionState {
    fn from(session: Option<Session>) -> Self {
        match session {
            Some(session) => SessionState::Authenticated(Arc::new(session)),
            None => SessionState::Unauthenticated,
        }
    }
}

// --- Navigation Schemas (Output) ---

/// Breadcrumb
///
/// One step of the trail rendered above a page body. In every trail produced by the
/// route composer exactly one entry is active, and it is the last one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Breadcrumb {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    pub is_active: bool,
}

impl Breadcrumb {
    pub fn link(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: Some(href.into()),
            is_active: false,
        }
    }

    pub fn active(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: None,
            is_active: true,
        }
    }
}

/// NavItem
///
/// A sidebar entry pointing at a resource list the viewer may read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NavItem {
    pub key: String,
    pub label: String,
    pub href: String,
}
