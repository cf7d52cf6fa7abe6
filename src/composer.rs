use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    access::{self, Capability, Decision, Notice},
    models::{Breadcrumb, NavItem, Permission, PermissionAction, SessionState},
    registry::{ResourceMapEntry, ResourceRegistry, Section},
    skeleton::Skeleton,
};

const LABEL_DETAIL: &str = "Chi tiết";
const LABEL_CREATE: &str = "Tạo mới";
const LABEL_EDIT: &str = "Chỉnh sửa";
const LABEL_NOT_FOUND: &str = "Không tìm thấy";

/// Action
///
/// What the viewer wants to do with a resource. `id` is opaque: it is passed to the
/// feature view untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
#[ts(export)]
pub enum Action {
    List,
    Detail { id: String },
    Create,
    Edit { id: String },
}

/// Discriminant of `Action`, used as the feature-view registration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    List,
    Detail,
    Create,
    Edit,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::List,
        ActionKind::Detail,
        ActionKind::Create,
        ActionKind::Edit,
    ];
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::List => ActionKind::List,
            Action::Detail { .. } => ActionKind::Detail,
            Action::Create => ActionKind::Create,
            Action::Edit { .. } => ActionKind::Edit,
        }
    }

    /// list/detail read, create/edit write.
    pub fn permission_action(&self) -> PermissionAction {
        match self {
            Action::List | Action::Detail { .. } => PermissionAction::Read,
            Action::Create | Action::Edit { .. } => PermissionAction::Write,
        }
    }

    fn skeleton(&self, entry: &ResourceMapEntry) -> Skeleton {
        match self {
            Action::List => Skeleton::table(entry.skeleton),
            Action::Detail { .. } => Skeleton::detail(entry.skeleton),
            Action::Create | Action::Edit { .. } => Skeleton::form(entry.skeleton),
        }
    }
}

/// AdminRoute
///
/// A parsed `<resourceKey>[/<id>][/edit|/new]` path below the section prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminRoute {
    pub key: String,
    pub action: Action,
}

impl AdminRoute {
    pub fn new(key: impl Into<String>, action: Action) -> Self {
        Self {
            key: key.into(),
            action,
        }
    }

    /// parse
    ///
    /// `users` → list, `users/new` → create, `users/42` → detail,
    /// `users/42/edit` → edit. Anything else is `None`. Leading and trailing
    /// slashes are ignored. `new` always means create, never an id, so
    /// `users/new/edit` is `None`. `.` and `..` are never a key or an id.
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        if segments
            .iter()
            .any(|segment| matches!(*segment, "" | "." | ".."))
        {
            return None;
        }

        let action = match segments.as_slice() {
            [_, "new", "edit"] => return None,
            [_] => Action::List,
            [_, "new"] => Action::Create,
            [_, id] => Action::Detail { id: id.to_string() },
            [_, id, "edit"] => Action::Edit { id: id.to_string() },
            _ => return None,
        };
        Some(Self::new(segments[0], action))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct HeaderAction {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct HeaderConfig {
    pub title: String,
    /// Empty whenever the body is a notice or a pending placeholder.
    pub actions: Vec<HeaderAction>,
}

/// The feature view a deferred body will be filled by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ViewTarget {
    pub resource_key: String,
    pub resource_name: String,
    pub action: Action,
}

/// BodySlot
///
/// What goes below the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum BodySlot {
    /// Access was not granted (or the route does not exist).
    Notice { notice: Notice },
    /// The session is still resolving; show a placeholder, decide later.
    Loading { skeleton: Skeleton },
    /// Allowed: show `skeleton` until the feature view for `target` has its data.
    Deferred { skeleton: Skeleton, target: ViewTarget },
    /// The section dashboard.
    Navigation { items: Vec<NavItem> },
}

/// RenderPlan
///
/// Everything a page needs, decided before any feature view runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RenderPlan {
    pub breadcrumbs: Vec<Breadcrumb>,
    pub header: HeaderConfig,
    pub navigation: Vec<NavItem>,
    pub body: BodySlot,
}

impl RenderPlan {
    pub fn status(&self) -> StatusCode {
        match &self.body {
            BodySlot::Notice { notice } => notice.status(),
            _ => StatusCode::OK,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        match &self.body {
            BodySlot::Notice { notice } => Some(notice),
            _ => None,
        }
    }
}

/// RouteComposer
///
/// Turns (session, route) into a `RenderPlan`: registry resolution, breadcrumbs,
/// access check, then either a notice or a deferred feature-view body.
pub struct RouteComposer<'a> {
    registry: &'a ResourceRegistry,
}

impl<'a> RouteComposer<'a> {
    pub fn new(registry: &'a ResourceRegistry) -> Self {
        Self { registry }
    }

    /// compose
    ///
    /// Disabled and absent keys produce the identical not-found plan.
    pub fn compose(&self, session: &SessionState, route: &AdminRoute) -> RenderPlan {
        let Some(entry) = self.registry.routable(&route.key) else {
            tracing::debug!(key = %route.key, "no routable resource");
            return self.not_found();
        };

        let section = self.registry.section();
        let breadcrumbs = build_breadcrumbs(section, entry, &route.action);
        let required = Capability::Permission(Permission::for_resource(
            &entry.resource_name,
            route.action.permission_action(),
        ));
        let decision = access::evaluate(session, &required);

        let mut header = HeaderConfig {
            title: page_title(entry, &route.action),
            actions: Vec::new(),
        };
        let body = match decision {
            Decision::Allowed => {
                header.actions = self.header_actions(session, entry, &route.action);
                BodySlot::Deferred {
                    skeleton: route.action.skeleton(entry),
                    target: ViewTarget {
                        resource_key: entry.key.clone(),
                        resource_name: entry.resource_name.clone(),
                        action: route.action.clone(),
                    },
                }
            }
            Decision::Pending => BodySlot::Loading {
                skeleton: route.action.skeleton(entry),
            },
            denied => self.notice_body(denied, &required),
        };

        RenderPlan {
            breadcrumbs,
            header,
            navigation: self.navigation(session),
            body,
        }
    }

    /// compose_dashboard
    ///
    /// The section root: the section crumb alone (active) and the navigation list.
    pub fn compose_dashboard(&self, session: &SessionState) -> RenderPlan {
        let section = self.registry.section();
        let required = Capability::Authenticated;
        let navigation = self.navigation(session);

        let body = match access::evaluate(session, &required) {
            Decision::Allowed => BodySlot::Navigation {
                items: navigation.clone(),
            },
            Decision::Pending => BodySlot::Loading {
                skeleton: Skeleton::table(Default::default()),
            },
            denied => self.notice_body(denied, &required),
        };

        RenderPlan {
            breadcrumbs: vec![Breadcrumb::active(section.label.clone())],
            header: HeaderConfig {
                title: section.label.clone(),
                actions: Vec::new(),
            },
            navigation,
            body,
        }
    }

    /// The plan for unknown paths, unknown keys and disabled keys alike.
    pub fn not_found(&self) -> RenderPlan {
        let section = self.registry.section();
        RenderPlan {
            breadcrumbs: vec![
                Breadcrumb::link(section.label.clone(), section.href()),
                Breadcrumb::active(LABEL_NOT_FOUND),
            ],
            header: HeaderConfig {
                title: LABEL_NOT_FOUND.to_string(),
                actions: Vec::new(),
            },
            navigation: Vec::new(),
            body: BodySlot::Notice {
                notice: Notice::NotFound,
            },
        }
    }

    /// navigation
    ///
    /// Enabled resources the session may read, in registry order. Empty for viewers
    /// without a resolved session.
    pub fn navigation(&self, session: &SessionState) -> Vec<NavItem> {
        if session.session().is_none() {
            return Vec::new();
        }
        let section = self.registry.section();
        self.registry
            .visible()
            .filter(|entry| {
                let read = Capability::Permission(Permission::for_resource(
                    &entry.resource_name,
                    PermissionAction::Read,
                ));
                access::evaluate(session, &read).is_allowed()
            })
            .map(|entry| NavItem {
                key: entry.key.clone(),
                label: entry.label.clone(),
                href: resource_href(section, entry),
            })
            .collect()
    }

    fn notice_body(&self, decision: Decision, required: &Capability) -> BodySlot {
        let notice =
            Notice::from_decision(decision, required, &self.registry.section().href())
                .unwrap_or(Notice::NotFound);
        BodySlot::Notice { notice }
    }

    fn header_actions(
        &self,
        session: &SessionState,
        entry: &ResourceMapEntry,
        action: &Action,
    ) -> Vec<HeaderAction> {
        let write = Capability::Permission(Permission::for_resource(
            &entry.resource_name,
            PermissionAction::Write,
        ));
        if !access::evaluate(session, &write).is_allowed() {
            return Vec::new();
        }

        let base = resource_href(self.registry.section(), entry);
        match action {
            Action::List => vec![HeaderAction {
                label: LABEL_CREATE.to_string(),
                href: format!("{}/new", base),
            }],
            Action::Detail { id } => vec![HeaderAction {
                label: LABEL_EDIT.to_string(),
                href: format!("{}/{}/edit", base, id),
            }],
            Action::Create | Action::Edit { .. } => Vec::new(),
        }
    }
}

/// `/admin/users`
pub fn resource_href(section: &Section, entry: &ResourceMapEntry) -> String {
    format!("{}/{}", section.href(), entry.key)
}

/// build_breadcrumbs
///
/// Section crumb (inactive, linked), then either the resource label as the active leaf
/// (list) or the linked resource list followed by the active action leaf.
pub fn build_breadcrumbs(
    section: &Section,
    entry: &ResourceMapEntry,
    action: &Action,
) -> Vec<Breadcrumb> {
    let mut trail = vec![Breadcrumb::link(section.label.clone(), section.href())];
    let leaf = match action {
        Action::List => {
            trail.push(Breadcrumb::active(entry.label.clone()));
            return trail;
        }
        Action::Detail { .. } => LABEL_DETAIL,
        Action::Create => LABEL_CREATE,
        Action::Edit { .. } => LABEL_EDIT,
    };
    trail.push(Breadcrumb::link(
        entry.label.clone(),
        resource_href(section, entry),
    ));
    trail.push(Breadcrumb::active(leaf));
    trail
}

fn page_title(entry: &ResourceMapEntry, action: &Action) -> String {
    let subject = entry.label.to_lowercase();
    match action {
        Action::List => entry.label.clone(),
        Action::Detail { .. } => format!("{} {}", LABEL_DETAIL, subject),
        Action::Create => format!("{} {}", LABEL_CREATE, subject),
        Action::Edit { .. } => format!("{} {}", LABEL_EDIT, subject),
    }
}
