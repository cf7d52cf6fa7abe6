use std::convert::Infallible;

use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use futures_util::{StreamExt, future, stream};

use crate::{
    AppConfig, AppState,
    access::{self, Capability, Decision, Notice, SIGN_IN_HREF},
    auth::{CurrentSession, clear_session_cookie},
    composer::{AdminRoute, BodySlot, RenderPlan, ViewTarget, resource_href},
    error::ViewError,
    models::NavItem,
    render::AuthForm,
    skeleton::Skeleton,
    views::ViewRequest,
};

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

// --- Public Handlers ---

/// health
///
/// Liveness probe for load balancers and monitoring.
pub async fn health() -> &'static str {
    "ok"
}

/// root
///
/// The site root has no page of its own; send viewers to the section dashboard.
pub async fn root(State(state): State<AppState>) -> Redirect {
    Redirect::to(&state.registry.section().href())
}

/// sign_out
///
/// Drops the session cookie and returns to the sign-in form. The session itself is
/// owned by the auth provider; nothing is revoked here.
pub async fn sign_out(State(config): State<AppConfig>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, clear_session_cookie(&config.session_cookie))],
        Redirect::to(SIGN_IN_HREF),
    )
}

// --- Guest-Only Handlers ---

pub async fn sign_in_page(State(state): State<AppState>, session: CurrentSession) -> Response {
    auth_page(&state, &session, AuthForm::SignIn)
}

pub async fn sign_up_page(State(state): State<AppState>, session: CurrentSession) -> Response {
    auth_page(&state, &session, AuthForm::SignUp)
}

/// Renders an auth form, or redirects home when the viewer is already signed in.
fn auth_page(state: &AppState, session: &CurrentSession, form: AuthForm) -> Response {
    let home = state.registry.section().href();
    if access::evaluate(&session.state, &Capability::GuestOnly) == Decision::AlreadyAuthenticated {
        return Redirect::to(&home).into_response();
    }

    match state
        .renderer
        .auth_form(form, &state.config.auth_provider_url, &home)
    {
        Ok(html) => Html(html).into_response(),
        Err(e) => render_failure(e),
    }
}

// --- Admin Console Handlers ---

/// admin_dashboard
///
/// The section root: navigation for the viewer, or a notice when not signed in.
pub async fn admin_dashboard(State(state): State<AppState>, session: CurrentSession) -> Response {
    let plan = state.composer().compose_dashboard(&session.state);
    page_response(&state, &plan)
}

/// admin_page
///
/// Every resource page below the section prefix. Paths that do not parse, unknown keys
/// and disabled keys all render the same not-found page.
///
/// An allowed page is streamed: first the shell with the skeleton, then the finished
/// content once the feature view has loaded it.
pub async fn admin_page(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(path): Path<String>,
) -> Response {
    let plan = compose_path(&state, &session, &path);
    match &plan.body {
        BodySlot::Deferred { skeleton, target } => {
            deferred_page(&state, &plan, skeleton, target, session)
        }
        _ => page_response(&state, &plan),
    }
}

fn compose_path(state: &AppState, session: &CurrentSession, path: &str) -> RenderPlan {
    let composer = state.composer();
    match AdminRoute::parse(path) {
        Some(route) => composer.compose(&session.state, &route),
        None => {
            tracing::debug!(path, "unparseable admin path");
            composer.not_found()
        }
    }
}

/// page_response
///
/// A complete, non-streamed page with the status the plan maps to.
fn page_response(state: &AppState, plan: &RenderPlan) -> Response {
    if let Some(Notice::AlreadyAuthenticated { redirect_to }) = plan.notice() {
        return Redirect::to(redirect_to).into_response();
    }
    match state.renderer.full_page(plan) {
        Ok(html) => (plan.status(), Html(html)).into_response(),
        Err(e) => render_failure(e),
    }
}

/// deferred_page
///
/// 1. Resolve the feature view registered for the target; none means not-found.
/// 2. Render the shell with the skeleton as the first chunk.
/// 3. Load the content, then send it in one chunk that replaces the skeleton whole.
fn deferred_page(
    state: &AppState,
    plan: &RenderPlan,
    skeleton: &Skeleton,
    target: &ViewTarget,
    session: CurrentSession,
) -> Response {
    let kind = target.action.kind();
    let Some(view) = state.views.get(&target.resource_name, kind) else {
        tracing::error!(resource = %target.resource_name, action = ?kind, "no feature view registered");
        return page_response(state, &state.composer().not_found());
    };
    let Some(entry) = state.registry.routable(&target.resource_key).cloned() else {
        return page_response(state, &state.composer().not_found());
    };

    let head = match state.renderer.deferred_open(plan, skeleton) {
        Ok(head) => head,
        Err(e) => return render_failure(e),
    };

    let request = ViewRequest {
        base_href: resource_href(state.registry.section(), &entry),
        entry,
        action: target.action.clone(),
        session: session.state.session().cloned(),
        token: session.token,
    };
    let renderer = state.renderer.clone();

    let tail = async move {
        let loaded = view.load(&request).await;
        match &loaded {
            Ok(_) | Err(ViewError::NotFound) => {}
            Err(e) => {
                tracing::warn!(error = %e, resource = %request.entry.resource_name, "feature view failed to load");
            }
        }
        let body = renderer.deferred_body(&loaded);
        Ok::<_, Infallible>(renderer.deferred_ready(&body))
    };

    let chunks = stream::once(future::ready(Ok::<_, Infallible>(head))).chain(stream::once(tail));
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, HTML_CONTENT_TYPE)],
        Body::from_stream(chunks),
    )
        .into_response()
}

fn render_failure(err: ViewError) -> Response {
    tracing::error!(error = %err, "page render failed");
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

// --- JSON API Handlers ---

/// get_render_plan
///
/// The plan a resource page would be rendered from, with the same status mapping as
/// the HTML page. Lets a client-side shell reuse the server's access decisions.
#[utoipa::path(
    get,
    path = "/api/admin/{path}",
    params(("path" = String, Path, description = "Resource path, e.g. `users/42/edit`")),
    responses(
        (status = 200, description = "Access granted", body = RenderPlan),
        (status = 401, description = "No session or session error", body = RenderPlan),
        (status = 403, description = "Missing permission", body = RenderPlan),
        (status = 404, description = "Unknown or disabled resource", body = RenderPlan)
    )
)]
pub async fn get_render_plan(
    State(state): State<AppState>,
    session: CurrentSession,
    Path(path): Path<String>,
) -> (StatusCode, Json<RenderPlan>) {
    let plan = compose_path(&state, &session, &path);
    (plan.status(), Json(plan))
}

/// get_resources
///
/// Navigation entries the viewer may read.
#[utoipa::path(
    get,
    path = "/api/resources",
    responses(
        (status = 200, description = "Readable resources", body = [NavItem]),
        (status = 401, description = "Not signed in", body = Notice)
    )
)]
pub async fn get_resources(State(state): State<AppState>, session: CurrentSession) -> Response {
    let required = Capability::Authenticated;
    let decision = access::evaluate(&session.state, &required);
    let home = state.registry.section().href();
    if let Some(notice) = Notice::from_decision(decision, &required, &home) {
        return (notice.status(), Json(notice)).into_response();
    }
    Json(state.composer().navigation(&session.state)).into_response()
}
