use std::sync::Arc;

use axum::{Router, extract::FromRef, http::HeaderName};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core decision logic: no I/O.
pub mod access;
pub mod composer;
pub mod models;
pub mod registry;
pub mod skeleton;

// Boundaries to the outside world.
pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod views;

// HTTP surface.
pub mod handlers;
pub mod render;
pub mod routes;
use routes::{admin, api, guest, public};

// --- Public Re-exports ---

pub use auth::{JwtSessionProvider, RemoteSessionProvider, SessionProviderState};
pub use backend::{BackendState, HttpBackendApi};
pub use composer::RouteComposer;
pub use config::AppConfig;
pub use registry::ResourceRegistry;

use error::ViewError;
use render::PageRenderer;
use views::FeatureViews;

/// ApiDoc
///
/// OpenAPI document for the JSON endpoints, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::get_render_plan, handlers::get_resources),
    components(schemas(
        composer::RenderPlan, composer::BodySlot, composer::HeaderConfig,
        composer::HeaderAction, composer::ViewTarget, composer::Action,
        access::Notice, models::Breadcrumb, models::NavItem,
        skeleton::Skeleton, skeleton::SkeletonSpec, skeleton::SkeletonKind,
    )),
    tags(
        (name = "cms-portal", description = "Admin console render plans and navigation")
    )
)]
struct ApiDoc;

/// AppState
///
/// Everything a request handler may need, cloned cheaply per request.
#[derive(Clone)]
pub struct AppState {
    /// Resolves tokens into sessions.
    pub sessions: SessionProviderState,
    /// Resource data source for the feature views.
    pub backend: BackendState,
    /// The immutable resource map, validated at startup.
    pub registry: Arc<ResourceRegistry>,
    pub views: Arc<FeatureViews>,
    pub renderer: Arc<PageRenderer>,
    pub config: AppConfig,
}

impl AppState {
    /// new
    ///
    /// Wires the default feature views for every enabled resource and compiles the
    /// page templates. Fails only when a bundled template does not compile.
    pub fn new(
        config: AppConfig,
        registry: ResourceRegistry,
        sessions: SessionProviderState,
        backend: BackendState,
    ) -> Result<Self, ViewError> {
        let views = FeatureViews::with_backend(&registry, backend.clone());
        Ok(Self {
            sessions,
            backend,
            registry: Arc::new(registry),
            views: Arc::new(views),
            renderer: Arc::new(PageRenderer::new()?),
            config,
        })
    }

    pub fn composer(&self) -> RouteComposer<'_> {
        RouteComposer::new(&self.registry)
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for SessionProviderState {
    fn from_ref(app_state: &AppState) -> SessionProviderState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for BackendState {
    fn from_ref(app_state: &AppState) -> BackendState {
        app_state.backend.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing tree, applies the observability layers and registers the state.
/// Resource pages live under the registry's section slug (`/admin` by default).
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let section_href = state.registry.section().href();

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // Sign-in / sign-up: the guest-only check happens in the handlers, since an
        // authenticated viewer is redirected rather than rejected.
        .merge(guest::guest_routes())
        .nest(&section_href, admin::admin_routes())
        .nest("/api", api::api_routes())
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Puts method, uri and the `x-request-id` on the request span so every log line of a
/// request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
