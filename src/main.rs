use cms_portal::{
    AppState,
    auth::{JwtSessionProvider, RemoteSessionProvider, SessionProviderState},
    backend::{BackendState, HttpBackendApi},
    config::{AppConfig, Env, SessionBackend},
    create_router,
    registry::ResourceRegistry,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, sets up logging, validates the resource registry, wires the
/// session provider and backend client, then serves HTTP.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // RUST_LOG wins; otherwise verbose for this crate, request-level for the HTTP stack.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cms_portal=debug,tower_http=info,axum=trace".into());

    // 3. Pretty output locally, JSON in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Resource Registry (validated; a bad document stops the boot)
    let registry = match &config.registry_path {
        Some(path) => ResourceRegistry::load(path),
        None => ResourceRegistry::builtin(),
    }
    .expect("FATAL: Resource registry failed validation.");
    tracing::info!(
        resources = registry.len(),
        section = %registry.section().slug,
        "resource registry loaded"
    );

    // 5. Session Provider
    let sessions: SessionProviderState = match &config.session_backend {
        SessionBackend::Jwt => Arc::new(JwtSessionProvider::new(&config.jwt_secret)),
        SessionBackend::Remote { endpoint } => {
            tracing::info!(endpoint = %endpoint, "resolving sessions remotely");
            Arc::new(
                RemoteSessionProvider::new(endpoint)
                    .expect("FATAL: Failed to build the session provider HTTP client."),
            )
        }
    };

    // 6. Backend API client
    let backend: BackendState = Arc::new(
        HttpBackendApi::new(&config.backend_api_url)
            .expect("FATAL: BACKEND_API_URL is not a usable base URL."),
    );

    // 7. Unified State Assembly
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(config, registry, sessions, backend)
        .expect("FATAL: Page templates failed to compile.");

    // 8. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://{}/swagger-ui", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
