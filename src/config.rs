use std::{env, path::PathBuf};

/// AppConfig
///
/// Holds the application's entire configuration. Immutable once loaded and pulled into
/// handlers and extractors through `FromRef<AppState>`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls which secrets are mandatory and the log format.
    pub env: Env,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
    // HS256 secret used by the JWT session provider.
    pub jwt_secret: String,
    // Where sessions are resolved from.
    pub session_backend: SessionBackend,
    // Name of the cookie carrying the session token.
    pub session_cookie: String,
    // Base URL of the backend API owning resource data.
    pub backend_api_url: String,
    // Base URL of the external auth provider the sign-in/sign-up forms post to.
    pub auth_provider_url: String,
    // Optional registry document overriding the bundled one.
    pub registry_path: Option<PathBuf>,
}

/// Env
///
/// Local development vs. hardened production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// SessionBackend
///
/// `Jwt` validates tokens in-process; `Remote` asks an auth service per request.
#[derive(Clone, PartialEq, Debug)]
pub enum SessionBackend {
    Jwt,
    Remote { endpoint: String },
}

const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";
const LOCAL_BACKEND_API_URL: &str = "http://localhost:8080/api";
const LOCAL_AUTH_PROVIDER_URL: &str = "http://localhost:8080/auth";

impl Default for AppConfig {
    /// default
    ///
    /// Safe, non-panicking values for test state setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "127.0.0.1:3000".to_string(),
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            session_backend: SessionBackend::Jwt,
            session_cookie: "session".to_string(),
            backend_api_url: LOCAL_BACKEND_API_URL.to_string(),
            auth_provider_url: LOCAL_AUTH_PROVIDER_URL.to_string(),
            registry_path: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables at startup.
    ///
    /// # Panics
    /// Panics when a variable required for the current environment is missing
    /// (`SESSION_JWT_SECRET`, `BACKEND_API_URL` and `AUTH_PROVIDER_URL` in production,
    /// `SESSION_ENDPOINT` whenever `SESSION_PROVIDER=remote`), so the service never
    /// starts half-configured.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match env {
            Env::Production => env::var("SESSION_JWT_SECRET")
                .expect("FATAL: SESSION_JWT_SECRET must be set in production."),
            Env::Local => {
                env::var("SESSION_JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string())
            }
        };

        let session_backend = match env::var("SESSION_PROVIDER").as_deref() {
            Ok("remote") => SessionBackend::Remote {
                endpoint: env::var("SESSION_ENDPOINT")
                    .expect("FATAL: SESSION_ENDPOINT required when SESSION_PROVIDER=remote"),
            },
            _ => SessionBackend::Jwt,
        };

        let (backend_api_url, auth_provider_url) = match env {
            Env::Production => (
                env::var("BACKEND_API_URL").expect("FATAL: BACKEND_API_URL required in prod"),
                env::var("AUTH_PROVIDER_URL").expect("FATAL: AUTH_PROVIDER_URL required in prod"),
            ),
            Env::Local => (
                env::var("BACKEND_API_URL").unwrap_or_else(|_| LOCAL_BACKEND_API_URL.to_string()),
                env::var("AUTH_PROVIDER_URL")
                    .unwrap_or_else(|_| LOCAL_AUTH_PROVIDER_URL.to_string()),
            ),
        };

        Self {
            env,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            jwt_secret,
            session_backend,
            session_cookie: env::var("SESSION_COOKIE").unwrap_or_else(|_| "session".to_string()),
            backend_api_url,
            auth_provider_url,
            registry_path: env::var("RESOURCE_REGISTRY_PATH").ok().map(PathBuf::from),
        }
    }
}
