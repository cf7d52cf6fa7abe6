use thiserror::Error;

/// SessionError
///
/// Failures of the Session Provider itself (as opposed to "there is no session").
/// These never become HTTP 5xx responses: the `CurrentSession` extractor folds them
/// into `SessionState::Failed`, which the access evaluator treats as unauthenticated
/// while still rendering a distinct "session error" notice.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The provider could not be reached (connection refused, timeout, TLS).
    #[error("session provider unreachable: {0}")]
    Transport(String),

    /// The provider answered with a status that is neither success nor a clean "no session".
    #[error("session provider returned status {0}")]
    UpstreamStatus(u16),

    /// The provider answered, but the body was not a session document.
    #[error("malformed session payload: {0}")]
    Payload(String),
}

/// RegistryError
///
/// `NotFound` is the ordinary lookup miss. Every other variant is a startup
/// validation failure: the registry is rejected and the process refuses to boot.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("duplicate resource key: {0}")]
    DuplicateKey(String),

    #[error("invalid resource key {0:?}: keys must be non-empty and use only [A-Za-z0-9_-]")]
    InvalidKey(String),

    #[error("resource {key}: {detail}")]
    ShapeMismatch { key: String, detail: String },

    #[error("failed to read registry file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse registry document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// ViewError
///
/// Failures raised while a Feature View loads or renders its content.
#[derive(Debug, Error)]
pub enum ViewError {
    /// The requested record does not exist upstream.
    #[error("record not found")]
    NotFound,

    #[error("backend unreachable: {0}")]
    Transport(String),

    #[error("backend returned status {0}")]
    Upstream(u16),

    /// The backend answered 2xx with a body this console cannot read.
    #[error("unexpected backend payload: {0}")]
    Payload(String),

    #[error("invalid backend url: {0}")]
    InvalidUrl(String),

    #[error("template error: {0}")]
    Template(String),
}

impl From<handlebars::RenderError> for ViewError {
    fn from(err: handlebars::RenderError) -> Self {
        ViewError::Template(err.to_string())
    }
}

impl From<handlebars::TemplateError> for ViewError {
    fn from(err: handlebars::TemplateError) -> Self {
        ViewError::Template(err.to_string())
    }
}
