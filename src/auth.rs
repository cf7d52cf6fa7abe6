use std::{convert::Infallible, sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::SessionError,
    models::{Permission, Role, Session, SessionState},
};

/// Claims
///
/// The payload of a session JWT. Besides the standard `sub`/`exp`/`iat`, the token
/// carries the capability snapshot so no lookup is needed per request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The user's UUID.
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Session {
            user_id: claims.sub,
            email: claims.email,
            permissions: claims.permissions.into_iter().map(Permission::new).collect(),
            roles: claims.roles.into_iter().collect(),
            expires_at: DateTime::from_timestamp(claims.exp as i64, 0),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// SessionPayload
///
/// The document returned by a remote session endpoint:
/// `{ user: {id, email}, permissions: [...], roles: [{name}], expires }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionPayload {
    pub user: SessionUser,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
}

impl From<SessionPayload> for Session {
    fn from(payload: SessionPayload) -> Self {
        Session {
            user_id: payload.user.id,
            email: payload.user.email,
            permissions: payload.permissions.into_iter().map(Permission::new).collect(),
            roles: payload.roles.into_iter().collect(),
            expires_at: payload.expires,
        }
    }
}

/// SessionProvider Trait
///
/// The external identity boundary. `Ok(None)` means "no session" (anonymous, expired,
/// revoked); `Err` means the provider itself failed and must not be mistaken for a
/// clean logout.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn get_session(&self, token: &str) -> Result<Option<Session>, SessionError>;
}

/// SessionProviderState
///
/// The shared handle placed in `AppState`.
pub type SessionProviderState = Arc<dyn SessionProvider>;

/// JwtSessionProvider
///
/// Resolves sessions locally by validating HS256 tokens signed with the shared secret.
pub struct JwtSessionProvider {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtSessionProvider {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl SessionProvider for JwtSessionProvider {
    async fn get_session(&self, token: &str) -> Result<Option<Session>, SessionError> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(Some(data.claims.into())),
            Err(e) => {
                match e.kind() {
                    ErrorKind::ExpiredSignature => tracing::debug!("session token expired"),
                    _ => tracing::debug!(error = %e, "session token rejected"),
                }
                Ok(None)
            }
        }
    }
}

/// Upper bound on one round trip to the auth service, body included.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(5);

/// RemoteSessionProvider
///
/// Asks an external auth service for the session behind a bearer token.
pub struct RemoteSessionProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteSessionProvider {
    pub fn new(endpoint: &str) -> Result<Self, SessionError> {
        Self::with_timeout(endpoint, SESSION_TIMEOUT)
    }

    /// A stalled auth service surfaces as `SessionError::Transport` after `timeout`.
    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl SessionProvider for RemoteSessionProvider {
    async fn get_session(&self, token: &str) -> Result<Option<Session>, SessionError> {
        let response = self
            .client
            .get(&self.endpoint)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SessionError::UpstreamStatus(status.as_u16()));
        }

        // A `null` body is a valid "no session" answer.
        let payload = response
            .json::<Option<SessionPayload>>()
            .await
            .map_err(|e| {
                if e.is_decode() {
                    SessionError::Payload(e.to_string())
                } else {
                    SessionError::Transport(e.to_string())
                }
            })?;
        Ok(payload.map(Session::from))
    }
}

/// extract_token
///
/// Bearer header first, then the session cookie.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// CurrentSession Extractor Result
///
/// The per-request session snapshot handed to handlers. Resolution never rejects the
/// request: an absent or broken session is a state the access evaluator decides on.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub state: SessionState,
    /// The raw token, forwarded to the backend API by feature views.
    pub token: Option<String>,
}

impl CurrentSession {
    pub fn anonymous() -> Self {
        Self {
            state: SessionState::Unauthenticated,
            token: None,
        }
    }
}

/// CurrentSession Extractor Implementation
///
/// 1. Dependency Resolution: provider and config from the application state.
/// 2. Token Extraction: bearer header or session cookie; none means anonymous.
/// 3. Resolution: ask the provider; expired snapshots count as absent.
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
    SessionProviderState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let provider = SessionProviderState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let Some(token) = extract_token(&parts.headers, &config.session_cookie) else {
            return Ok(Self::anonymous());
        };

        let state = match provider.get_session(&token).await {
            Ok(Some(session)) if session.is_expired(Utc::now()) => {
                tracing::debug!(user_id = %session.user_id, "session expired");
                SessionState::Unauthenticated
            }
            Ok(session) => SessionState::from(session),
            Err(e) => {
                tracing::warn!(error = %e, "session provider failed");
                SessionState::Failed(e)
            }
        };

        Ok(Self {
            state,
            token: Some(token),
        })
    }
}

/// A `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie(cookie_name: &str) -> String {
    format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", cookie_name)
}
