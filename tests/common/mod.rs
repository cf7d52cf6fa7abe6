#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use cms_portal::{
    AppConfig, AppState,
    auth::{Claims, SessionProvider, SessionProviderState},
    backend::{BackendApi, BackendState},
    error::{SessionError, ViewError},
    models::{Role, Session},
    registry::ResourceRegistry,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::Value;
use uuid::Uuid;

pub const SECRET: &str = "integration-test-secret";

// --- Tokens ---

/// A signed session token valid for `ttl_secs` (negative for an expired one).
pub fn token_with(secret: &str, permissions: &[&str], roles: &[&str], ttl_secs: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: Uuid::new_v4(),
        exp: (now + ttl_secs) as usize,
        iat: now as usize,
        email: Some("admin@example.com".to_string()),
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
        roles: roles.iter().map(|r| Role::new(*r)).collect(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("token encoding")
}

pub fn token(permissions: &[&str]) -> String {
    token_with(SECRET, permissions, &[], 3600)
}

// --- Mock Session Provider ---

/// Answers every token with the same canned result.
pub struct StaticSessions(pub Result<Option<Session>, SessionError>);

#[async_trait]
impl SessionProvider for StaticSessions {
    async fn get_session(&self, _token: &str) -> Result<Option<Session>, SessionError> {
        self.0.clone()
    }
}

// --- Mock Backend ---

/// In-memory records per resource, with optional failure and latency.
#[derive(Default)]
pub struct MockBackend {
    pub records: HashMap<String, Vec<Value>>,
    pub fail_with: Option<u16>,
    pub delay: Option<Duration>,
}

impl MockBackend {
    pub fn with(resource_name: &str, records: Vec<Value>) -> Self {
        let mut backend = Self::default();
        backend.records.insert(resource_name.to_string(), records);
        backend
    }

    async fn settle(&self) -> Result<(), ViewError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.fail_with {
            Some(status) => Err(ViewError::Upstream(status)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BackendApi for MockBackend {
    async fn list(&self, resource_name: &str, _token: Option<&str>) -> Result<Vec<Value>, ViewError> {
        self.settle().await?;
        Ok(self.records.get(resource_name).cloned().unwrap_or_default())
    }

    async fn fetch(
        &self,
        resource_name: &str,
        id: &str,
        _token: Option<&str>,
    ) -> Result<Option<Value>, ViewError> {
        self.settle().await?;
        Ok(self.records.get(resource_name).and_then(|records| {
            records
                .iter()
                .find(|record| match &record["id"] {
                    Value::String(value) => value == id,
                    Value::Number(value) => value.to_string() == id,
                    _ => false,
                })
                .cloned()
        }))
    }

    fn resource_url(&self, resource_name: &str, id: Option<&str>) -> String {
        match id {
            Some(id) => format!("http://backend.test/{}/{}", resource_name, id),
            None => format!("http://backend.test/{}", resource_name),
        }
    }
}

// --- State Builders ---

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: SECRET.to_string(),
        ..AppConfig::default()
    }
}

pub fn app_state(sessions: SessionProviderState, backend: MockBackend) -> AppState {
    let backend: BackendState = Arc::new(backend);
    AppState::new(
        test_config(),
        ResourceRegistry::builtin().expect("bundled registry"),
        sessions,
        backend,
    )
    .expect("templates compile")
}

pub fn jwt_state(backend: MockBackend) -> AppState {
    app_state(
        Arc::new(cms_portal::JwtSessionProvider::new(SECRET)),
        backend,
    )
}
