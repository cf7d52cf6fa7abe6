use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde_json::Value;

use crate::error::ViewError;

/// BackendApi Trait
///
/// The contract for the assumed backend API that owns all resource data. Feature views
/// read through this trait, so tests swap in canned records without a network.
///
/// `token` is the viewer's bearer token, forwarded as-is so the backend applies its
/// own authorization on top of ours.
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// All records of a resource.
    async fn list(&self, resource_name: &str, token: Option<&str>)
    -> Result<Vec<Value>, ViewError>;

    /// One record; `Ok(None)` when the backend reports it missing.
    async fn fetch(
        &self,
        resource_name: &str,
        id: &str,
        token: Option<&str>,
    ) -> Result<Option<Value>, ViewError>;

    /// The URL forms post to for creating (`id = None`) or updating a record.
    fn resource_url(&self, resource_name: &str, id: Option<&str>) -> String;
}

/// BackendState
///
/// The shared handle placed in `AppState`.
pub type BackendState = Arc<dyn BackendApi>;

/// Upper bound on one backend round trip, body included.
pub const BACKEND_TIMEOUT: Duration = Duration::from_secs(10);

/// HttpBackendApi
///
/// `BackendApi` over HTTP/JSON: `GET {base}/{resource}` and `GET {base}/{resource}/{id}`.
/// Resource names and ids are appended as percent-encoded path segments, so an id can
/// never add a segment, a query or a fragment to the request.
pub struct HttpBackendApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBackendApi {
    pub fn new(base_url: &str) -> Result<Self, ViewError> {
        Self::with_timeout(base_url, BACKEND_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ViewError> {
        let base_url = Url::parse(base_url).map_err(|e| ViewError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ViewError::InvalidUrl(format!("{} cannot carry a path", base_url)));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ViewError::Transport(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    async fn get_json(&self, url: String, token: Option<&str>) -> Result<Option<Value>, ViewError> {
        let mut request = self.client.get(&url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ViewError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response.json::<Value>().await.map(Some).map_err(|e| {
                if e.is_decode() {
                    ViewError::Payload(e.to_string())
                } else {
                    ViewError::Transport(e.to_string())
                }
            }),
            status => Err(ViewError::Upstream(status.as_u16())),
        }
    }
}

/// `.` and `..` name no record; a backend may still resolve them as path steps.
fn is_dot_segment(segment: &str) -> bool {
    matches!(segment, "." | "..")
}

#[async_trait]
impl BackendApi for HttpBackendApi {
    /// Accepts either a bare array or an envelope `{ "data": [...] }`. A missing
    /// collection or any other body shape is an error, never an empty list.
    async fn list(
        &self,
        resource_name: &str,
        token: Option<&str>,
    ) -> Result<Vec<Value>, ViewError> {
        let url = self.resource_url(resource_name, None);
        match self.get_json(url, token).await? {
            Some(Value::Array(records)) => Ok(records),
            Some(Value::Object(mut envelope)) => match envelope.remove("data") {
                Some(Value::Array(records)) => Ok(records),
                _ => Err(ViewError::Payload(format!(
                    "{} list envelope has no data array",
                    resource_name
                ))),
            },
            Some(other) => Err(ViewError::Payload(format!(
                "{} list is neither an array nor an envelope: {}",
                resource_name,
                json_kind(&other)
            ))),
            None => Err(ViewError::Upstream(StatusCode::NOT_FOUND.as_u16())),
        }
    }

    async fn fetch(
        &self,
        resource_name: &str,
        id: &str,
        token: Option<&str>,
    ) -> Result<Option<Value>, ViewError> {
        if is_dot_segment(id) {
            return Ok(None);
        }
        let url = self.resource_url(resource_name, Some(id));
        let body = self.get_json(url, token).await?;
        Ok(body.map(|record| match record {
            Value::Object(mut envelope) if envelope.contains_key("data") => {
                envelope.remove("data").unwrap_or(Value::Null)
            }
            other => other,
        }))
    }

    fn resource_url(&self, resource_name: &str, id: Option<&str>) -> String {
        let mut url = self.base_url.clone();
        // Checked in `with_timeout`: the base always has path segments.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(resource_name);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        url.into()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
