//! Typed requests and responses, and the HTTP transport that carries them.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::ids::{NetworkId, NicId, TemplateId, VmId, VnicProfileId};

/// HTTP verb of an engine request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// Target of an engine request: entity kind plus identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Templates,
    Template(TemplateId),
    Vms,
    Vm(VmId),
    Nics(VmId),
    Nic(VmId, NicId),
    Networks,
    Network(NetworkId),
    VnicProfiles,
    VnicProfile(VnicProfileId),
}

impl Resource {
    /// Path below the API root.
    pub fn path(&self) -> String {
        match self {
            Resource::Templates => "/templates".to_string(),
            Resource::Template(id) => format!("/templates/{}", id),
            Resource::Vms => "/vms".to_string(),
            Resource::Vm(id) => format!("/vms/{}", id),
            Resource::Nics(vm_id) => format!("/vms/{}/nics", vm_id),
            Resource::Nic(vm_id, nic_id) => format!("/vms/{}/nics/{}", vm_id, nic_id),
            Resource::Networks => "/networks".to_string(),
            Resource::Network(id) => format!("/networks/{}", id),
            Resource::VnicProfiles => "/vnicprofiles".to_string(),
            Resource::VnicProfile(id) => format!("/vnicprofiles/{}", id),
        }
    }
}

/// A request to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineRequest {
    pub method: Method,
    pub resource: Resource,
    /// Field mutations. Only the fields present are sent.
    pub body: Option<Value>,
}

impl EngineRequest {
    pub fn get(resource: Resource) -> Self {
        Self { method: Method::Get, resource, body: None }
    }

    pub fn post(resource: Resource, body: Value) -> Self {
        Self { method: Method::Post, resource, body: Some(body) }
    }

    pub fn put(resource: Resource, body: Value) -> Self {
        Self { method: Method::Put, resource, body: Some(body) }
    }

    pub fn delete(resource: Resource) -> Self {
        Self { method: Method::Delete, resource, body: None }
    }
}

/// A response from the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineResponse {
    body: Option<Value>,
}

impl EngineResponse {
    pub fn new(body: Option<Value>) -> Self {
        Self { body }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// The single entity carried by the response, if there is one.
    pub fn entity<T: DeserializeOwned>(&self) -> Result<Option<T>, ConnectionError> {
        match &self.body {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) if map.is_empty() => Ok(None),
            Some(value) => T::deserialize(value)
                .map(Some)
                .map_err(|e| ConnectionError::Decode(e.to_string())),
        }
    }

    /// Entities of a list envelope such as `{"nic": [...]}`.
    ///
    /// The engine drops the field entirely for empty lists.
    pub fn list<T: DeserializeOwned>(&self, field: &str) -> Result<Vec<T>, ConnectionError> {
        match self.body.as_ref().and_then(|body| body.get(field)) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(items) => Vec::<T>::deserialize(items)
                .map_err(|e| ConnectionError::Decode(e.to_string())),
        }
    }
}

/// Failures of the connection itself, before any classification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {code}: {message}")]
    Status { code: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<ConnectionError> for EngineError {
    fn from(err: ConnectionError) -> Self {
        let message = err.to_string();
        match err {
            ConnectionError::Transport(_) => EngineError::Transport(message),
            ConnectionError::Decode(_) => EngineError::ProtocolViolation(message),
            ConnectionError::Status { code, .. } => match code {
                400 | 422 => EngineError::ValidationFailed(message),
                401 | 403 => EngineError::Unauthorized(message),
                404 => EngineError::NotFound(message),
                409 => EngineError::Conflict(message),
                _ => EngineError::Unidentified(message),
            },
        }
    }
}

/// Sends typed requests to the engine.
#[async_trait]
pub trait Connection: Send + Sync {
    async fn send(&self, request: EngineRequest) -> Result<EngineResponse, ConnectionError>;
}

// =============================================================================
// HTTP
// =============================================================================

/// JSON-over-HTTP connection to the engine's REST API.
pub struct RestConnection {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl RestConnection {
    /// Build a connection from configuration. Does not contact the engine.
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| EngineError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            client,
        })
    }

    fn url(&self, resource: &Resource) -> String {
        format!("{}{}", self.base_url, resource.path())
    }
}

#[async_trait]
impl Connection for RestConnection {
    #[instrument(skip(self, request), fields(method = request.method.as_str(), path = %request.resource.path()))]
    async fn send(&self, request: EngineRequest) -> Result<EngineResponse, ConnectionError> {
        let url = self.url(&request.resource);
        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };

        builder = builder.header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ConnectionError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ConnectionError::Transport(e.to_string()))?;

        debug!(status = status.as_u16(), bytes = text.len(), "Engine responded");

        if !status.is_success() {
            return Err(ConnectionError::Status {
                code: status.as_u16(),
                message: error_message(&text),
            });
        }

        if text.trim().is_empty() {
            return Ok(EngineResponse::empty());
        }

        let body: Value =
            serde_json::from_str(&text).map_err(|e| ConnectionError::Decode(e.to_string()))?;
        Ok(EngineResponse::new(Some(body)))
    }
}

/// Pull the engine's `detail`/`reason` out of an error body, falling back to the raw text.
fn error_message(text: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
        for key in ["detail", "reason"] {
            if let Some(Value::String(message)) = map.get(key) {
                return message.clone();
            }
        }
    }
    text.trim().to_string()
}
