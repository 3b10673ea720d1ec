//! Client configuration and backend selection.

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::error::{EngineError, Result};
use crate::mock::MockBackend;
use crate::rest::RestBackend;
use crate::retry::RetryStrategy;
use crate::traits::EngineClient;

/// Engine client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Backend type
    pub backend: BackendKind,
    /// API root, e.g. `https://engine.example.com/ovirt-engine/api`
    pub url: String,
    /// Bearer token passed through to the engine
    pub token: Option<String>,
    /// HTTP-level timeout for a single request
    pub request_timeout_secs: u64,
    /// Default retry policy
    pub retry: RetryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Rest,
            url: "https://localhost/ovirt-engine/api".to_string(),
            token: None,
            request_timeout_secs: 60,
            retry: RetryConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Check the configuration for values no backend can work with.
    pub fn validate(&self) -> Result<()> {
        if self.backend == BackendKind::Rest {
            if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
                return Err(EngineError::ValidationFailed(format!(
                    "Engine URL must start with http:// or https://: {}",
                    self.url
                )));
            }
            if self.request_timeout_secs == 0 {
                return Err(EngineError::ValidationFailed(
                    "request_timeout_secs must be greater than zero".to_string(),
                ));
            }
        }
        self.retry.validate()
    }
}

/// Engine backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// REST backend talking to a live engine
    Rest,
    /// In-memory mock for testing/development
    Mock,
}

impl Default for BackendKind {
    fn default() -> Self {
        Self::Rest
    }
}

/// Default retry policy, split by operation category.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total budget for reads (get/list)
    pub read_timeout_secs: u64,
    /// Total budget for writes (create/update/remove)
    pub write_timeout_secs: u64,
    /// Limit for a single attempt
    pub call_timeout_secs: u64,
    /// First backoff delay
    pub initial_backoff_ms: u64,
    /// Backoff ceiling
    pub max_backoff_ms: u64,
    /// Backoff growth factor
    pub backoff_factor: u32,
    /// Optional attempt cap on top of the time budget
    pub max_tries: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            read_timeout_secs: 300,
            write_timeout_secs: 600,
            call_timeout_secs: 60,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
            backoff_factor: 2,
            max_tries: None,
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.read_timeout_secs == 0 || self.write_timeout_secs == 0 || self.call_timeout_secs == 0 {
            return Err(EngineError::ValidationFailed(
                "retry timeouts must be greater than zero".to_string(),
            ));
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(EngineError::ValidationFailed(
                "initial_backoff_ms must not exceed max_backoff_ms".to_string(),
            ));
        }
        Ok(())
    }

    /// Defaults for get/list operations.
    pub fn read_defaults(&self) -> Vec<RetryStrategy> {
        self.defaults(Duration::from_secs(self.read_timeout_secs))
    }

    /// Defaults for create/update/remove operations.
    pub fn write_defaults(&self) -> Vec<RetryStrategy> {
        self.defaults(Duration::from_secs(self.write_timeout_secs))
    }

    fn defaults(&self, budget: Duration) -> Vec<RetryStrategy> {
        let mut strategies = vec![
            RetryStrategy::ExponentialBackoff {
                initial: Duration::from_millis(self.initial_backoff_ms),
                factor: self.backoff_factor,
                max: Duration::from_millis(self.max_backoff_ms),
            },
            RetryStrategy::Timeout(budget),
            RetryStrategy::CallTimeout(Duration::from_secs(self.call_timeout_secs)),
        ];
        if let Some(max_tries) = self.max_tries {
            strategies.push(RetryStrategy::MaxTries(max_tries));
        }
        strategies
    }
}

/// Build the client selected by `config.backend`.
///
/// The backend is chosen once here; callers only see [`EngineClient`].
pub fn connect(config: &EngineConfig) -> Result<Arc<dyn EngineClient>> {
    config.validate()?;

    match config.backend {
        BackendKind::Mock => {
            info!("Using mock engine backend");
            Ok(Arc::new(MockBackend::new()))
        }
        BackendKind::Rest => {
            info!(url = %config.url, "Using REST engine backend");
            Ok(Arc::new(RestBackend::new(config)?))
        }
    }
}
