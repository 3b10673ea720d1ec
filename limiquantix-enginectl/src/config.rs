//! Configuration management for the engine CLI.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use limiquantix_common::LogFormat;
use limiquantix_engine::{BackendKind, EngineConfig};

use crate::cli::Args;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/limiquantix/engine.yaml";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine connection and retry configuration
    pub engine: EngineConfig,
    /// Logging configuration
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply CLI argument overrides to the configuration.
    pub fn with_cli_overrides(mut self, args: &Args) -> Self {
        if let Some(ref url) = args.url {
            self.engine.url = url.clone();
        }

        if let Some(ref token) = args.token {
            self.engine.token = Some(token.clone());
        }

        if args.mock {
            self.engine.backend = BackendKind::Mock;
        }

        if let Some(ref level) = args.log_level {
            self.log.level = level.clone();
        }

        if let Some(format) = args.log_format {
            self.log.format = format;
        }

        self
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
        }
    }
}
