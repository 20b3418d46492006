//! Configuration System
//!
//! Layered configuration for the navigation client: built-in defaults, then
//! the user's global file, then the project file, then `NAVBRIDGE__*`
//! environment variables.

use crate::error::ClientError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod merge;
mod sources;

pub use sources::global_file::global_config_path;
pub use sources::project_file::PROJECT_CONFIG_FILE;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub navigation: NavigationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Server every path is resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Controller settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Path loaded when a headless session starts
    #[serde(default = "default_initial_path")]
    pub initial_path: String,

    /// Refresh props of the current frame on this interval (disabled when unset)
    #[serde(default)]
    pub auto_refresh_ms: Option<u64>,
}

fn default_initial_path() -> String {
    "/".to_string()
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            initial_path: default_initial_path(),
            auto_refresh_ms: None,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Transport(String),
    Navigation(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Transport(msg) => write!(f, "Transport: {}", msg),
            ValidationError::Navigation(msg) => write!(f, "Navigation: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl TransportConfig {
    pub fn validate(&self) -> Result<(), String> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| format!("Invalid base_url '{}': {}", self.base_url, e))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(format!("base_url must be http or https, got '{}'", url.scheme()));
        }
        if self.connect_timeout_ms == 0 || self.request_timeout_ms == 0 {
            return Err("Timeouts must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl NavigationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.initial_path.starts_with('/') {
            return Err(format!(
                "initial_path must start with '/', got '{}'",
                self.initial_path
            ));
        }
        if self.auto_refresh_ms == Some(0) {
            return Err("auto_refresh_ms must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl BridgeConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.transport.validate() {
            errors.push(ValidationError::Transport(e));
        }
        if let Err(e) = self.navigation.validate() {
            errors.push(ValidationError::Navigation(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Render as TOML, e.g. to show the effective configuration.
    pub fn to_toml(&self) -> Result<String, ClientError> {
        toml::to_string_pretty(self)
            .map_err(|e| ClientError::ConfigError(format!("Failed to serialize config: {}", e)))
    }
}

/// Loads [`BridgeConfig`] from layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load defaults, global file, `<project_root>/navbridge.toml` and environment.
    pub fn load(project_root: &Path) -> Result<BridgeConfig, ClientError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::project_file::add_to_builder(builder, project_root)?;
        let builder = sources::environment::add_to_builder(builder);
        Ok(builder.build()?.try_deserialize()?)
    }

    /// Load defaults overlaid with one explicit file. The file must exist.
    pub fn load_from_file(path: &Path) -> Result<BridgeConfig, ClientError> {
        let builder = merge::merge_policy::builder_with_defaults()?
            .add_source(config::File::from(path).required(true));
        Ok(builder.build()?.try_deserialize()?)
    }
}
