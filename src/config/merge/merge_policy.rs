//! Merge rules: defaults, override order, conflict handling.
//!
//! Later sources override earlier ones key by key; tables merge rather than
//! replace, so a project file can change one transport setting and keep the rest.

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("transport.base_url", "http://localhost:8000")?
        .set_default("transport.connect_timeout_ms", 10_000i64)?
        .set_default("transport.request_timeout_ms", 30_000i64)?
        .set_default("navigation.initial_path", "/")
}
