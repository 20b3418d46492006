//! Project config file source: <project root>/navbridge.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::Path;

pub const PROJECT_CONFIG_FILE: &str = "navbridge.toml";

/// Add the project config file to builder. Overrides the global file.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    project_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let path = project_root.join(PROJECT_CONFIG_FILE);
    if !path.exists() {
        return Ok(builder);
    }
    Ok(builder.add_source(File::from(path.as_path()).required(false)))
}
