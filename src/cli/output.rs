//! CLI output: error mapping from domain errors to the CLI surface.

use crate::error::{ClientError, NavigationError};

/// Map client errors to a string for CLI output.
pub fn map_error(e: &ClientError) -> String {
    match e {
        ClientError::Navigation(NavigationError::Server(path)) => {
            format!("Server error while loading {}", path)
        }
        ClientError::Navigation(NavigationError::Network(path)) => {
            format!("Network error while loading {} (is the server running?)", path)
        }
        other => other.to_string(),
    }
}
