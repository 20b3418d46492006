//! Error types for the navigation client.

use thiserror::Error;

/// Failures while decoding a packed value graph.
///
/// Any of these fails the whole decode call; no partial graph is returned.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unknown object type: {0}")]
    UnknownType(String),

    #[error("Malformed graph: {0}")]
    MalformedGraph(String),

    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    #[error("Cyclic reference to {0}: node is referenced before its construction completes")]
    CyclicReference(String),

    #[error("Constructor for {tag} failed: {message}")]
    Construct { tag: String, message: String },
}

/// Failures surfaced by navigation controller operations.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("Failed to decode response payload: {0}")]
    Decode(#[from] DecodeError),

    #[error("Server error while loading {0}")]
    Server(String),

    #[error("Network error while loading {0}")]
    Network(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Refresh interval must be greater than zero")]
    ZeroRefreshInterval,
}

/// Setup-time errors: configuration, logging and client construction.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Transport setup failed: {0}")]
    TransportSetup(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Navigation failed: {0}")]
    Navigation(#[from] NavigationError),

    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),
}

impl From<config::ConfigError> for ClientError {
    fn from(err: config::ConfigError) -> Self {
        ClientError::ConfigError(err.to_string())
    }
}
