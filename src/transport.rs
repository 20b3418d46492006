//! Transport Abstraction
//!
//! The network exchange a navigation controller suspends on. Implementations
//! never fail: transport problems come back as `server-error` or
//! `network-error` responses so that the controller handles every outcome
//! through one dispatch path.

use crate::response::Response;
use async_trait::async_trait;
use serde::Serialize;

pub mod http;

pub use http::HttpTransport;

/// Ordered form fields submitted with a POST.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormData {
    fields: Vec<(String, String)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// First value submitted under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Network collaborator consumed by the navigation controller
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `path`. `overlay` tells the server the result will render in an overlay.
    async fn get(&self, path: &str, overlay: bool) -> Response;

    /// Submit `form` to `path`.
    async fn post(&self, path: &str, form: FormData, overlay: bool) -> Response;
}
