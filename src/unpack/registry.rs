//! Tag-keyed constructor table.
//!
//! Built once at startup and shared read-only by every decode call.

use crate::unpack::value::{Adapted, Value};
use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Error a constructor reports when its decoded arguments are unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConstructError(pub String);

impl From<&str> for ConstructError {
    fn from(message: &str) -> Self {
        ConstructError(message.to_string())
    }
}

impl From<String> for ConstructError {
    fn from(message: String) -> Self {
        ConstructError(message)
    }
}

/// Factory invoked with fully decoded positional arguments.
pub type Constructor = Arc<dyn Fn(Vec<Value>) -> Result<Value, ConstructError> + Send + Sync>;

/// Mapping from `_type` tag to constructor.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    constructors: HashMap<String, Constructor>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in adapters (`Date`).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_type("Date", construct_date);
        registry
    }

    /// Register a constructor producing any decoded value.
    pub fn register<F>(&mut self, tag: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(Vec<Value>) -> Result<Value, ConstructError> + Send + Sync + 'static,
    {
        self.constructors.insert(tag.into(), Arc::new(constructor));
        self
    }

    /// Register a constructor producing a typed instance, reachable later through
    /// [`Value::downcast_ref`].
    pub fn register_type<T, F>(&mut self, tag: &str, build: F) -> &mut Self
    where
        T: Adapted,
        F: Fn(Vec<Value>) -> Result<T, ConstructError> + Send + Sync + 'static,
    {
        let owned_tag = tag.to_string();
        self.register(tag, move |args| {
            build(args).map(|built| Value::object(&owned_tag, built))
        })
    }

    pub fn lookup(&self, tag: &str) -> Option<&Constructor> {
        self.constructors.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

fn construct_date(args: Vec<Value>) -> Result<DateTime<FixedOffset>, ConstructError> {
    let raw = args
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| ConstructError::from("expected an ISO 8601 date string"))?;
    DateTime::parse_from_rfc3339(raw)
        .map_err(|e| ConstructError(format!("invalid date {:?}: {}", raw, e)))
}
