//! Decoded value graph.
//!
//! Containers and constructed instances are reference counted, so every `_ref`
//! to the same `_id` hands out a clone of the same allocation. Use
//! [`Value::ptr_eq`] to observe that sharing.

use serde_json::{Map, Number, Value as JsonValue};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Anything a registered constructor can produce.
pub trait Adapted: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug + Send + Sync> Adapted for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A constructed object together with the tag it was registered under.
#[derive(Clone)]
pub struct Instance {
    tag: Arc<str>,
    inner: Arc<dyn Adapted>,
}

impl Instance {
    pub fn new<T: Adapted>(tag: &str, value: T) -> Self {
        Self {
            tag: Arc::from(tag),
            inner: Arc::new(value),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        // Deref first: `Arc<dyn Adapted>` is itself `Adapted`.
        (*self.inner).as_any().downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("tag", &self.tag)
            .field("value", &self.inner)
            .finish()
    }
}

/// A live value produced by the decoder.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Arc<Vec<Value>>),
    Dict(Arc<BTreeMap<String, Value>>),
    Object(Instance),
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items))
    }

    pub fn dict(entries: BTreeMap<String, Value>) -> Self {
        Value::Dict(Arc::new(entries))
    }

    pub fn empty_dict() -> Self {
        Value::dict(BTreeMap::new())
    }

    pub fn object<T: Adapted>(tag: &str, value: T) -> Self {
        Value::Object(Instance::new(tag, value))
    }

    /// Convert a JSON literal structurally, without interpreting reserved keys.
    pub fn from_literal(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => Value::Number(n.clone()),
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Array(items) => Value::list(items.iter().map(Value::from_literal).collect()),
            JsonValue::Object(map) => Value::dict(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_literal(v)))
                    .collect(),
            ),
        }
    }

    /// True when both values share one allocation (lists, dicts, instances).
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            (Value::Dict(a), Value::Dict(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Dict(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// Field lookup on a dict value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_dict().and_then(|map| map.get(key))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_instance().and_then(|i| i.downcast_ref::<T>())
    }

    /// Render the graph as JSON for display. Instances become
    /// `{"_type": tag, "_debug": "..."}`; shared nodes are rendered at every site.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => JsonValue::Number(n.clone()),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::List(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Dict(map) => {
                let mut out = Map::new();
                for (k, v) in map.iter() {
                    out.insert(k.clone(), v.to_json());
                }
                JsonValue::Object(out)
            }
            Value::Object(instance) => {
                let mut out = Map::new();
                out.insert("_type".to_string(), JsonValue::String(instance.tag().to_string()));
                out.insert(
                    "_debug".to_string(),
                    JsonValue::String(format!("{:?}", instance.inner)),
                );
                JsonValue::Object(out)
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            // Instances compare by identity.
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::empty_dict()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}
