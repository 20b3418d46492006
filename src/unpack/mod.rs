//! Reference-Graph Decoder
//!
//! Turns a packed JSON document into a live [`Value`] graph. Object nodes may
//! carry reserved keys:
//!
//! - `_id`: identity, string or integer
//! - `_type` + `_args`: construct through the [`TypeRegistry`]
//! - `_ref`: reuse the node with that `_id`, possibly defined later in the document
//! - `_val`: literal, returned as-is
//! - `_list` / `_dict`: packed containers
//!
//! A node with none of these decodes structurally. Decoding runs in two passes:
//! an index pass that records every `_id` node, then a resolve pass that builds
//! values and caches each identified node so it is constructed at most once.

pub mod registry;
pub mod value;

pub use registry::{ConstructError, Constructor, TypeRegistry};
pub use value::{Adapted, Instance, Value};

use crate::error::DecodeError;
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::trace;

const ID: &str = "_id";
const TYPE: &str = "_type";
const ARGS: &str = "_args";
const REF: &str = "_ref";
const VAL: &str = "_val";
const LIST: &str = "_list";
const DICT: &str = "_dict";

/// Decode a packed value graph.
pub fn unpack(packed: &JsonValue, registry: &TypeRegistry) -> Result<Value, DecodeError> {
    Unpacker::new(packed, registry)?.resolve(packed)
}

/// Per-call decoder state: the id index and the decode cache.
struct Unpacker<'a> {
    registry: &'a TypeRegistry,
    packed_by_id: HashMap<String, &'a JsonValue>,
    values_by_id: HashMap<String, Value>,
    resolving: HashSet<String>,
}

impl<'a> Unpacker<'a> {
    fn new(root: &'a JsonValue, registry: &'a TypeRegistry) -> Result<Self, DecodeError> {
        let mut packed_by_id = HashMap::new();
        scan_for_ids(root, &mut packed_by_id)?;
        trace!(identified_nodes = packed_by_id.len(), "Indexed packed graph");
        Ok(Self {
            registry,
            packed_by_id,
            values_by_id: HashMap::new(),
            resolving: HashSet::new(),
        })
    }

    fn resolve(&mut self, packed: &'a JsonValue) -> Result<Value, DecodeError> {
        let obj = match packed {
            JsonValue::Object(obj) => obj,
            JsonValue::Array(items) => {
                let resolved = items
                    .iter()
                    .map(|item| self.resolve(item))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(Value::list(resolved));
            }
            primitive => return Ok(Value::from_literal(primitive)),
        };

        if let Some(target) = obj.get(REF) {
            return self.resolve_ref(target);
        }

        let id = obj.get(ID).map(id_key).transpose()?;
        if let Some(id) = &id {
            if let Some(existing) = self.values_by_id.get(id) {
                return Ok(existing.clone());
            }
            if !self.resolving.insert(id.clone()) {
                return Err(DecodeError::CyclicReference(id.clone()));
            }
        }

        let result = self.resolve_tagged(obj, id.as_deref());

        if let Some(id) = id {
            self.resolving.remove(&id);
            let value = result?;
            self.values_by_id.insert(id, value.clone());
            return Ok(value);
        }
        result
    }

    fn resolve_ref(&mut self, target: &JsonValue) -> Result<Value, DecodeError> {
        let key = id_key(target)?;
        if let Some(existing) = self.values_by_id.get(&key) {
            return Ok(existing.clone());
        }
        if self.resolving.contains(&key) {
            return Err(DecodeError::CyclicReference(key));
        }
        let node = *self
            .packed_by_id
            .get(&key)
            .ok_or_else(|| DecodeError::UnresolvedReference(key.clone()))?;
        // Resolving the target populates the cache as a side effect.
        self.resolve(node)
    }

    fn resolve_tagged(
        &mut self,
        obj: &'a Map<String, JsonValue>,
        id: Option<&str>,
    ) -> Result<Value, DecodeError> {
        if let Some(literal) = obj.get(VAL) {
            return Ok(Value::from_literal(literal));
        }

        if let Some(list) = obj.get(LIST) {
            let items = expect_array(list, LIST)?;
            let resolved = items
                .iter()
                .map(|item| self.resolve(item))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Value::list(resolved));
        }

        if let Some(dict) = obj.get(DICT) {
            let entries = dict.as_object().ok_or_else(|| {
                DecodeError::MalformedGraph(format!("{} must be an object", DICT))
            })?;
            return self.resolve_fields(entries);
        }

        if let Some(tag) = obj.get(TYPE) {
            let tag = tag.as_str().ok_or_else(|| {
                DecodeError::MalformedGraph(format!("{} must be a string", TYPE))
            })?;
            let constructor = self
                .registry
                .lookup(tag)
                .cloned()
                .ok_or_else(|| DecodeError::UnknownType(tag.to_string()))?;
            let args = match obj.get(ARGS) {
                Some(args) => expect_array(args, ARGS)?
                    .iter()
                    .map(|arg| self.resolve(arg))
                    .collect::<Result<Vec<_>, _>>()?,
                None => Vec::new(),
            };
            trace!(tag, args = args.len(), "Constructing instance");
            return constructor(args).map_err(|e| DecodeError::Construct {
                tag: tag.to_string(),
                message: e.0,
            });
        }

        if let Some(id) = id {
            return Err(DecodeError::MalformedGraph(format!(
                "node {} has an {} but no {}",
                id, ID, TYPE
            )));
        }

        self.resolve_fields(obj)
    }

    fn resolve_fields(&mut self, entries: &'a Map<String, JsonValue>) -> Result<Value, DecodeError> {
        let mut out = BTreeMap::new();
        for (key, packed) in entries {
            out.insert(key.clone(), self.resolve(packed)?);
        }
        Ok(Value::dict(out))
    }
}

/// Index pass: record every node carrying `_id`, descending into all container forms.
fn scan_for_ids<'a>(
    packed: &'a JsonValue,
    index: &mut HashMap<String, &'a JsonValue>,
) -> Result<(), DecodeError> {
    let obj = match packed {
        JsonValue::Object(obj) => obj,
        JsonValue::Array(items) => {
            for item in items {
                scan_for_ids(item, index)?;
            }
            return Ok(());
        }
        _ => return Ok(()),
    };

    let mut reserved = false;

    if let Some(id) = obj.get(ID) {
        reserved = true;
        index.insert(id_key(id)?, packed);
    }

    if obj.contains_key(TYPE) || obj.contains_key(VAL) || obj.contains_key(REF) {
        reserved = true;
    }

    for key in [LIST, ARGS] {
        if let Some(JsonValue::Array(items)) = obj.get(key) {
            reserved = true;
            for item in items {
                scan_for_ids(item, index)?;
            }
        }
    }

    if let Some(JsonValue::Object(entries)) = obj.get(DICT) {
        reserved = true;
        for item in entries.values() {
            scan_for_ids(item, index)?;
        }
    }

    if !reserved {
        for item in obj.values() {
            scan_for_ids(item, index)?;
        }
    }

    Ok(())
}

/// Normalize an `_id`/`_ref` to its map key. Integer 7 and string "7" name the same node.
fn id_key(id: &JsonValue) -> Result<String, DecodeError> {
    match id {
        JsonValue::String(s) => Ok(s.clone()),
        JsonValue::Number(n) => Ok(n.to_string()),
        other => Err(DecodeError::MalformedGraph(format!(
            "identity must be a string or integer, got {}",
            other
        ))),
    }
}

fn expect_array<'a>(value: &'a JsonValue, key: &str) -> Result<&'a Vec<JsonValue>, DecodeError> {
    value
        .as_array()
        .ok_or_else(|| DecodeError::MalformedGraph(format!("{} must be an array", key)))
}
