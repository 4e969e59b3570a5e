//! Accessors over manifest documents.

use std::fmt;

use lens_core::{Mapping, Value};
use serde::Serialize;

use crate::error::{LensError, Result};

/// Kinds whose `items` are expanded instead of being kept as one object.
pub const LIST_KINDS: &[&str] = &["ConfigMapList"];

/// Identity of one manifest object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ObjectId {
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
}

impl ObjectId {
    /// Validate `doc` in kind → metadata → metadata.name order.
    pub fn from_doc(doc: &Value, path: &str, index: usize) -> Result<Self> {
        let kind = kind(doc).ok_or_else(|| LensError::missing(path, index, "kind"))?;
        let meta = metadata(doc).ok_or_else(|| LensError::missing(path, index, "metadata"))?;
        let name = name(meta).ok_or_else(|| LensError::missing(path, index, "metadata.name"))?;
        Ok(Self { kind: kind.to_string(), name, namespace: namespace(meta) })
    }

    /// `{namespace or _}/{kind}/{name}.yaml`
    pub fn output_path(&self) -> String { format!("{}.yaml", self) }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace.as_deref().unwrap_or("_"), self.kind, self.name)
    }
}

pub fn kind(doc: &Value) -> Option<&str> { doc.get("kind").and_then(Value::as_str).filter(|k| !k.is_empty()) }

pub fn metadata(doc: &Value) -> Option<&Mapping> { doc.get("metadata").and_then(Value::as_mapping) }

/// `metadata.name` as text; integers are accepted since they read back unchanged.
pub fn name(meta: &Mapping) -> Option<String> { meta.get("name").and_then(scalar_text) }

/// `metadata.namespace`; null and empty count as unset.
pub fn namespace(meta: &Mapping) -> Option<String> { meta.get("namespace").and_then(scalar_text) }

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Int(i) => Some(i.to_string()),
        Value::Octal(o) => Some(o.literal().to_string()),
        _ => None,
    }
}

pub fn is_list(doc: &Value) -> bool { kind(doc).is_some_and(|k| LIST_KINDS.contains(&k)) }

/// Move the `items` out of a list wrapper. A missing or null `items` yields nothing.
pub fn take_items(doc: Value, path: &str, index: usize) -> Result<Vec<Value>> {
    let Value::Mapping(mut m) = doc else { return Ok(Vec::new()) };
    match m.remove("items") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Sequence(items)) => Ok(items),
        Some(_) => Err(LensError::InvalidItems { path: path.to_string(), index }),
    }
}

/// Stream fragment declaring namespace `name`, with the name always
/// double-quoted; empty when `name` is empty.
pub fn namespace_manifest(name: &str) -> Result<String> {
    if name.is_empty() {
        return Ok(String::new());
    }
    let quoted = serde_json::to_string(name).map_err(|e| LensError::Config(format!("namespace {name:?}: {e}")))?;
    Ok(format!("---\nkind: Namespace\napiVersion: v1\nmetadata:\n  name: {}\n", quoted))
}
