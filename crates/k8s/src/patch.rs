//! Namespace patcher: fill or override `metadata.namespace` across a stream.

use lens_core::{parse_stream, serialize_stream, EmitOptions, Value};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{LensError, Result};
use crate::manifest;
use crate::scope::is_namespaced;

/// Namespace policy handed in by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespacePolicy {
    pub namespace: Option<String>,
    /// Set the namespace where none is present.
    pub fill: bool,
    /// Set the namespace unconditionally.
    pub override_: bool,
}

impl NamespacePolicy {
    pub fn fill(namespace: impl Into<String>) -> Self {
        Self { namespace: Some(namespace.into()), fill: true, override_: false }
    }

    pub fn override_with(namespace: impl Into<String>) -> Self {
        Self { namespace: Some(namespace.into()), fill: false, override_: true }
    }

    pub fn is_noop(&self) -> bool { !self.fill && !self.override_ }

    fn target(&self) -> Result<&str> {
        self.namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .ok_or_else(|| LensError::Config("a target namespace is required when fill or override is enabled".into()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Patched {
    pub text: String,
    /// Number of objects whose namespace was set.
    pub patched: usize,
    /// False when the policy was a no-op and `text` is the input unchanged.
    pub applied: bool,
}

/// Patch the stream `text` read from `path`.
pub fn patch_namespaces(path: &str, text: &str, policy: &NamespacePolicy) -> Result<Patched> {
    if path.is_empty() {
        return Err(LensError::Config("yaml path required".into()));
    }
    if policy.is_noop() {
        warn!(path = %path, "neither namespace fill nor namespace override is enabled, doing nothing");
        return Ok(Patched { text: text.to_string(), patched: 0, applied: false });
    }
    policy.target()?;
    info!("patching namespaces in {}", path);

    let mut docs = parse_stream(text).map_err(|e| LensError::parse(path, e))?;
    let patched = patch_documents(&mut docs, path, policy)?;
    let text = serialize_stream(&docs, EmitOptions::default()).map_err(|e| LensError::emit(path, e))?;
    info!("patched {} namespaces in {}", patched, path);
    Ok(Patched { text, patched, applied: true })
}

/// [`patch_namespaces`] over raw bytes; invalid UTF-8 is a parse failure.
pub fn patch_namespaces_bytes(path: &str, bytes: &[u8], policy: &NamespacePolicy) -> Result<Patched> {
    let text = std::str::from_utf8(bytes).map_err(|e| LensError::parse(path, e.into()))?;
    patch_namespaces(path, text, policy)
}

/// Apply `policy` to parsed documents in place, returning how many changed.
/// Key order is left untouched.
pub fn patch_documents(docs: &mut [Value], path: &str, policy: &NamespacePolicy) -> Result<usize> {
    if policy.is_noop() {
        return Ok(0);
    }
    let target = policy.target()?;
    let mut patched = 0usize;
    let mut index = 0usize;
    for doc in docs.iter_mut().filter(|d| !d.is_null()) {
        index += 1;
        let meta = manifest::metadata(doc).ok_or_else(|| LensError::missing(path, index, "metadata"))?;
        let name = manifest::name(meta).ok_or_else(|| LensError::missing(path, index, "metadata.name"))?;
        let current = manifest::namespace(meta);
        let kind = manifest::kind(doc).ok_or_else(|| LensError::missing(path, index, "kind"))?.to_string();

        if !is_namespaced(&kind) {
            continue;
        }
        if policy.override_ || (policy.fill && current.is_none()) {
            if let Some(meta) = doc.get_mut("metadata").and_then(Value::as_mapping_mut) {
                meta.insert("namespace", target);
            }
            info!("namespacing {}/{}/{}", target, kind, name);
            patched += 1;
        }
    }
    Ok(patched)
}
