//! Lens k8s: Kubernetes manifest normalization and namespace patching.
//!
//! - [`normalize`] splits multi-document sources into one key-sorted file per
//!   object at `{namespace or _}/{kind}/{name}.yaml`, expanding list wrappers.
//! - [`patch_namespaces`] fills or overrides `metadata.namespace` on every
//!   namespaced object of a stream, preserving key order.
//! - [`is_namespaced`] classifies kinds against a fixed cluster-scoped table.

#![forbid(unsafe_code)]

mod error;
pub mod manifest;
mod normalize;
mod patch;
mod scope;

pub use error::{LensError, Result};
pub use manifest::{namespace_manifest, ObjectId};
pub use normalize::{normalize, DuplicatePolicy, NormalizeOptions, Normalized};
pub use patch::{patch_documents, patch_namespaces, patch_namespaces_bytes, NamespacePolicy, Patched};
pub use scope::{is_namespaced, CLUSTER_SCOPED_KINDS};

/// Whether `path` names a manifest file the patcher should touch.
pub fn is_manifest_path(path: &str) -> bool { path.ends_with(".yaml") || path.ends_with(".yml") }
