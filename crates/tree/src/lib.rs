//! Lens tree: `{path → bytes}` trees loaded from and written to directories,
//! plus tree-wide normalize / namespace-patch runs.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use lens_k8s::{is_manifest_path, normalize, patch_namespaces_bytes, LensError, NamespacePolicy, NormalizeOptions};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid tree path: {0}")]
    InvalidPath(String),
    #[error(transparent)]
    Lens(#[from] LensError),
}

pub type Result<T, E = TreeError> = std::result::Result<T, E>;

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> TreeError + '_ {
    move |source| TreeError::Io { path: path.to_path_buf(), source }
}

/// In-memory file tree keyed by relative `/`-separated paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: BTreeMap<String, Vec<u8>>,
}

impl Tree {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Result<()> {
        let path = path.into();
        validate_rel(&path)?;
        self.entries.insert(path, bytes.into());
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> { self.entries.get(path).map(Vec::as_slice) }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().map(|(p, b)| (p.as_str(), b.as_slice()))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> { self.entries.keys().map(String::as_str) }
}

fn validate_rel(path: &str) -> Result<()> {
    let ok = path.split('/').all(|seg| !seg.is_empty() && seg != "." && seg != "..");
    if ok { Ok(()) } else { Err(TreeError::InvalidPath(path.to_string())) }
}

/// Source and sink of trees.
#[async_trait::async_trait]
pub trait TreeStore: Send + Sync {
    async fn read_tree(&self) -> Result<Tree>;
    /// Replace the stored tree with `tree`. Either all entries land or none do.
    async fn write_tree(&self, tree: &Tree) -> Result<()>;
}

/// Tree stored as a plain directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    pub fn root(&self) -> &Path { &self.root }

    fn sibling(&self, tag: &str) -> Result<PathBuf> {
        let name = self
            .root
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| TreeError::InvalidPath(self.root.display().to_string()))?;
        Ok(self.root.with_file_name(format!(".{}.{}-{}", name, tag, std::process::id())))
    }
}

#[async_trait::async_trait]
impl TreeStore for DirStore {
    async fn read_tree(&self) -> Result<Tree> {
        let mut tree = Tree::new();
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let mut rd = tokio::fs::read_dir(&dir).await.map_err(io_err(&dir))?;
            while let Some(entry) = rd.next_entry().await.map_err(io_err(&dir))? {
                let path = entry.path();
                let ft = entry.file_type().await.map_err(io_err(&path))?;
                if ft.is_dir() {
                    pending.push(path);
                } else if ft.is_file() {
                    let rel = rel_path(&self.root, &path)?;
                    let bytes = tokio::fs::read(&path).await.map_err(io_err(&path))?;
                    debug!(path = %rel, bytes = bytes.len(), "read");
                    tree.insert(rel, bytes)?;
                } else {
                    debug!(path = %path.display(), "skipping non-regular file");
                }
            }
        }
        Ok(tree)
    }

    async fn write_tree(&self, tree: &Tree) -> Result<()> {
        let staging = self.sibling("staging")?;
        if tokio::fs::metadata(&staging).await.is_ok() {
            tokio::fs::remove_dir_all(&staging).await.map_err(io_err(&staging))?;
        }
        tokio::fs::create_dir_all(&staging).await.map_err(io_err(&staging))?;
        for (rel, bytes) in tree.iter() {
            let path = staging.join(rel);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(io_err(parent))?;
            }
            tokio::fs::write(&path, bytes).await.map_err(io_err(&path))?;
        }

        // swap the staged tree in
        if tokio::fs::metadata(&self.root).await.is_ok() {
            let old = self.sibling("old")?;
            tokio::fs::rename(&self.root, &old).await.map_err(io_err(&self.root))?;
            tokio::fs::rename(&staging, &self.root).await.map_err(io_err(&staging))?;
            tokio::fs::remove_dir_all(&old).await.map_err(io_err(&old))?;
        } else {
            tokio::fs::rename(&staging, &self.root).await.map_err(io_err(&staging))?;
        }
        info!(root = %self.root.display(), entries = tree.len(), "tree written");
        Ok(())
    }
}

fn rel_path(root: &Path, path: &Path) -> Result<String> {
    let rel = path.strip_prefix(root).map_err(|_| TreeError::InvalidPath(path.display().to_string()))?;
    let parts = rel
        .components()
        .map(|c| c.as_os_str().to_str().ok_or_else(|| TreeError::InvalidPath(path.display().to_string())))
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join("/"))
}

/// Normalize every entry of `tree` into a fresh tree of one file per object.
/// Also returns the source path each output came from.
pub fn normalize_tree(tree: &Tree, opts: &NormalizeOptions) -> Result<(Tree, BTreeMap<String, String>)> {
    let normalized = normalize(tree.iter(), opts)?;
    let mut out = Tree::new();
    for (path, text) in normalized.files {
        out.insert(path, text)?;
    }
    Ok((out, normalized.origins))
}

/// Patch namespaces in every manifest entry; other entries pass through.
/// Returns the new tree and the number of objects patched.
pub fn patch_tree(tree: &Tree, policy: &NamespacePolicy) -> Result<(Tree, usize)> {
    let mut out = Tree::new();
    let mut total = 0usize;
    for (path, bytes) in tree.iter() {
        if !is_manifest_path(path) {
            out.insert(path, bytes)?;
            continue;
        }
        let patched = patch_namespaces_bytes(path, bytes, policy)?;
        total += patched.patched;
        out.insert(path, patched.text)?;
    }
    Ok((out, total))
}

/// Patch a single manifest file in place. Returns the number of objects patched.
pub async fn patch_file(path: Option<&Path>, policy: &NamespacePolicy) -> Result<usize> {
    let path = path.ok_or_else(|| LensError::Config("yaml path required".into()))?;
    if policy.is_noop() {
        warn!(path = %path.display(), "neither namespace fill nor namespace override is enabled, doing nothing");
        return Ok(0);
    }
    let bytes = tokio::fs::read(path).await.map_err(io_err(path))?;
    let patched = patch_namespaces_bytes(&path.display().to_string(), &bytes, policy)?;

    let name = path.file_name().and_then(|n| n.to_str()).ok_or_else(|| TreeError::InvalidPath(path.display().to_string()))?;
    let tmp = path.with_file_name(format!(".{}.tmp-{}", name, std::process::id()));
    tokio::fs::write(&tmp, patched.text.as_bytes()).await.map_err(io_err(&tmp))?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err(path))?;
    Ok(patched.patched)
}
