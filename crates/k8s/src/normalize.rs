//! Normalizer: split multi-document sources into one key-sorted file per object.

use std::collections::{BTreeMap, VecDeque};

use lens_core::{parse_stream_bytes, EmitOptions, Value};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{LensError, Result};
use crate::manifest::{self, ObjectId};

/// What to do when two documents map to the same output path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Keep the later document without comment.
    Overwrite,
    /// Keep the later document and log a warning.
    #[default]
    Warn,
    /// Abort the run.
    Error,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeOptions {
    pub on_duplicate: DuplicatePolicy,
}

/// Output of a normalize run, keyed by output path.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Normalized {
    /// Serialized object per output path.
    pub files: BTreeMap<String, String>,
    /// Source path each output came from.
    pub origins: BTreeMap<String, String>,
}

/// Normalize every source. Any parse or validation failure aborts the whole
/// run and no output is returned.
pub fn normalize<'a, I>(sources: I, opts: &NormalizeOptions) -> Result<Normalized>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut out = Normalized::default();
    for (path, bytes) in sources {
        normalize_source(&mut out, path, bytes, opts)?;
    }
    Ok(out)
}

fn normalize_source(out: &mut Normalized, path: &str, bytes: &[u8], opts: &NormalizeOptions) -> Result<()> {
    let docs = parse_stream_bytes(bytes).map_err(|e| LensError::parse(path, e))?;

    // List items are appended behind the documents already queued.
    let mut queue: VecDeque<Value> = docs.into();
    let mut index = 0usize;
    while let Some(doc) = queue.pop_front() {
        if doc.is_null() {
            continue;
        }
        if manifest::is_list(&doc) {
            queue.extend(manifest::take_items(doc, path, index + 1)?);
            continue;
        }
        index += 1;
        let id = ObjectId::from_doc(&doc, path, index)?;
        let output = id.output_path();
        let text = lens_core::to_string(&doc, EmitOptions::sorted()).map_err(|e| LensError::emit(path, e))?;
        record(out, output, path, text, opts.on_duplicate)?;
    }
    Ok(())
}

fn record(out: &mut Normalized, output: String, path: &str, text: String, policy: DuplicatePolicy) -> Result<()> {
    if let Some(first) = out.origins.get(&output) {
        match policy {
            DuplicatePolicy::Overwrite => {}
            DuplicatePolicy::Warn => warn!(output = %output, first = %first, second = %path, "duplicate object; keeping the later one"),
            DuplicatePolicy::Error => {
                return Err(LensError::Duplicate { output, first: first.clone(), second: path.to_string() });
            }
        }
    }
    info!("{}→{}", path, output);
    out.origins.insert(output.clone(), path.to_string());
    out.files.insert(output, text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(sources: &[(&str, &str)], opts: NormalizeOptions) -> Result<Normalized> {
        normalize(sources.iter().map(|(p, t)| (*p, t.as_bytes())), &opts)
    }

    #[test]
    fn one_file_per_object_with_sorted_keys() {
        let src = "kind: Service\nmetadata:\n  name: web\n  namespace: team\napiVersion: v1\n---\nkind: ClusterRole\napiVersion: rbac.authorization.k8s.io/v1\nmetadata:\n  name: reader\n";
        let out = run(&[("all.yaml", src)], NormalizeOptions::default()).unwrap();
        assert_eq!(out.files.len(), 2);
        assert_eq!(out.files["team/Service/web.yaml"], "apiVersion: v1\nkind: Service\nmetadata:\n  name: web\n  namespace: team\n");
        assert_eq!(out.origins["_/ClusterRole/reader.yaml"], "all.yaml");
    }

    #[test]
    fn config_map_lists_expand() {
        let src = "\
kind: ConfigMapList
apiVersion: v1
items:
  - kind: ConfigMap
    metadata:
      name: one
      namespace: a
    data:
      mode: 0644
  - kind: ConfigMap
    metadata:
      name: two
";
        let out = run(&[("cm.yaml", src)], NormalizeOptions::default()).unwrap();
        let paths: Vec<_> = out.files.keys().cloned().collect();
        assert_eq!(paths, ["_/ConfigMap/two.yaml", "a/ConfigMap/one.yaml"]);
        assert!(out.files.keys().all(|p| !p.contains("ConfigMapList")));
        assert!(out.files["a/ConfigMap/one.yaml"].contains("mode: 0644"));
    }

    #[test]
    fn expanded_items_follow_queued_documents() {
        // the list's item lands after `b`, so it wins the shared path
        let src = "kind: ConfigMapList\nitems:\n  - kind: ConfigMap\n    metadata: {name: x}\n    data: {from: list}\n---\nkind: ConfigMap\nmetadata: {name: x}\ndata: {from: doc}\n";
        let out = run(&[("s.yaml", src)], NormalizeOptions { on_duplicate: DuplicatePolicy::Overwrite }).unwrap();
        assert!(out.files["_/ConfigMap/x.yaml"].contains("from: list"));
    }

    #[test]
    fn missing_name_aborts_with_index() {
        let src = "---\nkind: Pod\nmetadata:\n  name: ok\n---\nkind: Pod\nmetadata:\n  labels: {}\n";
        let err = run(&[("good.yaml", "kind: Pod\nmetadata: {name: z}\n"), ("bad.yaml", src)], NormalizeOptions::default()).unwrap_err();
        match err {
            LensError::Validation { path, index, field } => {
                assert_eq!(path, "bad.yaml");
                assert_eq!(index, 2);
                assert_eq!(field, "metadata.name");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn metadata_through_a_merge_key() {
        let src = "kind: ConfigMap\nmetadata:\n  <<: &m {name: shared}\ndata: {a: b}\n";
        let out = run(&[("m.yaml", src)], NormalizeOptions::default()).unwrap();
        assert_eq!(out.files["_/ConfigMap/shared.yaml"], "data:\n  a: b\nkind: ConfigMap\nmetadata:\n  name: shared\n");
    }

    #[test]
    fn parse_errors_name_the_source() {
        let err = run(&[("broken.yaml", "a: [1, 2\n")], NormalizeOptions::default()).unwrap_err();
        assert!(matches!(err, LensError::Parse { ref path, .. } if path == "broken.yaml"), "{err}");
        assert!(err.to_string().starts_with("failed to parse broken.yaml"));
    }

    #[test]
    fn duplicate_policies() {
        let a = ("a.yaml", "kind: Pod\nmetadata: {name: p}\nspec: {v: 1}\n");
        let b = ("b.yaml", "kind: Pod\nmetadata: {name: p}\nspec: {v: 2}\n");
        let out = run(&[a, b], NormalizeOptions::default()).unwrap();
        assert_eq!(out.files.len(), 1);
        assert!(out.files["_/Pod/p.yaml"].contains("v: 2"));
        assert_eq!(out.origins["_/Pod/p.yaml"], "b.yaml");

        let err = run(&[a, b], NormalizeOptions { on_duplicate: DuplicatePolicy::Error }).unwrap_err();
        match err {
            LensError::Duplicate { output, first, second } => {
                assert_eq!(output, "_/Pod/p.yaml");
                assert_eq!((first.as_str(), second.as_str()), ("a.yaml", "b.yaml"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_documents_are_skipped() {
        let out = run(&[("e.yaml", "---\n---\n"), ("none.yaml", "")], NormalizeOptions::default()).unwrap();
        assert!(out.files.is_empty());
    }
}
