//! Block-style YAML output through the yaml-rust2 emitter.
//!
//! Output shape: two-space indentation, sequences indented under their key,
//! multi-line strings as literal blocks when they survive one exactly.

use yaml_rust2::yaml::Hash;
use yaml_rust2::{Yaml, YamlEmitter};

use crate::error::{Error, Result};
use crate::scalar::{is_ambiguous, represent_float};
use crate::value::Value;

/// Separator placed between documents of a serialized stream.
pub const DOCUMENT_SEPARATOR: &str = "\n---\n\n";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitOptions {
    /// Sort mapping keys at every level.
    pub sort_keys: bool,
}

impl EmitOptions {
    pub fn sorted() -> Self { Self { sort_keys: true } }
}

/// Serialize one document. The text always ends with a newline.
pub fn to_string(value: &Value, opts: EmitOptions) -> Result<String> {
    if opts.sort_keys {
        let mut sorted = value.clone();
        sorted.sort_keys();
        return dump(&sorted);
    }
    dump(value)
}

/// Serialize a stream, dropping null documents.
pub fn serialize_stream(docs: &[Value], opts: EmitOptions) -> Result<String> {
    let parts = docs
        .iter()
        .filter(|d| !d.is_null())
        .map(|d| to_string(d, opts))
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join(DOCUMENT_SEPARATOR))
}

fn dump(value: &Value) -> Result<String> {
    let doc = to_yaml(value)?;
    let mut out = String::new();
    {
        let mut emitter = YamlEmitter::new(&mut out);
        // literal blocks are all-or-nothing per document; one string a block
        // cannot hold exactly switches the document to escaped scalars
        emitter.multiline_strings(literal_blocks_fit(value));
        emitter.dump(&doc).map_err(|e| Error::Emit(format!("{:?}", e)))?;
    }
    let body = out.strip_prefix("---\n").or_else(|| out.strip_prefix("--- ")).unwrap_or(out.as_str());
    let mut text = body.to_string();
    text.push('\n');
    Ok(text)
}

fn to_yaml(v: &Value) -> Result<Yaml> {
    Ok(match v {
        Value::Null => Yaml::Null,
        Value::Bool(b) => Yaml::Boolean(*b),
        Value::Int(i) => Yaml::Integer(*i),
        // reals are written verbatim, which keeps the octal literal intact
        Value::Octal(o) => Yaml::Real(o.literal().to_string()),
        Value::Float(f) => Yaml::Real(represent_float(*f)),
        // quoting follows this crate's resolver, whose set is wider than the emitter's
        Value::String(s) if is_ambiguous(s) => Yaml::Real(format!("\"{}\"", s)),
        Value::String(s) => Yaml::String(s.clone()),
        Value::Sequence(items) => Yaml::Array(items.iter().map(to_yaml).collect::<Result<_>>()?),
        Value::Mapping(m) => {
            let mut hash = Hash::new();
            for (k, v) in m.iter() {
                if matches!(k, Value::Sequence(_) | Value::Mapping(_)) {
                    return Err(Error::UnsupportedKey);
                }
                hash.insert(to_yaml(k)?, to_yaml(v)?);
            }
            Yaml::Hash(hash)
        }
    })
}

/// Whether every multi-line string of `v` reads back unchanged from a `|`/`|-`
/// literal block. Keys never go into blocks.
fn literal_blocks_fit(v: &Value) -> bool {
    match v {
        Value::String(s) => !s.contains('\n') || literal_ok(s),
        Value::Sequence(items) => items.iter().all(literal_blocks_fit),
        Value::Mapping(m) => m
            .iter()
            .all(|(k, v)| !k.as_str().is_some_and(|s| s.contains('\n')) && literal_blocks_fit(v)),
        _ => true,
    }
}

fn literal_ok(s: &str) -> bool {
    !s.starts_with(char::is_whitespace)
        && !s.trim().is_empty()
        && !s.ends_with("\n\n")
        && s.chars().all(|c| c == '\n' || !c.is_control() || c == '\t')
        && !s.split('\n').any(|line| line.ends_with(' ') || line.ends_with('\t'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_stream;
    use crate::value::Mapping;
    use proptest::prelude::*;

    fn emit(text: &str) -> String {
        let docs = parse_stream(text).unwrap();
        serialize_stream(&docs, EmitOptions::default()).unwrap()
    }

    #[test]
    fn block_layout() {
        let src = "apiVersion: v1\nkind: Pod\nmetadata:\n  name: a\n  labels:\n    app: web\nspec:\n  containers:\n    - name: c\n      image: nginx\n      ports:\n        - 8080\n        - 9090\n";
        assert_eq!(emit(src), src);
    }

    #[test]
    fn nested_sequences_and_empty_collections() {
        let src = "matrix:\n  - - 1\n    - 2\n  - []\nempty: {}\n";
        assert_eq!(emit(src), src);
    }

    #[test]
    fn octal_stays_octal_and_decimal_stays_decimal() {
        assert_eq!(emit("data: 0755\n"), "data: 0755\n");
        assert_eq!(emit("a: +5\nb: 0x1F\nc: 0089\n"), "a: 5\nb: 31\nc: 89\n");
    }

    #[test]
    fn strings_that_read_as_other_types_stay_quoted() {
        let out = emit("a: '0755'\nb: 'true'\nc: ''\nd: '123'\n");
        assert_eq!(out, "a: \"0755\"\nb: \"true\"\nc: \"\"\nd: \"123\"\n");
    }

    #[test]
    fn yaml11_bool_words_stay_quoted() {
        let out = emit("data:\n  enabled: 'yes'\n  flag: \"on\"\n  n: 'no'\n  o: 'off'\n  short: 'y'\n");
        assert_eq!(out, "data:\n  enabled: \"yes\"\n  flag: \"on\"\n  n: \"no\"\n  o: \"off\"\n  short: \"y\"\n");
        let back = parse_stream(&out).unwrap();
        assert_eq!(back[0].get("data").and_then(|d| d.get("enabled")), Some(&Value::from("yes")));
    }

    #[test]
    fn special_characters_read_back_unchanged() {
        let src = "image: 'nginx:1.25'\narg: '--port'\nquote: \"it's\"\nhash: 'a #b'\n";
        let docs = parse_stream(src).unwrap();
        let out = emit(src);
        assert_eq!(parse_stream(&out).unwrap(), docs);
    }

    #[test]
    fn multiline_strings_use_literal_blocks() {
        let src = "script: |\n  echo one\n  echo two\nclip: |-\n  line one\n  line two\n";
        assert_eq!(emit(src), src);
    }

    #[test]
    fn strings_a_block_cannot_hold_are_escaped() {
        assert_eq!(emit("keep: |+\n  kept\n\n"), "keep: \"kept\\n\\n\"\n");
        assert_eq!(emit("a: \"  leading\\nspace\"\n"), "a: \"  leading\\nspace\"\n");
        // the whole document falls back, and still reads back the same
        let src = "a: |\n  fine\n  text\nb: \"trailing \\nspace\"\n";
        let out = emit(src);
        assert!(!out.contains('|'), "{out}");
        assert_eq!(parse_stream(&out).unwrap(), parse_stream(src).unwrap());
    }

    #[test]
    fn stream_drops_nulls_and_uses_separator() {
        let out = emit("a: 1\n---\n---\nb: 2\n");
        assert_eq!(out, "a: 1\n\n---\n\nb: 2\n");
    }

    #[test]
    fn sorted_output() {
        let docs = parse_stream("kind: Pod\napiVersion: v1\nmetadata:\n  name: a\n  labels: {z: 1, a: 2}\n").unwrap();
        let out = to_string(&docs[0], EmitOptions::sorted()).unwrap();
        assert_eq!(out, "apiVersion: v1\nkind: Pod\nmetadata:\n  labels:\n    a: 2\n    z: 1\n  name: a\n");
    }

    proptest! {
        #[test]
        fn any_string_reads_back_as_itself(s in "[a-zA-Z0-9 ._/:#-]{0,16}") {
            let mut m = Mapping::new();
            m.insert("v", s.as_str());
            let out = to_string(&Value::Mapping(m), EmitOptions::default()).unwrap();
            let back = parse_stream(&out).unwrap();
            prop_assert_eq!(back[0].get("v"), Some(&Value::String(s.clone())));
        }
    }

    #[test]
    fn collection_keys_are_rejected() {
        let mut m = Mapping::new();
        m.insert(Value::Sequence(vec![Value::Int(1)]), Value::Null);
        assert!(matches!(to_string(&Value::Mapping(m), EmitOptions::default()), Err(Error::UnsupportedKey)));
    }
}
