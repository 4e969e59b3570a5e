//! Multi-document stream loading on top of the yaml-rust2 event parser.
//!
//! The event layer is used instead of a ready-made document loader because the
//! scalar style (plain vs quoted) decides whether `0755` is an octal integer or
//! a string, and loaders discard it.

use std::collections::HashMap;

use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

use crate::error::{Error, Result};
use crate::scalar::{self, resolve_plain};
use crate::value::{Mapping, Value};

const CORE_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// `!!x`, whether or not the parser has already expanded the handle.
fn is_core(tag: &Tag) -> bool { tag.handle == CORE_TAG_PREFIX || tag.handle == "!!" }

/// Parse every document in `text`. Empty documents become `Value::Null`
/// entries so callers can tell them apart from absent ones.
pub fn parse_stream(text: &str) -> Result<Vec<Value>> {
    let mut loader = Loader::default();
    let mut parser = Parser::new(text.chars());
    parser.load(&mut loader, true).map_err(|e| Error::Syntax {
        line: e.marker().line(),
        column: e.marker().col() + 1,
        message: e.info().to_string(),
    })?;
    match loader.error {
        Some(e) => Err(e),
        None => Ok(loader.docs),
    }
}

pub fn parse_stream_bytes(bytes: &[u8]) -> Result<Vec<Value>> { parse_stream(std::str::from_utf8(bytes)?) }

enum Frame {
    Seq { items: Vec<Value>, anchor: usize },
    Map { map: Mapping, key: Option<Value>, merge: bool, merged: Vec<Value>, anchor: usize },
}

#[derive(Default)]
struct Loader {
    docs: Vec<Value>,
    root: Option<Value>,
    stack: Vec<Frame>,
    anchors: HashMap<usize, Value>,
    error: Option<Error>,
}

impl MarkedEventReceiver for Loader {
    fn on_event(&mut self, ev: Event, mark: Marker) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.handle(ev, mark) {
            self.error = Some(e);
        }
    }
}

impl Loader {
    fn handle(&mut self, ev: Event, mark: Marker) -> Result<()> {
        match ev {
            Event::DocumentStart { .. } => {
                self.root = None;
                self.anchors.clear();
            }
            Event::DocumentEnd { .. } => self.docs.push(self.root.take().unwrap_or(Value::Null)),
            Event::Scalar(text, style, anchor, tag) => {
                if matches!(style, TScalarStyle::Plain) && tag.is_none() && text == "<<" {
                    if let Some(Frame::Map { key: None, merge, .. }) = self.stack.last_mut() {
                        *merge = true;
                    }
                }
                let v = resolve_scalar(&text, style, tag.as_ref(), mark.line())?;
                self.complete(v, anchor, mark)?;
            }
            Event::SequenceStart(anchor, tag) => {
                check_collection_tag(tag.as_ref(), "seq", mark.line())?;
                self.stack.push(Frame::Seq { items: Vec::new(), anchor });
            }
            Event::MappingStart(anchor, tag) => {
                check_collection_tag(tag.as_ref(), "map", mark.line())?;
                self.stack.push(Frame::Map { map: Mapping::new(), key: None, merge: false, merged: Vec::new(), anchor });
            }
            Event::SequenceEnd | Event::MappingEnd => {
                let (v, anchor) = match self.stack.pop() {
                    Some(Frame::Seq { items, anchor }) => (Value::Sequence(items), anchor),
                    Some(Frame::Map { map, anchor, .. }) => (Value::Mapping(map), anchor),
                    None => return Ok(()),
                };
                self.complete(v, anchor, mark)?;
            }
            Event::Alias(id) => {
                let v = self.anchors.get(&id).cloned().ok_or(Error::UnknownAlias { line: mark.line() })?;
                self.complete(v, 0, mark)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Attach a finished node to its parent (or make it the document root).
    fn complete(&mut self, v: Value, anchor: usize, mark: Marker) -> Result<()> {
        if anchor > 0 {
            self.anchors.insert(anchor, v.clone());
        }
        match self.stack.last_mut() {
            None => self.root = Some(v),
            Some(Frame::Seq { items, .. }) => items.push(v),
            Some(Frame::Map { map, key, merge, merged, .. }) => match key.take() {
                None => *key = Some(v),
                Some(_) if *merge => {
                    *merge = false;
                    merge_into(map, merged, v, mark.line())?;
                }
                Some(k) => {
                    if let Some(pos) = merged.iter().position(|m| *m == k) {
                        // explicit keys win over merged ones
                        merged.swap_remove(pos);
                    } else if map.iter().any(|(existing, _)| *existing == k) {
                        return Err(Error::DuplicateKey { key: key_label(&k), line: mark.line() });
                    }
                    map.insert(k, v);
                }
            },
        }
        Ok(())
    }
}

/// Expand a `<<` merge: entries of the merged mapping(s) are added unless the
/// key is already present. Earlier mappings of a sequence take precedence.
fn merge_into(map: &mut Mapping, merged: &mut Vec<Value>, source: Value, line: usize) -> Result<()> {
    let sources = match source {
        Value::Mapping(m) => vec![m],
        Value::Sequence(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Mapping(m) => Ok(m),
                _ => Err(Error::InvalidMerge { line }),
            })
            .collect::<Result<Vec<_>>>()?,
        _ => return Err(Error::InvalidMerge { line }),
    };
    for m in sources {
        for (k, v) in m.iter() {
            if map.iter().any(|(existing, _)| existing == k) {
                continue;
            }
            merged.push(k.clone());
            map.insert(k.clone(), v.clone());
        }
    }
    Ok(())
}

fn resolve_scalar(text: &str, style: TScalarStyle, tag: Option<&Tag>, line: usize) -> Result<Value> {
    let Some(tag) = tag else {
        return Ok(match style {
            TScalarStyle::Plain => resolve_plain(text),
            _ => Value::String(text.to_string()),
        });
    };
    // non-specific `!` forces a string
    if (tag.handle == "!" && tag.suffix.is_empty()) || (tag.handle.is_empty() && tag.suffix == "!") {
        return Ok(Value::String(text.to_string()));
    }
    if !is_core(tag) {
        return Err(Error::UnsupportedTag { tag: format!("{}{}", tag.handle, tag.suffix), line });
    }
    let mismatch = || Error::TagMismatch { tag: format!("!!{}", tag.suffix), value: text.to_string(), line };
    match tag.suffix.as_str() {
        "str" => Ok(Value::String(text.to_string())),
        "null" if scalar::resolve_null(text) => Ok(Value::Null),
        "bool" => scalar::resolve_bool(text).map(Value::Bool).ok_or_else(mismatch),
        "int" => scalar::resolve_int(text).map(Value::from).ok_or_else(mismatch),
        "float" => scalar::resolve_float(text)
            .or_else(|| scalar::resolve_int(text).and_then(|i| Value::from(i).as_i64()).map(|i| i as f64))
            .map(Value::Float)
            .ok_or_else(mismatch),
        "null" => Err(mismatch()),
        other => Err(Error::UnsupportedTag { tag: format!("!!{}", other), line }),
    }
}

fn check_collection_tag(tag: Option<&Tag>, expected: &str, line: usize) -> Result<()> {
    match tag {
        None => Ok(()),
        Some(t) if is_core(t) && t.suffix == expected => Ok(()),
        Some(t) => Err(Error::UnsupportedTag { tag: format!("{}{}", t.handle, t.suffix), line }),
    }
}

fn key_label(k: &Value) -> String {
    match k {
        Value::String(s) => s.clone(),
        other => scalar::represent_int(other).unwrap_or_else(|| format!("{:?}", other)),
    }
}
