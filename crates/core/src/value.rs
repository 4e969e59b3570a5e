//! Dynamic document tree.

use std::fmt;

/// Integer whose source literal was octal-looking (`0755`). The literal is kept
/// verbatim so it can be re-emitted unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OctalInt {
    value: i64,
    literal: String,
}

impl OctalInt {
    pub(crate) fn new(value: i64, literal: impl Into<String>) -> Self {
        Self { value, literal: literal.into() }
    }

    pub fn value(&self) -> i64 { self.value }
    pub fn literal(&self) -> &str { &self.literal }
}

impl fmt::Display for OctalInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.literal) }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Octal(OctalInt),
    Float(f64),
    String(String),
    Sequence(Vec<Value>),
    Mapping(Mapping),
}

impl Value {
    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

    pub fn as_str(&self) -> Option<&str> {
        match self { Value::String(s) => Some(s), _ => None }
    }

    /// Numeric value of either integer flavour.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Octal(o) => Some(o.value()),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self { Value::Mapping(m) => Some(m), _ => None }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self { Value::Mapping(m) => Some(m), _ => None }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self { Value::Sequence(s) => Some(s), _ => None }
    }

    /// Look up `key` when this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> { self.as_mapping().and_then(|m| m.get(key)) }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> { self.as_mapping_mut().and_then(|m| m.get_mut(key)) }

    /// Recursively sort mapping keys at every level.
    pub fn sort_keys(&mut self) {
        match self {
            Value::Mapping(m) => m.sort_keys(),
            Value::Sequence(items) => items.iter_mut().for_each(Value::sort_keys),
            _ => {}
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::String(s.to_string()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Value::String(s) }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self { Value::Int(i) }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Bool(b) }
}

impl From<Mapping> for Value {
    fn from(m: Mapping) -> Self { Value::Mapping(m) }
}

/// Insertion-ordered mapping. Manifests are small, so lookups are linear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    entries: Vec<(Value, Value)>,
}

impl Mapping {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k.as_str() == Some(key)).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.iter_mut().find(|(k, _)| k.as_str() == Some(key)).map(|(_, v)| v)
    }

    /// Replace the value in place when `key` exists, append otherwise.
    /// Returns the previous value.
    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k.as_str() == Some(key))?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn sort_keys(&mut self) {
        self.entries.sort_by(|(a, _), (b, _)| sort_text(a).cmp(&sort_text(b)));
        for (_, v) in self.entries.iter_mut() { v.sort_keys(); }
    }
}

impl FromIterator<(Value, Value)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let mut m = Mapping::new();
        for (k, v) in iter { m.insert(k, v); }
        m
    }
}

// Keys compare by their scalar text so "10" and 10 sort the same way.
fn sort_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Octal(o) => o.literal().to_string(),
        Value::Float(f) => f.to_string(),
        Value::Sequence(_) | Value::Mapping(_) => String::new(),
    }
}
