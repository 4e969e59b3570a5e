//! Scalar codec: plain-scalar resolution with octal-preserving integers.
//!
//! File-mode bits in manifests are usually written as `0644` / `0755`. A loader
//! that reads them as decimal, or writes them back as `420`, silently corrupts
//! the mode. Integers therefore come in two flavours:
//!
//! - `^0[0-7]+$` resolves to an [`OctalInt`] that keeps its literal verbatim;
//! - `^[-+]?[0-9]+$` and `^0x[0-9a-fA-F]+$` resolve to plain integers that are
//!   always written back in decimal.
//!
//! Null and bool resolution run before integers; floats and strings after.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::value::{OctalInt, Value};

static OCTAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0[0-7]+$").expect("octal pattern"));
static DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-+]?[0-9]+$").expect("decimal pattern"));
static HEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0x[0-9a-fA-F]+$").expect("hex pattern"));
static FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+]?(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][-+]?[0-9]+)?$").expect("float pattern")
});

/// Result of integer recognition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntScalar {
    Plain(i64),
    Octal(OctalInt),
}

impl From<IntScalar> for Value {
    fn from(i: IntScalar) -> Self {
        match i {
            IntScalar::Plain(v) => Value::Int(v),
            IntScalar::Octal(o) => Value::Octal(o),
        }
    }
}

/// Classify a plain scalar token as an integer. Literals that overflow `i64`
/// are not integers.
pub fn resolve_int(token: &str) -> Option<IntScalar> {
    if OCTAL.is_match(token) {
        return i64::from_str_radix(token, 8).ok().map(|v| IntScalar::Octal(OctalInt::new(v, token)));
    }
    if DECIMAL.is_match(token) {
        return token.parse::<i64>().ok().map(IntScalar::Plain);
    }
    if HEX.is_match(token) {
        return i64::from_str_radix(&token[2..], 16).ok().map(IntScalar::Plain);
    }
    None
}

/// Whether the integer codec may represent `value`. Floats never qualify,
/// even integral ones, and neither does null.
pub fn is_int(value: &Value) -> bool { matches!(value, Value::Int(_) | Value::Octal(_)) }

/// Text form of an integer value: the retained literal for octals, decimal otherwise.
pub fn represent_int(value: &Value) -> Option<String> {
    match value {
        Value::Octal(o) => Some(o.literal().to_string()),
        Value::Int(i) => Some(i.to_string()),
        _ => None,
    }
}

pub fn resolve_null(token: &str) -> bool { matches!(token, "" | "~" | "null" | "Null" | "NULL") }

pub fn resolve_bool(token: &str) -> Option<bool> {
    match token {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

pub fn resolve_float(token: &str) -> Option<f64> {
    match token {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => return Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => return Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return Some(f64::NAN),
        _ => {}
    }
    if FLOAT.is_match(token) { token.parse::<f64>().ok() } else { None }
}

pub fn represent_float(f: f64) -> String {
    if f.is_nan() {
        ".nan".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { ".inf".to_string() } else { "-.inf".to_string() }
    } else {
        // Debug keeps a fractional part or exponent, so the text reads back as a float.
        format!("{:?}", f)
    }
}

/// Resolve an untagged plain scalar.
pub fn resolve_plain(token: &str) -> Value {
    if resolve_null(token) {
        return Value::Null;
    }
    if let Some(b) = resolve_bool(token) {
        return Value::Bool(b);
    }
    if let Some(i) = resolve_int(token) {
        return i.into();
    }
    if looks_like_int(token) {
        // out of i64 range; keep the digits rather than round through f64
        return Value::String(token.to_string());
    }
    if let Some(f) = resolve_float(token) {
        return Value::Float(f);
    }
    Value::String(token.to_string())
}

fn looks_like_int(token: &str) -> bool { OCTAL.is_match(token) || DECIMAL.is_match(token) || HEX.is_match(token) }

/// YAML 1.1 boolean spellings this reader keeps as strings but Kubernetes
/// tooling loads as booleans.
pub const YAML11_BOOL_WORDS: &[&str] = &[
    "y", "Y", "yes", "Yes", "YES", "n", "N", "no", "No", "NO", "on", "On", "ON", "off", "Off", "OFF",
];

/// A string that would read back as something else must be quoted. Oversized
/// integer literals and YAML 1.1 boolean words are quoted too, since other
/// readers take them as numbers or booleans.
pub fn is_ambiguous(s: &str) -> bool {
    looks_like_int(s) || YAML11_BOOL_WORDS.contains(&s) || !matches!(resolve_plain(s), Value::String(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn octal_literals_keep_their_text() {
        for lit in ["0755", "0644", "00", "0777", "01"] {
            match resolve_int(lit) {
                Some(IntScalar::Octal(o)) => {
                    assert_eq!(o.literal(), lit);
                    assert_eq!(o.value(), i64::from_str_radix(lit, 8).unwrap());
                    assert_eq!(represent_int(&Value::Octal(o)).as_deref(), Some(lit));
                }
                other => panic!("{lit} resolved to {other:?}"),
            }
        }
        assert_eq!(resolve_int("0755"), Some(IntScalar::Octal(OctalInt::new(493, "0755"))));
    }

    #[test]
    fn decimal_and_hex_are_plain() {
        assert_eq!(resolve_int("0"), Some(IntScalar::Plain(0)));
        assert_eq!(resolve_int("42"), Some(IntScalar::Plain(42)));
        assert_eq!(resolve_int("+5"), Some(IntScalar::Plain(5)));
        assert_eq!(resolve_int("-17"), Some(IntScalar::Plain(-17)));
        assert_eq!(resolve_int("0x1F"), Some(IntScalar::Plain(31)));
        // leading zero with 8/9 is not octal-looking
        assert_eq!(resolve_int("0089"), Some(IntScalar::Plain(89)));
        assert_eq!(represent_int(&Value::Int(31)).as_deref(), Some("31"));
        assert_eq!(represent_int(&Value::Int(5)).as_deref(), Some("5"));
    }

    #[test]
    fn non_integers_fall_through() {
        assert_eq!(resolve_int("1.5"), None);
        assert_eq!(resolve_int("0x"), None);
        assert_eq!(resolve_int("0o17"), None);
        assert_eq!(resolve_int("abc"), None);
        assert_eq!(resolve_int("99999999999999999999"), None);
        assert!(!is_int(&Value::Float(2.0)));
        assert!(!is_int(&Value::Float(f64::NAN)));
        assert!(!is_int(&Value::Null));
        assert_eq!(represent_int(&Value::Float(1.5)), None);
    }

    #[test]
    fn resolution_order() {
        assert_eq!(resolve_plain(""), Value::Null);
        assert_eq!(resolve_plain("~"), Value::Null);
        assert_eq!(resolve_plain("True"), Value::Bool(true));
        assert_eq!(resolve_plain("yes"), Value::String("yes".into()));
        assert_eq!(resolve_plain("1.5"), Value::Float(1.5));
        assert_eq!(resolve_plain("99999999999999999999"), Value::String("99999999999999999999".into()));
        assert_eq!(resolve_plain("-.inf"), Value::Float(f64::NEG_INFINITY));
        assert!(matches!(resolve_plain(".nan"), Value::Float(f) if f.is_nan()));
        assert_eq!(resolve_plain("nginx:1.25"), Value::String("nginx:1.25".into()));
    }

    #[test]
    fn float_text_reads_back_as_float() {
        for f in [1.0, 0.5, -2.25, 1e20, 1e-7] {
            let text = represent_float(f);
            assert_eq!(resolve_plain(&text), Value::Float(f), "text={text}");
        }
        assert_eq!(represent_float(f64::INFINITY), ".inf");
    }

    #[test]
    fn ambiguous_strings() {
        for s in ["0755", "123", "true", "null", "", "1.0", "0x10", "99999999999999999999"] {
            assert!(is_ambiguous(s), "{s}");
        }
        for s in ["hello", "v1", "0o17", "1.2.3", "yesterday", "online"] {
            assert!(!is_ambiguous(s), "{s}");
        }
    }

    #[test]
    fn yaml11_bool_words_are_ambiguous() {
        for s in YAML11_BOOL_WORDS {
            assert_eq!(resolve_plain(s), Value::String(s.to_string()));
            assert!(is_ambiguous(s), "{s}");
        }
    }

    proptest! {
        #[test]
        fn any_octal_literal_is_kept_verbatim(lit in "0[0-7]{1,20}") {
            match resolve_int(&lit) {
                Some(IntScalar::Octal(o)) => {
                    prop_assert_eq!(o.literal(), lit.as_str());
                    prop_assert_eq!(represent_int(&Value::Octal(o)), Some(lit.clone()));
                }
                other => prop_assert!(false, "{} resolved to {:?}", lit, other),
            }
        }

        #[test]
        fn any_decimal_prints_without_leading_zero(v in any::<i64>()) {
            let text = v.to_string();
            prop_assert_eq!(resolve_int(&text), Some(IntScalar::Plain(v)));
            let back = represent_int(&Value::Int(v)).unwrap_or_default();
            prop_assert_eq!(&back, &text);
            prop_assert!(v == 0 || !back.trim_start_matches('-').starts_with('0'));
        }
    }
}
