//! Lens core: dynamic YAML documents with an octal-preserving integer codec,
//! multi-document stream parsing and block-style serialization.

#![forbid(unsafe_code)]

pub mod emit;
mod error;
pub mod parse;
pub mod scalar;
mod value;

pub use emit::{serialize_stream, to_string, EmitOptions, DOCUMENT_SEPARATOR};
pub use error::{Error, Result};
pub use parse::{parse_stream, parse_stream_bytes};
pub use value::{Mapping, OctalInt, Value};

pub mod prelude {
    pub use super::{parse_stream, serialize_stream, EmitOptions, Mapping, OctalInt, Value};
}
