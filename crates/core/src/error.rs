use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("YAML syntax error at line {line} column {column}: {message}")]
    Syntax { line: usize, column: usize, message: String },
    #[error("input is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("unsupported tag {tag} at line {line}")]
    UnsupportedTag { tag: String, line: usize },
    #[error("value {value:?} at line {line} does not match its tag {tag}")]
    TagMismatch { tag: String, value: String, line: usize },
    #[error("duplicated mapping key {key} at line {line}")]
    DuplicateKey { key: String, line: usize },
    #[error("unknown alias at line {line}")]
    UnknownAlias { line: usize },
    #[error("cannot emit a collection as a mapping key")]
    UnsupportedKey,
    #[error("failed to write YAML: {0}")]
    Emit(String),
    #[error("merge key at line {line} must point at a mapping or a sequence of mappings")]
    InvalidMerge { line: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
