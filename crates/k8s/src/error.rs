use thiserror::Error;

#[derive(Debug, Error)]
pub enum LensError {
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: lens_core::Error,
    },
    #[error("object {index} in {path} is missing property: {field}")]
    Validation { path: String, index: usize, field: &'static str },
    #[error("object {index} in {path}: items must be a sequence")]
    InvalidItems { path: String, index: usize },
    #[error("{output} is produced by both {first} and {second}")]
    Duplicate { output: String, first: String, second: String },
    #[error("{0}")]
    Config(String),
    #[error("failed to serialize {path}: {source}")]
    Emit {
        path: String,
        #[source]
        source: lens_core::Error,
    },
}

impl LensError {
    pub(crate) fn parse(path: &str, source: lens_core::Error) -> Self { Self::Parse { path: path.to_string(), source } }

    pub(crate) fn emit(path: &str, source: lens_core::Error) -> Self { Self::Emit { path: path.to_string(), source } }

    pub(crate) fn missing(path: &str, index: usize, field: &'static str) -> Self {
        Self::Validation { path: path.to_string(), index, field }
    }
}

pub type Result<T, E = LensError> = std::result::Result<T, E>;
