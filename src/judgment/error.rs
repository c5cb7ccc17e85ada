use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("judgment document is not valid JSON")]
    Syntax(#[source] serde_json::Error),

    #[error("judgment document must be a top-level array, found {found}")]
    NotAnArray { found: &'static str },

    #[error("record {record} must be an object, found {found}")]
    RecordNotObject { record: usize, found: &'static str },

    #[error("record {record} has a non-string `query` ({found})")]
    QueryNotString { record: usize, found: &'static str },

    #[error("record {record} is missing a `results` array")]
    MissingResults { record: usize },

    #[error("record {record} result {rank} must be an object, found {found}")]
    ResultNotObject {
        record: usize,
        rank: usize,
        found: &'static str,
    },

    #[error("record {record} result {rank} is missing a boolean `relevant` field")]
    MissingRelevant { record: usize, rank: usize },
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("card index query failed")]
    Index(#[from] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read judgments from {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write judgments to {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize judgments")]
    Serialize(#[source] serde_json::Error),

    #[error("invalid judgment document {path}")]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
}

#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("failed to read {what}")]
    Input {
        what: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("failed to flush sealed judgment records")]
    Checkpoint(#[from] StoreError),
}

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
