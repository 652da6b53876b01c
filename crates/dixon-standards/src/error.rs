#![deny(unsafe_code)]

use std::path::PathBuf;

use dixon_model::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum StandardsError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to parse CSV {path}: {message}")]
    Csv { path: PathBuf, message: String },

    #[error("{path} line {line}: {source}")]
    InvalidRow {
        path: PathBuf,
        line: u64,
        #[source]
        source: ModelError,
    },

    #[error("{path} line {line}: Swapped must be 0 or 1, got '{value}'")]
    InvalidSwapFlag {
        path: PathBuf,
        line: u64,
        value: String,
    },

    #[error("{path} line {line}: duplicate swap record for {key}")]
    DuplicateSwapRow {
        path: PathBuf,
        line: u64,
        key: String,
    },

    #[error("invalid excluded patient id: {0}")]
    InvalidExclusion(#[source] ModelError),
}

impl StandardsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
