//! Error types for archive discovery and extraction.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// Directory not found or not a directory.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A site with an experiment level has a patient folder without one.
    #[error("no experiment folder in {path}")]
    MissingExperiment { path: PathBuf },

    /// The archive could not be opened or an entry could not be unpacked.
    #[error("failed to extract {archive}: {message}")]
    Extraction { archive: PathBuf, message: String },

    /// An entry name escapes the extraction directory.
    #[error("unsafe entry '{entry}' in {archive}")]
    UnsafeEntry { archive: PathBuf, entry: String },

    #[error("failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create scratch directory: {source}")]
    Scratch {
        #[source]
        source: std::io::Error,
    },
}

impl IngestError {
    pub(crate) fn dir_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryRead {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn extraction(archive: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Extraction {
            archive: archive.into(),
            message: message.to_string(),
        }
    }
}

/// Result type for ingest operations.
pub type Result<T> = std::result::Result<T, IngestError>;
