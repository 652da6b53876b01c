//! Error types for reading and reshaping image series.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("failed to read {file}: {message}")]
    Dicom { file: PathBuf, message: String },

    #[error("{file} has no {attribute}")]
    MissingAttribute {
        file: PathBuf,
        attribute: &'static str,
    },

    #[error("failed to read directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("series contains no images")]
    EmptySeries,

    #[error("inconsistent slice geometry: {0}")]
    InconsistentGeometry(String),

    #[error("two slices at location {location:.4}")]
    DuplicateSlice { location: f64 },

    #[error("non-uniform slice spacing: expected {expected:.4} mm, found {found:.4} mm after slice {index}")]
    NonUniformSpacing {
        expected: f64,
        found: f64,
        index: usize,
    },

    /// Only one echo time where an in-phase/out-phase pair was expected.
    #[error("only one echo time ({echo_time} ms) in series")]
    IncompleteEchoPair { echo_time: f64 },

    #[error("expected two echo times, found {}", .echo_times.len())]
    UnexpectedEchoCount { echo_times: Vec<f64> },

    /// A slice-gap repair names a slice location that the series lacks.
    #[error("no slice at location {location} to anchor the gap repair")]
    GapAnchorNotFound { location: f64 },
}

pub type Result<T> = std::result::Result<T, VolumeError>;
