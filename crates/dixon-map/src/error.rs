//! Error types for series classification.

use dixon_model::ModelError;

/// Why a raw series (or a patient folder) could not be given a canonical name.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifyError {
    /// The GE description is not one of the known Dixon descriptions.
    #[error("unknown series description '{0}'")]
    UnknownSeriesDescription(String),

    #[error("missing DICOM attribute {0}")]
    MissingTag(&'static str),

    /// The repetition counter went past the configured cap.
    #[error("{name} exceeds the maximum of {max} repetitions")]
    TooManyRepetitions { name: String, max: u32 },

    #[error("cannot derive a patient id from folder '{folder}': {source}")]
    InvalidPatientId {
        folder: String,
        #[source]
        source: ModelError,
    },
}
