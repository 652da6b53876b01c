use thiserror::Error;

/// Errors raised while constructing or parsing model values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid patient id '{0}': expected <4 digits>_<3 digits>")]
    InvalidPatientId(String),

    #[error("invalid canonical series name '{0}'")]
    InvalidSeriesName(String),

    #[error("repetition must be a positive integer")]
    ZeroRepetition,

    #[error("unknown site '{0}'")]
    UnknownSite(String),

    #[error("unknown study '{0}'")]
    UnknownStudy(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
