//! Archive export ingestion: discovering patient folders and series
//! archives, and unpacking them into scratch space.

#![deny(unsafe_code)]

pub mod discovery;
pub mod error;
pub mod extract;
pub mod scratch;

pub use discovery::{PatientFolder, SeriesArchive, list_patient_folders, list_series_archives};
pub use error::{IngestError, Result};
pub use extract::{extract_archive, flatten_folder};
pub use scratch::ScratchSpace;
