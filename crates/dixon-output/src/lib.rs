//! Canonical database of harmonized Dixon series.
//!
//! Entries are NIfTI volumes with a JSON provenance sidecar, laid out as
//! `{site}/Patients/{patient}/{study}/{series}`. Writes are check-then-write
//! and existing entries are never modified.

#![deny(unsafe_code)]

mod database;
mod error;
mod nifti_file;
mod provenance;

pub use database::{
    CanonicalDatabase, DONE_SENTINEL, EntryKey, PATIENTS_DIR, StoredStudy, VOLUME_FILE,
    WriteOutcome,
};
pub use error::{OutputError, Result};
pub use nifti_file::{volume_header, write_volume};
pub use provenance::{PROVENANCE_FILE, Provenance, SourceFile};
