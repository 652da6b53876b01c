//! Harmonization orchestrator for multi-site Dixon exports.
//!
//! [`Harmonizer`] walks a site's archive export patient by patient, names
//! every series through the site adapter, splits and repairs two-echo
//! series, applies fat-water swap corrections and stores the result in the
//! canonical database. Per-series problems are collected in a
//! [`SiteReport`] rather than aborting the run.

#![deny(unsafe_code)]

pub mod context;
pub mod harmonizer;
pub mod outcome;

pub use context::{HarmonizeContext, load_swap_record};
pub use harmonizer::{Harmonizer, SiteRun};
pub use outcome::{FailureKind, PatientOutcome, PatientState, SeriesFailure, SiteReport};
