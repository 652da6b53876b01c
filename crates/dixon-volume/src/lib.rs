//! Image-series access for the harmonization pipeline.
//!
//! DICOM decoding is delegated to the `dicom` crate behind the
//! [`DicomSource`] trait. On top of it this crate assembles slice stacks
//! into volumes, splits two-echo series by echo time and reconstructs
//! calibrated slice gaps.

#![deny(unsafe_code)]

pub mod dicom_file;
pub mod echo;
pub mod error;
pub mod gap;
pub mod source;
pub mod stack;
#[cfg(feature = "synthetic")]
pub mod synthetic;
pub mod volume;

pub use dicom_file::DicomFileSource;
pub use echo::{EchoPair, EchoTime, split_by_echo_time, split_echo_pair};
pub use error::{Result, VolumeError};
pub use gap::repair_gap;
pub use source::{DicomSource, SeriesFiles};
pub use stack::{Slice, SliceGeometry, SliceStack};
pub use volume::Volume;
