#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod exclusion;
pub mod hash;
pub mod profiles;
pub mod swap_record;

pub use crate::config::HarmonizeConfig;
pub use crate::error::StandardsError;
pub use crate::exclusion::ExclusionList;
pub use crate::hash::sha256_hex;
pub use crate::profiles::{RegroupedPatient, SiteProfile, SliceGapRecord, WriteOrder};
pub use crate::swap_record::{FatWaterSwapRecord, SWAP_RECORD_HEADER, SwapKey};
