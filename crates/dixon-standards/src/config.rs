//! Pipeline configuration loaded from TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StandardsError;
use crate::exclusion::ExclusionList;

pub const DEFAULT_PHILIPS_OUT_PHASE_MAX_ECHO_MS: f64 = 2.0;
pub const DEFAULT_MAX_REPETITIONS: u32 = 3;

/// Settings shared by every harmonization run.
///
/// Every field has a default so a partial file (or no file) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarmonizeConfig {
    /// Root of the downloaded archive export.
    pub download_root: PathBuf,
    /// Root of the harmonized database.
    pub database_root: PathBuf,
    /// Directory receiving the curation reports.
    pub check_root: PathBuf,
    /// Curated fat-water swap record; `None` disables swap correction.
    pub swap_record: Option<PathBuf>,
    /// Philips echo times below this value are out-of-phase.
    pub philips_out_phase_max_echo_ms: f64,
    /// Highest repetition accepted for sites written in canonical order.
    pub max_repetitions: u32,
    /// Patient IDs excluded in addition to the built-in list.
    pub exclude: Vec<String>,
}

impl Default for HarmonizeConfig {
    fn default() -> Self {
        Self {
            download_root: PathBuf::from("build/dixon_1_download"),
            database_root: PathBuf::from("build/dixon_2_data"),
            check_root: PathBuf::from("build/dixon_3_check"),
            swap_record: None,
            philips_out_phase_max_echo_ms: DEFAULT_PHILIPS_OUT_PHASE_MAX_ECHO_MS,
            max_repetitions: DEFAULT_MAX_REPETITIONS,
            exclude: Vec::new(),
        }
    }
}

impl HarmonizeConfig {
    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, StandardsError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn load(path: &Path) -> Result<Self, StandardsError> {
        let contents = std::fs::read_to_string(path).map_err(|e| StandardsError::io(path, e))?;
        let config: Self = toml::from_str(&contents).map_err(|e| StandardsError::Toml {
            path: path.to_path_buf(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), "loaded harmonize config");
        Ok(config)
    }

    /// Built-in exclusions extended with the configured ones.
    pub fn exclusion_list(&self) -> Result<ExclusionList, StandardsError> {
        let mut list = ExclusionList::builtin();
        list.extend_from_strs(self.exclude.iter().map(String::as_str))?;
        Ok(list)
    }
}
