//! Run-wide inputs of the harmonizer.
//!
//! A [`HarmonizeContext`] bundles the archive location, the database, the
//! curated records and the tunables, so the orchestrator holds no global
//! state. Build it from a [`HarmonizeConfig`] or piece by piece.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dixon_map::AdapterOptions;
use dixon_output::CanonicalDatabase;
use dixon_standards::{ExclusionList, FatWaterSwapRecord, HarmonizeConfig};
use dixon_standards::config::DEFAULT_MAX_REPETITIONS;

#[derive(Debug, Clone)]
pub struct HarmonizeContext {
    /// Root holding the per-site archive exports.
    pub download_root: PathBuf,
    pub database: CanonicalDatabase,
    /// Curated fat-water swap corrections; `None` disables swapping.
    pub swap_record: Option<FatWaterSwapRecord>,
    pub exclusions: ExclusionList,
    pub adapter_options: AdapterOptions,
    /// Repetition cap for sites written in canonical order.
    pub max_repetitions: u32,
    /// Parent of the per-patient scratch directories; system temp when `None`.
    pub scratch_root: Option<PathBuf>,
}

impl HarmonizeContext {
    /// A context with the built-in exclusions and default tunables.
    pub fn new(download_root: impl Into<PathBuf>, database: CanonicalDatabase) -> Self {
        Self {
            download_root: download_root.into(),
            database,
            swap_record: None,
            exclusions: ExclusionList::builtin(),
            adapter_options: AdapterOptions::default(),
            max_repetitions: DEFAULT_MAX_REPETITIONS,
            scratch_root: None,
        }
    }

    /// Opens the database and loads every curated input named by `config`.
    ///
    /// Failures here are fatal for the run.
    pub fn from_config(config: &HarmonizeConfig) -> Result<Self> {
        let database = CanonicalDatabase::create(&config.database_root).with_context(|| {
            format!(
                "cannot create output directory {}",
                config.database_root.display()
            )
        })?;
        let exclusions = config
            .exclusion_list()
            .context("invalid exclusion list in configuration")?;
        let mut context = Self::new(&config.download_root, database)
            .with_exclusions(exclusions)
            .with_adapter_options(AdapterOptions {
                philips_out_phase_max_echo_ms: config.philips_out_phase_max_echo_ms,
            })
            .with_max_repetitions(config.max_repetitions);
        if let Some(path) = &config.swap_record {
            context = context.with_swap_record(load_swap_record(path)?);
        }
        Ok(context)
    }

    pub fn with_swap_record(mut self, record: FatWaterSwapRecord) -> Self {
        self.swap_record = Some(record);
        self
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionList) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn with_adapter_options(mut self, options: AdapterOptions) -> Self {
        self.adapter_options = options;
        self
    }

    pub fn with_max_repetitions(mut self, max: u32) -> Self {
        self.max_repetitions = max;
        self
    }

    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }
}

/// Loads the swap record; a malformed record aborts the run.
pub fn load_swap_record(path: &Path) -> Result<FatWaterSwapRecord> {
    let record = FatWaterSwapRecord::load(path)
        .with_context(|| format!("cannot parse swap record {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        rows = record.len(),
        swapped = record.swapped_count(),
        "loaded fat-water swap record"
    );
    Ok(record)
}
