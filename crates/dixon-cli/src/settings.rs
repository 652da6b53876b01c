//! Run settings assembled from the config file and command-line flags.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use dixon_model::Site;
use dixon_standards::HarmonizeConfig;

/// Path flags that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub download_root: Option<PathBuf>,
    pub database_root: Option<PathBuf>,
    pub check_root: Option<PathBuf>,
    pub swap_record: Option<PathBuf>,
}

/// Loads `path` (defaults when absent) and applies the overrides.
pub fn resolve_config(path: &Path, overrides: &ConfigOverrides) -> Result<HarmonizeConfig> {
    let mut config = HarmonizeConfig::load_or_default(path)
        .with_context(|| format!("cannot read configuration {}", path.display()))?;
    if let Some(root) = &overrides.download_root {
        config.download_root.clone_from(root);
    }
    if let Some(root) = &overrides.database_root {
        config.database_root.clone_from(root);
    }
    if let Some(root) = &overrides.check_root {
        config.check_root.clone_from(root);
    }
    if let Some(record) = &overrides.swap_record {
        config.swap_record = Some(record.clone());
    }
    Ok(config)
}

/// Sites named on the command line: one site or `all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteSelection {
    All,
    One(Site),
}

impl SiteSelection {
    pub fn sites(&self) -> Vec<Site> {
        match self {
            SiteSelection::All => Site::ALL.to_vec(),
            SiteSelection::One(site) => vec![*site],
        }
    }
}

impl FromStr for SiteSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(SiteSelection::All);
        }
        s.parse().map(SiteSelection::One).map_err(|_| {
            let names: Vec<&str> = Site::ALL.iter().map(Site::as_str).collect();
            format!("unknown site {s:?}; expected one of {} or all", names.join(", "))
        })
    }
}

impl fmt::Display for SiteSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteSelection::All => f.write_str("all"),
            SiteSelection::One(site) => write!(f, "{site}"),
        }
    }
}
