//! Enumerations for sites, studies, acquisitions and image roles.
//!
//! The string forms are the ones used in the canonical database layout and
//! in the curated CSV records, so `Display` and `FromStr` round-trip.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ModelError;

/// A contributing imaging site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Site {
    Leeds,
    Bari,
    Sheffield,
    Turku,
}

impl Site {
    pub const ALL: [Site; 4] = [Site::Leeds, Site::Bari, Site::Sheffield, Site::Turku];

    pub fn as_str(&self) -> &'static str {
        match self {
            Site::Leeds => "Leeds",
            Site::Bari => "Bari",
            Site::Sheffield => "Sheffield",
            Site::Turku => "Turku",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Site {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Site::ALL
            .into_iter()
            .find(|site| site.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ModelError::UnknownSite(s.to_string()))
    }
}

/// Study timepoint of a patient visit.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Study {
    #[default]
    Baseline,
    Followup,
}

impl Study {
    pub fn as_str(&self) -> &'static str {
        match self {
            Study::Baseline => "Baseline",
            Study::Followup => "Followup",
        }
    }
}

impl fmt::Display for Study {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Study {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baseline" => Ok(Study::Baseline),
            "followup" => Ok(Study::Followup),
            _ => Err(ModelError::UnknownStudy(s.to_string())),
        }
    }
}

/// Dixon acquisition relative to contrast injection.
///
/// Variant order is the canonical write order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Acquisition {
    Dixon,
    DixonPostContrast,
}

impl Acquisition {
    pub const ALL: [Acquisition; 2] = [Acquisition::Dixon, Acquisition::DixonPostContrast];

    pub fn as_str(&self) -> &'static str {
        match self {
            Acquisition::Dixon => "Dixon",
            Acquisition::DixonPostContrast => "Dixon_post_contrast",
        }
    }
}

impl fmt::Display for Acquisition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chemical-shift role of one Dixon image.
///
/// `Other` carries an unrecognised vendor label verbatim. Variant order is
/// the canonical write order (`out_phase`, `in_phase`, `fat`, `water`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    OutPhase,
    InPhase,
    Fat,
    Water,
    Other(String),
}

impl Role {
    pub const STANDARD: [Role; 4] = [Role::OutPhase, Role::InPhase, Role::Fat, Role::Water];

    pub fn as_str(&self) -> &str {
        match self {
            Role::OutPhase => "out_phase",
            Role::InPhase => "in_phase",
            Role::Fat => "fat",
            Role::Water => "water",
            Role::Other(label) => label,
        }
    }

    /// Exchanges fat and water; every other role maps to itself.
    #[must_use]
    pub fn swapped(&self) -> Role {
        match self {
            Role::Fat => Role::Water,
            Role::Water => Role::Fat,
            other => other.clone(),
        }
    }

    pub fn is_phase(&self) -> bool {
        matches!(self, Role::OutPhase | Role::InPhase)
    }

    pub fn is_fat_water(&self) -> bool {
        matches!(self, Role::Fat | Role::Water)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let role = match s {
            "out_phase" => Role::OutPhase,
            "in_phase" => Role::InPhase,
            "fat" => Role::Fat,
            "water" => Role::Water,
            "" => return Err(ModelError::InvalidSeriesName(s.to_string())),
            other => Role::Other(other.to_string()),
        };
        Ok(role)
    }
}
