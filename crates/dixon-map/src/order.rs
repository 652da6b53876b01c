//! Canonical write order and channel coverage of named series.

use std::collections::BTreeMap;

use dixon_model::{CanonicalSeriesName, Role, SeriesGroup};
use serde::Serialize;

/// Holds named items until they can be released in canonical order:
/// acquisition, then repetition, then role (`out_phase`, `in_phase`, `fat`,
/// `water`).
#[derive(Debug, Clone)]
pub struct CanonicalBuffer<T> {
    items: BTreeMap<CanonicalSeriesName, T>,
}

impl<T> Default for CanonicalBuffer<T> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }
}

impl<T> CanonicalBuffer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previous item when `name` was already buffered.
    pub fn insert(&mut self, name: CanonicalSeriesName, item: T) -> Option<T> {
        self.items.insert(name, item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &CanonicalSeriesName> {
        self.items.keys()
    }

    /// Consumes the buffer in canonical order.
    pub fn drain_ordered(self) -> impl Iterator<Item = (CanonicalSeriesName, T)> {
        self.items.into_iter()
    }
}

/// Which standard Dixon channels a series group ended up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelCoverage {
    /// All of out-phase, in-phase, fat and water.
    Full,
    /// Both echoes but no fat/water separation.
    PhaseOnly,
    /// Anything less.
    Partial,
}

impl ChannelCoverage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelCoverage::Full => "full",
            ChannelCoverage::PhaseOnly => "phase_only",
            ChannelCoverage::Partial => "partial",
        }
    }
}

impl std::fmt::Display for ChannelCoverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coverage of every series group present in `names`.
pub fn channel_coverage<'a>(
    names: impl IntoIterator<Item = &'a CanonicalSeriesName>,
) -> BTreeMap<SeriesGroup, ChannelCoverage> {
    let mut roles: BTreeMap<SeriesGroup, [bool; 4]> = BTreeMap::new();
    for name in names {
        let present = roles.entry(name.group()).or_default();
        if let Some(slot) = Role::STANDARD.iter().position(|role| *role == name.role) {
            present[slot] = true;
        }
    }
    roles
        .into_iter()
        .map(|(group, present)| {
            let coverage = match present {
                [true, true, true, true] => ChannelCoverage::Full,
                [true, true, false, false] => ChannelCoverage::PhaseOnly,
                _ => ChannelCoverage::Partial,
            };
            (group, coverage)
        })
        .collect()
}
