//! Repetition disambiguation within one patient study.
//!
//! Repeated acquisitions of the same role get increasing repetition
//! numbers in the order they are encountered: the first `Dixon` fat image
//! is `Dixon_1_fat`, the next one `Dixon_2_fat`.

use std::collections::BTreeSet;

use dixon_model::{Acquisition, CanonicalSeriesName, Role, SeriesGroup};

use crate::error::ClassifyError;

/// Picks the lowest free repetition for `(acquisition, role)` and records it.
pub fn assign_repetition(
    acquisition: Acquisition,
    role: Role,
    assigned: &mut BTreeSet<CanonicalSeriesName>,
) -> CanonicalSeriesName {
    let candidate = lowest_free(acquisition, role, assigned);
    assigned.insert(candidate.clone());
    candidate
}

fn lowest_free(
    acquisition: Acquisition,
    role: Role,
    assigned: &BTreeSet<CanonicalSeriesName>,
) -> CanonicalSeriesName {
    let mut candidate = SeriesGroup::first(acquisition).name(role);
    while assigned.contains(&candidate) {
        candidate = candidate.group().next().name(candidate.role.clone());
    }
    candidate
}

/// Names already handed out for one (patient, study).
#[derive(Debug, Clone, Default)]
pub struct RepetitionTracker {
    assigned: BTreeSet<CanonicalSeriesName>,
    max_repetitions: Option<u32>,
}

impl RepetitionTracker {
    /// A tracker without a repetition cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// A tracker that rejects repetitions above `max`.
    pub fn with_max_repetitions(max: u32) -> Self {
        Self {
            assigned: BTreeSet::new(),
            max_repetitions: Some(max),
        }
    }

    pub fn max_repetitions(&self) -> Option<u32> {
        self.max_repetitions
    }

    /// Seeds the tracker with names that already exist (e.g. in the database).
    pub fn reserve(&mut self, name: CanonicalSeriesName) {
        self.assigned.insert(name);
    }

    pub fn contains(&self, name: &CanonicalSeriesName) -> bool {
        self.assigned.contains(name)
    }

    pub fn assigned(&self) -> &BTreeSet<CanonicalSeriesName> {
        &self.assigned
    }

    /// Assigns the next free name for one role.
    pub fn assign(
        &mut self,
        acquisition: Acquisition,
        role: Role,
    ) -> Result<CanonicalSeriesName, ClassifyError> {
        let candidate = lowest_free(acquisition, role, &self.assigned);
        self.check_cap(&candidate)?;
        self.assigned.insert(candidate.clone());
        Ok(candidate)
    }

    /// Assigns a series group for an acquisition that yields several roles
    /// at once. The first role is the collision key; every role in `roles`
    /// is reserved under the returned group.
    pub fn assign_group(
        &mut self,
        acquisition: Acquisition,
        roles: &[Role],
    ) -> Result<SeriesGroup, ClassifyError> {
        let Some(key) = roles.first() else {
            return Ok(SeriesGroup::first(acquisition));
        };
        let mut group = SeriesGroup::first(acquisition);
        while self.assigned.contains(&group.name(key.clone())) {
            group = group.next();
        }
        self.check_cap(&group.name(key.clone()))?;
        for role in roles {
            self.assigned.insert(group.name(role.clone()));
        }
        Ok(group)
    }

    fn check_cap(&self, candidate: &CanonicalSeriesName) -> Result<(), ClassifyError> {
        match self.max_repetitions {
            Some(max) if candidate.repetition > max => Err(ClassifyError::TooManyRepetitions {
                name: candidate.to_string(),
                max,
            }),
            _ => Ok(()),
        }
    }
}
