#![deny(unsafe_code)]

use std::collections::BTreeSet;

use dixon_model::PatientId;

use crate::error::StandardsError;

/// Patients whose exports are known to be incomplete.
const BUILTIN_EXCLUSIONS: &[&str] = &[
    // post-contrast out-phase truncated, water missing
    "7128_054",
    // post-contrast phase images and pre-contrast water missing
    "7128_065",
    // post-contrast out-phase and pre-contrast water missing
    "7128_148",
    // in-phase missing in both acquisitions
    "7128_155",
];

/// Patients skipped before any processing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionList {
    patients: BTreeSet<PatientId>,
}

impl ExclusionList {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let patients = BUILTIN_EXCLUSIONS
            .iter()
            .filter_map(|id| PatientId::new(*id).ok())
            .collect();
        Self { patients }
    }

    pub fn insert(&mut self, patient: PatientId) -> bool {
        self.patients.insert(patient)
    }

    pub fn extend_from_strs<'a>(
        &mut self,
        ids: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), StandardsError> {
        for id in ids {
            let patient = PatientId::new(id).map_err(StandardsError::InvalidExclusion)?;
            self.patients.insert(patient);
        }
        Ok(())
    }

    pub fn contains(&self, patient: &PatientId) -> bool {
        self.patients.contains(patient)
    }

    pub fn contains_str(&self, patient: &str) -> bool {
        PatientId::new(patient).is_ok_and(|id| self.contains(&id))
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PatientId> {
        self.patients.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_list_is_complete() {
        let list = ExclusionList::builtin();
        assert_eq!(list.len(), BUILTIN_EXCLUSIONS.len());
        assert!(list.contains_str("7128_155"));
        assert!(!list.contains_str("7128_001"));
    }
}
