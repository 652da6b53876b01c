#![deny(unsafe_code)]

use std::fmt;

use crate::ModelError;

const COHORT_WIDTH: usize = 4;
const SUBJECT_WIDTH: usize = 3;

/// Harmonized patient identifier of the form `{cohort}_{subject}`.
///
/// Both parts are ASCII digit strings of fixed width (`4128_007`).
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct PatientId(String);

impl PatientId {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        let Some((cohort, subject)) = trimmed.split_once('_') else {
            return Err(ModelError::InvalidPatientId(value));
        };
        if !is_digits(cohort, COHORT_WIDTH) || !is_digits(subject, SUBJECT_WIDTH) {
            return Err(ModelError::InvalidPatientId(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn cohort(&self) -> &str {
        &self.0[..COHORT_WIDTH]
    }

    pub fn subject(&self) -> &str {
        &self.0[COHORT_WIDTH + 1..]
    }
}

fn is_digits(part: &str, width: usize) -> bool {
    part.len() == width && part.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PatientId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PatientId> for String {
    fn from(value: PatientId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_cohort_and_subject() {
        let id = PatientId::new("4128_007").unwrap();
        assert_eq!(id.cohort(), "4128");
        assert_eq!(id.subject(), "007");
        assert_eq!(id.to_string(), "4128_007");
    }

    #[test]
    fn rejects_wrong_width_or_letters() {
        for bad in ["412_007", "4128_07", "4128-007", "41a8_007", "4128_007_followup", ""] {
            assert!(PatientId::new(bad).is_err(), "{bad} should be rejected");
        }
    }
}
