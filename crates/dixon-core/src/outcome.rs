//! Results of harmonizing patients and sites.

use std::collections::BTreeMap;
use std::fmt;

use dixon_ingest::IngestError;
use dixon_map::{ChannelCoverage, ClassifyError};
use dixon_model::{PatientId, SeriesGroup, Site, Study};
use dixon_output::OutputError;
use dixon_volume::VolumeError;
use serde::Serialize;

/// Category of a per-series (or per-patient) failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FailureKind {
    UnknownSeriesDescription,
    MissingTag,
    TooManyRepetitions,
    InvalidPatientId,
    IncompleteEchoPair,
    UnexpectedEchoCount,
    ExtractionFailure,
    VolumeReadFailure,
    WriteFailure,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::UnknownSeriesDescription => "UnknownSeriesDescription",
            FailureKind::MissingTag => "MissingTag",
            FailureKind::TooManyRepetitions => "TooManyRepetitions",
            FailureKind::InvalidPatientId => "InvalidPatientId",
            FailureKind::IncompleteEchoPair => "IncompleteEchoPair",
            FailureKind::UnexpectedEchoCount => "UnexpectedEchoCount",
            FailureKind::ExtractionFailure => "ExtractionFailure",
            FailureKind::VolumeReadFailure => "VolumeReadFailure",
            FailureKind::WriteFailure => "WriteFailure",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&ClassifyError> for FailureKind {
    fn from(error: &ClassifyError) -> Self {
        match error {
            ClassifyError::UnknownSeriesDescription(_) => FailureKind::UnknownSeriesDescription,
            ClassifyError::MissingTag(_) => FailureKind::MissingTag,
            ClassifyError::TooManyRepetitions { .. } => FailureKind::TooManyRepetitions,
            ClassifyError::InvalidPatientId { .. } => FailureKind::InvalidPatientId,
        }
    }
}

impl From<&VolumeError> for FailureKind {
    fn from(error: &VolumeError) -> Self {
        match error {
            VolumeError::IncompleteEchoPair { .. } => FailureKind::IncompleteEchoPair,
            VolumeError::UnexpectedEchoCount { .. } => FailureKind::UnexpectedEchoCount,
            _ => FailureKind::VolumeReadFailure,
        }
    }
}

impl From<&IngestError> for FailureKind {
    fn from(_: &IngestError) -> Self {
        FailureKind::ExtractionFailure
    }
}

impl From<&OutputError> for FailureKind {
    fn from(_: &OutputError) -> Self {
        FailureKind::WriteFailure
    }
}

/// One series (or patient folder) that could not be harmonized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{series}: {kind}: {message}")]
pub struct SeriesFailure {
    /// Archive entry name, or the patient folder for patient-level failures.
    pub series: String,
    pub kind: FailureKind,
    pub message: String,
}

impl SeriesFailure {
    pub fn new<E>(series: impl Into<String>, error: &E) -> Self
    where
        E: fmt::Display,
        for<'a> FailureKind: From<&'a E>,
    {
        Self {
            series: series.into(),
            kind: FailureKind::from(error),
            message: error.to_string(),
        }
    }
}

/// Terminal state of one patient folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PatientState {
    /// Every series was processed; some may have failed individually.
    Done,
    SkippedExcluded,
    /// The study was completed by an earlier run.
    SkippedExists,
    /// The patient could not be processed at all.
    Failed,
}

impl PatientState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatientState::Done => "done",
            PatientState::SkippedExcluded => "skipped (excluded)",
            PatientState::SkippedExists => "skipped (exists)",
            PatientState::Failed => "failed",
        }
    }
}

impl fmt::Display for PatientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatientOutcome {
    pub folder: String,
    pub patient: Option<PatientId>,
    pub study: Option<Study>,
    pub state: PatientState,
    /// Entries written by this run.
    pub written: usize,
    /// Entries found already stored and left untouched.
    pub existing: usize,
    pub failures: Vec<SeriesFailure>,
    pub coverage: BTreeMap<SeriesGroup, ChannelCoverage>,
}

impl PatientOutcome {
    pub(crate) fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            patient: None,
            study: None,
            state: PatientState::Done,
            written: 0,
            existing: 0,
            failures: Vec::new(),
            coverage: BTreeMap::new(),
        }
    }

    pub(crate) fn with_state(mut self, state: PatientState) -> Self {
        self.state = state;
        self
    }

    pub(crate) fn fail(mut self, failure: SeriesFailure) -> Self {
        self.failures.push(failure);
        self.state = PatientState::Failed;
        self
    }

    /// `patient/study`, or the raw folder when no id could be derived.
    pub fn label(&self) -> String {
        match (&self.patient, self.study) {
            (Some(patient), Some(study)) => format!("{patient}/{study}"),
            _ => self.folder.clone(),
        }
    }
}

/// Everything one site run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteReport {
    pub site: Site,
    pub patients: Vec<PatientOutcome>,
}

impl SiteReport {
    pub fn new(site: Site) -> Self {
        Self {
            site,
            patients: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: PatientOutcome) {
        self.patients.push(outcome);
    }

    pub fn written(&self) -> usize {
        self.patients.iter().map(|p| p.written).sum()
    }

    pub fn existing(&self) -> usize {
        self.patients.iter().map(|p| p.existing).sum()
    }

    pub fn count(&self, state: PatientState) -> usize {
        self.patients.iter().filter(|p| p.state == state).count()
    }

    /// Every failure with the patient it belongs to.
    pub fn failures(&self) -> impl Iterator<Item = (&PatientOutcome, &SeriesFailure)> {
        self.patients
            .iter()
            .flat_map(|p| p.failures.iter().map(move |f| (p, f)))
    }

    pub fn has_failures(&self) -> bool {
        self.patients.iter().any(|p| !p.failures.is_empty())
    }

    pub fn failure_counts(&self) -> BTreeMap<FailureKind, usize> {
        let mut counts = BTreeMap::new();
        for (_, failure) in self.failures() {
            *counts.entry(failure.kind).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_errors_map_to_echo_kinds() {
        let incomplete = VolumeError::IncompleteEchoPair { echo_time: 2.4 };
        assert_eq!(FailureKind::from(&incomplete), FailureKind::IncompleteEchoPair);
        let failure = SeriesFailure::new("series_05", &VolumeError::EmptySeries);
        assert_eq!(failure.kind, FailureKind::VolumeReadFailure);
        assert_eq!(failure.series, "series_05");
    }

    #[test]
    fn report_totals() {
        let mut report = SiteReport::new(Site::Bari);
        let mut done = PatientOutcome::new("1128030");
        done.written = 2;
        done.failures.push(SeriesFailure::new(
            "series_07",
            &ClassifyError::MissingTag("SeriesNumber"),
        ));
        report.push(done);
        report.push(PatientOutcome::new("1128054").with_state(PatientState::SkippedExcluded));
        assert_eq!(report.written(), 2);
        assert_eq!(report.count(PatientState::Done), 1);
        assert_eq!(report.count(PatientState::SkippedExcluded), 1);
        assert!(report.has_failures());
        assert_eq!(report.failure_counts()[&FailureKind::MissingTag], 1);
    }
}
