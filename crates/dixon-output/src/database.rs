//! Filesystem-backed canonical database.
//!
//! Layout: `{root}/{site}/Patients/{patient}/{study}/{series}/` with the
//! volume and its provenance inside each series directory. An entry exists
//! once its volume file is in place; volumes are written under a temporary
//! name and renamed, so an interrupted write leaves no entry behind.

use std::path::{Path, PathBuf};

use dixon_model::{CanonicalSeriesName, PatientId, Site, Study};
use dixon_volume::Volume;

use crate::error::{OutputError, Result};
use crate::nifti_file::write_volume;
use crate::provenance::{PROVENANCE_FILE, Provenance};

pub const PATIENTS_DIR: &str = "Patients";
pub const VOLUME_FILE: &str = "volume.nii.gz";
const PARTIAL_VOLUME_FILE: &str = "volume.partial.nii.gz";
/// Marks a study whose patient ran to completion.
pub const DONE_SENTINEL: &str = ".harmonized";

/// Address of one database entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryKey {
    pub site: Site,
    pub patient: PatientId,
    pub study: Study,
    pub series: CanonicalSeriesName,
}

impl EntryKey {
    pub fn new(site: Site, patient: PatientId, study: Study, series: CanonicalSeriesName) -> Self {
        Self {
            site,
            patient,
            study,
            series,
        }
    }
}

impl std::fmt::Display for EntryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.site, self.patient, self.study, self.series
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The entry was already stored and has not been touched.
    AlreadyPresent,
}

/// A (patient, study) found in the database.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct StoredStudy {
    pub patient: PatientId,
    pub study: Study,
}

#[derive(Debug, Clone)]
pub struct CanonicalDatabase {
    root: PathBuf,
}

impl CanonicalDatabase {
    /// Opens the database at `root`, creating the directory if needed.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| OutputError::create_dir(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn patients_dir(&self, site: Site) -> PathBuf {
        self.root.join(site.as_str()).join(PATIENTS_DIR)
    }

    pub fn study_dir(&self, site: Site, patient: &PatientId, study: Study) -> PathBuf {
        self.patients_dir(site)
            .join(patient.as_str())
            .join(study.as_str())
    }

    pub fn entry_dir(&self, key: &EntryKey) -> PathBuf {
        self.study_dir(key.site, &key.patient, key.study)
            .join(key.series.to_string())
    }

    pub fn volume_path(&self, key: &EntryKey) -> PathBuf {
        self.entry_dir(key).join(VOLUME_FILE)
    }

    pub fn contains(&self, key: &EntryKey) -> bool {
        self.volume_path(key).is_file()
    }

    /// Stores an entry unless it already exists.
    pub fn write_entry(
        &self,
        key: &EntryKey,
        volume: &Volume,
        provenance: &Provenance,
    ) -> Result<WriteOutcome> {
        if self.contains(key) {
            tracing::debug!(entry = %key, "entry already present");
            return Ok(WriteOutcome::AlreadyPresent);
        }
        let dir = self.entry_dir(key);
        std::fs::create_dir_all(&dir).map_err(|e| OutputError::create_dir(&dir, e))?;
        provenance.write(&dir.join(PROVENANCE_FILE))?;

        let partial = dir.join(PARTIAL_VOLUME_FILE);
        write_volume(volume, &partial)?;
        let target = dir.join(VOLUME_FILE);
        std::fs::rename(&partial, &target).map_err(|e| OutputError::io(&target, e))?;
        tracing::info!(entry = %key, "entry written");
        Ok(WriteOutcome::Written)
    }

    pub fn read_provenance(&self, key: &EntryKey) -> Result<Provenance> {
        Provenance::read(&self.entry_dir(key).join(PROVENANCE_FILE))
    }

    pub fn is_done(&self, site: Site, patient: &PatientId, study: Study) -> bool {
        self.study_dir(site, patient, study)
            .join(DONE_SENTINEL)
            .is_file()
    }

    pub fn mark_done(&self, site: Site, patient: &PatientId, study: Study) -> Result<()> {
        let dir = self.study_dir(site, patient, study);
        std::fs::create_dir_all(&dir).map_err(|e| OutputError::create_dir(&dir, e))?;
        let sentinel = dir.join(DONE_SENTINEL);
        std::fs::write(&sentinel, b"").map_err(|e| OutputError::io(&sentinel, e))
    }

    /// Every (patient, study) stored for `site`, sorted.
    pub fn studies(&self, site: Site) -> Result<Vec<StoredStudy>> {
        let mut studies = Vec::new();
        let patients_dir = self.patients_dir(site);
        if !patients_dir.is_dir() {
            return Ok(studies);
        }
        for patient_dir in subdirectories(&patients_dir)? {
            let Some(patient) = dir_name(&patient_dir).and_then(|n| PatientId::new(n).ok()) else {
                tracing::debug!(path = %patient_dir.display(), "ignoring non-patient folder");
                continue;
            };
            for study_dir in subdirectories(&patient_dir)? {
                if let Some(study) = dir_name(&study_dir).and_then(|n| n.parse::<Study>().ok()) {
                    studies.push(StoredStudy {
                        patient: patient.clone(),
                        study,
                    });
                }
            }
        }
        studies.sort();
        Ok(studies)
    }

    /// Stored series of one study, in canonical order.
    pub fn series(
        &self,
        site: Site,
        patient: &PatientId,
        study: Study,
    ) -> Result<Vec<CanonicalSeriesName>> {
        let study_dir = self.study_dir(site, patient, study);
        if !study_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names: Vec<CanonicalSeriesName> = subdirectories(&study_dir)?
            .into_iter()
            .filter(|dir| dir.join(VOLUME_FILE).is_file())
            .filter_map(|dir| dir_name(&dir).and_then(|n| n.parse().ok()))
            .collect();
        names.sort();
        Ok(names)
    }
}

fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| OutputError::io(dir, e))? {
        let path = entry.map_err(|e| OutputError::io(dir, e))?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn dir_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dixon_model::{Acquisition, Role};

    fn key(role: Role) -> EntryKey {
        EntryKey::new(
            Site::Leeds,
            PatientId::new("4128_007").unwrap(),
            Study::Baseline,
            CanonicalSeriesName::new(Acquisition::Dixon, 1, role).unwrap(),
        )
    }

    #[test]
    fn layout_follows_site_patient_study_series() {
        let db = CanonicalDatabase {
            root: PathBuf::from("/data/db"),
        };
        assert_eq!(
            db.entry_dir(&key(Role::Fat)),
            PathBuf::from("/data/db/Leeds/Patients/4128_007/Baseline/Dixon_1_fat")
        );
    }

    #[test]
    fn sentinel_marks_study_done() {
        let dir = tempfile::tempdir().unwrap();
        let db = CanonicalDatabase::create(dir.path().join("db")).unwrap();
        let patient = PatientId::new("4128_007").unwrap();
        assert!(!db.is_done(Site::Leeds, &patient, Study::Baseline));
        db.mark_done(Site::Leeds, &patient, Study::Baseline).unwrap();
        assert!(db.is_done(Site::Leeds, &patient, Study::Baseline));
        assert!(!db.is_done(Site::Leeds, &patient, Study::Followup));
        assert_eq!(
            db.studies(Site::Leeds).unwrap(),
            vec![StoredStudy {
                patient,
                study: Study::Baseline
            }]
        );
    }

    #[test]
    fn partial_volume_is_not_an_entry() {
        let dir = tempfile::tempdir().unwrap();
        let db = CanonicalDatabase::create(dir.path()).unwrap();
        let key = key(Role::Water);
        let entry = db.entry_dir(&key);
        std::fs::create_dir_all(&entry).unwrap();
        std::fs::write(entry.join(PARTIAL_VOLUME_FILE), b"").unwrap();
        assert!(!db.contains(&key));
        assert!(
            db.series(key.site, &key.patient, key.study)
                .unwrap()
                .is_empty()
        );
    }
}
