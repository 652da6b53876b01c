//! Discovery of patient folders and series archives.
//!
//! Layout: `{site download dir}/{patient}/[{experiment}/]series_NN.zip`.

use std::path::{Path, PathBuf};

use dixon_model::trailing_number;
use dixon_standards::SiteProfile;

use crate::error::{IngestError, Result};

/// One patient folder of a site export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientFolder {
    /// Raw folder name as exported by the site.
    pub name: String,
    pub path: PathBuf,
}

impl PatientFolder {
    /// Directory holding the series archives of this patient.
    pub fn archive_dir(&self, profile: &SiteProfile) -> Result<PathBuf> {
        if profile.experiment_level {
            experiment_dir(&self.path)
        } else {
            Ok(self.path.clone())
        }
    }
}

/// One zipped series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesArchive {
    pub path: PathBuf,
    /// File name without the `.zip` extension.
    pub entry_name: String,
    /// Numeric suffix of `entry_name`.
    pub index: Option<u32>,
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::dir_read(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| IngestError::dir_read(dir, e))?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Lists the patient folders of a site export, sorted by name.
pub fn list_patient_folders(site_dir: &Path, profile: &SiteProfile) -> Result<Vec<PatientFolder>> {
    let mut patients = Vec::new();
    for path in sorted_entries(site_dir)? {
        if !path.is_dir() {
            continue;
        }
        patients.push(PatientFolder {
            name: file_name(&path),
            path,
        });
    }
    tracing::debug!(
        site = %profile.site,
        dir = %site_dir.display(),
        count = patients.len(),
        "discovered patient folders"
    );
    Ok(patients)
}

/// The first experiment folder below a patient folder.
fn experiment_dir(patient_dir: &Path) -> Result<PathBuf> {
    sorted_entries(patient_dir)?
        .into_iter()
        .find(|path| path.is_dir())
        .ok_or_else(|| IngestError::MissingExperiment {
            path: patient_dir.to_path_buf(),
        })
}

/// Lists the series archives accepted by `profile`, in series order.
///
/// Archives are ordered by their numeric suffix; archives without one come
/// last, by name.
pub fn list_series_archives(dir: &Path, profile: &SiteProfile) -> Result<Vec<SeriesArchive>> {
    let mut archives = Vec::new();
    for path in sorted_entries(dir)? {
        if !path.is_file() {
            continue;
        }
        let is_zip = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
        if !is_zip {
            continue;
        }
        let entry_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !profile.accepts_entry(&entry_name) {
            tracing::debug!(entry = %entry_name, "archive entry filtered out");
            continue;
        }
        archives.push(SeriesArchive {
            index: trailing_number(&entry_name),
            entry_name,
            path,
        });
    }
    archives.sort_by(|a, b| {
        let key = |archive: &SeriesArchive| {
            (archive.index.is_none(), archive.index, archive.entry_name.clone())
        };
        key(a).cmp(&key(b))
    });
    Ok(archives)
}
