use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{IngestError, Result};

/// Per-patient scratch area; removed when dropped.
#[derive(Debug)]
pub struct ScratchSpace {
    dir: TempDir,
}

impl ScratchSpace {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("dixon-")
            .tempdir()
            .map_err(|source| IngestError::Scratch { source })?;
        Ok(Self { dir })
    }

    /// Creates the scratch area below `parent` instead of the system temp dir.
    pub fn new_in(parent: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("dixon-")
            .tempdir_in(parent)
            .map_err(|source| IngestError::Scratch { source })?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Fresh subdirectory path for one series; not created.
    pub fn series_dir(&self, entry_name: &str) -> PathBuf {
        self.dir.path().join(entry_name)
    }
}
