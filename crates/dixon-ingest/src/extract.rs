//! Archive extraction and folder flattening.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};

/// Unpacks `archive` into `dest` and flattens the result.
///
/// Returns the extracted files, all directly inside `dest`.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    unpack(archive, dest)?;
    let files = flatten_folder(dest)?;
    tracing::debug!(
        archive = %archive.display(),
        files = files.len(),
        "extracted series archive"
    );
    Ok(files)
}

fn unpack(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive).map_err(|e| IngestError::extraction(archive, e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| IngestError::extraction(archive, e))?;
    fs::create_dir_all(dest).map_err(|e| IngestError::extraction(archive, e))?;

    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| IngestError::extraction(archive, e))?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(IngestError::UnsafeEntry {
                archive: archive.to_path_buf(),
                entry: entry.name().to_string(),
            });
        };
        let target = dest.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| IngestError::extraction(archive, e))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| IngestError::extraction(archive, e))?;
        }
        let mut out = File::create(&target).map_err(|e| IngestError::extraction(archive, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| IngestError::extraction(archive, e))?;
    }
    Ok(())
}

/// Moves every file below `root` directly into `root` and removes the
/// emptied subdirectories.
///
/// Name clashes get a counter before the extension (`img.dcm`, `img_1.dcm`).
/// Returns the files in `root`, sorted.
pub fn flatten_folder(root: &Path) -> Result<Vec<PathBuf>> {
    let mut nested = Vec::new();
    let mut dirs = Vec::new();
    collect(root, root, &mut nested, &mut dirs)?;

    for source in nested {
        let name = source.file_name().map(PathBuf::from).unwrap_or_default();
        let target = free_name(root, &name);
        fs::rename(&source, &target).map_err(|e| IngestError::Move {
            from: source.clone(),
            to: target.clone(),
            source: e,
        })?;
    }
    // Deepest first so parents are empty by the time they are removed.
    dirs.sort_by_key(|dir| std::cmp::Reverse(dir.components().count()));
    for dir in dirs {
        if let Err(e) = fs::remove_dir(&dir) {
            tracing::warn!(dir = %dir.display(), error = %e, "could not remove directory");
        }
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(root).map_err(|e| IngestError::dir_read(root, e))? {
        let path = entry.map_err(|e| IngestError::dir_read(root, e))?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn collect(
    root: &Path,
    dir: &Path,
    nested: &mut Vec<PathBuf>,
    dirs: &mut Vec<PathBuf>,
) -> Result<()> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| IngestError::dir_read(dir, e))? {
        entries.push(entry.map_err(|e| IngestError::dir_read(dir, e))?.path());
    }
    entries.sort();
    for path in entries {
        if path.is_dir() {
            dirs.push(path.clone());
            collect(root, &path, nested, dirs)?;
        } else if dir != root {
            nested.push(path);
        }
    }
    Ok(())
}

fn free_name(root: &Path, name: &Path) -> PathBuf {
    let candidate = root.join(name);
    if !candidate.exists() {
        return candidate;
    }
    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let mut counter = 1;
    loop {
        let candidate = root.join(format!("{stem}_{counter}{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
