//! Builders for synthetic site exports.

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use dixon_core::{HarmonizeContext, Harmonizer};
use dixon_model::{SeriesTags, Site};
use dixon_output::CanonicalDatabase;
use dixon_standards::SiteProfile;
use dixon_volume::synthetic::{SyntheticImage, SyntheticSource};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub fn download_root(root: &Path) -> PathBuf {
    root.join("dixon_1_download")
}

pub fn database_root(root: &Path) -> PathBuf {
    root.join("dixon_2_data")
}

pub fn site_dir(root: &Path, site: Site) -> PathBuf {
    SiteProfile::for_site(site).download_path(&download_root(root))
}

pub fn context(root: &Path) -> HarmonizeContext {
    let database = CanonicalDatabase::create(database_root(root)).unwrap();
    let scratch = root.join("scratch");
    std::fs::create_dir_all(&scratch).unwrap();
    HarmonizeContext::new(download_root(root), database).with_scratch_root(scratch)
}

pub fn harmonizer(context: HarmonizeContext) -> Harmonizer<SyntheticSource> {
    Harmonizer::new(context, SyntheticSource)
}

/// Writes `{dir}/{entry}.zip` holding the images below a nested folder.
pub fn write_series(dir: &Path, entry: &str, images: &[SyntheticImage]) {
    std::fs::create_dir_all(dir).unwrap();
    let file = File::create(dir.join(format!("{entry}.zip"))).unwrap();
    let mut zip = ZipWriter::new(file);
    for (k, image) in images.iter().enumerate() {
        zip.start_file(format!("DICOM/IM_{k:04}"), SimpleFileOptions::default())
            .unwrap();
        zip.write_all(&image.to_bytes().unwrap()).unwrap();
    }
    zip.finish().unwrap();
}

/// `count` axial 2x2 slices 2 mm apart filled with `value`.
pub fn images(uid: &str, tags: &SeriesTags, count: usize, value: f32) -> Vec<SyntheticImage> {
    (0..count)
        .map(|k| SyntheticImage::axial(uid, tags.clone(), 2.0 * k as f64, 2, 2, value))
        .collect()
}

pub fn leeds_tags(series_number: i32, label: &str) -> SeriesTags {
    SeriesTags {
        series_number: Some(series_number),
        image_type: ["DERIVED", "PRIMARY", "DIXON", label]
            .iter()
            .map(ToString::to_string)
            .collect(),
        manufacturer: Some("GE MEDICAL SYSTEMS".to_string()),
        ..SeriesTags::default()
    }
}

pub fn ge_tags(description: &str) -> SeriesTags {
    SeriesTags {
        series_description: Some(description.to_string()),
        manufacturer: Some("GE MEDICAL SYSTEMS".to_string()),
        ..SeriesTags::default()
    }
}

pub fn echo_tags(echo_time: f64) -> SeriesTags {
    SeriesTags {
        manufacturer: Some("SIEMENS".to_string()),
        series_description: Some("t1_vibe_dixon_tra_bh".to_string()),
        echo_time: Some(echo_time),
        ..SeriesTags::default()
    }
}
