//! Reports rendered from a small on-disk database.

use std::fs;
use std::path::Path;

use dixon_model::{CanonicalSeriesName, PatientId, Site, Study};
use dixon_output::{CanonicalDatabase, VOLUME_FILE};
use dixon_report::{
    ReportOutcome, count_dixons, render_dixon_counts, render_swap_template, swap_template_rows,
    write_dixon_counts, write_swap_template,
};
use dixon_standards::FatWaterSwapRecord;

fn store(db: &CanonicalDatabase, site: Site, patient: &str, study: Study, names: &[&str]) {
    let patient = PatientId::new(patient).unwrap();
    let study_dir = db.study_dir(site, &patient, study);
    fs::create_dir_all(&study_dir).unwrap();
    for name in names {
        let name: CanonicalSeriesName = name.parse().unwrap();
        let entry = study_dir.join(name.to_string());
        fs::create_dir_all(&entry).unwrap();
        fs::write(entry.join(VOLUME_FILE), b"").unwrap();
    }
}

fn database(root: &Path) -> CanonicalDatabase {
    let db = CanonicalDatabase::create(root).unwrap();
    store(
        &db,
        Site::Leeds,
        "4128_007",
        Study::Baseline,
        &[
            "Dixon_1_out_phase",
            "Dixon_1_in_phase",
            "Dixon_1_fat",
            "Dixon_1_water",
            "Dixon_post_contrast_1_out_phase",
            "Dixon_post_contrast_1_in_phase",
            "Dixon_post_contrast_1_fat",
            "Dixon_post_contrast_1_water",
        ],
    );
    store(
        &db,
        Site::Sheffield,
        "7128_157",
        Study::Baseline,
        &[
            "Dixon_2_out_phase",
            "Dixon_2_fat",
            "Dixon_1_water",
            "Dixon_1_fat",
            "Dixon_1_out_phase",
        ],
    );
    store(
        &db,
        Site::Bari,
        "1128_030",
        Study::Followup,
        &["Dixon_1_out_phase", "Dixon_1_in_phase"],
    );
    // A study whose entries never finished writing.
    store(&db, Site::Turku, "5128_001", Study::Baseline, &[]);
    db
}

#[test]
fn swap_template_lists_fat_groups() {
    let dir = tempfile::tempdir().unwrap();
    let db = database(dir.path());
    let template = render_swap_template(&swap_template_rows(&db).unwrap()).unwrap();
    insta::assert_snapshot!("swap_template", template);
}

#[test]
fn swap_template_loads_as_swap_record() {
    let dir = tempfile::tempdir().unwrap();
    let db = database(&dir.path().join("db"));
    let path = dir.path().join("fat_water_swap_record.csv");
    let outcome = write_swap_template(&db, &path).unwrap();
    assert_eq!(
        outcome,
        ReportOutcome::Written {
            path: path.clone(),
            rows: 4
        }
    );
    let record = FatWaterSwapRecord::load(&path).unwrap();
    assert_eq!(record.len(), 4);
    assert_eq!(record.swapped_count(), 0);
}

#[test]
fn dixon_counts_choose_series_to_use() {
    let dir = tempfile::tempdir().unwrap();
    let db = database(dir.path());
    let counts = count_dixons(&db).unwrap();
    assert_eq!(counts.len(), 4);
    insta::assert_snapshot!("dixon_counts", render_dixon_counts(&counts).unwrap());
}

#[test]
fn existing_reports_are_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let db = database(&dir.path().join("db"));
    let template = dir.path().join("template.csv");
    let counts = dir.path().join("dixon_counts.csv");
    fs::write(&template, "curated\n").unwrap();
    fs::write(&counts, "curated\n").unwrap();

    let outcome = write_swap_template(&db, &template).unwrap();
    assert!(matches!(outcome, ReportOutcome::Skipped { .. }));
    assert_eq!(outcome.path(), template);
    let outcome = write_dixon_counts(&db, &counts).unwrap();
    assert!(matches!(outcome, ReportOutcome::Skipped { .. }));

    assert_eq!(fs::read_to_string(&template).unwrap(), "curated\n");
    assert_eq!(fs::read_to_string(&counts).unwrap(), "curated\n");
}
