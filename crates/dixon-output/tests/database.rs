//! Round trip of database entries through the filesystem.

use chrono::Utc;
use dixon_model::{Acquisition, CanonicalSeriesName, PatientId, Role, SeriesTags, Site, Study};
use dixon_output::{
    CanonicalDatabase, EntryKey, Provenance, SourceFile, StoredStudy, WriteOutcome,
};
use dixon_volume::Volume;
use ndarray::Array3;
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};

fn entry(role: Role) -> EntryKey {
    EntryKey::new(
        Site::Sheffield,
        PatientId::new("7128_157").unwrap(),
        Study::Baseline,
        CanonicalSeriesName::new(Acquisition::Dixon, 1, role).unwrap(),
    )
}

fn volume() -> Volume {
    let data = Array3::from_shape_fn((3, 2, 4), |(i, j, k)| (i + 10 * j + 100 * k) as f32);
    let mut affine = [[0.0; 4]; 4];
    affine[0] = [1.5, 0.0, 0.0, -100.0];
    affine[1] = [0.0, 1.5, 0.0, 50.0];
    affine[2] = [0.0, 0.0, 3.0, 20.0];
    affine[3][3] = 1.0;
    Volume::new(data, affine)
}

fn provenance(key: &EntryKey) -> Provenance {
    Provenance {
        site: key.site,
        patient: key.patient.clone(),
        study: key.study,
        series: key.series.clone(),
        raw_series: "series_05".to_string(),
        reference_uid: "1.2.826.0.1.3680043.2.1125.1".to_string(),
        tags: SeriesTags {
            series_description: Some("WATER: T1_abdomen_dixon_cor_bh".to_string()),
            manufacturer: Some("GE MEDICAL SYSTEMS".to_string()),
            ..SeriesTags::default()
        },
        sources: vec![SourceFile {
            name: "IM_0001.dcm".to_string(),
            sha256: "00".repeat(32),
        }],
        swapped: false,
        echo_time: None,
        interpolated_slices: 0,
        written_at: Utc::now(),
    }
}

#[test]
fn entry_is_written_once_with_affine_and_provenance() {
    let dir = tempfile::tempdir().unwrap();
    let db = CanonicalDatabase::create(dir.path().join("dixon_2_data")).unwrap();
    let key = entry(Role::Water);
    assert!(!db.contains(&key));

    let outcome = db.write_entry(&key, &volume(), &provenance(&key)).unwrap();
    assert_eq!(outcome, WriteOutcome::Written);
    assert!(db.contains(&key));

    let object = ReaderOptions::new().read_file(db.volume_path(&key)).unwrap();
    let header = object.header().clone();
    assert_eq!(header.sform_code, 1);
    // LPS to RAS flips the first two rows.
    assert_eq!(header.srow_x, [-1.5, 0.0, 0.0, 100.0]);
    assert_eq!(header.srow_y, [0.0, -1.5, 0.0, -50.0]);
    assert_eq!(header.srow_z, [0.0, 0.0, 3.0, 20.0]);
    let data = object.into_volume().into_ndarray::<f32>().unwrap();
    assert_eq!(data.shape(), &[3, 2, 4]);
    assert_eq!(data[[2, 1, 3]], 312.0);

    let stored = db.read_provenance(&key).unwrap();
    assert_eq!(stored.raw_series, "series_05");
    assert_eq!(stored.series.to_string(), "Dixon_1_water");

    // A second write leaves the entry untouched.
    let mut changed = provenance(&key);
    changed.raw_series = "series_99".to_string();
    let again = db.write_entry(&key, &volume(), &changed).unwrap();
    assert_eq!(again, WriteOutcome::AlreadyPresent);
    assert_eq!(db.read_provenance(&key).unwrap().raw_series, "series_05");
}

#[test]
fn listing_returns_canonical_order() {
    let dir = tempfile::tempdir().unwrap();
    let db = CanonicalDatabase::create(dir.path()).unwrap();
    for role in [Role::Water, Role::OutPhase, Role::Fat, Role::InPhase] {
        let key = entry(role);
        db.write_entry(&key, &volume(), &provenance(&key)).unwrap();
    }
    let key = entry(Role::Fat);
    let names: Vec<String> = db
        .series(key.site, &key.patient, key.study)
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        names,
        ["Dixon_1_out_phase", "Dixon_1_in_phase", "Dixon_1_fat", "Dixon_1_water"]
    );
    assert_eq!(
        db.studies(Site::Sheffield).unwrap(),
        vec![StoredStudy {
            patient: key.patient.clone(),
            study: Study::Baseline
        }]
    );
    assert!(db.studies(Site::Turku).unwrap().is_empty());
}
