//! Fat-water swap correction.
//!
//! Some Dixon reconstructions label the fat image as water and vice versa.
//! Reviewers record affected series groups in the swap record; names in a
//! flagged group have `fat` and `water` exchanged before persistence.

use dixon_model::{CanonicalSeriesName, PatientId, Site, Study};
use dixon_standards::{FatWaterSwapRecord, SwapKey};

/// Relabels `name` when `record` flags its series group as swapped.
///
/// Applying it twice with the same record returns the original name.
pub fn resolve(
    record: &FatWaterSwapRecord,
    site: Site,
    patient: &PatientId,
    study: Study,
    name: &CanonicalSeriesName,
) -> CanonicalSeriesName {
    if !name.role.is_fat_water() {
        return name.clone();
    }
    let key = SwapKey {
        site,
        patient: patient.clone(),
        study,
        group: name.group(),
    };
    if record.is_swapped(&key) {
        name.with_role(name.role.swapped())
    } else {
        name.clone()
    }
}

/// Swap resolution bound to one site run.
///
/// Sites whose exports were never reviewed resolve every name to itself.
#[derive(Debug, Clone, Copy)]
pub struct SwapResolver<'a> {
    site: Site,
    record: Option<&'a FatWaterSwapRecord>,
}

impl<'a> SwapResolver<'a> {
    pub fn new(site: Site, record: Option<&'a FatWaterSwapRecord>) -> Self {
        Self { site, record }
    }

    pub fn disabled(site: Site) -> Self {
        Self { site, record: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.record.is_some()
    }

    pub fn resolve(
        &self,
        patient: &PatientId,
        study: Study,
        name: &CanonicalSeriesName,
    ) -> CanonicalSeriesName {
        let Some(record) = self.record else {
            return name.clone();
        };
        let resolved = resolve(record, self.site, patient, study, name);
        if resolved != *name {
            tracing::info!(
                site = %self.site,
                patient = %patient,
                study = %study,
                from = %name,
                to = %resolved,
                "fat-water swap applied"
            );
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use dixon_model::{Acquisition, Role, SeriesGroup};

    use super::*;

    fn record() -> FatWaterSwapRecord {
        let mut record = FatWaterSwapRecord::new();
        record.insert(
            SwapKey {
                site: Site::Sheffield,
                patient: PatientId::new("7128_001").unwrap(),
                study: Study::Baseline,
                group: SeriesGroup::first(Acquisition::Dixon),
            },
            true,
        );
        record
    }

    #[test]
    fn swaps_only_flagged_group() {
        let record = record();
        let patient = PatientId::new("7128_001").unwrap();
        let resolver = SwapResolver::new(Site::Sheffield, Some(&record));
        let fat: CanonicalSeriesName = "Dixon_1_fat".parse().unwrap();
        let water: CanonicalSeriesName = "Dixon_1_water".parse().unwrap();
        let post_fat: CanonicalSeriesName = "Dixon_post_contrast_1_fat".parse().unwrap();
        let in_phase: CanonicalSeriesName = "Dixon_1_in_phase".parse().unwrap();

        assert_eq!(resolver.resolve(&patient, Study::Baseline, &fat), water);
        assert_eq!(resolver.resolve(&patient, Study::Baseline, &water), fat);
        assert_eq!(resolver.resolve(&patient, Study::Baseline, &post_fat), post_fat);
        assert_eq!(resolver.resolve(&patient, Study::Baseline, &in_phase), in_phase);
        assert_eq!(resolver.resolve(&patient, Study::Followup, &fat), fat);
    }

    #[test]
    fn other_sites_are_not_matched() {
        let record = record();
        let patient = PatientId::new("7128_001").unwrap();
        let fat = SeriesGroup::first(Acquisition::Dixon).name(Role::Fat);
        assert_eq!(
            resolve(&record, Site::Turku, &patient, Study::Baseline, &fat),
            fat
        );
        assert_eq!(
            SwapResolver::disabled(Site::Sheffield).resolve(&patient, Study::Baseline, &fat),
            fat
        );
    }
}
