//! The harmonization orchestrator.
//!
//! Each patient folder runs through
//! `extract -> classify -> (split) -> swap-resolve -> persist`. Series that
//! fail any stage are logged and recorded in the [`PatientOutcome`]; the
//! remaining series of the patient carry on. Entries already in the
//! database are never re-read or rewritten, and a study that ran to
//! completion is skipped as a whole on the next run.
//!
//! A study left open by failures is resumed: names stored by the earlier
//! run are reserved up front, and a raw series found again under its
//! recorded provenance keeps the name it was stored under.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use dixon_ingest::{
    PatientFolder, ScratchSpace, SeriesArchive, extract_archive, list_patient_folders,
    list_series_archives,
};
use dixon_map::{
    CanonicalBuffer, Classification, RepetitionTracker, SiteAdapter, SwapResolver, adapter_for,
    channel_coverage,
};
use dixon_model::{
    Acquisition, CanonicalSeriesName, PatientId, RawSeries, Role, SeriesTags, Site, Study,
};
use dixon_output::{EntryKey, Provenance, SourceFile, WriteOutcome};
use dixon_standards::{RegroupedPatient, SiteProfile, WriteOrder};
use dixon_volume::{
    DicomSource, SeriesFiles, SliceStack, VolumeError, repair_gap, split_echo_pair,
};

use crate::context::HarmonizeContext;
use crate::outcome::{FailureKind, PatientOutcome, PatientState, SeriesFailure, SiteReport};

/// Drives harmonization of whole sites against one database.
#[derive(Debug)]
pub struct Harmonizer<S> {
    context: HarmonizeContext,
    source: S,
}

impl<S: DicomSource> Harmonizer<S> {
    pub fn new(context: HarmonizeContext, source: S) -> Self {
        Self { context, source }
    }

    pub fn context(&self) -> &HarmonizeContext {
        &self.context
    }

    /// Prepares a run over one site: adapter and swap policy are chosen here.
    pub fn site(&self, site: Site) -> SiteRun<'_, S> {
        let profile = SiteProfile::for_site(site);
        let swap = if profile.apply_swap_record {
            if self.context.swap_record.is_none() {
                tracing::warn!(
                    site = %site,
                    "no swap record configured; fat and water kept as labelled"
                );
            }
            SwapResolver::new(site, self.context.swap_record.as_ref())
        } else {
            SwapResolver::disabled(site)
        };
        SiteRun {
            harmonizer: self,
            profile,
            adapter: adapter_for(site, self.context.adapter_options),
            swap,
        }
    }

    /// Harmonizes every patient folder of `site`.
    pub fn run_site(&self, site: Site) -> Result<SiteReport> {
        self.site(site).run()
    }
}

/// One site's pass over its patient folders.
pub struct SiteRun<'h, S> {
    harmonizer: &'h Harmonizer<S>,
    profile: &'static SiteProfile,
    adapter: Box<dyn SiteAdapter>,
    swap: SwapResolver<'h>,
}

/// Images behind one canonical entry.
enum Images {
    /// A whole raw series, decoded when persisted.
    Series(SeriesFiles),
    /// One echo of a split series, possibly gap-repaired.
    Stack(SliceStack),
}

impl Images {
    fn files(&self) -> Vec<PathBuf> {
        match self {
            Images::Series(series) => series.files.clone(),
            Images::Stack(stack) => stack.files(),
        }
    }
}

/// A named series waiting to be persisted.
struct PendingEntry {
    name: CanonicalSeriesName,
    raw_series: String,
    reference_uid: String,
    tags: SeriesTags,
    images: Images,
    swapped: bool,
    echo_time: Option<f64>,
    interpolated_slices: usize,
}

/// State of one patient between the pipeline stages.
struct PatientRun {
    folder: String,
    patient: PatientId,
    study: Study,
    tracker: RepetitionTracker,
    buffer: CanonicalBuffer<PendingEntry>,
    stored: Vec<CanonicalSeriesName>,
    /// Names stored by earlier runs, keyed by raw series and reference UID.
    /// Names are as acquired, before any swap correction.
    previous: BTreeMap<(String, String), Vec<CanonicalSeriesName>>,
    outcome: PatientOutcome,
}

impl PatientRun {
    /// Earlier name of a raw series accepted by `matches`.
    fn previous_name(
        &self,
        raw_series: &str,
        reference_uid: &str,
        matches: impl Fn(&CanonicalSeriesName) -> bool,
    ) -> Option<CanonicalSeriesName> {
        self.previous
            .get(&(raw_series.to_string(), reference_uid.to_string()))?
            .iter()
            .find(|name| matches(name))
            .cloned()
    }

    fn record(&mut self, failure: SeriesFailure) {
        tracing::error!(
            patient = %self.patient,
            study = %self.study,
            series = %failure.series,
            kind = %failure.kind,
            error = %failure.message,
            "series failed"
        );
        self.outcome.failures.push(failure);
    }
}

impl<S: DicomSource> SiteRun<'_, S> {
    pub fn site(&self) -> Site {
        self.profile.site
    }

    pub fn export_dir(&self) -> PathBuf {
        self.profile.download_path(&self.harmonizer.context.download_root)
    }

    /// Patient folders of the site export, sorted by name.
    pub fn patients(&self) -> Result<Vec<PatientFolder>> {
        let dir = self.export_dir();
        list_patient_folders(&dir, self.profile)
            .with_context(|| format!("cannot list {} export {}", self.site(), dir.display()))
    }

    pub fn run(&self) -> Result<SiteReport> {
        let _span = tracing::info_span!("site", site = %self.site()).entered();
        let mut report = SiteReport::new(self.site());
        for folder in self.patients()? {
            report.push(self.harmonize(&folder));
        }
        tracing::info!(
            patients = report.patients.len(),
            written = report.written(),
            existing = report.existing(),
            failed_series = report.failures().count(),
            "site finished"
        );
        Ok(report)
    }

    /// Harmonizes one patient folder. Never fails; problems end up in the outcome.
    pub fn harmonize(&self, folder: &PatientFolder) -> PatientOutcome {
        let _span = tracing::info_span!("patient", folder = %folder.name).entered();
        let mut outcome = PatientOutcome::new(&folder.name);

        let (patient, study) = match self.adapter.normalize_id(&folder.name) {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(folder = %folder.name, error = %e, "invalid patient folder");
                return outcome.fail(SeriesFailure::new(&folder.name, &e));
            }
        };
        outcome.patient = Some(patient.clone());
        outcome.study = Some(study);

        let context = &self.harmonizer.context;
        if context.exclusions.contains(&patient) {
            tracing::info!(patient = %patient, "patient excluded");
            return outcome.with_state(PatientState::SkippedExcluded);
        }
        if context.database.is_done(self.site(), &patient, study) {
            tracing::info!(patient = %patient, study = %study, "study already harmonized");
            return outcome.with_state(PatientState::SkippedExists);
        }

        let tracker = match self.profile.write_order {
            WriteOrder::Streaming => RepetitionTracker::new(),
            WriteOrder::Canonical => {
                RepetitionTracker::with_max_repetitions(context.max_repetitions)
            }
        };
        let mut run = PatientRun {
            folder: folder.name.clone(),
            patient,
            study,
            tracker,
            buffer: CanonicalBuffer::new(),
            stored: Vec::new(),
            previous: BTreeMap::new(),
            outcome,
        };
        self.load_previous(&mut run);
        if let Err(failure) = self.process(folder, &mut run) {
            tracing::error!(
                patient = %run.patient,
                kind = %failure.kind,
                error = %failure.message,
                "patient failed"
            );
            return run.outcome.fail(failure);
        }
        self.finish(run)
    }

    /// Reserves the names an earlier, unfinished run already stored.
    fn load_previous(&self, run: &mut PatientRun) {
        let database = &self.harmonizer.context.database;
        let stored = match database.series(self.site(), &run.patient, run.study) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(patient = %run.patient, error = %e, "cannot list stored series");
                return;
            }
        };
        for name in stored {
            let key = EntryKey::new(self.site(), run.patient.clone(), run.study, name.clone());
            match database.read_provenance(&key) {
                Ok(provenance) => {
                    let acquired = if provenance.swapped {
                        name.with_role(name.role.swapped())
                    } else {
                        name
                    };
                    run.tracker.reserve(acquired.clone());
                    run.previous
                        .entry((provenance.raw_series, provenance.reference_uid))
                        .or_default()
                        .push(acquired);
                }
                Err(e) => {
                    tracing::warn!(entry = %key, error = %e, "stored entry without provenance");
                    let acquired = self.swap.resolve(&run.patient, run.study, &name);
                    run.tracker.reserve(acquired);
                }
            }
        }
        if !run.previous.is_empty() {
            tracing::info!(
                patient = %run.patient,
                study = %run.study,
                stored = run.tracker.assigned().len(),
                "resuming study"
            );
        }
    }

    /// Extraction through persistence of every series of the patient.
    fn process(&self, folder: &PatientFolder, run: &mut PatientRun) -> Result<(), SeriesFailure> {
        let archive_dir = folder
            .archive_dir(self.profile)
            .map_err(|e| SeriesFailure::new(&folder.name, &e))?;
        let archives = list_series_archives(&archive_dir, self.profile)
            .map_err(|e| SeriesFailure::new(&folder.name, &e))?;
        let scratch = match &self.harmonizer.context.scratch_root {
            Some(root) => ScratchSpace::new_in(root),
            None => ScratchSpace::new(),
        }
        .map_err(|e| SeriesFailure::new(&folder.name, &e))?;
        tracing::debug!(archives = archives.len(), "processing patient");

        match self.profile.regrouped(&run.patient) {
            Some(regroup) => self.collect_regrouped(run, regroup, &archives, &scratch),
            None => {
                for archive in &archives {
                    self.collect_archive(run, archive, &scratch);
                }
            }
        }
        // Buffered entries still reference files in scratch.
        let buffer = std::mem::take(&mut run.buffer);
        for (_, entry) in buffer.drain_ordered() {
            self.persist(run, entry);
        }
        Ok(())
    }

    fn finish(&self, mut run: PatientRun) -> PatientOutcome {
        run.outcome.coverage = channel_coverage(run.stored.iter());
        if run.outcome.failures.is_empty() {
            let database = &self.harmonizer.context.database;
            if let Err(e) = database.mark_done(self.site(), &run.patient, run.study) {
                run.record(SeriesFailure::new(&run.folder, &e));
            }
        } else {
            tracing::warn!(
                patient = %run.patient,
                failures = run.outcome.failures.len(),
                "study left open for a later run"
            );
        }
        tracing::info!(
            patient = %run.patient,
            study = %run.study,
            written = run.outcome.written,
            existing = run.outcome.existing,
            "patient finished"
        );
        run.outcome
    }

    fn collect_archive(
        &self,
        run: &mut PatientRun,
        archive: &SeriesArchive,
        scratch: &ScratchSpace,
    ) {
        let dest = scratch.series_dir(&archive.entry_name);
        if let Err(e) = extract_archive(&archive.path, &dest) {
            run.record(SeriesFailure::new(&archive.entry_name, &e));
            return;
        }
        let groups = match self.harmonizer.source.group_into_series(&dest) {
            Ok(groups) => groups,
            Err(e) => {
                run.record(SeriesFailure::new(&archive.entry_name, &e));
                return;
            }
        };
        if groups.is_empty() {
            run.record(SeriesFailure::new(&archive.entry_name, &VolumeError::EmptySeries));
            return;
        }
        for series in groups {
            self.collect_series(run, &archive.entry_name, series);
        }
    }

    fn collect_series(&self, run: &mut PatientRun, entry_name: &str, series: SeriesFiles) {
        let tags = match self.harmonizer.source.series_tags(&series) {
            Ok(tags) => tags,
            Err(e) => {
                run.record(SeriesFailure::new(entry_name, &e));
                return;
            }
        };
        let raw = RawSeries {
            site: self.site(),
            patient_folder: run.folder.clone(),
            entry_name: entry_name.to_string(),
            tags,
        };
        let classification = match self.adapter.classify(&raw) {
            Ok(classification) => classification,
            Err(e) => {
                run.record(SeriesFailure::new(entry_name, &e));
                return;
            }
        };

        match classification {
            Classification::Single { acquisition, role } => {
                let previous = run.previous_name(entry_name, &series.uid, |name| {
                    name.acquisition == acquisition && name.role == role
                });
                let name = match previous {
                    Some(name) => name,
                    None => match run.tracker.assign(acquisition, role) {
                        Ok(name) => name,
                        Err(e) => {
                            run.record(SeriesFailure::new(entry_name, &e));
                            return;
                        }
                    },
                };
                let resolved = self.swap.resolve(&run.patient, run.study, &name);
                tracing::debug!(series = entry_name, canonical = %resolved, "classified series");
                let entry = PendingEntry {
                    swapped: resolved != name,
                    name: resolved,
                    raw_series: raw.entry_name,
                    reference_uid: series.uid.clone(),
                    tags: raw.tags,
                    images: Images::Series(series),
                    echo_time: None,
                    interpolated_slices: 0,
                };
                self.emit(run, entry);
            }
            Classification::EchoPair { acquisition } => {
                self.collect_echo_pair(run, raw, series, acquisition);
            }
        }
    }

    /// Splits a two-echo series into its out-of-phase and in-phase entries.
    ///
    /// The series group is taken before the split, so a series that turns
    /// out to hold a single echo still uses up its repetition.
    fn collect_echo_pair(
        &self,
        run: &mut PatientRun,
        raw: RawSeries,
        series: SeriesFiles,
        acquisition: Acquisition,
    ) {
        let entry_name = raw.entry_name.as_str();
        let previous = run.previous_name(entry_name, &series.uid, |name| {
            name.acquisition == acquisition && name.role.is_phase()
        });
        let group = match previous {
            Some(name) => name.group(),
            None => match run
                .tracker
                .assign_group(acquisition, &[Role::OutPhase, Role::InPhase])
            {
                Ok(group) => group,
                Err(e) => {
                    run.record(SeriesFailure::new(entry_name, &e));
                    return;
                }
            },
        };
        let pair = match self
            .harmonizer
            .source
            .read_slices(&series)
            .and_then(split_echo_pair)
        {
            Ok(pair) => pair,
            Err(e) => {
                run.record(SeriesFailure::new(entry_name, &e));
                return;
            }
        };

        let echoes = [
            (Role::OutPhase, pair.out_phase, pair.out_phase_echo_time),
            (Role::InPhase, pair.in_phase, pair.in_phase_echo_time),
        ];
        for (role, mut stack, echo_time) in echoes {
            let mut interpolated_slices = 0;
            if let Some(gap) = self.profile.slice_gap(&run.patient, group, &role) {
                if let Err(e) = repair_gap(&mut stack, gap.after_location, gap.missing) {
                    run.record(SeriesFailure::new(entry_name, &e));
                    continue;
                }
                interpolated_slices = gap.missing;
                tracing::info!(
                    series = entry_name,
                    role = %role,
                    after_location = gap.after_location,
                    missing = gap.missing,
                    "repaired slice gap"
                );
            }
            let name = group.name(role);
            let resolved = self.swap.resolve(&run.patient, run.study, &name);
            tracing::debug!(
                series = entry_name,
                echo_time,
                canonical = %resolved,
                "split echo"
            );
            let entry = PendingEntry {
                swapped: resolved != name,
                name: resolved,
                raw_series: raw.entry_name.clone(),
                reference_uid: series.uid.clone(),
                tags: raw.tags.clone(),
                images: Images::Stack(stack),
                echo_time: Some(echo_time),
                interpolated_slices,
            };
            self.emit(run, entry);
        }
    }

    /// Names the images of a regrouped patient from its SeriesNumber table.
    fn collect_regrouped(
        &self,
        run: &mut PatientRun,
        regroup: &RegroupedPatient,
        archives: &[SeriesArchive],
        scratch: &ScratchSpace,
    ) {
        let source = &self.harmonizer.source;
        let mut groups: BTreeMap<i32, (SeriesTags, Vec<PathBuf>)> = BTreeMap::new();
        for archive in archives {
            let dest = scratch.series_dir(&archive.entry_name);
            let files = match extract_archive(&archive.path, &dest) {
                Ok(files) => files,
                Err(e) => {
                    run.record(SeriesFailure::new(&archive.entry_name, &e));
                    continue;
                }
            };
            for file in files {
                let tags = match source.read_tags(&file) {
                    Ok(tags) => tags,
                    Err(e) => {
                        tracing::debug!(
                            file = %file.display(),
                            error = %e,
                            "skipping unreadable image"
                        );
                        continue;
                    }
                };
                let Some(number) = tags.series_number else {
                    tracing::debug!(file = %file.display(), "image without SeriesNumber");
                    continue;
                };
                groups
                    .entry(number)
                    .or_insert_with(|| (tags, Vec::new()))
                    .1
                    .push(file);
            }
        }

        for (number, (tags, files)) in groups {
            let Some(name) = regroup.name_for(number) else {
                tracing::debug!(series_number = number, "series number not in regroup table");
                continue;
            };
            run.tracker.reserve(name.clone());
            let resolved = self.swap.resolve(&run.patient, run.study, &name);
            let uid = format!("series-number-{number}");
            let entry = PendingEntry {
                swapped: resolved != name,
                name: resolved,
                raw_series: format!("series_number_{number}"),
                reference_uid: uid.clone(),
                tags,
                images: Images::Series(SeriesFiles { uid, files }),
                echo_time: None,
                interpolated_slices: 0,
            };
            self.emit(run, entry);
        }
    }

    fn emit(&self, run: &mut PatientRun, entry: PendingEntry) {
        match self.profile.write_order {
            WriteOrder::Streaming => self.persist(run, entry),
            WriteOrder::Canonical => {
                let name = entry.name.clone();
                if let Some(previous) = run.buffer.insert(name.clone(), entry) {
                    tracing::warn!(
                        canonical = %name,
                        replaced = %previous.raw_series,
                        "duplicate canonical name in buffer"
                    );
                }
            }
        }
    }

    /// Check-then-write of one entry.
    fn persist(&self, run: &mut PatientRun, entry: PendingEntry) {
        let database = &self.harmonizer.context.database;
        let key = EntryKey::new(
            self.site(),
            run.patient.clone(),
            run.study,
            entry.name.clone(),
        );
        if database.contains(&key) {
            let stored_from = database
                .read_provenance(&key)
                .map(|stored| (stored.raw_series, stored.reference_uid));
            match stored_from {
                Ok((raw_series, reference_uid))
                    if raw_series == entry.raw_series && reference_uid == entry.reference_uid =>
                {
                    tracing::debug!(entry = %key, "entry already stored");
                    run.outcome.existing += 1;
                    run.stored.push(entry.name);
                }
                Ok((raw_series, _)) => run.record(SeriesFailure {
                    series: entry.raw_series.clone(),
                    kind: FailureKind::WriteFailure,
                    message: format!("{key} already holds {raw_series}"),
                }),
                Err(e) => run.record(SeriesFailure::new(&entry.raw_series, &e)),
            }
            return;
        }

        let volume = match &entry.images {
            Images::Series(series) => self.harmonizer.source.read_volume(series),
            Images::Stack(stack) => stack.to_volume(),
        };
        let volume = match volume {
            Ok(volume) => volume,
            Err(e) => {
                run.record(SeriesFailure::new(&entry.raw_series, &e));
                return;
            }
        };
        let sources = match entry
            .images
            .files()
            .iter()
            .map(|file| SourceFile::hash(file))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(sources) => sources,
            Err(e) => {
                run.record(SeriesFailure {
                    series: entry.raw_series.clone(),
                    kind: FailureKind::VolumeReadFailure,
                    message: e.to_string(),
                });
                return;
            }
        };

        let provenance = Provenance {
            site: self.site(),
            patient: run.patient.clone(),
            study: run.study,
            series: entry.name.clone(),
            raw_series: entry.raw_series.clone(),
            reference_uid: entry.reference_uid,
            tags: entry.tags,
            sources,
            swapped: entry.swapped,
            echo_time: entry.echo_time,
            interpolated_slices: entry.interpolated_slices,
            written_at: Utc::now(),
        };
        match database.write_entry(&key, &volume, &provenance) {
            Ok(WriteOutcome::Written) => {
                run.outcome.written += 1;
                run.stored.push(entry.name);
            }
            Ok(WriteOutcome::AlreadyPresent) => {
                run.outcome.existing += 1;
                run.stored.push(entry.name);
            }
            Err(e) => run.record(SeriesFailure::new(&entry.raw_series, &e)),
        }
    }
}
