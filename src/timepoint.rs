use serde::Serialize;
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use crate::{
    enums::TemporalKey,
    record_loader::{LoadedRecords, MetadataReader, RecordLoader, RecordLoaderError, SliceRecord},
};

/// Slices sharing a temporal key, in load order.
#[derive(Debug, Clone)]
pub struct TimepointGroup {
    pub key: TemporalKey,
    pub records: Vec<SliceRecord>,
}

/// Number of slices seen for one timepoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceCount {
    pub key: TemporalKey,
    pub slices: usize,
}

/// A backing file that could not be removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteFailure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PruneReport {
    /// Slice count per timepoint, in order of first appearance
    pub slice_counts: Vec<SliceCount>,
    /// Largest slice count, taken as a complete volume
    pub complete_count: usize,
    pub incomplete: Vec<TemporalKey>,
    pub removed: Vec<PathBuf>,
    pub failures: Vec<DeleteFailure>,
    /// Regular files that were not slice records
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PruneOutcome {
    NoRecordsFound { skipped: usize },
    Pruned(PruneReport),
}

impl PruneOutcome {
    /// Paths deleted by this run, empty when nothing was found
    pub fn removed(&self) -> &[PathBuf] {
        match self {
            Self::NoRecordsFound { .. } => &[],
            Self::Pruned(report) => &report.removed,
        }
    }

    /// Deletions that failed in this run
    pub fn failures(&self) -> &[DeleteFailure] {
        match self {
            Self::NoRecordsFound { .. } => &[],
            Self::Pruned(report) => &report.failures,
        }
    }
}

impl fmt::Display for PruneOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = match self {
            Self::NoRecordsFound { skipped } => {
                return write!(f, "No DICOM files found ({skipped} other files skipped)");
            }
            Self::Pruned(report) => report,
        };

        let counts: Vec<_> = report
            .slice_counts
            .iter()
            .map(|count| format!("{}: {}", count.key, count.slices))
            .collect();
        writeln!(f, "Slices per timepoint: {{{}}}", counts.join(", "))?;

        let incomplete: Vec<_> = report.incomplete.iter().map(ToString::to_string).collect();
        writeln!(f, "Incomplete timepoints: [{}]", incomplete.join(", "))?;

        for failure in &report.failures {
            writeln!(f, "Failed to remove {}: {}", failure.path.display(), failure.reason)?;
        }
        write!(f, "Removed files: {}", report.removed.len())
    }
}

/// Partition records by temporal key.
///
/// Groups appear in order of their first record, and records keep load order
/// inside a group.
pub fn group_by_timepoint(records: Vec<SliceRecord>) -> Vec<TimepointGroup> {
    let mut groups: Vec<TimepointGroup> = Vec::new();
    for record in records {
        let key = record.temporal_key();
        match groups.iter_mut().find(|group| group.key == key) {
            Some(group) => group.records.push(record),
            None => groups.push(TimepointGroup {
                key,
                records: vec![record],
            }),
        }
    }
    groups
}

pub struct TimepointPruner;

impl TimepointPruner {
    /// Delete every slice of a timepoint that has fewer slices than the
    /// fullest timepoint in `path`.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be read. Failed deletions do not
    /// abort the run; they are listed in [`PruneReport::failures`].
    pub fn prune_incomplete_timepoints(
        path: impl AsRef<Path>,
        reader: &impl MetadataReader,
    ) -> Result<PruneOutcome, RecordLoaderError> {
        let loaded = RecordLoader::load_from_directory(path, reader)?;
        Ok(Self::prune_records(loaded))
    }

    /// Same as [`Self::prune_incomplete_timepoints`] for already loaded records
    pub fn prune_records(loaded: LoadedRecords) -> PruneOutcome {
        let LoadedRecords { records, skipped } = loaded;
        if records.is_empty() {
            info!(skipped = skipped.len(), "no slice records found");
            return PruneOutcome::NoRecordsFound {
                skipped: skipped.len(),
            };
        }

        let groups = group_by_timepoint(records);
        let slice_counts: Vec<_> = groups
            .iter()
            .map(|group| SliceCount {
                key: group.key,
                slices: group.records.len(),
            })
            .collect();
        let complete_count = Self::get_complete_count(&groups);

        let mut report = PruneReport {
            slice_counts,
            complete_count,
            skipped: skipped.len(),
            ..Default::default()
        };

        for group in groups
            .iter()
            .filter(|group| group.records.len() < complete_count)
        {
            report.incomplete.push(group.key);
            for record in &group.records {
                match fs::remove_file(&record.path) {
                    Ok(()) => report.removed.push(record.path.clone()),
                    Err(e) => {
                        warn!(path = %record.path.display(), error = %e, "failed to remove slice");
                        report.failures.push(DeleteFailure {
                            path: record.path.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        info!(
            timepoints = report.slice_counts.len(),
            complete_count,
            incomplete = report.incomplete.len(),
            removed = report.removed.len(),
            failed = report.failures.len(),
            "pruned incomplete timepoints"
        );
        PruneOutcome::Pruned(report)
    }

    fn get_complete_count(groups: &[TimepointGroup]) -> usize {
        groups
            .iter()
            .map(|group| group.records.len())
            .max()
            .unwrap_or(0)
    }
}
