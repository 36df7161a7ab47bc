use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::{
    converter::{ConverterError, VolumeConverter},
    record_loader::{MetadataReader, RecordLoaderError},
    slice_timing::{
        HeaderReadError, SliceTimingError, compute_slice_timing, count_slices, find_volume,
        validate_repetition_time, write_slice_timing,
    },
    timepoint::{PruneOutcome, TimepointPruner},
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] RecordLoaderError),

    #[error(transparent)]
    Converter(#[from] ConverterError),

    #[error(transparent)]
    Header(#[from] HeaderReadError),

    #[error(transparent)]
    SliceTiming(#[from] SliceTimingError),
}

/// Where slice timing is derived from and written to.
#[derive(Debug, Clone)]
pub struct SliceTimingConfig {
    /// Repetition time in seconds
    pub repetition_time: f64,
    pub destination: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory of raw slices, pruned in place
    pub input_dir: PathBuf,
    /// Directory the converter writes volumes to
    pub output_dir: PathBuf,
    pub slice_timing: Option<SliceTimingConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceTimingSummary {
    pub volume: PathBuf,
    pub slices: usize,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub prune: PruneOutcome,
    pub converted: bool,
    pub slice_timing: Option<SliceTimingSummary>,
}

pub struct Pipeline;

impl Pipeline {
    /// Prune incomplete timepoints, convert the remaining slices and
    /// optionally derive slice timing from the converted volume.
    ///
    /// Stops after pruning when the input holds no slice records. An invalid
    /// repetition time is rejected before any file is deleted.
    pub fn run(
        config: &PipelineConfig,
        reader: &impl MetadataReader,
        converter: &impl VolumeConverter,
    ) -> Result<PipelineReport, PipelineError> {
        if let Some(timing) = &config.slice_timing {
            validate_repetition_time(timing.repetition_time)?;
        }

        let prune = TimepointPruner::prune_incomplete_timepoints(&config.input_dir, reader)?;
        if matches!(prune, PruneOutcome::NoRecordsFound { .. }) {
            return Ok(PipelineReport {
                prune,
                converted: false,
                slice_timing: None,
            });
        }

        converter.convert(&config.input_dir, &config.output_dir)?;
        info!(output = %config.output_dir.display(), "conversion finished");

        let slice_timing = config
            .slice_timing
            .as_ref()
            .map(|timing| Self::derive_slice_timing(config, timing))
            .transpose()?;

        Ok(PipelineReport {
            prune,
            converted: true,
            slice_timing,
        })
    }

    fn derive_slice_timing(
        config: &PipelineConfig,
        timing: &SliceTimingConfig,
    ) -> Result<SliceTimingSummary, PipelineError> {
        let volume = find_volume(&config.output_dir)?;
        let slices = count_slices(&volume)?;
        let table = compute_slice_timing(timing.repetition_time, slices)?;
        write_slice_timing(&table, &timing.destination)?;

        Ok(SliceTimingSummary {
            volume,
            slices,
            destination: timing.destination.clone(),
        })
    }
}
