use nifti::NiftiHeader;
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SliceTimingError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum HeaderReadError {
    #[error("NIfTI error: {0}")]
    Nifti(#[from] nifti::NiftiError),

    #[error("Volume has {0} dimensions, expected at least 3")]
    MissingThroughPlaneAxis(u16),

    #[error("No NIfTI volume found in {0}")]
    NoVolume(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Acquisition offset of every slice within one repetition time, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceTimingTable(Vec<f64>);

impl SliceTimingTable {
    pub fn offsets(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Write one offset per line, each terminated by a comma.
    pub fn write_to(&self, writer: &mut impl Write) -> std::io::Result<()> {
        for offset in &self.0 {
            writeln!(writer, "{offset:?},")?;
        }
        Ok(())
    }
}

/// Reject a repetition time that is not a positive finite number of seconds.
pub fn validate_repetition_time(repetition_time: f64) -> Result<(), SliceTimingError> {
    if !repetition_time.is_finite() || repetition_time <= 0.0 {
        return Err(SliceTimingError::InvalidArgument(format!(
            "repetition time must be positive, got {repetition_time}"
        )));
    }
    Ok(())
}

/// Evenly spaced slice offsets over `[0, repetition_time)`.
///
/// Slice `i` is acquired at `i * repetition_time / slice_count`, so the table
/// always holds exactly `slice_count` values.
///
/// # Errors
///
/// Returns [`SliceTimingError::InvalidArgument`] if `slice_count` is zero or
/// `repetition_time` is not a positive finite number.
pub fn compute_slice_timing(
    repetition_time: f64,
    slice_count: usize,
) -> Result<SliceTimingTable, SliceTimingError> {
    if slice_count == 0 {
        return Err(SliceTimingError::InvalidArgument(
            "slice count must be greater than zero".into(),
        ));
    }
    validate_repetition_time(repetition_time)?;

    let offset = repetition_time / slice_count as f64;
    Ok(SliceTimingTable(
        (0..slice_count).map(|i| i as f64 * offset).collect(),
    ))
}

/// Persist a slice timing table at `destination`, replacing any existing file.
pub fn write_slice_timing(
    table: &SliceTimingTable,
    destination: impl AsRef<Path>,
) -> Result<(), SliceTimingError> {
    let destination = destination.as_ref();
    let mut writer = BufWriter::new(fs::File::create(destination)?);
    table.write_to(&mut writer)?;
    writer.flush()?;
    info!(path = %destination.display(), slices = table.len(), "wrote slice timing");
    Ok(())
}

/// Number of slices along the through-plane axis of a NIfTI volume.
pub fn count_slices(volume: impl AsRef<Path>) -> Result<usize, HeaderReadError> {
    let volume = volume.as_ref();
    let header = NiftiHeader::from_file(volume)?;
    let slices = slice_count_from_dim(&header.dim)?;
    debug!(path = %volume.display(), slices, "read volume header");
    Ok(slices)
}

// dim[0] holds the rank, dim[1..] the extents
fn slice_count_from_dim(dim: &[u16; 8]) -> Result<usize, HeaderReadError> {
    let rank = dim[0];
    if rank < 3 || dim[3] == 0 {
        return Err(HeaderReadError::MissingThroughPlaneAxis(rank));
    }
    Ok(usize::from(dim[3]))
}

/// First `.nii` or `.nii.gz` file in `directory`, by file name.
///
/// `directory` is expected to hold only the output of one conversion. When
/// several volumes are present the choice is logged, since a stale volume
/// from an earlier run would otherwise be picked silently.
pub fn find_volume(directory: impl AsRef<Path>) -> Result<PathBuf, HeaderReadError> {
    let directory = directory.as_ref();
    let mut volumes: Vec<_> = fs::read_dir(directory)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| {
                    let name = name.to_ascii_lowercase();
                    name.ends_with(".nii") || name.ends_with(".nii.gz")
                })
        })
        .collect();
    volumes.sort();
    if volumes.len() > 1 {
        warn!(
            directory = %directory.display(),
            candidates = volumes.len(),
            chosen = %volumes[0].display(),
            "several NIfTI volumes found, using the first"
        );
    }
    volumes
        .into_iter()
        .next()
        .ok_or_else(|| HeaderReadError::NoVolume(directory.to_path_buf()))
}
