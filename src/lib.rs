//! # DICOM-timepoints library
//!
//! This crate prepares a directory of single-slice DICOM files of a dynamic
//! (fMRI or other 4D MR) acquisition for conversion into volumes.
//!
//! Slices are grouped into timepoints by a temporal key taken from each file:
//!  - Temporal Position Identifier (0020,0100) if present
//!  - otherwise Acquisition Time (0008,0032)
//!  - otherwise every slice shares one default timepoint
//!
//! The timepoint with the most slices is taken as a complete volume. Every
//! timepoint with fewer slices is incomplete and its files are deleted, so
//! the converter run afterwards only sees complete volumes. Once converted,
//! the slice timing of a volume can be derived from its repetition time and
//! the slice count in its NIfTI header.
//!
//! The crate never looks at pixel data. DICOM files are read up to the Pixel
//! Data element and only the attributes above are used.
//!
//! # Examples
//!
//! ## Removing incomplete timepoints
//!
//! ```no_run
//! # use dicom_timepoints::{DicomMetadataReader, PruneOutcome, TimepointPruner};
//! let outcome = TimepointPruner::prune_incomplete_timepoints("dicom", &DicomMetadataReader)
//!     .expect("should have read the directory");
//! if let PruneOutcome::Pruned(report) = &outcome {
//!     println!("removed {} files", report.removed.len());
//! }
//! ```
//!
//! ## Writing slice timing
//!
//! ```no_run
//! # use dicom_timepoints::slice_timing::{compute_slice_timing, count_slices, write_slice_timing};
//! let slices = count_slices("nifti/run.nii.gz").expect("should have read the header");
//! let table = compute_slice_timing(2.0, slices).expect("should have valid arguments");
//! write_slice_timing(&table, "slice_timing.txt").expect("should have written the table");
//! ```

pub mod converter;
pub mod enums;
pub mod pipeline;
pub mod record_loader;
pub mod slice_timing;
pub mod timepoint;

pub use converter::{ConverterError, Dcm2NiixConverter, VolumeConverter};
pub use enums::TemporalKey;
pub use pipeline::{Pipeline, PipelineConfig, PipelineError, PipelineReport, SliceTimingConfig};
pub use record_loader::{
    DicomMetadataReader, LoadedRecords, MetadataReader, RecordLoader, RecordLoaderError,
    SliceMetadata, SliceRecord,
};
pub use slice_timing::{HeaderReadError, SliceTimingError, SliceTimingTable};
pub use timepoint::{PruneOutcome, PruneReport, TimepointGroup, TimepointPruner};
