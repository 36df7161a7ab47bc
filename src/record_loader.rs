use dicom::object::{DefaultDicomObject, OpenFileOptions};
use dicom_dictionary_std::tags;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

use crate::enums::TemporalKey;

#[derive(Debug, Error)]
pub enum RecordLoaderError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a file was not accepted as a slice record.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SkipReason(pub String);

/// The attributes of a slice that decide its timepoint.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SliceMetadata {
    pub temporal_position_identifier: Option<i64>,
    pub acquisition_time: Option<f64>,
}

/// A parsed slice together with the file backing it.
#[derive(Clone, Debug, PartialEq)]
pub struct SliceRecord {
    pub path: PathBuf,
    pub metadata: SliceMetadata,
}

impl SliceRecord {
    pub fn temporal_key(&self) -> TemporalKey {
        TemporalKey::from_metadata(&self.metadata)
    }
}

/// Records found in a directory plus the regular files that could not be parsed.
#[derive(Debug, Default)]
pub struct LoadedRecords {
    pub records: Vec<SliceRecord>,
    pub skipped: Vec<PathBuf>,
}

/// Parses the metadata of a single slice file.
pub trait MetadataReader {
    fn read_metadata(&self, path: &Path) -> Result<SliceMetadata, SkipReason>;
}

/// Reads slice metadata from DICOM files, stopping before the pixel data.
#[derive(Clone, Copy, Debug, Default)]
pub struct DicomMetadataReader;

impl DicomMetadataReader {
    fn get_temporal_position(dicom_object: &DefaultDicomObject) -> Option<i64> {
        dicom_object
            .element(tags::TEMPORAL_POSITION_IDENTIFIER)
            .ok()?
            .to_int::<i64>()
            .ok()
    }

    fn get_acquisition_time(dicom_object: &DefaultDicomObject) -> Option<f64> {
        let value = dicom_object
            .element(tags::ACQUISITION_TIME)
            .ok()?
            .to_str()
            .ok()?;
        parse_acquisition_time(&value)
    }
}

// TM is HHMMSS.FFFFFF; read as a plain decimal so keys stay comparable.
// NaN never equals itself, so non-finite values count as absent.
fn parse_acquisition_time(value: &str) -> Option<f64> {
    value
        .trim()
        .trim_end_matches('\0')
        .parse::<f64>()
        .ok()
        .filter(|time| time.is_finite())
}

impl MetadataReader for DicomMetadataReader {
    fn read_metadata(&self, path: &Path) -> Result<SliceMetadata, SkipReason> {
        let dicom_object = OpenFileOptions::new()
            .read_until(tags::PIXEL_DATA)
            .open_file(path)
            .map_err(|e| SkipReason(e.to_string()))?;

        Ok(SliceMetadata {
            temporal_position_identifier: Self::get_temporal_position(&dicom_object),
            acquisition_time: Self::get_acquisition_time(&dicom_object),
        })
    }
}

pub struct RecordLoader;

impl RecordLoader {
    /// Load every parseable slice in a directory
    ///
    /// # Arguments
    ///
    /// * `path` - Directory holding the slice files
    /// * `reader` - Parser applied to each regular file
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be read. Files that fail to parse
    /// are listed in [`LoadedRecords::skipped`] instead.
    pub fn load_from_directory(
        path: impl AsRef<Path>,
        reader: &impl MetadataReader,
    ) -> Result<LoadedRecords, RecordLoaderError> {
        let path = path.as_ref();
        let io_error = |source| RecordLoaderError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut paths: Vec<_> = fs::read_dir(path)
            .map_err(io_error)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        let mut loaded = LoadedRecords::default();
        for path in paths {
            match reader.read_metadata(&path) {
                Ok(metadata) => loaded.records.push(SliceRecord { path, metadata }),
                Err(reason) => {
                    debug!(path = %path.display(), %reason, "skipping unparseable file");
                    loaded.skipped.push(path);
                }
            }
        }

        debug!(
            directory = %path.display(),
            records = loaded.records.len(),
            skipped = loaded.skipped.len(),
            "loaded slice records"
        );
        Ok(loaded)
    }

    /// Load DICOM slices from a directory
    pub fn load_dicom_directory(
        path: impl AsRef<Path>,
    ) -> Result<LoadedRecords, RecordLoaderError> {
        Self::load_from_directory(path, &DicomMetadataReader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Accepts files whose content is `position=<n>`.
    struct PositionFileReader;

    impl MetadataReader for PositionFileReader {
        fn read_metadata(&self, path: &Path) -> Result<SliceMetadata, SkipReason> {
            let content = fs::read_to_string(path).map_err(|e| SkipReason(e.to_string()))?;
            let position = content
                .trim()
                .strip_prefix("position=")
                .and_then(|value| value.parse().ok())
                .ok_or_else(|| SkipReason("not a slice".into()))?;
            Ok(SliceMetadata {
                temporal_position_identifier: Some(position),
                acquisition_time: None,
            })
        }
    }

    #[test]
    fn skips_unparseable_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.slice"), "position=1").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        let loaded = RecordLoader::load_from_directory(dir.path(), &PositionFileReader).unwrap();

        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].path, dir.path().join("a.slice"));
        assert_eq!(loaded.records[0].temporal_key(), TemporalKey::Position(1));
        assert_eq!(loaded.skipped, vec![dir.path().join("notes.txt")]);
    }

    #[test]
    fn ignores_subdirectories() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("b.slice"), "position=2").unwrap();

        let loaded = RecordLoader::load_from_directory(dir.path(), &PositionFileReader).unwrap();

        assert!(loaded.records.is_empty());
        assert!(loaded.skipped.is_empty());
    }

    #[test]
    fn records_are_in_path_order() {
        let dir = tempdir().unwrap();
        for (name, position) in [("c", 3), ("a", 1), ("b", 2)] {
            fs::write(dir.path().join(name), format!("position={position}")).unwrap();
        }

        let loaded = RecordLoader::load_from_directory(dir.path(), &PositionFileReader).unwrap();
        let keys: Vec<_> = loaded.records.iter().map(SliceRecord::temporal_key).collect();

        assert_eq!(
            keys,
            vec![
                TemporalKey::Position(1),
                TemporalKey::Position(2),
                TemporalKey::Position(3)
            ]
        );
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let result = RecordLoader::load_from_directory(dir.path().join("absent"), &PositionFileReader);
        assert!(matches!(result, Err(RecordLoaderError::Io { .. })));
    }

    #[test]
    fn acquisition_time_must_be_finite() {
        assert_eq!(parse_acquisition_time("101530.25 "), Some(101530.25));
        assert_eq!(parse_acquisition_time("120000\0"), Some(120000.0));
        for value in ["NaN", "inf", "-infinity", "", "10:15:30"] {
            assert_eq!(parse_acquisition_time(value), None, "{value}");
        }
    }

    #[test]
    fn dicom_reader_rejects_non_dicom_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.txt");
        fs::write(&path, "definitely not DICOM").unwrap();

        assert!(DicomMetadataReader.read_metadata(&path).is_err());
    }
}
