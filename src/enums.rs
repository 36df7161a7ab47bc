use std::fmt;

use serde::Serialize;

use crate::record_loader::SliceMetadata;

/// Key used to decide which slices were acquired as part of the same volume.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalKey {
    /// Value of Temporal Position Identifier (0020,0100)
    Position(i64),
    /// Value of Acquisition Time (0008,0032)
    AcquisitionTime(f64),
    /// Neither attribute present; every such slice lands in one group
    #[default]
    Default,
}

impl TemporalKey {
    /// Derive the key of a slice.
    ///
    /// Temporal Position Identifier wins over Acquisition Time. A slice
    /// carrying neither falls back to [`TemporalKey::Default`].
    pub fn from_metadata(metadata: &SliceMetadata) -> Self {
        if let Some(position) = metadata.temporal_position_identifier {
            Self::Position(position)
        } else if let Some(time) = metadata.acquisition_time {
            Self::AcquisitionTime(time)
        } else {
            Self::Default
        }
    }
}

impl fmt::Display for TemporalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position(position) => write!(f, "{position}"),
            Self::AcquisitionTime(time) => write!(f, "{time}"),
            Self::Default => f.write_str("default"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(position: Option<i64>, time: Option<f64>) -> SliceMetadata {
        SliceMetadata {
            temporal_position_identifier: position,
            acquisition_time: time,
        }
    }

    #[test]
    fn temporal_position_takes_priority() {
        let key = TemporalKey::from_metadata(&metadata(Some(3), Some(101530.5)));
        assert_eq!(key, TemporalKey::Position(3));
    }

    #[test]
    fn acquisition_time_used_without_position() {
        let key = TemporalKey::from_metadata(&metadata(None, Some(101530.5)));
        assert_eq!(key, TemporalKey::AcquisitionTime(101530.5));
    }

    #[test]
    fn missing_fields_fall_back_to_default() {
        assert_eq!(
            TemporalKey::from_metadata(&SliceMetadata::default()),
            TemporalKey::Default
        );
    }

    #[test]
    fn position_and_time_with_same_value_differ() {
        assert_ne!(TemporalKey::Position(1), TemporalKey::AcquisitionTime(1.0));
    }

    #[test]
    fn display() {
        assert_eq!(TemporalKey::Position(2).to_string(), "2");
        assert_eq!(TemporalKey::AcquisitionTime(1.5).to_string(), "1.5");
        assert_eq!(TemporalKey::Default.to_string(), "default");
    }
}
