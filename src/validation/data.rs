//! Plausibility checks applied to parsed records before they enter a case

use std::fmt;

/// Problems found in a single record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordIssue {
    LatitudeOutOfRange { value: f64 },
    LongitudeOutOfRange { value: f64 },
    NonFiniteCoordinate,
    PitchOutOfRange { value: f64 },
    MissingBearing,
}

impl fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordIssue::LatitudeOutOfRange { value } => {
                write!(f, "latitude {} outside [-90, 90]", value)
            }
            RecordIssue::LongitudeOutOfRange { value } => {
                write!(f, "longitude {} outside [-180, 180]", value)
            }
            RecordIssue::NonFiniteCoordinate => write!(f, "coordinate is not a finite number"),
            RecordIssue::PitchOutOfRange { value } => {
                write!(f, "pitch {} outside [-90, 90], ignored", value)
            }
            RecordIssue::MissingBearing => write!(f, "no usable yaw/heading"),
        }
    }
}

/// Checks coordinates and orientation of loaded records
#[derive(Debug, Clone, Default)]
pub struct RecordValidator {
    /// Reject records without a bearing instead of keeping them for display
    pub require_bearing: bool,
}

impl RecordValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hard check: a record failing it cannot be placed on a map.
    pub fn check_position(&self, lat: f64, lon: f64) -> Result<(), RecordIssue> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(RecordIssue::NonFiniteCoordinate);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(RecordIssue::LatitudeOutOfRange { value: lat });
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(RecordIssue::LongitudeOutOfRange { value: lon });
        }
        Ok(())
    }

    /// Soft check on the orientation. Returns the pitch to keep and any
    /// issues worth logging.
    pub fn check_orientation(
        &self,
        yaw: Option<f64>,
        pitch: Option<f64>,
    ) -> (Option<f64>, Vec<RecordIssue>) {
        let mut issues = Vec::new();
        if yaw.is_none() {
            issues.push(RecordIssue::MissingBearing);
        }
        let pitch = match pitch {
            Some(p) if !(-90.0..=90.0).contains(&p) => {
                issues.push(RecordIssue::PitchOutOfRange { value: p });
                None
            }
            other => other,
        };
        (pitch, issues)
    }

    /// Whether the issues make the record unusable under this validator
    pub fn is_fatal(&self, issue: &RecordIssue) -> bool {
        match issue {
            RecordIssue::MissingBearing => self.require_bearing,
            RecordIssue::PitchOutOfRange { .. } => false,
            _ => true,
        }
    }
}
