//! Core data types for cases, records and estimates

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::constants::{AUTO_OBJECT_ID, DEFAULT_OBJECT_ID};

/// Free-form reading details shown in popups
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub timestamp: Option<String>,
    /// Reported GPS accuracy (meters)
    pub gps_accuracy: Option<f64>,
    /// Compass heading (degrees)
    pub heading: Option<f64>,
    /// Yaw relative to geographic north (degrees)
    pub yaw_geo: Option<f64>,
    /// Yaw relative to magnetic north (degrees)
    pub yaw_magnetic: Option<f64>,
    /// Pitch, up-positive (degrees)
    pub pitch: Option<f64>,
}

/// One observer's reading toward the target
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRecord {
    pub observer_id: u32,
    pub lat: f64,
    pub lon: f64,
    pub alt: Option<f64>,
    /// Bearing toward the target, clockwise from north (degrees)
    pub yaw: Option<f64>,
    /// Elevation angle toward the target, up-positive (degrees)
    pub pitch: Option<f64>,
    pub image_path: Option<PathBuf>,
    /// The `data.json` this record was read from
    pub source: PathBuf,
    pub metadata: RecordMetadata,
}

/// Reference (true) position of the tracked target
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    pub object_id: String,
    pub lat: f64,
    pub lon: f64,
    pub alt: Option<f64>,
    pub image_path: Option<PathBuf>,
    pub source: PathBuf,
    pub metadata: RecordMetadata,
}

/// Output of a localization run. Recomputed for every render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatedPosition {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EstimationMethod {
    /// Component-wise median of pairwise bearing intersections
    TriangulationMedian,
    /// Every bearing pair was parallel; mean of observer positions
    FallbackNoIntersections,
}

impl EstimationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimationMethod::TriangulationMedian => "triangulation-median",
            EstimationMethod::FallbackNoIntersections => "fallback-no-intersections",
        }
    }
}

impl fmt::Display for EstimationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an estimate was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateInfo {
    pub method: EstimationMethod,
    /// Bearing pairs that produced an intersection
    pub pairs: usize,
    /// Observers with a usable bearing
    pub observers_used: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub position: EstimatedPosition,
    pub info: EstimateInfo,
}

/// A fully loaded case: one target plus its observers
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub name: String,
    pub path: PathBuf,
    pub object: ObjectRecord,
    pub observations: Vec<ObservationRecord>,
}

/// Per-case summary of one render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseMetrics {
    pub case: String,
    pub n_observers: usize,
    pub has_object: bool,
    pub est_lat: Option<f64>,
    pub est_lon: Option<f64>,
    pub object_lat: Option<f64>,
    pub object_lon: Option<f64>,
    /// Geodesic estimate-to-object distance, millimeter resolution
    pub error_m: Option<f64>,
    pub method: Option<EstimationMethod>,
}

/// Which object record of a case is the reference target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ObjectSelector {
    /// A fixed record directory, e.g. `object_records/1`
    Id(String),
    /// The first record directory in sorted order
    Auto,
}

impl Default for ObjectSelector {
    fn default() -> Self {
        ObjectSelector::Id(DEFAULT_OBJECT_ID.to_string())
    }
}

impl From<String> for ObjectSelector {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case(AUTO_OBJECT_ID) {
            ObjectSelector::Auto
        } else {
            ObjectSelector::Id(trimmed.to_string())
        }
    }
}

impl From<ObjectSelector> for String {
    fn from(value: ObjectSelector) -> Self {
        value.to_string()
    }
}

impl FromStr for ObjectSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err("object id must not be empty".to_string());
        }
        Ok(ObjectSelector::from(s.to_string()))
    }
}

impl fmt::Display for ObjectSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectSelector::Id(id) => f.write_str(id),
            ObjectSelector::Auto => f.write_str(AUTO_OBJECT_ID),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_selector_parsing() {
        assert_eq!("1".parse::<ObjectSelector>().unwrap(), ObjectSelector::Id("1".into()));
        assert_eq!(" AUTO ".parse::<ObjectSelector>().unwrap(), ObjectSelector::Auto);
        assert!("  ".parse::<ObjectSelector>().is_err());
        assert_eq!(ObjectSelector::default().to_string(), "1");
    }

    #[test]
    fn test_object_selector_serde() {
        let json = serde_json::to_string(&ObjectSelector::Auto).unwrap();
        assert_eq!(json, "\"auto\"");
        let back: ObjectSelector = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(back, ObjectSelector::Id("7".into()));
    }

    #[test]
    fn test_method_names() {
        assert_eq!(EstimationMethod::TriangulationMedian.to_string(), "triangulation-median");
        let json = serde_json::to_string(&EstimationMethod::FallbackNoIntersections).unwrap();
        assert_eq!(json, "\"fallback-no-intersections\"");
    }
}
