//! Parsing of `data.json` record files
//!
//! Records come from phones and the target logger with slightly different
//! shapes: position either under `gps` or at the top level, numbers either
//! as JSON numbers or as numeric strings. Everything is optional at this
//! level; the loader decides what a usable record needs. A value of the
//! wrong JSON type is kept aside rather than failing the whole file.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::{RecordMetadata, PHOTO_FILE_NAMES};
use crate::validation::{Result, ViewerError};

/// A number that may arrive as `12.5` or `"12.5"`. Anything else lands in
/// `Other` and reads as missing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberField {
    Number(f64),
    Text(String),
    Other(Value),
}

impl NumberField {
    pub fn value(&self) -> Option<f64> {
        match self {
            NumberField::Number(n) => Some(*n),
            NumberField::Text(s) => s.trim().parse().ok(),
            NumberField::Other(_) => None,
        }
    }
}

/// A nested object that either has the expected shape or does not
#[derive(Debug, Clone, PartialEq)]
pub enum Node<T> {
    Valid(T),
    Malformed(Value),
}

impl<T> Node<T> {
    pub fn valid(&self) -> Option<&T> {
        match self {
            Node::Valid(node) => Some(node),
            Node::Malformed(_) => None,
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Node<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match serde_json::from_value(value.clone()) {
            Ok(node) => Node::Valid(node),
            Err(_) => Node::Malformed(value),
        })
    }
}

fn number(field: &Option<NumberField>) -> Option<f64> {
    field.as_ref().and_then(NumberField::value)
}

fn finite(field: &Option<NumberField>) -> Option<f64> {
    number(field).filter(|v| v.is_finite())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GpsNode {
    pub latitude: Option<NumberField>,
    pub longitude: Option<NumberField>,
    pub altitude: Option<NumberField>,
    pub accuracy: Option<NumberField>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CompassNode {
    pub heading: Option<NumberField>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GyroNode {
    pub yaw_geo_north: Option<NumberField>,
    pub yaw_magnetic_north: Option<NumberField>,
    pub pitch: Option<NumberField>,
}

/// One `data.json` as written by the recorders
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    pub timestamp: Option<Value>,
    pub gps: Option<Node<GpsNode>>,
    pub compass: Option<Node<CompassNode>>,
    pub gyro: Option<Node<GyroNode>>,
    // Older target logs put the fix at the top level
    pub latitude: Option<NumberField>,
    pub longitude: Option<NumberField>,
    pub altitude: Option<NumberField>,
}

impl RawRecord {
    /// Read and parse a record file. The file handle is dropped before
    /// parsing starts.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ViewerError::MissingRequiredFile { path: path.to_path_buf() }
            } else {
                ViewerError::io(path, e)
            }
        })?;
        Self::from_json(&content).map_err(|e| ViewerError::json(path, e))
    }

    pub fn from_json(content: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    fn gps(&self) -> Option<&GpsNode> {
        self.gps.as_ref().and_then(Node::valid)
    }

    fn compass(&self) -> Option<&CompassNode> {
        self.compass.as_ref().and_then(Node::valid)
    }

    fn gyro(&self) -> Option<&GyroNode> {
        self.gyro.as_ref().and_then(Node::valid)
    }

    /// Names of nested nodes present with the wrong shape
    pub fn malformed_nodes(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if matches!(self.gps, Some(Node::Malformed(_))) {
            names.push("gps");
        }
        if matches!(self.compass, Some(Node::Malformed(_))) {
            names.push("compass");
        }
        if matches!(self.gyro, Some(Node::Malformed(_))) {
            names.push("gyro");
        }
        names
    }

    /// (lat, lon, alt) from the `gps` node when present, else the top level.
    /// `None` unless both latitude and longitude are numbers. A malformed
    /// `gps` node still shadows the top level.
    pub fn position(&self) -> Option<(f64, f64, Option<f64>)> {
        let (lat, lon, alt) = match &self.gps {
            Some(Node::Valid(gps)) => (&gps.latitude, &gps.longitude, &gps.altitude),
            Some(Node::Malformed(_)) => return None,
            None => (&self.latitude, &self.longitude, &self.altitude),
        };
        Some((number(lat)?, number(lon)?, finite(alt)))
    }

    /// Bearing toward the target: geographic yaw, then magnetic yaw, then
    /// compass heading. The first finite value wins.
    pub fn yaw(&self) -> Option<f64> {
        let gyro = self.gyro();
        gyro.and_then(|g| finite(&g.yaw_geo_north))
            .or_else(|| gyro.and_then(|g| finite(&g.yaw_magnetic_north)))
            .or_else(|| self.compass().and_then(|c| finite(&c.heading)))
    }

    pub fn pitch(&self) -> Option<f64> {
        self.gyro().and_then(|g| finite(&g.pitch))
    }

    pub fn timestamp(&self) -> Option<String> {
        match self.timestamp.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn metadata(&self) -> RecordMetadata {
        let gyro = self.gyro().cloned().unwrap_or_default();
        RecordMetadata {
            timestamp: self.timestamp(),
            gps_accuracy: self.gps().and_then(|g| finite(&g.accuracy)),
            heading: self.compass().and_then(|c| finite(&c.heading)),
            yaw_geo: finite(&gyro.yaw_geo_north),
            yaw_magnetic: finite(&gyro.yaw_magnetic_north),
            pitch: finite(&gyro.pitch),
        }
    }
}

/// Photo stored next to a record file, if any
pub fn first_photo_for(record_path: &Path) -> Option<PathBuf> {
    let folder = record_path.parent()?;
    PHOTO_FILE_NAMES
        .iter()
        .map(|name| folder.join(name))
        .find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_full_observation_record() {
        let raw = RawRecord::from_json(
            r#"{
                "timestamp": "2025-03-01T10:00:00Z",
                "gps": { "latitude": 25.1, "longitude": 55.2, "altitude": 7.5, "accuracy": 3.2 },
                "compass": { "heading": 45.0 },
                "gyro": { "yaw_geo_north": 44.1, "yaw_magnetic_north": 46.0, "pitch": 12.5 },
                "battery": 80
            }"#,
        )
        .unwrap();

        assert_eq!(raw.position(), Some((25.1, 55.2, Some(7.5))));
        assert_eq!(raw.yaw(), Some(44.1));
        assert_eq!(raw.pitch(), Some(12.5));

        let meta = raw.metadata();
        assert_eq!(meta.timestamp.as_deref(), Some("2025-03-01T10:00:00Z"));
        assert_eq!(meta.gps_accuracy, Some(3.2));
        assert_eq!(meta.heading, Some(45.0));
        assert_eq!(meta.yaw_magnetic, Some(46.0));
    }

    #[test]
    fn test_yaw_fallback_chain() {
        let magnetic = RawRecord::from_json(
            r#"{ "gyro": { "yaw_geo_north": null, "yaw_magnetic_north": 90 }, "compass": { "heading": 10 } }"#,
        )
        .unwrap();
        assert_eq!(magnetic.yaw(), Some(90.0));

        let compass = RawRecord::from_json(r#"{ "compass": { "heading": "135.5" } }"#).unwrap();
        assert_eq!(compass.yaw(), Some(135.5));

        let nothing = RawRecord::from_json(r#"{ "gyro": { "pitch": 3 } }"#).unwrap();
        assert_eq!(nothing.yaw(), None);
    }

    #[test]
    fn test_top_level_position_and_string_numbers() {
        let raw = RawRecord::from_json(r#"{ "latitude": "25.5", "longitude": 55.5 }"#).unwrap();
        assert_eq!(raw.position(), Some((25.5, 55.5, None)));

        // A gps node shadows the top level even when it is incomplete
        let shadowed =
            RawRecord::from_json(r#"{ "gps": { "latitude": 1.0 }, "latitude": 2.0, "longitude": 3.0 }"#)
                .unwrap();
        assert_eq!(shadowed.position(), None);

        let junk = RawRecord::from_json(r#"{ "gps": { "latitude": "north", "longitude": 1 } }"#).unwrap();
        assert_eq!(junk.position(), None);
    }

    #[test]
    fn test_wrong_typed_values_read_as_missing() {
        let raw = RawRecord::from_json(
            r#"{ "gps": "unavailable", "latitude": 25.0, "longitude": 55.0,
                 "compass": { "heading": 80 }, "gyro": { "yaw_geo_north": [1], "pitch": true } }"#,
        )
        .unwrap();
        assert_eq!(raw.malformed_nodes(), vec!["gps"]);
        // The broken gps node still hides the top-level fix
        assert_eq!(raw.position(), None);
        assert_eq!(raw.yaw(), Some(80.0));
        assert_eq!(raw.pitch(), None);

        let shapes = RawRecord::from_json(r#"{ "compass": 12, "gyro": "off" }"#).unwrap();
        assert_eq!(shapes.malformed_nodes(), vec!["compass", "gyro"]);
        assert_eq!(shapes.yaw(), None);
        assert_eq!(shapes.metadata().heading, None);
    }

    #[test]
    fn test_numeric_timestamp() {
        let raw = RawRecord::from_json(r#"{ "timestamp": 1700000000 }"#).unwrap();
        assert_eq!(raw.timestamp().as_deref(), Some("1700000000"));
    }

    #[test]
    fn test_from_file_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("data.json");
        assert!(matches!(
            RawRecord::from_file(&missing),
            Err(ViewerError::MissingRequiredFile { .. })
        ));

        std::fs::write(&missing, "{ \"gps\": ").unwrap();
        assert!(matches!(RawRecord::from_file(&missing), Err(ViewerError::Json { .. })));
    }

    #[test]
    fn test_photo_lookup_order() {
        let dir = TempDir::new().unwrap();
        let record = dir.path().join("data.json");
        assert_eq!(first_photo_for(&record), None);

        std::fs::write(dir.path().join("photo.png"), b"png").unwrap();
        assert_eq!(first_photo_for(&record), Some(dir.path().join("photo.png")));

        std::fs::write(dir.path().join("photo.jpg"), b"jpg").unwrap();
        assert_eq!(first_photo_for(&record), Some(dir.path().join("photo.jpg")));
    }
}
