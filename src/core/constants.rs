//! Dataset layout, geodetic constants and rendering defaults

/// Mean Earth radius used for map margins and the haversine fallback (meters)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// WGS84 semi-major axis (meters)
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257223563;

/// Directory holding the reference target record(s) of a case
pub const OBJECT_RECORDS_DIR: &str = "object_records";

/// Directory holding one sub-directory per observer
pub const OBSERVATION_RECORDS_DIR: &str = "observation_records";

/// Record file inside every object/observation directory
pub const RECORD_FILE_NAME: &str = "data.json";

/// Photo names probed next to a record, in priority order
pub const PHOTO_FILE_NAMES: [&str; 3] = ["photo.jpg", "photo.jpeg", "photo.png"];

/// Object record loaded when nothing else is configured
pub const DEFAULT_OBJECT_ID: &str = "1";

/// Keyword selecting the first object record in sorted order
pub const AUTO_OBJECT_ID: &str = "auto";

/// Upper bound on observation directories scanned per case
pub const DEFAULT_MAX_OBSERVATION_RECORDS: usize = 100;

/// Determinant below which two bearing lines count as parallel
pub const PARALLEL_DETERMINANT_EPS: f64 = 1e-6;

pub const DEFAULT_POPUP_WIDTH_PX: u32 = 240;
pub const DEFAULT_BOUNDS_MARGIN_M: f64 = 30.0;
pub const DEFAULT_ZOOM: u8 = 16;

/// Fallback map center when a document carries no points
pub const DEFAULT_CENTER: (f64, f64) = (25.0, 55.0);
