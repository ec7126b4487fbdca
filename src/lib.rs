//! Observer/Target Localization Viewer
//!
//! Loads recorded observer bearings and the true target position for a
//! dataset case, estimates the target by bearing-only triangulation and
//! renders everything onto an interactive Leaflet map.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod render;
pub mod api;
pub mod validation;
pub mod utils;

// Re-export commonly used types
pub use crate::core::{Case, CaseMetrics, Estimate, EstimatedPosition, EstimationMethod, ObjectRecord, ObjectSelector, ObservationRecord};
pub use crate::algorithms::{BearingTriangulator, LocalizationEstimator};
pub use crate::processing::DatasetLoader;
pub use crate::render::{build_map_for_cases, build_map_for_root, MapDocument, RenderedMap};
pub use crate::api::{handle, Action, MetricsFormatter, Outcome, OutputFormat, ViewerState};
pub use crate::validation::{Result, ViewerError};
pub use crate::utils::{ConfigurationManager, ViewerConfig};
