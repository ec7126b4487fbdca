use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::{
    ObjectSelector, DEFAULT_BOUNDS_MARGIN_M, DEFAULT_MAX_OBSERVATION_RECORDS,
    DEFAULT_POPUP_WIDTH_PX,
};

/// Smallest and largest popup image width accepted (pixels)
pub const MIN_POPUP_WIDTH_PX: u32 = 40;
pub const MAX_POPUP_WIDTH_PX: u32 = 2000;

/// Viewer-wide configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Object record used as the reference target (`"1"` or `"auto"`)
    pub object_id: ObjectSelector,
    /// Attach image + metadata popups to markers
    pub enable_popups: bool,
    /// Width of the embedded popup image (pixels)
    pub popup_image_width_px: u32,
    /// Margin added around all points when fitting the view (meters)
    pub bounds_margin_m: f64,
    /// Custom observer marker image
    pub observer_icon: Option<PathBuf>,
    /// Custom object marker image
    pub object_icon: Option<PathBuf>,
    /// Highest observation directory index scanned per case
    pub max_observation_records: usize,
    /// Drop observations that carry no yaw or heading
    pub require_bearing: bool,
    /// Enable debug logging
    pub debug_logging: bool,
    /// Where rendered artifacts are written
    pub output: OutputConfig,
}

/// Output file locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub map_path: PathBuf,
    pub geojson_path: PathBuf,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            object_id: ObjectSelector::default(),
            enable_popups: true,
            popup_image_width_px: DEFAULT_POPUP_WIDTH_PX,
            bounds_margin_m: DEFAULT_BOUNDS_MARGIN_M,
            observer_icon: None,
            object_icon: None,
            max_observation_records: DEFAULT_MAX_OBSERVATION_RECORDS,
            require_bearing: false,
            debug_logging: false,
            output: OutputConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            map_path: PathBuf::from("results/map.html"),
            geojson_path: PathBuf::from("results/results.geojson"),
        }
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid parameter '{parameter}' = '{value}': {reason}")]
    InvalidParameter { parameter: String, value: String, reason: String },

    #[error("I/O error: {message}")]
    IoError { message: String },

    #[error("Serialization error: {message}")]
    SerializationError { message: String },
}

/// Outcome of validating a configuration
#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ConfigError>,
    pub warnings: Vec<String>,
}

/// Owns the active configuration and its backing file
pub struct ConfigurationManager {
    config: ViewerConfig,
    config_file_path: Option<PathBuf>,
    is_modified: bool,
}

impl Default for ConfigurationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationManager {
    /// Create a new configuration manager with default settings
    pub fn new() -> Self {
        Self {
            config: ViewerConfig::default(),
            config_file_path: None,
            is_modified: false,
        }
    }

    /// Create configuration manager and load from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn get_config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn into_config(self) -> ViewerConfig {
        self.config
    }

    /// Load configuration from JSON file
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        let config: ViewerConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::SerializationError {
                message: format!("Failed to parse config file '{}': {}", path.display(), e),
            })?;

        let validation = Self::validate_config(&config);
        for warning in &validation.warnings {
            tracing::warn!("{}: {}", path.display(), warning);
        }
        Self::first_error(validation)?;

        self.config = config;
        self.config_file_path = Some(path.to_path_buf());
        self.is_modified = false;
        Ok(())
    }

    /// Save configuration to JSON file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(&self.config).map_err(|e| {
            ConfigError::SerializationError {
                message: format!("Failed to serialize config: {}", e),
            }
        })?;

        fs::write(path, content).map_err(|e| ConfigError::IoError {
            message: format!("Failed to write config file '{}': {}", path.display(), e),
        })?;

        self.config_file_path = Some(path.to_path_buf());
        self.is_modified = false;
        Ok(())
    }

    /// Save to the currently loaded file path
    pub fn save(&mut self) -> Result<(), ConfigError> {
        match self.config_file_path.clone() {
            Some(path) => self.save_to_file(path),
            None => Err(ConfigError::IoError {
                message: "No file path set for saving configuration".to_string(),
            }),
        }
    }

    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    // Runtime parameter adjustment. Each setter returns the previous value.

    pub fn set_object_id(&mut self, object_id: ObjectSelector) -> Result<ObjectSelector, ConfigError> {
        if let ObjectSelector::Id(id) = &object_id {
            if id.trim().is_empty() {
                return Err(ConfigError::InvalidParameter {
                    parameter: "object_id".to_string(),
                    value: id.clone(),
                    reason: "Object id must not be empty".to_string(),
                });
            }
        }
        self.is_modified = true;
        Ok(std::mem::replace(&mut self.config.object_id, object_id))
    }

    pub fn set_popups_enabled(&mut self, enabled: bool) -> bool {
        self.is_modified = true;
        std::mem::replace(&mut self.config.enable_popups, enabled)
    }

    pub fn set_popup_width(&mut self, width_px: u32) -> Result<u32, ConfigError> {
        if !(MIN_POPUP_WIDTH_PX..=MAX_POPUP_WIDTH_PX).contains(&width_px) {
            return Err(ConfigError::InvalidParameter {
                parameter: "popup_image_width_px".to_string(),
                value: width_px.to_string(),
                reason: format!(
                    "Popup width must be between {} and {} px",
                    MIN_POPUP_WIDTH_PX, MAX_POPUP_WIDTH_PX
                ),
            });
        }
        self.is_modified = true;
        Ok(std::mem::replace(&mut self.config.popup_image_width_px, width_px))
    }

    pub fn set_bounds_margin(&mut self, margin_m: f64) -> Result<f64, ConfigError> {
        if !margin_m.is_finite() || margin_m < 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "bounds_margin_m".to_string(),
                value: margin_m.to_string(),
                reason: "Bounds margin must be a non-negative number of meters".to_string(),
            });
        }
        self.is_modified = true;
        Ok(std::mem::replace(&mut self.config.bounds_margin_m, margin_m))
    }

    pub fn set_require_bearing(&mut self, required: bool) -> bool {
        self.is_modified = true;
        std::mem::replace(&mut self.config.require_bearing, required)
    }

    pub fn set_debug_logging(&mut self, enabled: bool) -> bool {
        self.is_modified = true;
        std::mem::replace(&mut self.config.debug_logging, enabled)
    }

    /// Validate a configuration without applying it
    pub fn validate_config(config: &ViewerConfig) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if let ObjectSelector::Id(id) = &config.object_id {
            if id.trim().is_empty() {
                errors.push(ConfigError::InvalidParameter {
                    parameter: "object_id".to_string(),
                    value: id.clone(),
                    reason: "Object id must not be empty".to_string(),
                });
            }
        }

        if !(MIN_POPUP_WIDTH_PX..=MAX_POPUP_WIDTH_PX).contains(&config.popup_image_width_px) {
            errors.push(ConfigError::InvalidParameter {
                parameter: "popup_image_width_px".to_string(),
                value: config.popup_image_width_px.to_string(),
                reason: format!(
                    "Popup width must be between {} and {} px",
                    MIN_POPUP_WIDTH_PX, MAX_POPUP_WIDTH_PX
                ),
            });
        }

        if !config.bounds_margin_m.is_finite() || config.bounds_margin_m < 0.0 {
            errors.push(ConfigError::InvalidParameter {
                parameter: "bounds_margin_m".to_string(),
                value: config.bounds_margin_m.to_string(),
                reason: "Bounds margin must be a non-negative number of meters".to_string(),
            });
        } else if config.bounds_margin_m > 10_000.0 {
            warnings.push(format!(
                "bounds_margin_m = {} will zoom the map far out",
                config.bounds_margin_m
            ));
        }

        if config.max_observation_records == 0 {
            errors.push(ConfigError::InvalidParameter {
                parameter: "max_observation_records".to_string(),
                value: "0".to_string(),
                reason: "At least one observation record must be scanned".to_string(),
            });
        }

        for (name, icon) in [("observer_icon", &config.observer_icon), ("object_icon", &config.object_icon)] {
            if let Some(path) = icon {
                if !path.exists() {
                    warnings.push(format!(
                        "{} '{}' does not exist, default marker will be used",
                        name,
                        path.display()
                    ));
                }
            }
        }

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    fn first_error(validation: ValidationResult) -> Result<(), ConfigError> {
        match validation.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ViewerConfig::default();
        assert_eq!(config.object_id, ObjectSelector::Id("1".to_string()));
        assert!(config.enable_popups);
        assert_eq!(config.popup_image_width_px, 240);
        assert_eq!(config.bounds_margin_m, 30.0);
        assert_eq!(config.max_observation_records, 100);
        assert!(!config.require_bearing);
        assert!(ConfigurationManager::validate_config(&config).is_valid);
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let config: ViewerConfig =
            serde_json::from_str(r#"{ "object_id": "auto", "enable_popups": false }"#).unwrap();
        assert_eq!(config.object_id, ObjectSelector::Auto);
        assert!(!config.enable_popups);
        assert_eq!(config.popup_image_width_px, 240);
        assert_eq!(config.output.map_path, PathBuf::from("results/map.html"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ViewerConfig {
            popup_image_width_px: 5,
            bounds_margin_m: -1.0,
            max_observation_records: 0,
            ..Default::default()
        };
        let result = ConfigurationManager::validate_config(&config);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 3);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("viewer.json");

        let mut manager = ConfigurationManager::new();
        manager.set_object_id(ObjectSelector::Auto).unwrap();
        manager.set_popup_width(320).unwrap();
        assert!(manager.is_modified());
        manager.save_to_file(&path).unwrap();
        assert!(!manager.is_modified());

        let loaded = ConfigurationManager::from_file(&path).unwrap();
        assert_eq!(loaded.get_config().object_id, ObjectSelector::Auto);
        assert_eq!(loaded.get_config().popup_image_width_px, 320);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        match ConfigurationManager::from_file(&path) {
            Err(ConfigError::SerializationError { .. }) => {}
            other => panic!("unexpected result: {:?}", other.map(|m| m.into_config())),
        }
        assert!(matches!(
            ConfigurationManager::from_file(dir.path().join("missing.json")),
            Err(ConfigError::IoError { .. })
        ));
    }

    #[test]
    fn test_runtime_adjustments_return_previous_value() {
        let mut manager = ConfigurationManager::new();
        assert_eq!(manager.set_bounds_margin(50.0).unwrap(), 30.0);
        assert!(manager.set_bounds_margin(f64::NAN).is_err());
        assert_eq!(manager.set_popup_width(100).unwrap(), 240);
        assert!(manager.set_popup_width(10_000).is_err());
        assert!(manager.set_popups_enabled(false));
        assert!(manager.set_object_id(ObjectSelector::Id(" ".into())).is_err());
        assert!(!manager.set_require_bearing(true));
        assert!(!manager.set_debug_logging(true));
        assert!(manager.get_config().require_bearing);
    }

    #[test]
    fn test_save_without_path_fails() {
        let mut manager = ConfigurationManager::new();
        assert!(matches!(manager.save(), Err(ConfigError::IoError { .. })));
    }
}
