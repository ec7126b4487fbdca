//! Dataset walking and case loading
//!
//! Layout:
//!
//! ```text
//! <root>/<case>/object_records/<id>/data.json
//! <root>/<case>/observation_records/<n>/data.json
//! ```
//!
//! A case is loaded all-or-nothing. The object record is mandatory; its
//! absence is reported as [`ViewerError::MissingRequiredFile`] before any
//! observation is touched.

use std::cmp::Ordering;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

use super::record::{first_photo_for, RawRecord};
use crate::core::{
    Case, ObjectRecord, ObjectSelector, ObservationRecord, OBJECT_RECORDS_DIR,
    OBSERVATION_RECORDS_DIR, RECORD_FILE_NAME,
};
use crate::utils::config::ViewerConfig;
use crate::validation::{RecordValidator, Result, ViewerError};

/// Numeric names first in numeric order, then everything else lexically
pub fn compare_case_names(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Names of the sub-directories of `dir`, hidden ones excluded
fn subdirectory_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| ViewerError::io(dir, e))? {
        let entry = entry.map_err(|e| ViewerError::io(dir, e))?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        names.push(name);
    }
    Ok(names)
}

/// Loads cases from a dataset root
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    root: PathBuf,
    object_selector: ObjectSelector,
    max_observation_records: usize,
    validator: RecordValidator,
}

impl DatasetLoader {
    pub fn new(root: impl Into<PathBuf>, config: &ViewerConfig) -> Self {
        Self {
            root: root.into(),
            object_selector: config.object_id.clone(),
            max_observation_records: config.max_observation_records,
            validator: RecordValidator {
                require_bearing: config.require_bearing,
            },
        }
    }

    pub fn with_validator(mut self, validator: RecordValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Case directory names under the root, sorted
    pub fn list_cases(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Err(ViewerError::DatasetNotFound { path: self.root.clone() });
        }
        let mut cases = subdirectory_names(&self.root)?;
        cases.sort_by(|a, b| compare_case_names(a, b));
        debug!(root = %self.root.display(), count = cases.len(), "listed cases");
        Ok(cases)
    }

    /// Directory of a case; the name must be a single path component
    pub fn case_path(&self, case: &str) -> Result<PathBuf> {
        let mut components = Path::new(case).components();
        let single_name = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        let path = self.root.join(case);
        if !single_name || !path.is_dir() {
            return Err(ViewerError::UnknownCase { case: case.to_string() });
        }
        Ok(path)
    }

    /// Location of the selected object record, which must exist
    pub fn object_record_path(&self, case: &str) -> Result<PathBuf> {
        let objects_dir = self.case_path(case)?.join(OBJECT_RECORDS_DIR);
        match &self.object_selector {
            ObjectSelector::Id(id) => {
                let path = objects_dir.join(id).join(RECORD_FILE_NAME);
                if path.is_file() {
                    Ok(path)
                } else {
                    Err(ViewerError::MissingRequiredFile { path })
                }
            }
            ObjectSelector::Auto => {
                let mut ids = if objects_dir.is_dir() {
                    subdirectory_names(&objects_dir)?
                } else {
                    Vec::new()
                };
                ids.sort();
                ids.into_iter()
                    .map(|id| objects_dir.join(id).join(RECORD_FILE_NAME))
                    .find(|p| p.is_file())
                    .ok_or_else(|| ViewerError::MissingRequiredFile {
                        path: objects_dir.join("*").join(RECORD_FILE_NAME),
                    })
            }
        }
    }

    /// Load one case. Either every required record resolves and parses or
    /// the whole case is rejected.
    pub fn load_case(&self, case: &str) -> Result<Case> {
        let case_dir = self.case_path(case)?;
        let object_path = self.object_record_path(case)?;
        let object = self.load_object(&object_path)?;
        let observations = self.load_observations(&case_dir.join(OBSERVATION_RECORDS_DIR))?;

        if observations.is_empty() {
            warn!(case, "case has no usable observation records");
        }
        info!(
            case,
            object_id = %object.object_id,
            observers = observations.len(),
            "loaded case"
        );

        Ok(Case {
            name: case.to_string(),
            path: case_dir,
            object,
            observations,
        })
    }

    fn load_object(&self, path: &Path) -> Result<ObjectRecord> {
        let raw = RawRecord::from_file(path)?;
        for node in raw.malformed_nodes() {
            warn!(path = %path.display(), node, "unexpected JSON shape, node ignored");
        }
        let (lat, lon, alt) = raw
            .position()
            .ok_or_else(|| ViewerError::invalid_record(path, "no latitude/longitude"))?;
        self.validator
            .check_position(lat, lon)
            .map_err(|issue| ViewerError::invalid_record(path, issue.to_string()))?;

        let object_id = path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(ObjectRecord {
            object_id,
            lat,
            lon,
            alt,
            image_path: first_photo_for(path),
            source: path.to_path_buf(),
            metadata: raw.metadata(),
        })
    }

    fn load_observations(&self, dir: &Path) -> Result<Vec<ObservationRecord>> {
        if !dir.is_dir() {
            warn!(path = %dir.display(), "no observation_records directory");
            return Ok(Vec::new());
        }

        let mut indices: Vec<u32> = Vec::new();
        for name in subdirectory_names(dir)? {
            match name.parse::<u32>() {
                // `01` or `+1` would alias `1`
                Ok(n) if n.to_string() != name => {
                    debug!(entry = %name, "non-canonical observation directory, skipped")
                }
                Ok(n) if n >= 1 && (n as usize) <= self.max_observation_records => indices.push(n),
                Ok(n) => debug!(index = n, "observation index outside scan range, skipped"),
                Err(_) => debug!(entry = %name, "non-numeric observation directory, skipped"),
            }
        }
        indices.sort_unstable();

        let mut observations = Vec::with_capacity(indices.len());
        for index in indices {
            let path = dir.join(index.to_string()).join(RECORD_FILE_NAME);
            if !path.is_file() {
                debug!(path = %path.display(), "observation directory without record");
                continue;
            }
            if let Some(record) = self.load_observation(index, &path)? {
                observations.push(record);
            }
        }
        Ok(observations)
    }

    /// `Ok(None)` for a well-formed record that cannot be placed
    fn load_observation(&self, index: u32, path: &Path) -> Result<Option<ObservationRecord>> {
        let raw = RawRecord::from_file(path)?;
        for node in raw.malformed_nodes() {
            warn!(path = %path.display(), node, "unexpected JSON shape, node ignored");
        }

        let Some((lat, lon, alt)) = raw.position() else {
            warn!(path = %path.display(), "observation without latitude/longitude, skipped");
            return Ok(None);
        };
        if let Err(issue) = self.validator.check_position(lat, lon) {
            warn!(path = %path.display(), %issue, "observation position rejected");
            return Ok(None);
        }

        let yaw = raw.yaw();
        let (pitch, issues) = self.validator.check_orientation(yaw, raw.pitch());
        for issue in &issues {
            if self.validator.is_fatal(issue) {
                warn!(path = %path.display(), %issue, "observation rejected");
                return Ok(None);
            }
            debug!(path = %path.display(), %issue, "observation orientation issue");
        }

        Ok(Some(ObservationRecord {
            observer_id: index,
            lat,
            lon,
            alt,
            yaw,
            pitch,
            image_path: first_photo_for(path),
            source: path.to_path_buf(),
            metadata: raw.metadata(),
        }))
    }
}
