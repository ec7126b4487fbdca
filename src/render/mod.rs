//! Map rendering: markers, popups, HTML and GeoJSON output

pub mod geojson;
pub mod html;
pub mod map;
pub mod popup;

pub use geojson::{save_geojson, to_geojson};
pub use map::{Bounds, Label, Layer, MapBuilder, MapDocument, Marker, MarkerIcon, MarkerKind, Polyline};
pub use popup::{html_escape, PopupBuilder};

use std::path::Path;
use tracing::warn;

use crate::algorithms::LocalizationEstimator;
use crate::core::{Case, CaseMetrics};
use crate::processing::DatasetLoader;
use crate::utils::config::ViewerConfig;
use crate::validation::Result;

/// A finished render: the map plus what went into it
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMap {
    pub document: MapDocument,
    pub metrics: Vec<CaseMetrics>,
    pub cases: Vec<Case>,
}

impl RenderedMap {
    pub fn to_html(&self) -> Result<String> {
        self.document.to_html()
    }

    pub fn save_html(&self, path: &Path) -> Result<()> {
        self.document.save_html(path)
    }

    pub fn save_geojson(&self, path: &Path) -> Result<()> {
        save_geojson(&self.cases, path)
    }
}

/// Estimate and draw already loaded cases onto one map
pub fn build_map_for_cases(
    cases: Vec<Case>,
    config: &ViewerConfig,
    estimator: &dyn LocalizationEstimator,
) -> RenderedMap {
    let mut builder = MapBuilder::new(config);
    let metrics = cases
        .iter()
        .map(|case| {
            let estimate = estimator.estimate(&case.observations);
            builder.add_case(case, estimate.as_ref())
        })
        .collect();
    RenderedMap {
        document: builder.finish(),
        metrics,
        cases,
    }
}

/// Load and draw cases under `root`.
///
/// With an empty `only_cases` every case is drawn and cases that fail to
/// load are skipped with a warning. Named cases must all load.
pub fn build_map_for_root(
    root: &Path,
    only_cases: &[String],
    config: &ViewerConfig,
    estimator: &dyn LocalizationEstimator,
) -> Result<RenderedMap> {
    let loader = DatasetLoader::new(root, config);

    let cases = if only_cases.is_empty() {
        let mut cases = Vec::new();
        for name in loader.list_cases()? {
            match loader.load_case(&name) {
                Ok(case) => cases.push(case),
                Err(e) if e.is_case_local() => {
                    warn!(case = %name, error = %e, "skipping case");
                }
                Err(e) => return Err(e),
            }
        }
        cases
    } else {
        only_cases
            .iter()
            .map(|name| loader.load_case(name))
            .collect::<Result<Vec<_>>>()?
    };

    Ok(build_map_for_cases(cases, config, estimator))
}
