//! GeoJSON export of observers and objects

use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::core::Case;
use crate::validation::{Result, ViewerError};

fn point_feature(lat: f64, lon: f64, properties: Value) -> Value {
    json!({
        "type": "Feature",
        "geometry": { "type": "Point", "coordinates": [lon, lat] },
        "properties": properties,
    })
}

/// `FeatureCollection` with one point per observer and per object
pub fn to_geojson(cases: &[Case]) -> Value {
    let mut features = Vec::new();
    for case in cases {
        for obs in &case.observations {
            features.push(point_feature(
                obs.lat,
                obs.lon,
                json!({
                    "type": "observer",
                    "case": case.name,
                    "record": obs.observer_id,
                    "label": format!("Observer {}-{}", case.name, obs.observer_id),
                    "timestamp": obs.metadata.timestamp,
                    "source": obs.source.display().to_string(),
                }),
            ));
        }
        features.push(point_feature(
            case.object.lat,
            case.object.lon,
            json!({
                "type": "object",
                "case": case.name,
                "record": case.object.object_id,
                "source": case.object.source.display().to_string(),
            }),
        ));
    }
    json!({ "type": "FeatureCollection", "features": features })
}

pub fn save_geojson(cases: &[Case], path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(&to_geojson(cases))
        .map_err(|e| ViewerError::Render(format!("GeoJSON serialization failed: {}", e)))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ViewerError::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| ViewerError::io(path, e))?;
    info!(path = %path.display(), "GeoJSON written");
    Ok(())
}
