//! Self-contained Leaflet page for a [`MapDocument`]

use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

use super::map::{Label, Layer, MapDocument, Marker, Polyline};
use crate::validation::{Result, ViewerError};

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Localization map</title>
<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/leaflet@1.9.4/dist/leaflet.css">
<link rel="stylesheet" href="https://netdna.bootstrapcdn.com/bootstrap/3.0.0/css/bootstrap-glyphicons.css">
<link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/Leaflet.awesome-markers/2.0.2/leaflet.awesome-markers.css">
<script src="https://cdn.jsdelivr.net/npm/leaflet@1.9.4/dist/leaflet.js"></script>
<script src="https://cdnjs.cloudflare.com/ajax/libs/Leaflet.awesome-markers/2.0.2/leaflet.awesome-markers.js"></script>
<style>html, body, #map { height: 100%; width: 100%; margin: 0; padding: 0; }</style>
</head>
<body>
<div id="map"></div>
"#;

const PAGE_SCRIPT: &str = r#"<script>
(function () {
  var doc = JSON.parse(document.getElementById('map-data').textContent);
  var map = L.map('map', { center: doc.center, zoom: doc.zoom });
  L.control.scale().addTo(map);
  L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
    maxZoom: 19,
    attribution: '&copy; OpenStreetMap contributors'
  }).addTo(map);

  var groups = {};
  var overlays = {};
  doc.layers.forEach(function (layer) {
    groups[layer.id] = L.featureGroup().addTo(map);
    overlays[layer.title] = groups[layer.id];
  });

  function icon(spec) {
    if (spec.type === 'custom') {
      return L.icon({ iconUrl: spec.data_uri, iconSize: [spec.size, spec.size] });
    }
    return L.AwesomeMarkers.icon({ markerColor: spec.color, icon: spec.glyph, prefix: 'glyphicon' });
  }

  doc.markers.forEach(function (m) {
    var marker = L.marker([m.lat, m.lon], { icon: icon(m.icon) });
    if (m.tooltip) { marker.bindTooltip(m.tooltip); }
    if (m.popup_html) { marker.bindPopup(m.popup_html, { maxWidth: m.popup_max_width }); }
    marker.addTo(groups[m.layer]);
  });

  doc.labels.forEach(function (l) {
    L.marker([l.lat, l.lon], {
      icon: L.divIcon({ html: l.html, iconSize: [l.width, 36], iconAnchor: [0, 0], className: '' })
    }).addTo(groups[l.layer]);
  });

  doc.polylines.forEach(function (p) {
    L.polyline(p.points, { color: p.color, weight: p.weight, opacity: p.opacity }).addTo(groups[p.layer]);
  });

  L.control.layers(null, overlays, { collapsed: false }).addTo(map);
  if (doc.bounds) { map.fitBounds(doc.bounds); }
})();
</script>
</body>
</html>
"#;

#[derive(Serialize)]
struct LayerInfo {
    id: Layer,
    title: &'static str,
}

/// What the page script reads from the embedded JSON block
#[derive(Serialize)]
struct Payload<'a> {
    center: [f64; 2],
    zoom: u8,
    bounds: Option<[[f64; 2]; 2]>,
    layers: Vec<LayerInfo>,
    markers: &'a [Marker],
    labels: &'a [Label],
    polylines: &'a [Polyline],
}

impl MapDocument {
    /// Map data as JSON, safe to place inside a `<script>` element
    pub fn to_json(&self) -> Result<String> {
        let payload = Payload {
            center: [self.center.0, self.center.1],
            zoom: self.zoom,
            bounds: self.bounds.map(|b| b.corners()),
            layers: Layer::ALL
                .iter()
                .map(|&id| LayerInfo { id, title: id.title() })
                .collect(),
            markers: &self.markers,
            labels: &self.labels,
            polylines: &self.polylines,
        };
        let json = serde_json::to_string(&payload)
            .map_err(|e| ViewerError::Render(format!("map serialization failed: {}", e)))?;
        Ok(json.replace("</", "<\\/"))
    }

    pub fn to_html(&self) -> Result<String> {
        let json = self.to_json()?;
        let mut html = String::with_capacity(PAGE_HEAD.len() + PAGE_SCRIPT.len() + json.len() + 64);
        html.push_str(PAGE_HEAD);
        html.push_str(r#"<script type="application/json" id="map-data">"#);
        html.push_str(&json);
        html.push_str("</script>\n");
        html.push_str(PAGE_SCRIPT);
        Ok(html)
    }

    /// Write the page, creating parent directories as needed
    pub fn save_html(&self, path: &Path) -> Result<()> {
        let html = self.to_html()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ViewerError::io(parent, e))?;
        }
        fs::write(path, html).map_err(|e| ViewerError::io(path, e))?;
        info!(path = %path.display(), markers = self.markers.len(), "map written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::map::{Bounds, MarkerIcon, MarkerKind};
    use tempfile::TempDir;

    fn document() -> MapDocument {
        MapDocument {
            center: (25.0, 55.0),
            zoom: 16,
            bounds: Bounds::around(&[(25.0, 55.0)], 30.0),
            markers: vec![Marker {
                kind: MarkerKind::Observer,
                layer: Layer::Observers,
                lat: 25.0,
                lon: 55.0,
                icon: MarkerIcon::builtin("blue", "user"),
                tooltip: "Observer 2-1".to_string(),
                popup_html: Some("<div><table></table></div>".to_string()),
                popup_max_width: 280,
            }],
            labels: Vec::new(),
            polylines: Vec::new(),
        }
    }

    #[test]
    fn test_json_payload() {
        let json = document().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["center"], serde_json::json!([25.0, 55.0]));
        assert_eq!(value["layers"][1]["id"], "object_actual");
        assert_eq!(value["layers"][2]["title"], "Object (estimated)");
        assert_eq!(value["markers"][0]["icon"]["type"], "builtin");
        assert_eq!(value["markers"][0]["layer"], "observers");
        assert_eq!(value["markers"][0]["popup_html"], "<div><table></table></div>");
    }

    #[test]
    fn test_script_close_tag_is_escaped() {
        let json = document().to_json().unwrap();
        assert!(!json.contains("</"));
        let html = document().to_html().unwrap();
        assert_eq!(html.matches("</script>").count(), 4);
        assert!(html.contains("leaflet@1.9.4"));
        assert!(html.contains("L.control.layers"));
    }

    #[test]
    fn test_save_creates_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results/map.html");
        document().save_html(&path).unwrap();
        let html = fs::read_to_string(&path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
    }
}
