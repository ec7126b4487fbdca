//! Map document model and its construction from loaded cases
//!
//! The document is plain data: markers, text labels and helper lines, each
//! assigned to one of three toggleable layers. Turning it into HTML is the
//! job of [`super::html`].

use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

use super::popup::{data_uri, html_escape, PopupBuilder};
use crate::algorithms::geodesy::{geodesic_distance_m, margin_degrees};
use crate::core::{Case, CaseMetrics, Estimate, DEFAULT_CENTER, DEFAULT_ZOOM};
use crate::utils::config::ViewerConfig;

// Label offsets north of the marker they annotate (degrees latitude)
const OBSERVER_LABEL_OFFSET: f64 = 0.00018;
const DISTANCE_LABEL_OFFSET: f64 = -0.0001;
const OBJECT_LABEL_OFFSET: f64 = 0.00025;
const ESTIMATE_LABEL_OFFSET: f64 = 0.00022;

const OBSERVER_ICON_SIZE: u32 = 36;
const OBJECT_ICON_SIZE: u32 = 46;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Observers,
    ObjectActual,
    ObjectEstimated,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::Observers, Layer::ObjectActual, Layer::ObjectEstimated];

    pub fn title(&self) -> &'static str {
        match self {
            Layer::Observers => "Observers",
            Layer::ObjectActual => "Object (actual)",
            Layer::ObjectEstimated => "Object (estimated)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Observer,
    Object,
    Estimate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarkerIcon {
    /// Colored pin with a glyph
    Builtin { color: String, glyph: String },
    /// User-supplied image, inlined
    Custom { data_uri: String, size: u32 },
}

impl MarkerIcon {
    pub fn builtin(color: &str, glyph: &str) -> Self {
        MarkerIcon::Builtin {
            color: color.to_string(),
            glyph: glyph.to_string(),
        }
    }

    /// Custom image when configured and readable, otherwise `fallback`
    pub fn resolve(custom: Option<&Path>, size: u32, fallback: MarkerIcon) -> Self {
        let Some(path) = custom else {
            return fallback;
        };
        if !path.is_file() {
            warn!(path = %path.display(), "marker icon not found, using default");
            return fallback;
        }
        match data_uri(path) {
            Ok(data_uri) => MarkerIcon::Custom { data_uri, size },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "marker icon unreadable, using default");
                fallback
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub kind: MarkerKind,
    pub layer: Layer,
    pub lat: f64,
    pub lon: f64,
    pub icon: MarkerIcon,
    pub tooltip: String,
    pub popup_html: Option<String>,
    pub popup_max_width: u32,
}

/// Free-floating HTML text pinned to a coordinate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub layer: Layer,
    pub lat: f64,
    pub lon: f64,
    pub html: String,
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polyline {
    pub layer: Layer,
    /// `[lat, lon]` pairs
    pub points: Vec<[f64; 2]>,
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    /// Bounding box of `points` (lat, lon), widened by `margin_m` on every side
    pub fn around(points: &[(f64, f64)], margin_m: f64) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut b = Bounds {
            south: first.0,
            west: first.1,
            north: first.0,
            east: first.1,
        };
        for &(lat, lon) in rest {
            b.south = b.south.min(lat);
            b.north = b.north.max(lat);
            b.west = b.west.min(lon);
            b.east = b.east.max(lon);
        }
        let margin = margin_degrees(margin_m);
        Some(Bounds {
            south: b.south - margin,
            west: b.west - margin,
            north: b.north + margin,
            east: b.east + margin,
        })
    }

    /// Leaflet corner order: `[[south, west], [north, east]]`
    pub fn corners(&self) -> [[f64; 2]; 2] {
        [[self.south, self.west], [self.north, self.east]]
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.south..=self.north).contains(&lat) && (self.west..=self.east).contains(&lon)
    }
}

/// Everything needed to draw one map
#[derive(Debug, Clone, PartialEq)]
pub struct MapDocument {
    pub center: (f64, f64),
    pub zoom: u8,
    pub bounds: Option<Bounds>,
    pub markers: Vec<Marker>,
    pub labels: Vec<Label>,
    pub polylines: Vec<Polyline>,
}

impl MapDocument {
    pub fn markers_of(&self, kind: MarkerKind) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(move |m| m.kind == kind)
    }

    pub fn count(&self, kind: MarkerKind) -> usize {
        self.markers_of(kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// Accumulates cases into a [`MapDocument`]
pub struct MapBuilder {
    popups: Option<PopupBuilder>,
    bounds_margin_m: f64,
    observer_icon: MarkerIcon,
    object_icon: MarkerIcon,
    center: Option<(f64, f64)>,
    points: Vec<(f64, f64)>,
    markers: Vec<Marker>,
    labels: Vec<Label>,
    polylines: Vec<Polyline>,
}

impl MapBuilder {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            popups: config
                .enable_popups
                .then(|| PopupBuilder::new(config.popup_image_width_px)),
            bounds_margin_m: config.bounds_margin_m,
            observer_icon: MarkerIcon::resolve(
                config.observer_icon.as_deref(),
                OBSERVER_ICON_SIZE,
                MarkerIcon::builtin("blue", "user"),
            ),
            object_icon: MarkerIcon::resolve(
                config.object_icon.as_deref(),
                OBJECT_ICON_SIZE,
                MarkerIcon::builtin("red", "star"),
            ),
            center: None,
            points: Vec::new(),
            markers: Vec::new(),
            labels: Vec::new(),
            polylines: Vec::new(),
        }
    }

    fn popup_max_width(&self) -> u32 {
        self.popups.as_ref().map(PopupBuilder::max_width).unwrap_or(0)
    }

    /// Draw one case. The inputs are only read.
    pub fn add_case(&mut self, case: &Case, estimate: Option<&Estimate>) -> CaseMetrics {
        let name = html_escape(&case.name);
        let object = &case.object;
        let popup_max_width = self.popup_max_width();

        for obs in &case.observations {
            self.center.get_or_insert((obs.lat, obs.lon));
            self.points.push((obs.lat, obs.lon));

            let popup_html = self.popups.as_ref().map(|p| p.observation_popup(obs));
            self.markers.push(Marker {
                kind: MarkerKind::Observer,
                layer: Layer::Observers,
                lat: obs.lat,
                lon: obs.lon,
                icon: self.observer_icon.clone(),
                tooltip: format!("Observer {}-{}", name, obs.observer_id),
                popup_html,
                popup_max_width,
            });
            self.labels.push(Label {
                layer: Layer::Observers,
                lat: obs.lat + OBSERVER_LABEL_OFFSET,
                lon: obs.lon,
                html: format!(
                    r#"<b style="color:#1f77b4;font-size:12pt">{}</b>"#,
                    obs.observer_id
                ),
                width: 150,
            });

            let distance = geodesic_distance_m(obs.lat, obs.lon, object.lat, object.lon);
            self.labels.push(Label {
                layer: Layer::Observers,
                lat: obs.lat + DISTANCE_LABEL_OFFSET,
                lon: obs.lon,
                html: format!("<span style='color:green;font-size:11pt'>{:.0} m</span>", distance),
                width: 150,
            });
        }

        self.center.get_or_insert((object.lat, object.lon));
        self.points.push((object.lat, object.lon));
        let popup_html = self.popups.as_ref().map(|p| p.object_popup(object));
        self.markers.push(Marker {
            kind: MarkerKind::Object,
            layer: Layer::ObjectActual,
            lat: object.lat,
            lon: object.lon,
            icon: self.object_icon.clone(),
            tooltip: format!("Object actual – case {}", name),
            popup_html,
            popup_max_width,
        });
        self.labels.push(Label {
            layer: Layer::ObjectActual,
            lat: object.lat + OBJECT_LABEL_OFFSET,
            lon: object.lon,
            html: r#"<b style="color:red;font-size:13pt">Object</b>"#.to_string(),
            width: 180,
        });

        let mut metrics = CaseMetrics {
            case: case.name.clone(),
            n_observers: case.observations.len(),
            has_object: true,
            est_lat: None,
            est_lon: None,
            object_lat: Some(object.lat),
            object_lon: Some(object.lon),
            error_m: None,
            method: None,
        };

        if let Some(estimate) = estimate {
            let est = estimate.position;
            let error_m = geodesic_distance_m(est.lat, est.lon, object.lat, object.lon);
            self.points.push((est.lat, est.lon));

            self.markers.push(Marker {
                kind: MarkerKind::Estimate,
                layer: Layer::ObjectEstimated,
                lat: est.lat,
                lon: est.lon,
                icon: MarkerIcon::builtin("orange", "flag"),
                tooltip: format!(
                    "Object est – case {} | error: {:.1} m | method: {}, pairs: {}, observers: {}",
                    name,
                    error_m,
                    estimate.info.method,
                    estimate.info.pairs,
                    estimate.info.observers_used
                ),
                popup_html: None,
                popup_max_width: 0,
            });
            self.labels.push(Label {
                layer: Layer::ObjectEstimated,
                lat: est.lat + ESTIMATE_LABEL_OFFSET,
                lon: est.lon,
                html: format!(
                    r#"<b style="color:orange;font-size:12pt">Object est ({:.1} m)</b>"#,
                    error_m
                ),
                width: 260,
            });
            for obs in &case.observations {
                self.polylines.push(Polyline {
                    layer: Layer::ObjectEstimated,
                    points: vec![[obs.lat, obs.lon], [est.lat, est.lon]],
                    color: "gray".to_string(),
                    weight: 1.0,
                    opacity: 0.6,
                });
            }

            metrics.est_lat = Some(est.lat);
            metrics.est_lon = Some(est.lon);
            metrics.error_m = Some((error_m * 1000.0).round() / 1000.0);
            metrics.method = Some(estimate.info.method);
        }

        info!(
            case = %metrics.case,
            n_obs = metrics.n_observers,
            error_m = ?metrics.error_m,
            method = ?metrics.method.map(|m| m.as_str()),
            "case metrics"
        );
        metrics
    }

    pub fn finish(self) -> MapDocument {
        MapDocument {
            center: self.center.unwrap_or(DEFAULT_CENTER),
            zoom: DEFAULT_ZOOM,
            bounds: Bounds::around(&self.points, self.bounds_margin_m),
            markers: self.markers,
            labels: self.labels,
            polylines: self.polylines,
        }
    }
}
