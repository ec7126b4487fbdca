//! Marker popups: embedded photo plus a small metadata table

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::fs;
use std::io;
use std::path::Path;
use tracing::warn;

use crate::core::{ObjectRecord, ObservationRecord, RecordMetadata};

/// Shown for values a record does not carry
pub const MISSING_VALUE: &str = "—";

/// Escape text for HTML element content and attribute values
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// MIME type from the file extension
pub fn image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

/// Inline an image file as a `data:` URI
pub fn data_uri(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(format!("data:{};base64,{}", image_mime(path), BASE64.encode(bytes)))
}

fn display_number(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => MISSING_VALUE.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct PopupBuilder {
    pub image_width_px: u32,
}

impl PopupBuilder {
    pub fn new(image_width_px: u32) -> Self {
        Self { image_width_px }
    }

    /// Leaflet `maxWidth` for popups built here
    pub fn max_width(&self) -> u32 {
        self.image_width_px + 40
    }

    pub fn observation_popup(&self, obs: &ObservationRecord) -> String {
        self.build(obs.image_path.as_deref(), obs.lat, obs.lon, obs.alt, &obs.metadata)
    }

    pub fn object_popup(&self, obj: &ObjectRecord) -> String {
        self.build(obj.image_path.as_deref(), obj.lat, obj.lon, obj.alt, &obj.metadata)
    }

    /// `<img>` with the photo inlined. An unreadable photo is logged and
    /// left out; the metadata table is still shown.
    pub fn image_tag(&self, path: &Path) -> Option<String> {
        match data_uri(path) {
            Ok(uri) => Some(format!(r#"<img src="{}" width="{}">"#, uri, self.image_width_px)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not embed popup image");
                None
            }
        }
    }

    pub fn metadata_table(&self, lat: f64, lon: f64, alt: Option<f64>, meta: &RecordMetadata) -> String {
        let rows = [
            ("timestamp", meta.timestamp.clone().unwrap_or_else(|| MISSING_VALUE.to_string())),
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("alt", display_number(alt)),
            ("gps_acc(m)", display_number(meta.gps_accuracy)),
            ("heading", display_number(meta.heading)),
            ("yaw_geo", display_number(meta.yaw_geo)),
            ("yaw_mag", display_number(meta.yaw_magnetic)),
            ("pitch", display_number(meta.pitch)),
        ];

        let mut html = String::from("<table style='font-size:12px; margin-top:6px;'>");
        for (label, value) in rows {
            html.push_str(&format!(
                "<tr><td><b>{}</b></td><td>{}</td></tr>",
                html_escape(label),
                html_escape(&value)
            ));
        }
        html.push_str("</table>");
        html
    }

    fn build(
        &self,
        image: Option<&Path>,
        lat: f64,
        lon: f64,
        alt: Option<f64>,
        meta: &RecordMetadata,
    ) -> String {
        let mut html = String::from("<div>");
        if let Some(tag) = image.and_then(|p| self.image_tag(p)) {
            html.push_str(&tag);
        }
        html.push_str(&self.metadata_table(lat, lon, alt, meta));
        html.push_str("</div>");
        html
    }
}

impl Default for PopupBuilder {
    fn default() -> Self {
        Self::new(crate::core::DEFAULT_POPUP_WIDTH_PX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn observation(image_path: Option<PathBuf>) -> ObservationRecord {
        ObservationRecord {
            observer_id: 3,
            lat: 25.5,
            lon: 55.25,
            alt: None,
            yaw: Some(10.0),
            pitch: None,
            image_path,
            source: PathBuf::from("3/data.json"),
            metadata: RecordMetadata {
                timestamp: Some("<script>".to_string()),
                heading: Some(12.5),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape(r#"<a href="x">&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#x27;&lt;/a&gt;");
        assert_eq!(html_escape("plain"), "plain");
    }

    #[test]
    fn test_image_mime() {
        assert_eq!(image_mime(Path::new("photo.JPG")), "image/jpeg");
        assert_eq!(image_mime(Path::new("photo.jpeg")), "image/jpeg");
        assert_eq!(image_mime(Path::new("photo.png")), "image/png");
        assert_eq!(image_mime(Path::new("icon.svg")), "image/svg+xml");
    }

    #[test]
    fn test_popup_without_image() {
        let html = PopupBuilder::new(240).observation_popup(&observation(None));
        assert!(html.starts_with("<div><table"));
        assert!(!html.contains("<img"));
        assert!(html.contains("<tr><td><b>timestamp</b></td><td>&lt;script&gt;</td></tr>"));
        assert!(html.contains("<tr><td><b>alt</b></td><td>—</td></tr>"));
        assert!(html.contains("<tr><td><b>heading</b></td><td>12.5</td></tr>"));
        assert!(html.contains("<tr><td><b>gps_acc(m)</b></td><td>—</td></tr>"));
    }

    #[test]
    fn test_popup_embeds_image() {
        let dir = TempDir::new().unwrap();
        let photo = dir.path().join("photo.png");
        fs::write(&photo, [1u8, 2, 3]).unwrap();

        let html = PopupBuilder::new(120).observation_popup(&observation(Some(photo)));
        assert!(html.contains(r#"<img src="data:image/png;base64,AQID" width="120">"#));
    }

    #[test]
    fn test_missing_image_keeps_table() {
        let builder = PopupBuilder::default();
        let html = builder.observation_popup(&observation(Some(PathBuf::from("/nonexistent/photo.jpg"))));
        assert!(!html.contains("<img"));
        assert!(html.contains("<table"));
        assert_eq!(builder.max_width(), 280);
    }
}
