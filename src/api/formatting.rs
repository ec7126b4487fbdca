//! Metrics report formatting
//!
//! Per-case metrics can be printed for humans, emitted as JSON for scripts,
//! or appended to CSV logs for comparing estimator runs.

use crate::api::types::OutputFormat;
use crate::core::CaseMetrics;

fn coordinate(value: Option<f64>) -> String {
    value.map(|v| format!("{:.6}°", v)).unwrap_or_else(|| "-".to_string())
}

/// Human-readable text formatter
#[derive(Debug, Clone, Default)]
pub struct TextFormatter {
    /// One line per case
    pub compact: bool,
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compact() -> Self {
        Self { compact: true }
    }

    pub fn format_case(&self, m: &CaseMetrics) -> String {
        let error = m
            .error_m
            .map(|e| format!("{:.3}", e))
            .unwrap_or_else(|| "none".to_string());
        let method = m.method.map(|x| x.as_str()).unwrap_or("none");

        if self.compact {
            return format!(
                "case={}  n_obs={}  error_m={}  method={}",
                m.case, m.n_observers, error, method
            );
        }

        let mut output = format!("Case {}:\n", m.case);
        output.push_str(&format!("  Observers: {}\n", m.n_observers));
        output.push_str(&format!(
            "  Object:    {}, {}\n",
            coordinate(m.object_lat),
            coordinate(m.object_lon)
        ));
        output.push_str(&format!(
            "  Estimate:  {}, {}\n",
            coordinate(m.est_lat),
            coordinate(m.est_lon)
        ));
        output.push_str(&format!("  Error:     {} m\n", error));
        output.push_str(&format!("  Method:    {}\n", method));
        output
    }

    pub fn format_text(&self, metrics: &[CaseMetrics]) -> String {
        let separator = if self.compact { "\n" } else { "" };
        let mut output = metrics
            .iter()
            .map(|m| self.format_case(m))
            .collect::<Vec<_>>()
            .join(separator);
        if self.compact && !output.is_empty() {
            output.push('\n');
        }
        output
    }
}

/// JSON formatter for structured output
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    pub fn format_json(&self, metrics: &[CaseMetrics]) -> Result<String, serde_json::Error> {
        if self.pretty {
            serde_json::to_string_pretty(metrics)
        } else {
            serde_json::to_string(metrics)
        }
    }
}

/// CSV formatter for data logging
#[derive(Debug, Clone)]
pub struct CsvFormatter {
    pub include_header: bool,
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self { include_header: true }
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl CsvFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self) -> String {
        "case,n_observers,has_object,est_lat,est_lon,object_lat,object_lon,error_m,method".to_string()
    }

    pub fn format_row(&self, m: &CaseMetrics) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{}",
            csv_field(&m.case),
            m.n_observers,
            m.has_object,
            csv_number(m.est_lat),
            csv_number(m.est_lon),
            csv_number(m.object_lat),
            csv_number(m.object_lon),
            csv_number(m.error_m),
            m.method.map(|x| x.as_str()).unwrap_or("")
        )
    }

    pub fn format_csv(&self, metrics: &[CaseMetrics]) -> String {
        let mut lines = Vec::with_capacity(metrics.len() + 1);
        if self.include_header {
            lines.push(self.header());
        }
        lines.extend(metrics.iter().map(|m| self.format_row(m)));
        let mut output = lines.join("\n");
        output.push('\n');
        output
    }
}

/// Picks the formatter for an [`OutputFormat`]
#[derive(Debug, Clone, Default)]
pub struct MetricsFormatter {
    pub format: OutputFormat,
    pub pretty_json: bool,
}

impl MetricsFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            pretty_json: true,
        }
    }

    pub fn format(&self, metrics: &[CaseMetrics]) -> Result<String, serde_json::Error> {
        match self.format {
            OutputFormat::Text => Ok(TextFormatter::new().format_text(metrics)),
            OutputFormat::Json => JsonFormatter { pretty: self.pretty_json }.format_json(metrics),
            OutputFormat::Csv => Ok(CsvFormatter::new().format_csv(metrics)),
        }
    }
}
