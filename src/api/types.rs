//! Session state, actions and report formats

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::CaseMetrics;
use crate::render::RenderedMap;

/// Everything the viewer remembers between actions
#[derive(Debug, Clone, Default)]
pub struct ViewerState {
    pub root: Option<PathBuf>,
    /// Cases found under `root` when it was set
    pub cases: Vec<String>,
    pub selected_case: Option<String>,
    /// Last successfully generated map
    pub map: Option<RenderedMap>,
    pub quit_requested: bool,
}

impl ViewerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_map(&self) -> bool {
        self.map.is_some()
    }
}

/// User intents the session reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetRoot(PathBuf),
    SelectCase(String),
    Generate,
    Clear,
    Quit,
}

/// What an action did
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    RootSet { cases: Vec<String>, selected: Option<String> },
    CaseSelected(String),
    Generated { case: String, markers: usize, metrics: Vec<CaseMetrics> },
    Cleared { had_map: bool },
    Quit,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::RootSet { cases, selected } => {
                write!(f, "{} case(s) found", cases.len())?;
                if let Some(case) = selected {
                    write!(f, ", selected '{}'", case)?;
                }
                Ok(())
            }
            Outcome::CaseSelected(case) => write!(f, "Selected case '{}'", case),
            Outcome::Generated { case, markers, .. } => {
                write!(f, "Map ready for case {} ({} markers)", case, markers)
            }
            Outcome::Cleared { had_map: true } => write!(f, "Cleared map."),
            Outcome::Cleared { had_map: false } => write!(f, "No map to clear."),
            Outcome::Quit => write!(f, "Bye."),
        }
    }
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(format!("unknown format '{}' (expected text, json or csv)", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!(OutputFormat::default(), OutputFormat::Text);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_outcome_messages() {
        let outcome = Outcome::RootSet {
            cases: vec!["1".into(), "2".into()],
            selected: Some("1".into()),
        };
        assert_eq!(outcome.to_string(), "2 case(s) found, selected '1'");
        assert_eq!(Outcome::Cleared { had_map: true }.to_string(), "Cleared map.");
    }
}
