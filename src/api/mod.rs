//! Application-facing API
//!
//! Session handling for interactive use and report formatting for the
//! metrics produced by each render.

pub mod formatting;
pub mod session;
pub mod types;

pub use formatting::{CsvFormatter, JsonFormatter, MetricsFormatter, TextFormatter};
pub use session::handle;
pub use types::{Action, Outcome, OutputFormat, ViewerState};
