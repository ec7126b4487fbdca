//! Error reporting and record plausibility checks

pub mod data;
pub mod error;

pub use data::{RecordIssue, RecordValidator};
pub use error::{Result, ViewerError};
