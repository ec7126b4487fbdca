//! Core types and constants for the localization viewer

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
