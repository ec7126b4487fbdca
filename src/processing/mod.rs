//! Dataset reading: record parsing and case loading

pub mod loader;
pub mod record;

pub use loader::{compare_case_names, DatasetLoader};
pub use record::{first_photo_for, NumberField, RawRecord};
