//! Geodesy and target localization algorithms

pub mod geodesy;
pub mod triangulation;

pub use geodesy::{geodesic_distance_m, haversine_distance_m, margin_degrees, Ellipsoid, LocalFrame};
pub use triangulation::{median, BearingTriangulator, LocalizationEstimator};
