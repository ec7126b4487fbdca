//! Bearing-only target localization
//!
//! Every observer reports its own position and the bearing (yaw, clockwise
//! from true north) and elevation (pitch) toward the target. The horizontal
//! fix is the component-wise median of all pairwise line intersections in a
//! local ENU plane, which keeps a single bad compass reading from dragging
//! the estimate. Height comes from the pitch angles once the horizontal
//! range to the fix is known.

use nalgebra::{Matrix2, Vector2, Vector3};
use tracing::{debug, warn};

use super::geodesy::LocalFrame;
use crate::core::{
    Estimate, EstimateInfo, EstimatedPosition, EstimationMethod, ObservationRecord,
    PARALLEL_DETERMINANT_EPS,
};

/// Turns a set of observer readings into a target position.
///
/// Implementations must be deterministic: the same observations always give
/// the same estimate.
pub trait LocalizationEstimator {
    /// `None` when the readings cannot constrain a position
    fn estimate(&self, observations: &[ObservationRecord]) -> Option<Estimate>;

    fn name(&self) -> &'static str;
}

/// Pairwise bearing intersection with median aggregation
#[derive(Debug, Clone)]
pub struct BearingTriangulator {
    /// Pairs whose direction determinant falls below this are skipped
    pub parallel_eps: f64,
}

impl Default for BearingTriangulator {
    fn default() -> Self {
        Self {
            parallel_eps: PARALLEL_DETERMINANT_EPS,
        }
    }
}

/// One observer expressed in the local frame
struct LocalBearing {
    origin: Vector2<f64>,
    direction: Vector2<f64>,
    pitch_deg: Option<f64>,
}

impl BearingTriangulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intersection of the lines `p1 + t d1` and `p2 + s d2`, or `None`
    /// when they are (nearly) parallel.
    pub fn intersect(
        &self,
        p1: &Vector2<f64>,
        d1: &Vector2<f64>,
        p2: &Vector2<f64>,
        d2: &Vector2<f64>,
    ) -> Option<Vector2<f64>> {
        let a = Matrix2::new(d1.x, -d2.x, d1.y, -d2.y);
        if a.determinant().abs() < self.parallel_eps {
            return None;
        }
        let t = a.try_inverse()? * (p2 - p1);
        Some(p1 + d1 * t.x)
    }

    fn local_bearings(&self, frame: &LocalFrame, observations: &[ObservationRecord]) -> Vec<LocalBearing> {
        observations
            .iter()
            .filter_map(|obs| {
                let yaw = match obs.yaw {
                    Some(y) if y.is_finite() => y,
                    _ => {
                        debug!(observer = obs.observer_id, "no usable yaw, skipping observer");
                        return None;
                    }
                };
                let enu = frame.to_enu(obs.lat, obs.lon, obs.alt.unwrap_or(0.0));
                let yaw_rad = yaw.to_radians();
                Some(LocalBearing {
                    origin: Vector2::new(enu.x, enu.y),
                    direction: Vector2::new(yaw_rad.sin(), yaw_rad.cos()),
                    pitch_deg: obs.pitch.filter(|p| p.is_finite()),
                })
            })
            .collect()
    }
}

impl LocalizationEstimator for BearingTriangulator {
    fn estimate(&self, observations: &[ObservationRecord]) -> Option<Estimate> {
        if observations.len() < 2 {
            return None;
        }

        // ENU origin at the first observer, whether or not its yaw is usable
        let first = &observations[0];
        let frame = LocalFrame::new(first.lat, first.lon, first.alt.unwrap_or(0.0));

        let bearings = self.local_bearings(&frame, observations);
        if bearings.len() < 2 {
            warn!(
                usable = bearings.len(),
                "fewer than two observers with a bearing, no estimate"
            );
            return None;
        }

        let mut candidates: Vec<Vector2<f64>> = Vec::new();
        for (i, bi) in bearings.iter().enumerate() {
            for bj in &bearings[i + 1..] {
                if let Some(point) = self.intersect(&bi.origin, &bi.direction, &bj.origin, &bj.direction) {
                    candidates.push(point);
                }
            }
        }

        let (horizontal, method) = if candidates.is_empty() {
            let sum = bearings
                .iter()
                .fold(Vector2::zeros(), |acc, b| acc + b.origin);
            (sum / bearings.len() as f64, EstimationMethod::FallbackNoIntersections)
        } else {
            let east = median(candidates.iter().map(|c| c.x).collect()).unwrap_or(0.0);
            let north = median(candidates.iter().map(|c| c.y).collect()).unwrap_or(0.0);
            (Vector2::new(east, north), EstimationMethod::TriangulationMedian)
        };

        let heights: Vec<f64> = bearings
            .iter()
            .filter_map(|b| {
                let pitch = b.pitch_deg?;
                let range = (b.origin - horizontal).norm();
                Some(pitch.to_radians().tan() * range)
            })
            .collect();
        let up = median(heights).unwrap_or(0.0);

        let (lat, lon, alt) = frame.to_geodetic(&Vector3::new(horizontal.x, horizontal.y, up));

        debug!(
            method = %method,
            pairs = candidates.len(),
            east = horizontal.x,
            north = horizontal.y,
            up,
            "bearing triangulation complete"
        );

        Some(Estimate {
            position: EstimatedPosition { lat, lon, alt },
            info: EstimateInfo {
                method,
                pairs: candidates.len(),
                observers_used: bearings.len(),
            },
        })
    }

    fn name(&self) -> &'static str {
        "bearing-triangulation"
    }
}

/// Median with the mean of the two middle values for even counts
pub fn median(mut values: Vec<f64>) -> Option<f64> {
    values.retain(|v| v.is_finite());
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
