//! WGS84 geodetic conversions and distances
//!
//! Observers sit within a few hundred meters of each other, so bearings are
//! intersected in a local East-North-Up tangent plane anchored at one
//! observer. Conversions go through ECEF to stay exact on the ellipsoid.

use geo::{GeodesicDistance, Point};
use nalgebra::{Matrix3, Vector3};

use crate::core::{EARTH_RADIUS_M, WGS84_A, WGS84_F};

/// WGS84 ellipsoid
#[derive(Debug, Clone, Copy)]
pub struct Ellipsoid {
    /// Semi-major axis (meters)
    pub a: f64,
    /// Semi-minor axis (meters)
    pub b: f64,
    pub flattening: f64,
    /// First eccentricity squared
    pub e2: f64,
    /// Second eccentricity squared
    pub ep2: f64,
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Ellipsoid {
    pub fn wgs84() -> Self {
        let a = WGS84_A;
        let f = WGS84_F;
        let b = a * (1.0 - f);
        let e2 = f * (2.0 - f);
        Self {
            a,
            b,
            flattening: f,
            e2,
            ep2: (a * a - b * b) / (b * b),
        }
    }

    /// Geodetic (degrees, meters above ellipsoid) to ECEF (meters)
    pub fn geodetic_to_ecef(&self, lat_deg: f64, lon_deg: f64, height_m: f64) -> Vector3<f64> {
        let lat = lat_deg.to_radians();
        let lon = lon_deg.to_radians();

        // Radius of curvature in the prime vertical
        let n = self.a / (1.0 - self.e2 * lat.sin().powi(2)).sqrt();

        Vector3::new(
            (n + height_m) * lat.cos() * lon.cos(),
            (n + height_m) * lat.cos() * lon.sin(),
            (n * (1.0 - self.e2) + height_m) * lat.sin(),
        )
    }

    /// ECEF to geodetic using Bowring's closed form. Returns
    /// (lat_deg, lon_deg, height_m).
    pub fn ecef_to_geodetic(&self, ecef: &Vector3<f64>) -> (f64, f64, f64) {
        let p = (ecef.x * ecef.x + ecef.y * ecef.y).sqrt();
        let theta = (ecef.z * self.a).atan2(p * self.b);

        let lat = (ecef.z + self.ep2 * self.b * theta.sin().powi(3))
            .atan2(p - self.e2 * self.a * theta.cos().powi(3));
        let lon = ecef.y.atan2(ecef.x);

        let n = self.a / (1.0 - self.e2 * lat.sin().powi(2)).sqrt();
        let height = if lat.cos().abs() > 1e-12 {
            p / lat.cos() - n
        } else {
            ecef.z.abs() / lat.sin().abs() - n * (1.0 - self.e2)
        };

        (lat.to_degrees(), lon.to_degrees(), height)
    }
}

/// Local East-North-Up frame anchored at a geodetic origin
#[derive(Debug, Clone)]
pub struct LocalFrame {
    ellipsoid: Ellipsoid,
    origin_ecef: Vector3<f64>,
    /// Rotation ECEF -> ENU
    rotation: Matrix3<f64>,
}

impl LocalFrame {
    pub fn new(lat0_deg: f64, lon0_deg: f64, h0_m: f64) -> Self {
        let ellipsoid = Ellipsoid::wgs84();
        let lat = lat0_deg.to_radians();
        let lon = lon0_deg.to_radians();
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = lon.sin_cos();

        let rotation = Matrix3::new(
            -sin_lon,           cos_lon,            0.0,
            -sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat,
            cos_lat * cos_lon,  cos_lat * sin_lon,  sin_lat,
        );

        Self {
            origin_ecef: ellipsoid.geodetic_to_ecef(lat0_deg, lon0_deg, h0_m),
            ellipsoid,
            rotation,
        }
    }

    /// Geodetic to (east, north, up) meters relative to the origin
    pub fn to_enu(&self, lat_deg: f64, lon_deg: f64, height_m: f64) -> Vector3<f64> {
        let ecef = self.ellipsoid.geodetic_to_ecef(lat_deg, lon_deg, height_m);
        self.rotation * (ecef - self.origin_ecef)
    }

    /// (east, north, up) back to (lat_deg, lon_deg, height_m)
    pub fn to_geodetic(&self, enu: &Vector3<f64>) -> (f64, f64, f64) {
        let ecef = self.origin_ecef + self.rotation.transpose() * enu;
        self.ellipsoid.ecef_to_geodetic(&ecef)
    }
}

/// Great-circle distance on a sphere of radius [`EARTH_RADIUS_M`]
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Ellipsoidal distance on WGS84 (Karney's geodesic)
pub fn geodesic_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    Point::new(lon1, lat1).geodesic_distance(&Point::new(lon2, lat2))
}

/// Degrees of arc spanned by `margin_m` on the mean-radius sphere
pub fn margin_degrees(margin_m: f64) -> f64 {
    (margin_m / EARTH_RADIUS_M).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geodetic_to_ecef_at_origin() {
        let e = Ellipsoid::wgs84();
        let ecef = e.geodetic_to_ecef(0.0, 0.0, 0.0);
        assert!((ecef.x - WGS84_A).abs() < 1e-6);
        assert!(ecef.y.abs() < 1e-6);
        assert!(ecef.z.abs() < 1e-6);
    }

    #[test]
    fn test_ecef_round_trip() {
        let e = Ellipsoid::wgs84();
        for &(lat, lon, h) in &[(25.2048, 55.2708, 12.0), (-33.86, 151.2, 250.0), (60.0, -10.0, -5.0)] {
            let ecef = e.geodetic_to_ecef(lat, lon, h);
            let (lat2, lon2, h2) = e.ecef_to_geodetic(&ecef);
            assert!((lat - lat2).abs() < 1e-9, "lat {} vs {}", lat, lat2);
            assert!((lon - lon2).abs() < 1e-9);
            assert!((h - h2).abs() < 1e-3);
        }
    }

    #[test]
    fn test_enu_axes() {
        let frame = LocalFrame::new(25.0, 55.0, 0.0);

        let north = frame.to_enu(25.009, 55.0, 0.0);
        assert!(north.x.abs() < 1.0);
        assert!((north.y - 997.0).abs() < 5.0);
        // Curvature drops the point slightly below the tangent plane
        assert!(north.z < 0.0 && north.z > -1.0);

        let east = frame.to_enu(25.0, 55.01, 0.0);
        assert!(east.x > 1000.0 && east.x < 1020.0);
        assert!(east.y.abs() < 1.0);
    }

    #[test]
    fn test_enu_round_trip() {
        let frame = LocalFrame::new(25.0, 55.0, 3.0);
        let enu = Vector3::new(120.0, -45.0, 30.0);
        let (lat, lon, h) = frame.to_geodetic(&enu);
        let back = frame.to_enu(lat, lon, h);
        assert!((back - enu).norm() < 1e-6);
    }

    #[test]
    fn test_geodesic_distance_known_values() {
        assert_eq!(geodesic_distance_m(25.0, 55.0, 25.0, 55.0), 0.0);

        // One degree of latitude at the equator on WGS84
        let d = geodesic_distance_m(0.0, 0.0, 1.0, 0.0);
        assert!((d - 110_574.4).abs() < 1.0, "got {}", d);

        // Short hop agrees with haversine to within a fraction of a percent
        let g = geodesic_distance_m(25.0, 55.0, 25.001, 55.001);
        let h = haversine_distance_m(25.0, 55.0, 25.001, 55.001);
        assert!((g - h).abs() / h < 0.005);

        // Near-antipodal pair still resolves on the ellipsoid
        let far = geodesic_distance_m(0.0, 0.0, 0.5, 179.7);
        assert!(far > 19_900_000.0 && far < 20_010_000.0, "got {}", far);
    }

    #[test]
    fn test_margin_degrees() {
        let deg = margin_degrees(30.0);
        assert!((deg - 30.0 / 6_371_000.0 * 180.0 / std::f64::consts::PI).abs() < 1e-15);
    }
}
