//! Inertial → Earth-fixed → geodetic → display-space conversions.
//!
//! Display space is a unit-radius globe: +Y points to the north pole and
//! longitude -180° lies on +X, so markers line up with an equirectangular
//! texture wrapped around a standard sphere mesh.

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// WGS-84 equatorial radius, km.
pub const WGS84_A_KM: f64 = 6378.137;
/// WGS-84 polar radius, km.
pub const WGS84_B_KM: f64 = 6356.752_314_2;
/// Mean Earth radius used to scale heights into globe units.
pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// Globe radius at which zero-height markers sit, slightly above the surface mesh.
pub const SURFACE_RADIUS: f64 = 1.01;

const JULIAN_DATE_UNIX_EPOCH: f64 = 2_440_587.5;
const JULIAN_DATE_J2000: f64 = 2_451_545.0;
const DAYS_PER_JULIAN_CENTURY: f64 = 36_525.0;
const SECONDS_PER_DAY: f64 = 86_400.0;
const GEODETIC_ITERATIONS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geodetic {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub height_km: f64,
}

pub fn julian_date(instant: DateTime<Utc>) -> f64 {
    let seconds = instant.timestamp() as f64 + f64::from(instant.timestamp_subsec_nanos()) * 1e-9;
    seconds / SECONDS_PER_DAY + JULIAN_DATE_UNIX_EPOCH
}

/// Greenwich mean sidereal time (IAU-82) in radians, in `[0, 2π)`.
pub fn greenwich_sidereal_time(instant: DateTime<Utc>) -> f64 {
    let tut1 = (julian_date(instant) - JULIAN_DATE_J2000) / DAYS_PER_JULIAN_CENTURY;
    let seconds = -6.2e-6 * tut1 * tut1 * tut1
        + 0.093_104 * tut1 * tut1
        + (876_600.0 * 3600.0 + 8_640_184.812_866) * tut1
        + 67_310.548_41;
    (seconds.to_radians() / 240.0).rem_euclid(TAU)
}

/// Rotates an inertial position into the Earth-fixed frame.
pub fn eci_to_ecef(position: &Vector3<f64>, gmst: f64) -> Vector3<f64> {
    let (sin_g, cos_g) = gmst.sin_cos();
    Vector3::new(
        cos_g * position.x + sin_g * position.y,
        -sin_g * position.x + cos_g * position.y,
        position.z,
    )
}

/// Geodetic coordinates on the WGS-84 ellipsoid for an inertial position (km).
pub fn eci_to_geodetic(position: &Vector3<f64>, gmst: f64) -> Geodetic {
    ecef_to_geodetic(&eci_to_ecef(position, gmst))
}

pub fn ecef_to_geodetic(ecef: &Vector3<f64>) -> Geodetic {
    let flattening = (WGS84_A_KM - WGS84_B_KM) / WGS84_A_KM;
    let e2 = 2.0 * flattening - flattening * flattening;
    let r = ecef.x.hypot(ecef.y);

    let longitude = ecef.y.atan2(ecef.x);

    let mut latitude = ecef.z.atan2(r);
    for _ in 0..GEODETIC_ITERATIONS {
        let sin_lat = latitude.sin();
        let c = 1.0 / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        latitude = (ecef.z + WGS84_A_KM * c * e2 * sin_lat).atan2(r);
    }
    // Projection form of the height; stays finite over the poles.
    let (sin_lat, cos_lat) = latitude.sin_cos();
    let height =
        r * cos_lat + ecef.z * sin_lat - WGS84_A_KM * (1.0 - e2 * sin_lat * sin_lat).sqrt();

    Geodetic {
        latitude_deg: latitude.to_degrees(),
        longitude_deg: longitude.to_degrees(),
        height_km: height,
    }
}

/// Maps geodetic coordinates onto the display globe. Branch-free so the same
/// inputs always land on the same point.
pub fn display_position(geodetic: &Geodetic, surface_radius: f64) -> Vector3<f64> {
    let phi = (90.0 - geodetic.latitude_deg) * (PI / 180.0);
    let theta = (geodetic.longitude_deg + 180.0) * (PI / 180.0);
    let radius = surface_radius + geodetic.height_km / EARTH_RADIUS_KM;

    Vector3::new(
        radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    #[test]
    fn julian_date_of_j2000() {
        let j2000 = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert_relative_eq!(julian_date(j2000), JULIAN_DATE_J2000, epsilon = 1e-9);
    }

    #[test]
    fn sidereal_time_at_j2000() {
        let j2000 = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        // 18h 41m 50.548s
        assert_relative_eq!(
            greenwich_sidereal_time(j2000).to_degrees(),
            280.460_618_4,
            epsilon = 1e-6
        );
    }

    #[test]
    fn sidereal_time_stays_in_range() {
        let instant = Utc.with_ymd_and_hms(1987, 6, 3, 23, 59, 59).unwrap();
        let gmst = greenwich_sidereal_time(instant);
        assert!((0.0..TAU).contains(&gmst));
    }

    #[test]
    fn equatorial_point_on_x_axis_is_at_sea_level() {
        let geodetic = eci_to_geodetic(&Vector3::new(WGS84_A_KM, 0.0, 0.0), 0.0);
        assert_relative_eq!(geodetic.latitude_deg, 0.0, epsilon = 1e-9);
        assert_relative_eq!(geodetic.longitude_deg, 0.0, epsilon = 1e-9);
        assert_relative_eq!(geodetic.height_km, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn sidereal_rotation_shifts_longitude() {
        let geodetic = eci_to_geodetic(&Vector3::new(7000.0, 0.0, 0.0), PI / 2.0);
        assert_relative_eq!(geodetic.longitude_deg, -90.0, epsilon = 1e-9);
    }

    #[test]
    fn pole_height_uses_polar_radius() {
        let geodetic = eci_to_geodetic(&Vector3::new(0.0, 0.0, WGS84_B_KM + 500.0), 0.0);
        assert_relative_eq!(geodetic.latitude_deg, 90.0, epsilon = 1e-9);
        assert_relative_eq!(geodetic.height_km, 500.0, epsilon = 1e-3);
    }

    #[test]
    fn ecef_rotation_preserves_length() {
        let position = Vector3::new(4000.0, -3000.0, 2000.0);
        let rotated = eci_to_ecef(&position, 1.234);
        assert_relative_eq!(rotated.norm(), position.norm(), epsilon = 1e-9);
        assert_eq!(rotated.z, position.z);
    }

    #[test]
    fn prime_meridian_sea_level_maps_to_surface_radius() {
        let geodetic = Geodetic {
            latitude_deg: 0.0,
            longitude_deg: 0.0,
            height_km: 0.0,
        };
        let point = display_position(&geodetic, SURFACE_RADIUS);
        assert_relative_eq!(point.norm(), SURFACE_RADIUS, epsilon = 1e-12);
        assert!(point.y.abs() < 1e-12);
        assert_relative_eq!(point.x, -SURFACE_RADIUS, epsilon = 1e-12);
    }

    #[test]
    fn north_pole_maps_to_positive_y() {
        let geodetic = Geodetic {
            latitude_deg: 90.0,
            longitude_deg: 45.0,
            height_km: EARTH_RADIUS_KM,
        };
        let point = display_position(&geodetic, 1.0);
        assert_relative_eq!(point.y, 2.0, epsilon = 1e-12);
        assert!(point.x.abs() < 1e-12 && point.z.abs() < 1e-12);
    }

    #[test]
    fn display_position_is_reproducible() {
        let geodetic = Geodetic {
            latitude_deg: 53.123_456,
            longitude_deg: -12.987_654,
            height_km: 550.25,
        };
        let a = display_position(&geodetic, SURFACE_RADIUS);
        let b = display_position(&geodetic, SURFACE_RADIUS);
        assert_eq!(a, b);
    }
}
