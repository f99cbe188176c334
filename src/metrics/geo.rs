//! Great-circle distance on a spherical Earth.

use crate::config::EARTH_RADIUS_M;

/// Haversine distance in meters between two WGS84 positions given in degrees.
pub fn haversine_m(
    lat1: f64,
    lon1: f64,
    lat2: f64,
    lon2: f64,
) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let sin_dphi = libm::sin(d_phi / 2.0);
    let sin_dlambda = libm::sin(d_lambda / 2.0);
    let a = sin_dphi * sin_dphi + libm::cos(phi1) * libm::cos(phi2) * sin_dlambda * sin_dlambda;
    let c = 2.0 * libm::atan2(libm::sqrt(a), libm::sqrt(1.0 - a));
    EARTH_RADIUS_M * c
}

/// Meters per degree of latitude (used to build test tracks).
#[cfg(test)]
pub const METERS_PER_DEG_LAT: f64 = EARTH_RADIUS_M * core::f64::consts::PI / 180.0;

// =============================================================================
// Unit Tests
// =============================================================================
