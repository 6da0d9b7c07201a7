//! Receiver to satellite geometry
use map_3d::{ecef2aer, ecef2geodetic, rad2deg, Ellipsoid};
use nalgebra::Vector3;

/// Line of sight from a receiver to a satellite
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAngles {
    /// Azimuth (degrees, clockwise from north)
    pub azimuth: f64,
    /// Elevation (degrees)
    pub elevation: f64,
    /// Slant range (m)
    pub range: f64,
    /// Receiver geodetic latitude (degrees)
    pub rx_latitude: f64,
    /// Receiver geodetic longitude (degrees)
    pub rx_longitude: f64,
}

impl LookAngles {
    /// Resolves the line of sight between two WGS84 ECEF positions (m)
    pub fn new(rx_ecef: &Vector3<f64>, sv_ecef: &Vector3<f64>) -> Self {
        let (lat, lon, alt) = ecef2geodetic(rx_ecef[0], rx_ecef[1], rx_ecef[2], Ellipsoid::WGS84);
        let (az, el, range) = ecef2aer(
            sv_ecef[0],
            sv_ecef[1],
            sv_ecef[2],
            lat,
            lon,
            alt,
            Ellipsoid::WGS84,
        );
        Self {
            azimuth: rad2deg(az).rem_euclid(360.0),
            elevation: rad2deg(el),
            range,
            rx_latitude: rad2deg(lat),
            rx_longitude: rad2deg(lon),
        }
    }
}
