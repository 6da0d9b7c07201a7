use std::f64::consts::PI;

use hifitime::Epoch;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{constants::Constants, message::CarrierBand, time::seconds_of_week};

/// Klobuchar model payload
#[derive(Default, Debug, Copy, Clone, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KbModel {
    /// Alpha coefficients
    /// ((sec), (sec.semi-circle⁻¹), (sec.semi-circle⁻²), (sec.semi-circle⁻³))
    pub alpha: (f64, f64, f64, f64),
    /// Beta coefficients
    /// ((sec), (sec.semi-circle⁻¹), (sec.semi-circle⁻²), (sec.semi-circle⁻³))
    pub beta: (f64, f64, f64, f64),
}

impl KbModel {
    /// Slant ionospheric delay in meters, on given carrier.
    /// - t: GPS time of the signal reception
    /// - elevation, azimuth: satellite direction (radians)
    /// - user_lat_ddeg, user_lon_ddeg: receiver geodetic coordinates (degrees)
    pub fn meters_delay(
        &self,
        t: Epoch,
        elevation: f64,
        azimuth: f64,
        user_lat_ddeg: f64,
        user_lon_ddeg: f64,
        carrier: CarrierBand,
    ) -> f64 {
        const L1_F: f64 = 1575.42E6;

        // everything is expressed in semicircles
        let e = elevation / PI;
        let phi_u = user_lat_ddeg / 180.0;
        let lambda_u = user_lon_ddeg / 180.0;

        let psi = 0.0137 / (e + 0.11) - 0.022;
        let phi_i = (phi_u + psi * azimuth.cos()).clamp(-0.416, 0.416);
        let lambda_i = lambda_u + psi * azimuth.sin() / (phi_i * PI).cos();
        let phi_m = phi_i + 0.064 * ((lambda_i - 1.617) * PI).cos();

        let t_gps = seconds_of_week(t).rem_euclid(86400.0);
        let t_s = (43.2E3 * lambda_i + t_gps).rem_euclid(86.4E3);

        let a_i = (self.alpha.0
            + self.alpha.1 * phi_m
            + self.alpha.2 * phi_m.powi(2)
            + self.alpha.3 * phi_m.powi(3))
        .max(0.0);
        let p_i = (self.beta.0
            + self.beta.1 * phi_m
            + self.beta.2 * phi_m.powi(2)
            + self.beta.3 * phi_m.powi(3))
        .max(72.0E3);

        let x_i = 2.0 * PI * (t_s - 50400.0) / p_i;
        let f = 1.0 + 16.0 * (0.53 - e).powi(3);
        let delay_s = if x_i.abs() < 1.57 {
            f * (5.0E-9 + a_i * (1.0 - x_i.powi(2) / 2.0 + x_i.powi(4) / 24.0))
        } else {
            f * 5.0E-9
        };

        delay_s * Constants::SPEED_OF_LIGHT * (L1_F / carrier.frequency()).powi(2)
    }
}
