use hifitime::{Duration, Epoch, Unit};
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use gnss::prelude::SV;

use crate::navigation::Xvt;

/// SBAS geostationary broadcast ephemeris
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SbasEphemeris {
    /// Satellite
    pub sv: SV,
    /// Reference time (GPST)
    pub toe: Epoch,
    /// Clock bias (s)
    pub clock_bias: f64,
    /// Clock drift (s.s⁻¹)
    pub clock_drift: f64,
    /// Transmission time, in seconds of GPS week
    pub transmission_time: f64,
    /// Position (km)
    pub position: (f64, f64, f64),
    /// Velocity (km.s⁻¹)
    pub velocity: (f64, f64, f64),
    /// Acceleration (km.s⁻²)
    pub acceleration: (f64, f64, f64),
    /// Raw health
    pub health: u32,
    /// User range accuracy (m)
    pub accuracy: f64,
    /// Issue of data navigation
    pub iodn: u32,
}

impl SbasEphemeris {
    /// Half width of the validity interval, centered on the reference time
    pub fn validity_half_width(&self) -> Duration {
        12.0 * Unit::Hour
    }

    /// Satellite state at `t` (GPST), second order extrapolation
    pub fn xvt(&self, t: Epoch) -> Xvt {
        let dt = (t - self.toe).to_seconds();
        let p = Vector3::new(self.position.0, self.position.1, self.position.2) * 1.0E3;
        let v = Vector3::new(self.velocity.0, self.velocity.1, self.velocity.2) * 1.0E3;
        let a = Vector3::new(self.acceleration.0, self.acceleration.1, self.acceleration.2) * 1.0E3;
        Xvt {
            position: p + v * dt + a * (0.5 * dt.powi(2)),
            velocity: v + a * dt,
            clock_bias: self.clock_bias + self.clock_drift * dt,
            clock_drift: self.clock_drift,
            ..Default::default()
        }
    }
}
