use hifitime::{Duration, Epoch, Unit};
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use gnss::prelude::{Constellation, SV};

use crate::{
    constants::{Constants, Omega, Pz90},
    navigation::Xvt,
};

/// Maximal integration step (s)
const MAX_STEP_S: f64 = 60.0;

/// Glonass FDMA broadcast ephemeris (PZ-90 state vector)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GlonassEphemeris {
    /// Satellite
    pub sv: SV,
    /// Reference time (UTC)
    pub toe: Epoch,
    /// Clock bias, -TauN (s)
    pub clock_bias: f64,
    /// Relative frequency bias, GammaN (s.s⁻¹)
    pub clock_drift: f64,
    /// Message frame time, in seconds of UTC week
    pub message_frame_time: f64,
    /// Position (km)
    pub position: (f64, f64, f64),
    /// Velocity (km.s⁻¹)
    pub velocity: (f64, f64, f64),
    /// Luni solar acceleration (km.s⁻²)
    pub acceleration: (f64, f64, f64),
    /// Raw health (Bn)
    pub health: u32,
    /// Frequency channel
    pub channel: i8,
    /// Age of operation information (days)
    pub age: f64,
}

impl GlonassEphemeris {
    /// Half width of the validity interval, centered on the reference time
    pub fn validity_half_width(&self) -> Duration {
        15.0 * Unit::Minute
    }

    /// State vector derivative: (velocity, acceleration), PZ-90 rotating frame
    fn derivative(
        pos: &Vector3<f64>,
        vel: &Vector3<f64>,
        acc: &Vector3<f64>,
    ) -> (Vector3<f64>, Vector3<f64>) {
        let gm = Constants::gm(Constellation::Glonass);
        let omega = Omega::GLO;
        let r2 = pos.norm_squared();
        let r = r2.sqrt();
        let r3 = r2 * r;
        let r5 = r3 * r2;
        let k = 1.5 * Pz90::J2 * gm * Pz90::AE.powi(2) / r5;
        let z2_r2 = 5.0 * pos[2].powi(2) / r2;

        let ax = -gm / r3 * pos[0] - k * pos[0] * (1.0 - z2_r2)
            + omega.powi(2) * pos[0]
            + 2.0 * omega * vel[1]
            + acc[0];
        let ay = -gm / r3 * pos[1] - k * pos[1] * (1.0 - z2_r2) + omega.powi(2) * pos[1]
            - 2.0 * omega * vel[0]
            + acc[1];
        let az = -gm / r3 * pos[2] - k * pos[2] * (3.0 - z2_r2) + acc[2];

        (*vel, Vector3::new(ax, ay, az))
    }

    /// Runge Kutta (4th order) integration of the state vector over `dt` seconds
    fn integrate(&self, dt: f64) -> (Vector3<f64>, Vector3<f64>) {
        let mut pos = Vector3::new(self.position.0, self.position.1, self.position.2) * 1.0E3;
        let mut vel = Vector3::new(self.velocity.0, self.velocity.1, self.velocity.2) * 1.0E3;
        let acc =
            Vector3::new(self.acceleration.0, self.acceleration.1, self.acceleration.2) * 1.0E3;

        let steps = (dt.abs() / MAX_STEP_S).ceil().max(1.0) as usize;
        let h = dt / steps as f64;

        for _ in 0..steps {
            let (k1_p, k1_v) = Self::derivative(&pos, &vel, &acc);
            let (k2_p, k2_v) =
                Self::derivative(&(pos + k1_p * h / 2.0), &(vel + k1_v * h / 2.0), &acc);
            let (k3_p, k3_v) =
                Self::derivative(&(pos + k2_p * h / 2.0), &(vel + k2_v * h / 2.0), &acc);
            let (k4_p, k4_v) = Self::derivative(&(pos + k3_p * h), &(vel + k3_v * h), &acc);
            pos += (k1_p + k2_p * 2.0 + k3_p * 2.0 + k4_p) * h / 6.0;
            vel += (k1_v + k2_v * 2.0 + k3_v * 2.0 + k4_v) * h / 6.0;
        }
        (pos, vel)
    }

    /// Satellite state at `t` (UTC)
    pub fn xvt(&self, t: Epoch) -> Xvt {
        let dt = (t - self.toe).to_seconds();
        let (position, velocity) = self.integrate(dt);
        Xvt {
            position,
            velocity,
            clock_bias: self.clock_bias + self.clock_drift * dt,
            clock_drift: self.clock_drift,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hifitime::TimeScale;

    fn r01() -> GlonassEphemeris {
        GlonassEphemeris {
            sv: SV::new(Constellation::Glonass, 1),
            toe: Epoch::from_gregorian_utc(2015, 7, 19, 0, 15, 0, 0),
            clock_bias: 6.102025508881E-05,
            clock_drift: 0.0,
            message_frame_time: 0.0,
            position: (1.260593945312E+04, -1.001235595703E+04, 1.980017529297E+04),
            velocity: (-1.181285858154E+00, 2.303398132324E+00, 1.908569335938E+00),
            acceleration: (0.0, 0.0, -1.862645149231E-09),
            health: 0,
            channel: 1,
            age: 0.0,
        }
    }

    #[test]
    fn state_vector_integration() {
        let eph = r01();
        let at_toe = eph.xvt(eph.toe);
        assert!((at_toe.position[0] - 1.260593945312E+07).abs() < 1.0E-3);
        assert!((at_toe.velocity[1] - 2.303398132324E+03).abs() < 1.0E-6);

        let later = eph.xvt(eph.toe + 15.0 * Unit::Minute);
        let r = later.position.norm();
        // Glonass orbit radius
        assert!(r > 25.3E6 && r < 25.7E6, "radius {}", r);
        let moved = (later.position - at_toe.position).norm();
        assert!(moved > 1.0E6, "only moved {} m", moved);

        // backward integration
        let earlier = eph.xvt(eph.toe - 10.0 * Unit::Minute);
        assert!(earlier.position.norm() > 25.3E6);
        assert_eq!(eph.toe.time_scale, TimeScale::UTC);
    }
}
