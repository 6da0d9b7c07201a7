use hifitime::{Duration, Epoch, Unit};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use gnss::prelude::SV;

use crate::navigation::{KeplerOrbit, Xvt};

/// Coarse orbit and clock model, without harmonic perturbations
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Almanac {
    /// Satellite
    pub sv: SV,
    /// Time of applicability
    pub toa: Epoch,
    /// Week of applicability, full week counter
    pub week: u32,
    /// Orbital elements (toe holds the time of applicability in seconds of week)
    pub orbit: KeplerOrbit,
    /// Clock bias (s)
    pub af0: f64,
    /// Clock drift (s.s⁻¹)
    pub af1: f64,
    /// Raw health
    pub health: u32,
}

impl Almanac {
    /// Half width of the validity interval, centered on toa
    pub fn validity_half_width(&self) -> Duration {
        3.5 * Unit::Day
    }

    /// Satellite state at `t`, in the time system of toa
    pub fn xvt(&self, t: Epoch) -> Xvt {
        let t_k = (t - self.toa).to_seconds();
        let helper = self.orbit.helper(self.sv.constellation, false, t_k);
        Xvt {
            position: helper.ecef_position(),
            velocity: helper.ecef_velocity(),
            clock_bias: self.af0 + self.af1 * t_k,
            clock_drift: self.af1,
            relativistic: helper.dtr,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use gnss::prelude::Constellation;
    use hifitime::TimeScale;

    #[test]
    fn almanac_state() {
        let toa = Epoch::from_gregorian(2015, 7, 21, 13, 30, 0, 0, TimeScale::GPST);
        let almanac = Almanac {
            sv: SV::new(Constellation::GPS, 13),
            toa,
            week: 1854,
            orbit: KeplerOrbit {
                toe: 233472.0,
                sqrt_a: 5153.6,
                e: 4.6E-03,
                i_0: 0.9712,
                omega_0: -2.29,
                omega: 1.0,
                m_0: 1.02,
                omega_dot: -8.0E-09,
                ..Default::default()
            },
            af0: 1.0E-5,
            af1: 0.0,
            health: 0,
        };
        let xvt = almanac.xvt(toa + 2.0 * Unit::Hour);
        let r = xvt.position.norm();
        assert!(r > 26.3E6 && r < 26.8E6);
        assert!(xvt.velocity.norm() > 1.0E3 && xvt.velocity.norm() < 4.5E3);
        assert_eq!(xvt.clock_bias, 1.0E-5);
    }
}
