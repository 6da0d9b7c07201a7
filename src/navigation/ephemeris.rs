use hifitime::{Duration, Epoch, Unit};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use gnss::prelude::{Constellation, SV};

use crate::{
    message::NavType,
    navigation::{KeplerOrbit, Xvt},
    time::seconds_of_week,
};

/// Keplerian broadcast ephemeris (GPS, QZSS, Galileo, BeiDou, IRNSS)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ephemeris {
    /// Satellite
    pub sv: SV,
    /// Message structure
    pub nav: NavType,
    /// Time of clock, in the satellite time system
    pub toc: Epoch,
    /// Clock bias (in seconds)
    pub clock_bias: f64,
    /// Clock drift (s.s⁻¹)
    pub clock_drift: f64,
    /// Clock drift rate (s.s⁻²)
    pub clock_drift_rate: f64,
    /// Orbital elements
    pub orbit: KeplerOrbit,
    /// Issue of data (ephemeris)
    pub iode: u32,
    /// Issue of data (clock)
    pub iodc: u32,
    /// Week counter, as broadcast
    pub week: u32,
    /// Raw health flags
    pub health: u32,
    /// User range accuracy (m)
    pub accuracy: f64,
    /// Fit interval (hours), when known
    pub fit_interval: Option<f64>,
    /// Galileo data sources
    pub data_sources: Option<u32>,
}

impl Ephemeris {
    /// Returns [SV] onboard clock (bias [s], drift [s/s], drift rate [s/s]).
    pub fn sv_clock(&self) -> (f64, f64, f64) {
        (self.clock_bias, self.clock_drift, self.clock_drift_rate)
    }

    /// Time of ephemeris as [Epoch], in the time system of ToC.
    /// ToE is resolved in the week closest to ToC.
    pub fn toe(&self) -> Epoch {
        let mut dt = self.orbit.toe - seconds_of_week(self.toc);
        if dt > 302400.0 {
            dt -= 604800.0;
        } else if dt < -302400.0 {
            dt += 604800.0;
        }
        self.toc + dt * Unit::Second
    }

    /// True for BeiDou geostationary satellites
    pub fn is_beidou_geo(&self) -> bool {
        self.sv.constellation == Constellation::BeiDou && (self.sv.prn <= 5 || self.sv.prn >= 59)
    }

    /// Half width of the validity interval, centered on ToE
    pub fn validity_half_width(&self) -> Duration {
        match self.sv.constellation {
            Constellation::GPS | Constellation::QZSS => match self.fit_interval {
                Some(hours) if hours > 0.0 => (hours / 2.0) * Unit::Hour,
                _ => 2.0 * Unit::Hour,
            },
            Constellation::Galileo => 3.0 * Unit::Hour,
            Constellation::BeiDou => 6.0 * Unit::Hour,
            _ => 2.0 * Unit::Hour,
        }
    }

    /// (clock bias, clock drift) at `t`, expressed in the satellite time system
    pub fn clock_at(&self, t: Epoch) -> (f64, f64) {
        let dt = (t - self.toc).to_seconds();
        (
            self.clock_bias + self.clock_drift * dt + self.clock_drift_rate * dt.powi(2),
            self.clock_drift + 2.0 * self.clock_drift_rate * dt,
        )
    }

    /// Satellite state at `t`, expressed in the satellite time system
    pub fn xvt(&self, t: Epoch) -> Xvt {
        let t_k = (t - self.toe()).to_seconds();
        let helper = self
            .orbit
            .helper(self.sv.constellation, self.is_beidou_geo(), t_k);
        let (clock_bias, clock_drift) = self.clock_at(t);
        Xvt {
            position: helper.ecef_position(),
            velocity: helper.ecef_velocity(),
            clock_bias,
            clock_drift,
            relativistic: helper.dtr,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hifitime::TimeScale;

    fn ephemeris(toc: Epoch, toe: f64) -> Ephemeris {
        Ephemeris {
            sv: SV::new(Constellation::GPS, 13),
            nav: NavType::GpsLnav,
            toc,
            clock_bias: 1.0E-4,
            clock_drift: 1.0E-11,
            clock_drift_rate: 0.0,
            orbit: KeplerOrbit {
                toe,
                sqrt_a: 5153.6,
                e: 0.005,
                ..Default::default()
            },
            iode: 0,
            iodc: 0,
            week: 1854,
            health: 0,
            accuracy: 2.0,
            fit_interval: Some(4.0),
            data_sources: None,
        }
    }

    #[test]
    fn toe_week_rollover() {
        let toc = Epoch::from_gregorian(2015, 7, 19, 0, 0, 0, 0, TimeScale::GPST);
        assert_eq!(ephemeris(toc, 0.0).toe(), toc);
        assert_eq!(ephemeris(toc, 7200.0).toe(), toc + 2.0 * Unit::Hour);
        // toe in the previous week
        assert_eq!(ephemeris(toc, 597600.0).toe(), toc - 2.0 * Unit::Hour);

        let toc = Epoch::from_gregorian(2015, 7, 25, 23, 0, 0, 0, TimeScale::GPST);
        // toe in the next week
        assert_eq!(
            ephemeris(toc, 3600.0).toe(),
            Epoch::from_gregorian(2015, 7, 26, 1, 0, 0, 0, TimeScale::GPST)
        );
    }

    #[test]
    fn clock_and_validity() {
        let toc = Epoch::from_gregorian(2015, 7, 19, 0, 0, 0, 0, TimeScale::GPST);
        let eph = ephemeris(toc, 0.0);
        let (bias, drift) = eph.clock_at(toc + 100.0 * Unit::Second);
        assert!((bias - (1.0E-4 + 1.0E-9)).abs() < 1.0E-15);
        assert_eq!(drift, 1.0E-11);
        assert_eq!(eph.validity_half_width(), 2.0 * Unit::Hour);

        let mut gal = eph.clone();
        gal.sv = SV::new(Constellation::Galileo, 1);
        assert_eq!(gal.validity_half_width(), 3.0 * Unit::Hour);
        gal.sv = SV::new(Constellation::BeiDou, 3);
        assert!(gal.is_beidou_geo());
        assert_eq!(gal.validity_half_width(), 6.0 * Unit::Hour);
    }
}
