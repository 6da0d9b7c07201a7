use hifitime::{Duration, Epoch, TimeScale};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::time::reinterpret;

/// Broadcast offset between two time systems.
/// The polynomial describes the residual of (lhs - rhs) on top of the
/// nominal difference (leap seconds and fixed GNSS offsets).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeOffset {
    /// Left hand side [TimeScale]
    pub lhs: TimeScale,
    /// Right hand side [TimeScale]
    pub rhs: TimeScale,
    /// Reference time, expressed in `lhs`
    pub t_ref: Epoch,
    /// (offset, drift, drift-rate) as (s, s.s⁻¹, s.s⁻²)
    pub polynomials: (f64, f64, f64),
    /// Integer leap seconds at the time of broadcast
    pub leap_seconds: Option<u32>,
    /// UTC realization identifier ("UTC(USNO)", ..)
    pub utc_id: Option<String>,
}

impl TimeOffset {
    /// Builds a new [TimeOffset] between `lhs` and `rhs`
    pub fn new(lhs: TimeScale, rhs: TimeScale, t_ref: Epoch, polynomials: (f64, f64, f64)) -> Self {
        Self {
            lhs,
            rhs,
            t_ref,
            polynomials,
            leap_seconds: None,
            utc_id: None,
        }
    }

    /// Copy with integer leap seconds
    pub fn with_leap_seconds(&self, leap_seconds: u32) -> Self {
        let mut s = self.clone();
        s.leap_seconds = Some(leap_seconds);
        s
    }

    /// Copy with UTC identifier
    pub fn with_utc_id(&self, utc_id: &str) -> Self {
        let mut s = self.clone();
        s.utc_id = Some(utc_id.to_string());
        s
    }

    /// Residual (lhs - rhs) in seconds, `t` being read in `lhs`
    pub fn residual_seconds(&self, t: Epoch) -> f64 {
        let t = reinterpret(t, self.lhs);
        let dt = (t - self.t_ref).to_seconds();
        let (a0, a1, a2) = self.polynomials;
        a0 + a1 * dt + a2 * dt.powi(2)
    }

    /// True if this message describes the (`from`, `to`) pair in either direction
    pub fn describes(&self, from: TimeScale, to: TimeScale) -> bool {
        (self.lhs == from && self.rhs == to) || (self.lhs == to && self.rhs == from)
    }

    /// Residual to add to the nominal conversion of a `from` reading
    /// into a `to` reading, at `t`. None if this message does not describe
    /// this pair of time systems.
    pub fn conversion_residual(
        &self,
        from: TimeScale,
        to: TimeScale,
        t: Epoch,
    ) -> Option<Duration> {
        if self.lhs == from && self.rhs == to {
            Some(Duration::from_seconds(-self.residual_seconds(t)))
        } else if self.lhs == to && self.rhs == from {
            Some(Duration::from_seconds(self.residual_seconds(t)))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn residual_polynomial() {
        let t_ref = Epoch::from_gregorian(2022, 6, 10, 0, 0, 0, 0, TimeScale::GPST);
        let gput = TimeOffset::new(
            TimeScale::GPST,
            TimeScale::UTC,
            t_ref,
            (9.313225746155E-10, 2.664535259100E-15, 0.0),
        )
        .with_leap_seconds(18)
        .with_utc_id("UTC(USNO)");

        assert_eq!(gput.leap_seconds, Some(18));
        assert_eq!(gput.residual_seconds(t_ref), 9.313225746155E-10);

        let t = t_ref + Duration::from_seconds(86400.0);
        let expected = 9.313225746155E-10 + 2.664535259100E-15 * 86400.0;
        assert!((gput.residual_seconds(t) - expected).abs() < 1.0E-18);

        let forward = gput.conversion_residual(TimeScale::GPST, TimeScale::UTC, t).unwrap();
        let backward = gput.conversion_residual(TimeScale::UTC, TimeScale::GPST, t).unwrap();
        assert_eq!(forward, -backward);
        assert!(gput.describes(TimeScale::UTC, TimeScale::GPST));
        assert!(gput.conversion_residual(TimeScale::GST, TimeScale::UTC, t).is_none());
    }
}
