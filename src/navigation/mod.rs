//! Decoded navigation records
use std::io::Write;

use hifitime::{Duration, Epoch, TimeScale, Unit};
use nalgebra::Vector3;
use strum_macros::{Display, EnumIter, EnumString};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{factory::DataFormat, message::NavMessageID, time::calendar};

mod almanac;
mod ephemeris;
mod geometry;
mod glonass;
mod health;
mod iono;
mod isc;
mod kepler;
mod sbas;
mod time_offset;

pub use almanac::Almanac;
pub use ephemeris::Ephemeris;
pub use geometry::LookAngles;
pub use glonass::GlonassEphemeris;
pub use health::{Health, SvHealthFilter};
pub use iono::KbModel;
pub use isc::Isc;
pub use kepler::KeplerOrbit;
pub use sbas::SbasEphemeris;
pub use time_offset::TimeOffset;

/// Validity criterion applied when searching records
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter,
)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[strum(ascii_case_insensitive)]
pub enum ValidityFilter {
    /// Only records whose validity interval contains the search time
    #[default]
    ValidOnly,
    /// Only records whose validity interval excludes the search time
    InvalidOnly,
    Any,
}

impl ValidityFilter {
    /// True if a record of given validity satisfies this criterion
    pub fn accepts(&self, valid: bool) -> bool {
        match self {
            Self::ValidOnly => valid,
            Self::InvalidOnly => !valid,
            Self::Any => true,
        }
    }
}

/// Record selection policy
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter,
)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[strum(ascii_case_insensitive)]
pub enum SearchOrder {
    /// Most recently received record, as a real time user would
    #[default]
    User,
    /// Record closest in time, before or after
    Nearest,
}

/// Level of detail of record dumps
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter,
)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[strum(ascii_case_insensitive)]
pub enum DumpDetail {
    #[default]
    OneLine,
    Brief,
    Full,
}

/// Satellite state: position, velocity and time (clock)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Xvt {
    /// ECEF position (m)
    pub position: Vector3<f64>,
    /// ECEF velocity (m.s⁻¹)
    pub velocity: Vector3<f64>,
    /// Clock bias (s)
    pub clock_bias: f64,
    /// Clock drift (s.s⁻¹)
    pub clock_drift: f64,
    /// Relativistic correction (s)
    pub relativistic: f64,
    /// Health of the record this state was evaluated from
    pub health: Health,
}

impl Default for Xvt {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            clock_bias: 0.0,
            clock_drift: 0.0,
            relativistic: 0.0,
            health: Health::Unknown,
        }
    }
}

impl Xvt {
    /// Total clock correction (s): bias and relativistic effect
    pub fn clock_correction(&self) -> f64 {
        self.clock_bias + self.relativistic
    }
}

impl std::fmt::Display for Xvt {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "x:({:.3}, {:.3}, {:.3}) v:({:.4}, {:.4}, {:.4}) \
            clkbias:{:.6e} clkdrift:{:.6e} relcorr:{:.6e} health:{}",
            self.position[0],
            self.position[1],
            self.position[2],
            self.velocity[0],
            self.velocity[1],
            self.velocity[2],
            self.clock_bias,
            self.clock_drift,
            self.relativistic,
            self.health,
        )
    }
}

/// Decoded message content
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NavPayload {
    /// Keplerian ephemeris
    Ephemeris(Ephemeris),
    /// Glonass state vector ephemeris
    Glonass(GlonassEphemeris),
    /// SBAS state vector ephemeris
    Sbas(SbasEphemeris),
    Almanac(Almanac),
    /// Health status of the subject satellite
    Health { status: Health, raw: u32 },
    TimeOffset(TimeOffset),
    /// Klobuchar ionospheric model
    Iono(KbModel),
    Isc(Isc),
}

impl NavPayload {
    /// Default validity interval of this payload, for given time stamp
    pub fn validity(&self, time_stamp: Epoch) -> (Epoch, Epoch) {
        let (center, half) = match self {
            Self::Ephemeris(eph) => (eph.toe(), eph.validity_half_width()),
            Self::Glonass(eph) => (eph.toe, eph.validity_half_width()),
            Self::Sbas(eph) => (eph.toe, eph.validity_half_width()),
            Self::Almanac(almanac) => (almanac.toa, almanac.validity_half_width()),
            Self::TimeOffset(offset) => (offset.t_ref, 3.5 * Unit::Day),
            Self::Iono(_) => {
                let (y, m, d, _, _, _, _) = calendar(time_stamp);
                let midnight = Epoch::from_gregorian(y, m, d, 0, 0, 0, 0, time_stamp.time_scale);
                return (midnight, midnight + 1.0 * Unit::Day - 1.0 * Unit::Nanosecond);
            },
            Self::Health { .. } | Self::Isc(_) => (time_stamp, 2.0 * Unit::Hour),
        };
        (center - half, center + half)
    }
}

/// Navigation data record: a decoded message, its identifier
/// and its validity interval.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavData {
    /// Message identifier
    pub id: NavMessageID,
    /// Time of applicability (ToC, ToA or reference time),
    /// in the time system of this record
    pub time_stamp: Epoch,
    /// Transmission time, when known
    pub xmit_time: Option<Epoch>,
    /// Start of validity
    pub begin: Epoch,
    /// End of validity
    pub end: Epoch,
    pub payload: NavPayload,
    /// Provenance
    pub source: DataFormat,
}

impl NavData {
    /// Builds a new record, with the default validity of this payload
    pub fn new(
        id: NavMessageID,
        time_stamp: Epoch,
        payload: NavPayload,
        source: DataFormat,
    ) -> Self {
        let (begin, end) = payload.validity(time_stamp);
        Self {
            id,
            time_stamp,
            xmit_time: None,
            begin,
            end,
            payload,
            source,
        }
    }

    /// Copy with transmission time
    pub fn with_xmit_time(mut self, xmit_time: Epoch) -> Self {
        self.xmit_time = Some(xmit_time);
        self
    }

    /// Copy with a custom validity interval
    pub fn with_validity(mut self, begin: Epoch, end: Epoch) -> Self {
        self.begin = begin;
        self.end = end;
        self
    }

    /// Time system this record is expressed in
    pub fn time_scale(&self) -> TimeScale {
        self.time_stamp.time_scale
    }

    /// Time a real time user would have this record at hand
    pub fn user_time(&self) -> Epoch {
        self.xmit_time.unwrap_or(self.time_stamp)
    }

    /// True if `t` lies within the validity interval
    pub fn is_valid(&self, t: Epoch) -> bool {
        self.begin <= t && t <= self.end
    }

    /// Health of the subject satellite
    pub fn health(&self) -> Health {
        let c = self.id.sat.system.get();
        match &self.payload {
            NavPayload::Ephemeris(eph) => Health::from_raw(eph.sv.constellation, eph.health),
            NavPayload::Glonass(eph) => Health::from_raw(eph.sv.constellation, eph.health),
            NavPayload::Sbas(eph) => Health::from_raw(eph.sv.constellation, eph.health),
            NavPayload::Almanac(almanac) => {
                Health::from_raw(c.unwrap_or(almanac.sv.constellation), almanac.health)
            },
            NavPayload::Health { status, .. } => *status,
            _ => Health::Unknown,
        }
    }

    /// Evaluates the satellite state at `t`, `t` being expressed in the
    /// time system of this record. None for non orbital payloads.
    pub fn xvt(&self, t: Epoch) -> Option<Xvt> {
        let xvt = match &self.payload {
            NavPayload::Ephemeris(eph) => eph.xvt(t),
            NavPayload::Glonass(eph) => eph.xvt(t),
            NavPayload::Sbas(eph) => eph.xvt(t),
            NavPayload::Almanac(almanac) => almanac.xvt(t),
            _ => return None,
        };
        Some(Xvt {
            health: self.health(),
            ..xvt
        })
    }

    /// Writes a description of this record
    pub fn dump(&self, w: &mut dyn Write, detail: DumpDetail) -> std::io::Result<()> {
        match detail {
            DumpDetail::OneLine => writeln!(
                w,
                "{:<10} {:<4} {:<4} {:<11} {} {} {} {:<9} {}",
                self.id.message.to_string(),
                self.id.sat.to_string(),
                self.id.xmit.to_string(),
                self.id.nav.to_string(),
                self.time_stamp,
                self.begin,
                self.end,
                self.health().to_string(),
                self.source,
            ),
            DumpDetail::Brief | DumpDetail::Full => {
                writeln!(w, "**** {} {} ({})", self.id.message, self.id.sat, self.id.nav)?;
                writeln!(w, "  transmitter:  {}", self.id.xmit)?;
                writeln!(w, "  signal:       {}", self.id.obs)?;
                writeln!(w, "  time stamp:   {}", self.time_stamp)?;
                if let Some(xmit) = self.xmit_time {
                    writeln!(w, "  transmitted:  {}", xmit)?;
                }
                writeln!(w, "  validity:     {} .. {}", self.begin, self.end)?;
                writeln!(w, "  health:       {}", self.health())?;
                writeln!(w, "  source:       {}", self.source)?;
                self.dump_payload(w, detail)
            },
        }
    }

    fn dump_payload(&self, w: &mut dyn Write, detail: DumpDetail) -> std::io::Result<()> {
        if detail == DumpDetail::Full {
            return writeln!(w, "{:#?}", self.payload);
        }
        match &self.payload {
            NavPayload::Ephemeris(eph) => {
                writeln!(
                    w,
                    "  toe: {} IODE: {} IODC: {} week: {}",
                    eph.toe(),
                    eph.iode,
                    eph.iodc,
                    eph.week
                )?;
                writeln!(
                    w,
                    "  af0: {:e} af1: {:e} af2: {:e}",
                    eph.clock_bias, eph.clock_drift, eph.clock_drift_rate
                )?;
                writeln!(w, "  sqrt(A): {} e: {}", eph.orbit.sqrt_a, eph.orbit.e)
            },
            NavPayload::Glonass(eph) => {
                writeln!(w, "  channel: {} -TauN: {:e}", eph.channel, eph.clock_bias)?;
                writeln!(
                    w,
                    "  position (km): ({}, {}, {})",
                    eph.position.0, eph.position.1, eph.position.2
                )
            },
            NavPayload::Sbas(eph) => writeln!(
                w,
                "  position (km): ({}, {}, {}) af0: {:e}",
                eph.position.0, eph.position.1, eph.position.2, eph.clock_bias
            ),
            NavPayload::Almanac(almanac) => writeln!(
                w,
                "  toa: {} week: {} sqrt(A): {} e: {}",
                almanac.toa, almanac.week, almanac.orbit.sqrt_a, almanac.orbit.e
            ),
            NavPayload::Health { status, raw } => {
                writeln!(w, "  status: {} raw: {:#x}", status, raw)
            },
            NavPayload::TimeOffset(offset) => writeln!(
                w,
                "  {}-{} t_ref: {} a0: {:e} a1: {:e} a2: {:e}",
                offset.lhs,
                offset.rhs,
                offset.t_ref,
                offset.polynomials.0,
                offset.polynomials.1,
                offset.polynomials.2
            ),
            NavPayload::Iono(kb) => writeln!(
                w,
                "  alpha: ({:e}, {:e}, {:e}, {:e}) beta: ({:e}, {:e}, {:e}, {:e})",
                kb.alpha.0,
                kb.alpha.1,
                kb.alpha.2,
                kb.alpha.3,
                kb.beta.0,
                kb.beta.1,
                kb.beta.2,
                kb.beta.3
            ),
            NavPayload::Isc(isc) => match isc.tgd2 {
                Some(tgd2) => writeln!(w, "  tgd: {:e} tgd2: {:e}", isc.tgd, tgd2),
                None => writeln!(w, "  tgd: {:e}", isc.tgd),
            },
        }
    }
}

/// Duration between two records or query times, in absolute value
pub(crate) fn distance(a: Epoch, b: Epoch) -> Duration {
    (a - b).abs()
}
