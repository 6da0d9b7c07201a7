//! Time representation and time system conversions
use std::{cell::RefCell, str::FromStr};

use hifitime::{Duration, Epoch, TimeScale, Unit};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use gnss::prelude::Constellation;

use crate::{message::Wild, Error};

pub mod converter;

use converter::{TimeOffsetSource, TimeSystemConverter};

/// Calendar decomposition (y, m, d, hh, mm, ss, ns)
pub type Calendar = (i32, u8, u8, u8, u8, u8, u32);

/// Point in time used in queries. The time system may be a wildcard:
/// the calendar reading is then interpreted in the time system of
/// whatever it is compared to, without any conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavTime {
    /// Calendar reading, expressed in [Epoch::time_scale]
    pub epoch: Epoch,
    /// Time system, [Wild::Any] to compare against any system
    pub system: Wild<TimeScale>,
}

impl From<Epoch> for NavTime {
    fn from(epoch: Epoch) -> Self {
        Self::new(epoch)
    }
}

impl NavTime {
    /// [NavTime] bound to the time system of this [Epoch]
    pub fn new(epoch: Epoch) -> Self {
        Self {
            epoch,
            system: Wild::Is(epoch.time_scale),
        }
    }

    /// [NavTime] which is not bound to any time system
    pub fn any(epoch: Epoch) -> Self {
        Self {
            epoch,
            system: Wild::Any,
        }
    }

    /// Same calendar reading, released from its time system
    pub fn as_any(&self) -> Self {
        Self::any(self.epoch)
    }

    /// Expresses [Self] in desired [TimeScale].
    /// A wildcard time system is reinterpreted, a concrete one is converted:
    /// nominally by hifitime, then corrected by the residual offset the
    /// [TimeSystemConverter] returns. Without converter, only identical
    /// time systems may be compared.
    pub fn convert(
        &self,
        ts: TimeScale,
        converter: Option<&dyn TimeSystemConverter>,
        source: &dyn TimeOffsetSource,
    ) -> Result<Epoch, Error> {
        match self.system {
            Wild::Any => Ok(reinterpret(self.epoch, ts)),
            Wild::Is(from) if from == ts => Ok(self.epoch.to_time_scale(ts)),
            Wild::Is(from) => {
                let converter = converter.ok_or(Error::NoTimeConverter)?;
                let residual = converter.offset(source, from, ts, self)?;
                Ok(self.epoch.to_time_scale(ts) + residual)
            },
        }
    }
}

/// Query time, resolved in the time system of every record it is
/// compared to. Conversions are cached for the duration of one search.
pub struct QueryTime<'a> {
    when: NavTime,
    converter: Option<&'a dyn TimeSystemConverter>,
    source: &'a dyn TimeOffsetSource,
    cache: RefCell<Vec<(TimeScale, Epoch)>>,
}

impl<'a> QueryTime<'a> {
    pub fn new(
        when: NavTime,
        converter: Option<&'a dyn TimeSystemConverter>,
        source: &'a dyn TimeOffsetSource,
    ) -> Self {
        Self {
            when,
            converter,
            source,
            cache: RefCell::new(Vec::with_capacity(4)),
        }
    }

    /// Query time, as requested
    pub fn when(&self) -> &NavTime {
        &self.when
    }

    /// Query time expressed in given [TimeScale]
    pub fn at(&self, ts: TimeScale) -> Result<Epoch, Error> {
        if let Some((_, t)) = self.cache.borrow().iter().find(|(cached, _)| *cached == ts) {
            return Ok(*t);
        }
        let t = self.when.convert(ts, self.converter, self.source)?;
        self.cache.borrow_mut().push((ts, t));
        Ok(t)
    }
}

impl std::fmt::Display for NavTime {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.system {
            Wild::Is(_) => write!(f, "{}", self.epoch),
            Wild::Any => {
                let (y, doy, sod) = year_doy_sod(self.epoch);
                write!(f, "{:04}/{:03}/{} ANY", y, doy, format_sod(sod))
            },
        }
    }
}

impl FromStr for NavTime {
    type Err = Error;
    /// Parses "Y/DOY/H:M:S[.frac]", read in the wildcard time system,
    /// or "Y/DOY/H:M:S[.frac]/SYS", read in SYS.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let items = s.split('/').collect::<Vec<_>>();
        match items.len() {
            3 => {
                let epoch = parse_ydoy_hms(items[0], items[1], items[2], TimeScale::GPST)
                    .ok_or_else(|| Error::InvalidTime(s.to_string()))?;
                Ok(Self::any(epoch))
            },
            4 => {
                let ts = parse_time_scale(items[3])?;
                let epoch = parse_ydoy_hms(items[0], items[1], items[2], ts)
                    .ok_or_else(|| Error::InvalidTime(s.to_string()))?;
                Ok(Self::new(epoch))
            },
            _ => Err(Error::InvalidTime(s.to_string())),
        }
    }
}

fn parse_ydoy_hms(y: &str, doy: &str, hms: &str, ts: TimeScale) -> Option<Epoch> {
    let y = y.trim().parse::<i32>().ok()?;
    let doy = doy.trim().parse::<u16>().ok()?;
    let items = hms.trim().split(':').collect::<Vec<_>>();
    if items.len() != 3 {
        return None;
    }
    let hh = items[0].parse::<u8>().ok()?;
    let mm = items[1].parse::<u8>().ok()?;
    let ss = items[2].parse::<f64>().ok()?;
    if !(1..=366).contains(&doy) || hh > 23 || mm > 59 || !(0.0..61.0).contains(&ss) {
        return None;
    }
    let sod = hh as f64 * 3600.0 + mm as f64 * 60.0 + ss;
    from_year_doy(y, doy, sod, ts)
}

/// [Epoch] that reads `year`, day of year and seconds of day in given [TimeScale].
/// Seconds of day may exceed one day. None when this day does not exist.
pub fn from_year_doy(year: i32, doy: u16, sod: f64, ts: TimeScale) -> Option<Epoch> {
    if doy == 0 || !sod.is_finite() || sod.abs() > 1.0E9 {
        return None;
    }
    let jan1 = Epoch::maybe_from_gregorian(year, 1, 1, 0, 0, 0, 0, TimeScale::TAI).ok()?;
    let day = jan1 + (doy - 1) as f64 * Unit::Day;
    if calendar(day).0 != year {
        return None;
    }
    Some(reinterpret(day + sod * Unit::Second, ts))
}

/// Nominal (reading in `ts`) minus (reading in TAI), for time scales
/// that do not depend on leap seconds.
fn tai_reading_offset(ts: TimeScale) -> Duration {
    match ts {
        TimeScale::GPST | TimeScale::GST | TimeScale::QZSST => -19.0 * Unit::Second,
        TimeScale::BDT => -33.0 * Unit::Second,
        // TDB and ET differ from TT by less than 2 ms
        TimeScale::TT | TimeScale::ET | TimeScale::TDB => 32.184 * Unit::Second,
        _ => Duration::ZERO,
    }
}

/// Decomposes [Epoch] into its calendar reading, in its own time scale.
pub fn calendar(epoch: Epoch) -> Calendar {
    match epoch.time_scale {
        TimeScale::UTC => epoch.to_gregorian_utc(),
        ts => {
            let tai = epoch.to_time_scale(TimeScale::TAI);
            (tai + tai_reading_offset(ts)).to_gregorian_tai()
        },
    }
}

/// Same calendar reading, expressed in another [TimeScale]. No conversion.
pub fn reinterpret(epoch: Epoch, ts: TimeScale) -> Epoch {
    if epoch.time_scale == ts {
        return epoch;
    }
    let (y, m, d, hh, mm, ss, ns) = calendar(epoch);
    // 23:59:60 reads as the next midnight
    let (ss, leap) = if ss > 59 {
        (59, 1.0 * Unit::Second)
    } else {
        (ss, Duration::ZERO)
    };
    Epoch::from_gregorian(y, m, d, hh, mm, ss, ns, ts) + leap
}

/// TAI [Epoch] with the calendar reading of this [Epoch] in its own time scale.
/// Readings compare and subtract without leap seconds.
pub fn reading(epoch: Epoch) -> Epoch {
    reinterpret(epoch, TimeScale::TAI)
}

/// (year, day of year, seconds of day) reading of this [Epoch]
pub fn year_doy_sod(epoch: Epoch) -> (i32, u16, f64) {
    let reading = reading(epoch);
    let (y, _, _, hh, mm, ss, ns) = reading.to_gregorian_tai();
    let sod = hh as f64 * 3600.0 + mm as f64 * 60.0 + ss as f64 + ns as f64 * 1.0E-9;
    // whole days elapsed since january 1st
    let doy = (reading.day_of_year() - sod / 86400.0).round() as u16 + 1;
    (y, doy, sod)
}

/// Formats seconds of day as HH:MM:SS[.fff]
pub fn format_sod(sod: f64) -> String {
    let whole = sod.floor();
    let frac = sod - whole;
    let whole = whole as u32;
    let (hh, mm, ss) = (whole / 3600, (whole % 3600) / 60, whole % 60);
    if frac > 1.0E-9 {
        format!("{:02}:{:02}:{:02}.{:03}", hh, mm, ss, ((frac * 1.0E3).round() as u32).min(999))
    } else {
        format!("{:02}:{:02}:{:02}", hh, mm, ss)
    }
}

/// Parses a time system, either in hifitime notation ("GPST", "BDT", ..)
/// or with a GNSS system name ("GPS", "GAL", "BDS", "GLO", "QZS")
pub fn parse_time_scale(s: &str) -> Result<TimeScale, Error> {
    let s = s.trim();
    if let Ok(ts) = TimeScale::from_str(&s.to_uppercase()) {
        return Ok(ts);
    }
    match s.to_uppercase().as_str() {
        "GPS" | "G" | "IRN" | "IRNSS" | "SBAS" => Ok(TimeScale::GPST),
        "GAL" | "E" | "GALILEO" => Ok(TimeScale::GST),
        "BDS" | "C" | "BEIDOU" => Ok(TimeScale::BDT),
        "QZS" | "J" | "QZSS" => Ok(TimeScale::QZSST),
        "GLO" | "R" | "GLONASS" => Ok(TimeScale::UTC),
        _ => Err(Error::InvalidQueryToken {
            token: s.to_string(),
            field: "time system",
        }),
    }
}

/// Time system broadcast records of this [Constellation] are expressed in.
/// Glonass is expressed in UTC, SBAS and IRNSS are aligned to GPST.
pub fn system_time_scale(c: Constellation) -> Option<TimeScale> {
    match c {
        Constellation::GPS | Constellation::IRNSS => Some(TimeScale::GPST),
        Constellation::QZSS => Some(TimeScale::QZSST),
        Constellation::Galileo => Some(TimeScale::GST),
        Constellation::BeiDou => Some(TimeScale::BDT),
        Constellation::Glonass => Some(TimeScale::UTC),
        c if c.is_sbas() => Some(TimeScale::GPST),
        _ => None,
    }
}

/// Seconds of (GNSS) week of this [Epoch], in its own time scale.
/// All GNSS weeks start on sunday midnight, like GPS weeks.
pub fn seconds_of_week(epoch: Epoch) -> f64 {
    let (_, nanos) = reinterpret(epoch, TimeScale::GPST).to_time_of_week();
    nanos as f64 * 1.0E-9
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn calendar_readings() {
        let t = Epoch::from_gregorian(2015, 7, 19, 0, 15, 0, 0, TimeScale::GPST);
        assert_eq!(calendar(t), (2015, 7, 19, 0, 15, 0, 0));

        let t = Epoch::from_gregorian(2020, 2, 29, 23, 59, 59, 500_000_000, TimeScale::BDT);
        assert_eq!(calendar(t), (2020, 2, 29, 23, 59, 59, 500_000_000));

        let t = Epoch::from_gregorian_utc(2017, 1, 1, 12, 0, 0, 0);
        assert_eq!(calendar(t), (2017, 1, 1, 12, 0, 0, 0));
    }

    #[test]
    fn reinterpretation() {
        let gpst = Epoch::from_gregorian(2015, 7, 19, 0, 0, 0, 0, TimeScale::GPST);
        let utc = reinterpret(gpst, TimeScale::UTC);
        assert_eq!(utc, Epoch::from_gregorian_utc(2015, 7, 19, 0, 0, 0, 0));
        assert_eq!(calendar(utc), calendar(gpst));
        // converting (not reinterpreting) applies leap seconds
        assert_ne!(gpst.to_time_scale(TimeScale::UTC), utc);
    }

    #[test]
    fn year_doy() {
        for (t, doy) in [
            (Epoch::from_gregorian(2015, 7, 19, 0, 0, 0, 0, TimeScale::GPST), 200),
            (Epoch::from_gregorian(2016, 12, 31, 23, 59, 59, 0, TimeScale::BDT), 366),
            (Epoch::from_gregorian_utc(2015, 1, 1, 0, 0, 0, 0), 1),
        ] {
            assert_eq!(year_doy_sod(t).1, doy, "{}", t);
        }

        let t = from_year_doy(2015, 200, 900.5, TimeScale::GPST).unwrap();
        assert_eq!(
            t,
            Epoch::from_gregorian(2015, 7, 19, 0, 15, 0, 500_000_000, TimeScale::GPST)
        );
        let (y, doy, sod) = year_doy_sod(t);
        assert_eq!((y, doy), (2015, 200));
        assert!((sod - 900.5).abs() < 1.0E-6);
        assert_eq!(format_sod(sod), "00:15:00.500");
        assert_eq!(format_sod(3600.0), "01:00:00");

        assert!(from_year_doy(2015, 366, 0.0, TimeScale::GPST).is_none());
        assert!(from_year_doy(2016, 366, 0.0, TimeScale::GPST).is_some());
        assert!(from_year_doy(2015, 0, 0.0, TimeScale::GPST).is_none());
        assert!(from_year_doy(i32::MAX, 1, 0.0, TimeScale::GPST).is_none());
        assert!(from_year_doy(2015, 1, f64::NAN, TimeScale::GPST).is_none());
    }

    #[test]
    fn nav_time_parsing() {
        let t = NavTime::from_str("2015/200/00:15:00").unwrap();
        assert_eq!(t.system, Wild::Any);
        assert_eq!(calendar(t.epoch), (2015, 7, 19, 0, 15, 0, 0));

        let t = NavTime::from_str("2015/200/00:15:00.25/GPS").unwrap();
        assert_eq!(t.system, Wild::Is(TimeScale::GPST));
        assert_eq!(
            t.epoch,
            Epoch::from_gregorian(2015, 7, 19, 0, 15, 0, 250_000_000, TimeScale::GPST)
        );

        let t = NavTime::from_str("2015/200/12:00:00/UTC").unwrap();
        assert_eq!(t.system, Wild::Is(TimeScale::UTC));

        for invalid in [
            "2015/200",
            "2015/400/00:00:00",
            "2015/366/00:00:00",
            "2015/200/25:00:00",
            "2015/200/00:00",
            "Y/DOY/00:00:00",
            "2015/200/00:00:00/XYZ",
        ] {
            assert!(NavTime::from_str(invalid).is_err(), "\"{}\" parsed", invalid);
        }
    }

    #[test]
    fn time_scale_parsing() {
        for (desc, expected) in [
            ("GPST", TimeScale::GPST),
            ("gps", TimeScale::GPST),
            ("GAL", TimeScale::GST),
            ("GST", TimeScale::GST),
            ("BDS", TimeScale::BDT),
            ("BDT", TimeScale::BDT),
            ("UTC", TimeScale::UTC),
            ("GLO", TimeScale::UTC),
            ("QZS", TimeScale::QZSST),
            ("TAI", TimeScale::TAI),
        ] {
            assert_eq!(parse_time_scale(desc).unwrap(), expected);
        }
        assert!(parse_time_scale("XYZ").is_err());
    }

    #[test]
    fn leap_second_readings() {
        // readings survive leap seconds
        let t = from_year_doy(2017, 1, 86400.0 + 60.0, TimeScale::UTC).unwrap();
        assert_eq!(calendar(t), (2017, 1, 2, 0, 1, 0, 0));

        let gpst = Epoch::from_gregorian(2017, 1, 1, 0, 0, 0, 0, TimeScale::GPST);
        let utc = Epoch::from_gregorian_utc(2016, 12, 31, 23, 59, 59, 0);
        assert_eq!((reading(gpst) - reading(utc)).to_seconds(), 1.0);
    }

    #[test]
    fn week_seconds() {
        // 2015-07-19 is a sunday
        let t = Epoch::from_gregorian(2015, 7, 19, 0, 15, 0, 0, TimeScale::GPST);
        assert_eq!(seconds_of_week(t), 900.0);
        let t = Epoch::from_gregorian(2015, 7, 22, 12, 0, 0, 0, TimeScale::BDT);
        assert_eq!(seconds_of_week(t), 3.5 * 86400.0);
    }
}
