//! NAV RINEX header
use std::{collections::BTreeMap, str::FromStr};

use hifitime::{Epoch, TimeScale, Unit};

use gnss::prelude::Constellation;

use crate::{
    factory::{
        rinex::{column, midnight, parse_field, week_start},
        DataFormat, ParsingError,
    },
    message::{NavMessageID, NavMessageType, SatId},
    navigation::{KbModel, NavData, NavPayload, TimeOffset},
    time::{reinterpret, system_time_scale},
};

/// RINEX revision
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Version {
    pub major: u8,
    pub minor: u8,
}

impl FromStr for Version {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ParsingError::VersionParsing(s.to_string());
        let (major, minor) = match s.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (s, "0"),
        };
        let major = major.trim().parse::<u8>().map_err(|_| invalid())?;
        let minor = minor.trim();
        let minor = if minor.is_empty() {
            0
        } else {
            minor.parse::<u8>().map_err(|_| invalid())?
        };
        if !(2..=4).contains(&major) {
            return Err(invalid());
        }
        Ok(Self { major, minor })
    }
}

/// Klobuchar model, possibly described in two halves
#[derive(Debug, Default, Clone, Copy)]
struct KbHalves {
    alpha: Option<(f64, f64, f64, f64)>,
    beta: Option<(f64, f64, f64, f64)>,
}

/// Header fields the decoder makes use of
#[derive(Debug, Default, Clone)]
pub(crate) struct Header {
    pub version: Version,
    /// None in mixed files
    pub constellation: Option<Constellation>,
    kb_models: BTreeMap<Constellation, KbHalves>,
    /// Time system corrections, with the system that broadcast them
    offsets: Vec<(Constellation, TimeOffset)>,
    pub leap_seconds: Option<u32>,
}

impl Header {
    /// True if this first line describes a navigation RINEX
    pub fn is_nav_rinex(line: &str) -> bool {
        if !line.contains("RINEX VERSION / TYPE") {
            return false;
        }
        if Version::from_str(column(line, 0, 9)).is_err() {
            return false;
        }
        matches!(column(line, 20, 21), "N" | "G" | "H")
    }

    /// Parses the header, returns it with the index of the first body line.
    /// Errors are returned with the index of the faulty line.
    pub fn parse(lines: &[String]) -> Result<(Self, usize), (usize, ParsingError)> {
        let mut header = Self::default();

        for (index, line) in lines.iter().enumerate() {
            let label = column(line, 60, line.len()).trim();
            let located = |e: ParsingError| (index, e);

            if index == 0 {
                if label != "RINEX VERSION / TYPE" {
                    return Err((index, ParsingError::HeaderLineTooShort));
                }
                header.parse_version_type(line).map_err(located)?;
                continue;
            }

            match label {
                "END OF HEADER" => return Ok((header, index + 1)),
                "ION ALPHA" | "ION BETA" => {
                    let values = parse_kb_params(line, 2).map_err(located)?;
                    let halves = header.kb_models.entry(Constellation::GPS).or_default();
                    if label == "ION ALPHA" {
                        halves.alpha = Some(values);
                    } else {
                        halves.beta = Some(values);
                    }
                },
                "IONOSPHERIC CORR" => {
                    let kind = column(line, 0, 4);
                    let constellation = match &kind[..kind.len().min(3)] {
                        "GPS" => Some(Constellation::GPS),
                        "QZS" => Some(Constellation::QZSS),
                        "BDS" => Some(Constellation::BeiDou),
                        "IRN" => Some(Constellation::IRNSS),
                        _ => None,
                    };
                    match constellation {
                        Some(c) => {
                            let values = parse_kb_params(line, 5).map_err(located)?;
                            let halves = header.kb_models.entry(c).or_default();
                            if kind.ends_with('A') {
                                halves.alpha = Some(values);
                            } else {
                                halves.beta = Some(values);
                            }
                        },
                        None => debug!("skipping \"{}\" ionospheric model", kind.trim()),
                    }
                },
                "DELTA-UTC: A0,A1,T,W" => {
                    let a0 = required(column(line, 3, 22), 0).map_err(located)?;
                    let a1 = required(column(line, 22, 41), 1).map_err(located)?;
                    let t = required(column(line, 41, 50), 2).map_err(located)?;
                    let w = required(column(line, 50, 59), 3).map_err(located)?;
                    let t_ref = week_start(TimeScale::GPST, w as u32) + t * Unit::Second;
                    let offset =
                        TimeOffset::new(TimeScale::GPST, TimeScale::UTC, t_ref, (a0, a1, 0.0));
                    header.offsets.push((Constellation::GPS, offset));
                },
                "TIME SYSTEM CORR" => {
                    let code = column(line, 0, 4).trim();
                    match time_system_pair(code) {
                        Some((lhs, rhs, constellation)) => {
                            let a0 = required(column(line, 5, 22), 0).map_err(located)?;
                            let a1 = required(column(line, 22, 38), 1).map_err(located)?;
                            let t = required(column(line, 38, 45), 2).map_err(located)?;
                            let w = required(column(line, 45, 50), 3).map_err(located)?;
                            let week_ts = if lhs == TimeScale::BDT {
                                TimeScale::BDT
                            } else {
                                TimeScale::GPST
                            };
                            let t_ref = reinterpret(
                                week_start(week_ts, w as u32) + t * Unit::Second,
                                lhs,
                            );
                            let mut offset = TimeOffset::new(lhs, rhs, t_ref, (a0, a1, 0.0));
                            let utc_id = column(line, 51, 56).trim();
                            if !utc_id.is_empty() {
                                offset = offset.with_utc_id(utc_id);
                            }
                            header.offsets.push((constellation, offset));
                        },
                        None => debug!("skipping \"{}\" time system correction", code),
                    }
                },
                "CORR TO SYSTEM TIME" | "D-UTC A0,A1,T,W,S,U" => {
                    debug!("skipping \"{}\": no distinct time scale pair", label);
                },
                "LEAP SECONDS" => {
                    let leap = column(line, 0, 6)
                        .trim()
                        .parse::<u32>()
                        .map_err(|e| located(e.into()))?;
                    header.leap_seconds = Some(leap);
                },
                _ => {},
            }
        }
        Err((lines.len().saturating_sub(1), ParsingError::MissingEndOfHeader))
    }

    fn parse_version_type(&mut self, line: &str) -> Result<(), ParsingError> {
        if line.len() < 60 {
            return Err(ParsingError::HeaderLineTooShort);
        }
        self.version = Version::from_str(column(line, 0, 9))?;

        let rinex_type = column(line, 20, 21);
        let system = column(line, 40, 41).trim();

        self.constellation = match (self.version.major, rinex_type) {
            (2, "N") => Some(Constellation::GPS),
            (2, "G") => Some(Constellation::Glonass),
            (2, "H") => Some(Constellation::SBAS),
            (_, "N") | (_, "G") => match system {
                "" | "M" => None,
                system => Some(
                    Constellation::from_str(system)
                        .map_err(|_| ParsingError::ConstellationParsing(system.to_string()))?,
                ),
            },
            (_, other) => return Err(ParsingError::TypeParsing(other.to_string())),
        };

        // V3 Glonass only files may use the V2 "G" type
        if self.version.major > 2 && rinex_type == "G" {
            self.constellation = Some(Constellation::Glonass);
        }
        Ok(())
    }

    pub fn format(&self) -> DataFormat {
        match self.version.major {
            2 => DataFormat::Rinex2,
            3 => DataFormat::Rinex3,
            _ => DataFormat::Rinex4,
        }
    }

    /// Records described by this header.
    /// Ionospheric models cover every day spanned by the body `records`.
    pub fn records(&self, records: &[NavData]) -> Vec<NavData> {
        let format = self.format();
        let mut ret = Vec::new();

        for (constellation, offset) in self.offsets.iter() {
            let sat = SatId::any_of(*constellation);
            let offset = match self.leap_seconds {
                Some(leap) => offset.with_leap_seconds(leap),
                None => offset.clone(),
            };
            ret.push(NavData::new(
                NavMessageID::new(NavMessageType::TimeOffset, sat).with_xmit(sat),
                offset.t_ref,
                NavPayload::TimeOffset(offset),
                format,
            ));
        }

        let span = records
            .iter()
            .map(|data| data.time_stamp)
            .fold(None, |span: Option<(Epoch, Epoch)>, t| match span {
                None => Some((t, t)),
                Some((first, last)) => Some((first.min(t), last.max(t))),
            });

        for (constellation, halves) in self.kb_models.iter() {
            let (alpha, beta) = match (halves.alpha, halves.beta) {
                (Some(alpha), Some(beta)) => (alpha, beta),
                _ => {
                    warn!("incomplete {} ionospheric model", constellation);
                    continue;
                },
            };
            let (first, last) = match span {
                Some(span) => span,
                None => {
                    debug!("{} ionospheric model: no time reference", constellation);
                    continue;
                },
            };
            let ts = system_time_scale(*constellation).unwrap_or(TimeScale::GPST);
            let begin = midnight(first.to_time_scale(ts));
            let end = midnight(last.to_time_scale(ts)) + 1.0 * Unit::Day - 1.0 * Unit::Nanosecond;
            let sat = SatId::any_of(*constellation);
            ret.push(
                NavData::new(
                    NavMessageID::new(NavMessageType::Iono, sat).with_xmit(sat),
                    begin,
                    NavPayload::Iono(KbModel { alpha, beta }),
                    format,
                )
                .with_validity(begin, end),
            );
        }
        ret
    }
}

/// Parses 4 Klobuchar parameters, 12 characters wide
fn parse_kb_params(line: &str, offset: usize) -> Result<(f64, f64, f64, f64), ParsingError> {
    let mut values = [0.0_f64; 4];
    for (i, value) in values.iter_mut().enumerate() {
        let start = offset + i * 12;
        *value = required(column(line, start, start + 12), i)?;
    }
    Ok((values[0], values[1], values[2], values[3]))
}

fn required(content: &str, index: usize) -> Result<f64, ParsingError> {
    parse_field(content)?.ok_or(ParsingError::MissingField(index))
}

/// (lhs, rhs) time scales of a time system correction code,
/// with the constellation that broadcasts it. Glonass time is
/// modelled as UTC, SBAS and IRNSS time as GPST: their
/// corrections to these systems have no distinct pair.
pub(crate) fn time_system_pair(code: &str) -> Option<(TimeScale, TimeScale, Constellation)> {
    match code {
        "GPUT" => Some((TimeScale::GPST, TimeScale::UTC, Constellation::GPS)),
        "GAUT" => Some((TimeScale::GST, TimeScale::UTC, Constellation::Galileo)),
        "GAGP" => Some((TimeScale::GST, TimeScale::GPST, Constellation::Galileo)),
        "GPGA" => Some((TimeScale::GPST, TimeScale::GST, Constellation::GPS)),
        "BDUT" => Some((TimeScale::BDT, TimeScale::UTC, Constellation::BeiDou)),
        "QZGP" => Some((TimeScale::QZSST, TimeScale::GPST, Constellation::QZSS)),
        "QZUT" => Some((TimeScale::QZSST, TimeScale::UTC, Constellation::QZSS)),
        "GLGP" => Some((TimeScale::UTC, TimeScale::GPST, Constellation::Glonass)),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn header(lines: &[&str]) -> Result<(Header, usize), (usize, ParsingError)> {
        let lines = lines.iter().map(|l| l.to_string()).collect::<Vec<_>>();
        Header::parse(&lines)
    }

    #[test]
    fn version_parsing() {
        for (desc, expected) in [
            ("2.11", Version { major: 2, minor: 11 }),
            ("     3.04", Version { major: 3, minor: 4 }),
            ("4.00", Version { major: 4, minor: 0 }),
        ] {
            assert_eq!(Version::from_str(desc).unwrap(), expected);
        }
        assert!(Version::from_str("1.0").is_err());
        assert!(Version::from_str("x.yy").is_err());
    }

    #[test]
    fn v2_header() {
        let (header, body) = header(&[
            "     2.11           N: GPS NAV DATA                         RINEX VERSION / TYPE",
            "    0.1676D-07  0.2235D-07 -0.1192D-06 -0.1192D-06          ION ALPHA",
            "    0.1208D+06  0.1310D+06 -0.1310D+06 -0.1966D+06          ION BETA",
            "   -0.186264514923D-08-0.266453525910D-14   233472     1854 DELTA-UTC: A0,A1,T,W",
            "    17                                                      LEAP SECONDS",
            "                                                            END OF HEADER",
        ])
        .unwrap();
        assert_eq!(body, 6);
        assert_eq!(header.version, Version { major: 2, minor: 11 });
        assert_eq!(header.constellation, Some(Constellation::GPS));
        assert_eq!(header.leap_seconds, Some(17));
        assert_eq!(header.format(), DataFormat::Rinex2);

        // iono needs a time reference
        let records = header.records(&[]);
        assert_eq!(records.len(), 1);
        match &records[0].payload {
            NavPayload::TimeOffset(offset) => {
                assert_eq!(offset.lhs, TimeScale::GPST);
                assert_eq!(offset.rhs, TimeScale::UTC);
                assert_eq!(offset.leap_seconds, Some(17));
                assert_eq!(
                    offset.t_ref,
                    Epoch::from_gregorian(2015, 7, 21, 16, 51, 12, 0, TimeScale::GPST)
                );
                assert_eq!(offset.polynomials.0, -0.186264514923E-08);
            },
            payload => panic!("unexpected payload {:?}", payload),
        }
    }

    #[test]
    fn v3_header() {
        let (header, _) = header(&[
            "     3.04           N: GNSS NAV DATA    M: MIXED            RINEX VERSION / TYPE",
            "GPSA   1.1176E-08 -1.4901E-08 -5.9605E-08  1.1921E-07       IONOSPHERIC CORR",
            "GPSB   1.1264E+05 -1.1469E+05 -1.3107E+05  1.9661E+06       IONOSPHERIC CORR",
            "GAL    2.9250E+01  3.9062E-03  6.5613E-03  0.0000E+00       IONOSPHERIC CORR",
            "GPUT -3.7252902985E-09-1.065814104E-14 319488 2124          TIME SYSTEM CORR",
            "GAUT  0.0000000000E+00 0.000000000E+00 345600 2124          TIME SYSTEM CORR",
            "GLUT  1.8626451492E-09 0.000000000E+00      0    0          TIME SYSTEM CORR",
            "    18    18  2185     7                                    LEAP SECONDS",
            "                                                            END OF HEADER",
        ])
        .unwrap();
        assert_eq!(header.version, Version { major: 3, minor: 4 });
        assert_eq!(header.constellation, None);
        assert_eq!(header.leap_seconds, Some(18));
        assert_eq!(header.offsets.len(), 2);
        assert!(header.kb_models.contains_key(&Constellation::GPS));
        assert_eq!(header.kb_models.len(), 1);
    }

    #[test]
    fn invalid_headers() {
        let (line, _) = header(&[
            "     3.04           O: OBSERVATION DATA M: MIXED            RINEX VERSION / TYPE",
            "                                                            END OF HEADER",
        ])
        .unwrap_err();
        assert_eq!(line, 0);

        let (line, e) = header(&[
            "     3.04           N: GNSS NAV DATA    M: MIXED            RINEX VERSION / TYPE",
            "    1x                                                      LEAP SECONDS",
        ])
        .unwrap_err();
        assert_eq!(line, 1);
        assert!(matches!(e, ParsingError::ParseIntError(_)));

        let (_, e) = header(&[
            "     3.04           N: GNSS NAV DATA    M: MIXED            RINEX VERSION / TYPE",
        ])
        .unwrap_err();
        assert!(matches!(e, ParsingError::MissingEndOfHeader));
    }

    #[test]
    fn recognition() {
        assert!(Header::is_nav_rinex(
            "     2.11           N: GPS NAV DATA                         RINEX VERSION / TYPE"
        ));
        assert!(Header::is_nav_rinex(
            "     4.00           NAVIGATION DATA     M                   RINEX VERSION / TYPE"
        ));
        assert!(!Header::is_nav_rinex(
            "     3.04           O: OBSERVATION DATA M: MIXED            RINEX VERSION / TYPE"
        ));
        assert!(!Header::is_nav_rinex("******** Week 829 almanac for PRN-01 ********"));
    }
}
