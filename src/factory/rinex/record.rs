//! V2 and V3 ephemeris records
use hifitime::{Duration, Epoch, TimeScale};

use gnss::prelude::{Constellation, SV};

use crate::{
    factory::{
        rinex::{
            column, header::Header, parse_epoch, parse_fields, parse_sv, payload_kind,
            plausible_xmit, sow_near, week_start,
        },
        DataFormat, ParsingError,
    },
    message::{NavMessageID, NavMessageType, NavType, SatId},
    navigation::{
        Ephemeris, GlonassEphemeris, Health, Isc, KeplerOrbit, NavData, NavPayload,
        SbasEphemeris,
    },
    time::system_time_scale,
};

/// Unknown transmission times are encoded this way
const UNKNOWN_XMIT: f64 = 0.9E9;

/// Parses every record of a V2 or V3 body
pub(crate) fn parse_body(
    header: &Header,
    lines: &[String],
    start: usize,
    records: &mut Vec<NavData>,
) -> Result<(), (usize, ParsingError)> {
    let indent = indent(header);
    let mut i = start;
    while i < lines.len() {
        if lines[i].trim().is_empty() {
            i += 1;
            continue;
        }
        let first = i;
        i += 1;
        while i < lines.len() && is_continuation(&lines[i], indent) {
            i += 1;
        }
        parse_record(header, &lines[first..i], None, records).map_err(|e| (first, e))?;
    }
    Ok(())
}

/// Width of the record prefix (satellite descriptor)
fn indent(header: &Header) -> usize {
    if header.version.major < 3 {
        3
    } else {
        4
    }
}

fn is_continuation(line: &str, indent: usize) -> bool {
    !line.trim().is_empty() && column(line, 0, indent).trim().is_empty()
}

/// Decoded record lines: satellite, epoch, 3 clock fields
/// and every orbit field (4 per continuation line).
struct Block {
    sv: SV,
    epoch: Epoch,
    clock: Vec<Option<f64>>,
    orbits: Vec<Option<f64>>,
}

impl Block {
    fn parse(header: &Header, lines: &[String]) -> Result<Self, ParsingError> {
        let line = &lines[0];
        let (sv, epoch, offset) = if header.version.major < 3 {
            let prn = column(line, 0, 2).trim();
            let constellation = header
                .constellation
                .ok_or_else(|| ParsingError::SvParsing(prn.to_string()))?;
            let prn = prn
                .parse::<u8>()
                .map_err(|_| ParsingError::SvParsing(prn.to_string()))?;
            (SV::new(constellation, prn), column(line, 3, 22), 22)
        } else {
            (parse_sv(column(line, 0, 3))?, column(line, 4, 23), 23)
        };

        let ts = system_time_scale(sv.constellation)
            .ok_or(ParsingError::NoTimeScale(sv.constellation))?;
        let epoch = parse_epoch(epoch, ts)?;
        let clock = parse_fields(line, offset, 3)?;

        let indent = indent(header);
        let mut orbits = Vec::with_capacity(4 * (lines.len() - 1));
        for line in lines.iter().skip(1) {
            orbits.extend(parse_fields(line, indent, 4)?);
        }
        Ok(Self {
            sv,
            epoch,
            clock,
            orbits,
        })
    }

    fn clock(&self, i: usize) -> Result<f64, ParsingError> {
        self.clock
            .get(i)
            .copied()
            .flatten()
            .ok_or(ParsingError::MissingField(i))
    }

    /// Mandatory orbit field
    fn orbit(&self, i: usize) -> Result<f64, ParsingError> {
        self.optional(i).ok_or(ParsingError::MissingField(i + 3))
    }

    fn optional(&self, i: usize) -> Option<f64> {
        self.orbits.get(i).copied().flatten()
    }
}

/// Parses one record, possibly with a known message structure (V4 frames),
/// and appends the resulting records.
pub(crate) fn parse_record(
    header: &Header,
    lines: &[String],
    nav: Option<NavType>,
    records: &mut Vec<NavData>,
) -> Result<(), ParsingError> {
    let block = Block::parse(header, lines)?;
    let format = header.format();
    let c = block.sv.constellation;

    let before = records.len();

    if c == Constellation::Glonass {
        records.push(glonass_record(&block, format)?);
    } else if c.is_sbas() {
        records.push(sbas_record(&block, format)?);
    } else {
        records.extend(kepler_records(&block, nav, format)?);
    }

    for data in &records[before..] {
        trace!(
            "{} {} {}",
            payload_kind(&data.payload),
            data.id.sat,
            data.time_stamp
        );
    }
    Ok(())
}

/// Message structure of a legacy record
fn legacy_nav_type(sv: SV, data_sources: Option<u32>) -> NavType {
    match sv.constellation {
        Constellation::Galileo => match data_sources {
            Some(sources) if sources & 0x02 != 0 => NavType::GalFnav,
            _ => NavType::GalInav,
        },
        Constellation::BeiDou if sv.prn <= 5 || sv.prn >= 59 => NavType::BeiDouD2,
        c => NavType::legacy(c),
    }
}

/// Identifier of a record broadcast by the satellite it describes
fn self_broadcast(
    message: NavMessageType,
    sv: SV,
    nav: NavType,
    freq_offset: Option<i8>,
) -> NavMessageID {
    let sat = SatId::from(sv);
    let obs = match freq_offset {
        Some(offset) => nav.signal().with_freq_offset(offset),
        None => nav.signal(),
    };
    NavMessageID::new(message, sat)
        .with_xmit(sat)
        .with_obs(obs)
        .with_nav(nav)
}

/// Ephemeris record, followed by its health and group delay records
fn kepler_records(
    block: &Block,
    nav: Option<NavType>,
    format: DataFormat,
) -> Result<Vec<NavData>, ParsingError> {
    let sv = block.sv;
    let c = sv.constellation;
    let ts = block.epoch.time_scale;

    let orbit = KeplerOrbit {
        crs: block.orbit(1)?,
        dn: block.orbit(2)?,
        m_0: block.orbit(3)?,
        cuc: block.orbit(4)?,
        e: block.orbit(5)?,
        cus: block.orbit(6)?,
        sqrt_a: block.orbit(7)?,
        toe: block.orbit(8)?,
        cic: block.orbit(9)?,
        omega_0: block.orbit(10)?,
        cis: block.orbit(11)?,
        i_0: block.orbit(12)?,
        crc: block.orbit(13)?,
        omega: block.orbit(14)?,
        omega_dot: block.orbit(15)?,
        i_dot: block.orbit(16)?,
        a_dot: None,
    };

    let data_sources = match c {
        Constellation::Galileo => block.optional(17).map(|v| v as u32),
        _ => None,
    };

    let nav = nav.unwrap_or_else(|| legacy_nav_type(sv, data_sources));

    let week = block.orbit(18)? as u32;
    let health = block.orbit(21)? as u32;

    let eph = Ephemeris {
        sv,
        nav,
        toc: block.epoch,
        clock_bias: block.clock(0)?,
        clock_drift: block.clock(1)?,
        clock_drift_rate: block.clock(2)?,
        orbit,
        iode: block.orbit(0)? as u32,
        iodc: match c {
            Constellation::GPS | Constellation::QZSS => block.optional(23).unwrap_or(0.0) as u32,
            _ => 0,
        },
        week,
        health,
        accuracy: block.optional(20).unwrap_or(0.0),
        fit_interval: match c {
            Constellation::GPS | Constellation::QZSS => block.optional(25),
            _ => None,
        },
        data_sources,
    };

    let isc = Isc {
        constellation: c,
        tgd: block.optional(22).unwrap_or(0.0),
        tgd2: match c {
            Constellation::Galileo | Constellation::BeiDou => block.optional(23),
            _ => None,
        },
    };

    let xmit = block
        .optional(24)
        .filter(|sow| sow.abs() < UNKNOWN_XMIT)
        .map(|sow| xmit_time(ts, week, sow))
        .filter(|xmit| plausible_xmit(block.epoch, *xmit));

    Ok(ephemeris_family(eph, isc, xmit, format))
}

/// Transmission time, from week counter and seconds of week
fn xmit_time(ts: TimeScale, week: u32, sow: f64) -> Epoch {
    week_start(ts, week) + Duration::from_seconds(sow)
}

/// Ephemeris record with its health and group delay records,
/// all sharing the ephemeris validity interval.
pub(crate) fn ephemeris_family(
    eph: Ephemeris,
    isc: Isc,
    xmit: Option<Epoch>,
    format: DataFormat,
) -> Vec<NavData> {
    let (sv, nav, toc, raw) = (eph.sv, eph.nav, eph.toc, eph.health);

    let with_xmit = |data: NavData| match xmit {
        Some(xmit) => data.with_xmit_time(xmit),
        None => data,
    };

    let eph = with_xmit(NavData::new(
        self_broadcast(NavMessageType::Ephemeris, sv, nav, None),
        toc,
        NavPayload::Ephemeris(eph),
        format,
    ));

    let (begin, end) = (eph.begin, eph.end);

    let health = with_xmit(NavData::new(
        self_broadcast(NavMessageType::Health, sv, nav, None),
        toc,
        NavPayload::Health {
            status: Health::from_raw(sv.constellation, raw),
            raw,
        },
        format,
    ))
    .with_validity(begin, end);

    let isc = with_xmit(NavData::new(
        self_broadcast(NavMessageType::Isc, sv, nav, None),
        toc,
        NavPayload::Isc(isc),
        format,
    ))
    .with_validity(begin, end);

    vec![eph, health, isc]
}

fn glonass_record(block: &Block, format: DataFormat) -> Result<NavData, ParsingError> {
    let channel = block.orbit(7)? as i8;
    let eph = GlonassEphemeris {
        sv: block.sv,
        toe: block.epoch,
        clock_bias: block.clock(0)?,
        clock_drift: block.clock(1)?,
        message_frame_time: block.clock(2)?,
        position: (block.orbit(0)?, block.orbit(4)?, block.orbit(8)?),
        velocity: (block.orbit(1)?, block.orbit(5)?, block.orbit(9)?),
        acceleration: (block.orbit(2)?, block.orbit(6)?, block.orbit(10)?),
        health: block.orbit(3)? as u32,
        channel,
        age: block.optional(11).unwrap_or(0.0),
    };
    Ok(NavData::new(
        self_broadcast(
            NavMessageType::Ephemeris,
            block.sv,
            NavType::GloCivilF,
            Some(channel),
        ),
        block.epoch,
        NavPayload::Glonass(eph),
        format,
    ))
}

fn sbas_record(block: &Block, format: DataFormat) -> Result<NavData, ParsingError> {
    let transmission_time = block.clock(2)?;
    let eph = SbasEphemeris {
        sv: block.sv,
        toe: block.epoch,
        clock_bias: block.clock(0)?,
        clock_drift: block.clock(1)?,
        transmission_time,
        position: (block.orbit(0)?, block.orbit(4)?, block.orbit(8)?),
        velocity: (block.orbit(1)?, block.orbit(5)?, block.orbit(9)?),
        acceleration: (block.orbit(2)?, block.orbit(6)?, block.orbit(10)?),
        health: block.orbit(3)? as u32,
        accuracy: block.optional(7).unwrap_or(0.0),
        iodn: block.optional(11).unwrap_or(0.0) as u32,
    };
    let data = NavData::new(
        self_broadcast(NavMessageType::Ephemeris, block.sv, NavType::SbasL1, None),
        block.epoch,
        NavPayload::Sbas(eph),
        format,
    );
    if transmission_time.abs() < UNKNOWN_XMIT {
        return Ok(data.with_xmit_time(sow_near(block.epoch, transmission_time)));
    }
    Ok(data)
}

#[cfg(test)]
mod test {
    use super::*;
    use hifitime::Unit;

    fn lines(content: &str) -> Vec<String> {
        content.lines().map(|l| l.to_string()).collect()
    }

    fn v3_header() -> Header {
        let lines = lines(
            "     3.04           N: GNSS NAV DATA    M: MIXED            RINEX VERSION / TYPE
                                                            END OF HEADER",
        );
        Header::parse(&lines).unwrap().0
    }

    #[test]
    fn galileo_record() {
        let content = lines(
            "E01 2021 01 01 10 10 00-1.009316532873e-03-8.153477695305e-12 0.000000000000e+00
     6.100000000000e+01-1.481250000000e+01 2.853690581322e-09 9.001103935532e-01
    -6.780028343201e-07 2.018771972507e-04 1.189112663269e-05 5.440614356995e+03
     4.278000000000e+05 5.587935447693e-09-2.179629757958e+00 5.029141902924e-08
     9.908985911272e-01 8.696875000000e+01-4.474521837329e-01-5.291649084240e-09
    -2.975123929942e-10 5.170000000000e+02 2.138000000000e+03 0.000000000000e+00
     3.120000000000e+00 0.000000000000e+00-4.656612873077e-10-5.122274160385e-09
     4.284500000000e+05",
        );
        let mut records = Vec::new();
        parse_record(&v3_header(), &content, None, &mut records).unwrap();
        assert_eq!(records.len(), 3);

        let eph = &records[0];
        assert_eq!(eph.id.message, NavMessageType::Ephemeris);
        assert_eq!(eph.id.sat, SatId::new(Constellation::Galileo, 1));
        assert_eq!(eph.source, DataFormat::Rinex3);
        assert_eq!(
            eph.time_stamp,
            Epoch::from_gregorian(2021, 1, 1, 10, 10, 0, 0, TimeScale::GST)
        );
        match &eph.payload {
            NavPayload::Ephemeris(eph) => {
                // data sources 517: I/NAV E1-B and E5b
                assert_eq!(eph.nav, NavType::GalInav);
                assert_eq!(eph.iode, 61);
                assert_eq!(eph.week, 2138);
                assert_eq!(eph.orbit.sqrt_a, 5.440614356995e+03);
                assert_eq!(eph.clock_bias, -1.009316532873e-03);
            },
            payload => panic!("unexpected payload {:?}", payload),
        }
        // toe ± 3h
        assert_eq!(eph.end - eph.begin, 6.0 * Unit::Hour);
        assert!(eph.xmit_time.is_some());

        let health = &records[1];
        assert_eq!(health.id.message, NavMessageType::Health);
        assert_eq!((health.begin, health.end), (eph.begin, eph.end));

        match &records[2].payload {
            NavPayload::Isc(isc) => {
                assert_eq!(isc.tgd, -4.656612873077e-10);
                assert_eq!(isc.tgd2, Some(-5.122274160385e-09));
            },
            payload => panic!("unexpected payload {:?}", payload),
        }
    }

    #[test]
    fn glonass_record() {
        let content = lines(
            "R07 2021 01 01 09 45 00 4.610046744347e-05 1.818989403546e-12 3.423000000000e+04
    -2.189719482422e+04 1.561344146729e+00 3.725290298462e-09 0.000000000000e+00
    -3.080000000000e+03-3.313527107239e+00 0.000000000000e+00 5.000000000000e+00
     1.363212060547e+04-1.958591461182e+00-1.862645149231e-09 0.000000000000e+00",
        );
        let mut records = Vec::new();
        parse_record(&v3_header(), &content, None, &mut records).unwrap();
        assert_eq!(records.len(), 1);
        let data = &records[0];
        assert_eq!(data.time_scale(), TimeScale::UTC);
        assert_eq!(data.id.obs.freq_offset.get(), Some(5));
        match &data.payload {
            NavPayload::Glonass(eph) => {
                assert_eq!(eph.channel, 5);
                assert_eq!(eph.position.0, -2.189719482422e+04);
                assert_eq!(eph.velocity.2, -1.958591461182e+00);
            },
            payload => panic!("unexpected payload {:?}", payload),
        }
        assert_eq!(data.end - data.begin, 30.0 * Unit::Minute);
    }

    #[test]
    fn truncated_record() {
        let content = lines(
            "G01 2021 01 01 00 00 00 4.610046744347e-05 1.818989403546e-12 0.000000000000e+00
     6.100000000000e+01-1.481250000000e+01 2.853690581322e-09 9.001103935532e-01",
        );
        let mut records = Vec::new();
        let e = parse_record(&v3_header(), &content, None, &mut records).unwrap_err();
        assert!(matches!(e, ParsingError::MissingField(7)));
        assert!(records.is_empty());
    }
}
