//! V4 frames: EPH, STO and ION
use gnss::prelude::{Constellation, SV};

use crate::{
    factory::{
        rinex::{
            column,
            header::{time_system_pair, Header},
            parse_epoch, parse_fields, parse_sv, plausible_xmit,
            record::{ephemeris_family, parse_record},
            sow_near, week_of,
        },
        ParsingError,
    },
    message::{NavMessageID, NavMessageType, NavType, SatId},
    navigation::{Ephemeris, Isc, KbModel, KeplerOrbit, NavData, NavPayload, TimeOffset},
    time::{seconds_of_week, system_time_scale},
};

/// Parses every frame of a V4 body
pub(crate) fn parse_body(
    header: &Header,
    lines: &[String],
    start: usize,
    records: &mut Vec<NavData>,
) -> Result<(), (usize, ParsingError)> {
    let mut i = start;
    while i < lines.len() {
        if !lines[i].starts_with('>') {
            if !lines[i].trim().is_empty() {
                warn!("line {}: content outside of any frame", i + 1);
            }
            i += 1;
            continue;
        }
        let first = i;
        i += 1;
        while i < lines.len() && !lines[i].starts_with('>') {
            i += 1;
        }
        parse_frame(header, &lines[first], &lines[first + 1..i], records)
            .map_err(|e| (first, e))?;
    }
    Ok(())
}

fn parse_frame(
    header: &Header,
    description: &str,
    body: &[String],
    records: &mut Vec<NavData>,
) -> Result<(), ParsingError> {
    let items = description.split_ascii_whitespace().collect::<Vec<_>>();
    if items.len() < 2 {
        return Err(ParsingError::FrameParsing(description.to_string()));
    }
    let frame = items[1];

    if frame == "EOP" {
        debug!("skipping EOP frame");
        return Ok(());
    }
    if items.len() < 4 {
        return Err(ParsingError::FrameParsing(description.to_string()));
    }

    let sv = parse_sv(items[2])?;
    let msg = items[3];

    match frame {
        "EPH" => match nav_type(sv.constellation, msg) {
            Some(nav @ (NavType::GpsCnavL2 | NavType::GpsCnav2)) => {
                if body.is_empty() {
                    return Err(ParsingError::MissingField(0));
                }
                records.extend(parse_cnav(header, sv, nav, body)?);
                Ok(())
            },
            Some(nav) => {
                if body.is_empty() {
                    return Err(ParsingError::MissingField(0));
                }
                parse_record(header, body, Some(nav), records)
            },
            None => {
                debug!("skipping {} {} ephemeris frame", sv, msg);
                Ok(())
            },
        },
        "STO" => {
            if let Some(data) = parse_sto(header, sv, msg, body)? {
                records.push(data);
            }
            Ok(())
        },
        "ION" => {
            if let Some(data) = parse_ion(header, sv, msg, body)? {
                records.push(data);
            }
            Ok(())
        },
        _ => {
            debug!("skipping {} frame", frame);
            Ok(())
        },
    }
}

/// Message structure of an EPH frame
fn nav_type(c: Constellation, msg: &str) -> Option<NavType> {
    match (c, msg) {
        (Constellation::GPS, "LNAV") | (Constellation::QZSS, "LNAV") => Some(NavType::GpsLnav),
        (Constellation::GPS, "CNAV") | (Constellation::QZSS, "CNAV") => Some(NavType::GpsCnavL2),
        (Constellation::GPS, "CNV2") | (Constellation::QZSS, "CNV2") => Some(NavType::GpsCnav2),
        (Constellation::IRNSS, "LNAV") => Some(NavType::IrnssSps),
        (Constellation::Galileo, "INAV") => Some(NavType::GalInav),
        (Constellation::Galileo, "FNAV") => Some(NavType::GalFnav),
        (Constellation::BeiDou, "D1") => Some(NavType::BeiDouD1),
        (Constellation::BeiDou, "D2") => Some(NavType::BeiDouD2),
        (Constellation::Glonass, "FDMA") => Some(NavType::GloCivilF),
        (c, "SBAS") if c.is_sbas() => Some(NavType::SbasL1),
        _ => None,
    }
}

/// Modernized GPS/QZSS ephemeris (CNAV, CNAV-2)
fn parse_cnav(
    header: &Header,
    sv: SV,
    nav: NavType,
    body: &[String],
) -> Result<Vec<NavData>, ParsingError> {
    let line = &body[0];
    let ts = system_time_scale(sv.constellation)
        .ok_or(ParsingError::NoTimeScale(sv.constellation))?;
    let toc = parse_epoch(column(line, 4, 23), ts)?;
    let clock = parse_fields(line, 23, 3)?;
    let mut fields = Vec::with_capacity(4 * body.len());
    for line in body.iter().skip(1) {
        fields.extend(parse_fields(line, 4, 4)?);
    }
    let field = |i: usize| -> Result<f64, ParsingError> {
        fields
            .get(i)
            .copied()
            .flatten()
            .ok_or(ParsingError::MissingField(i + 3))
    };
    let clock_field =
        |i: usize| -> Result<f64, ParsingError> { clock[i].ok_or(ParsingError::MissingField(i)) };

    // toe is the time of clock in modernized messages
    let orbit = KeplerOrbit {
        toe: seconds_of_week(toc),
        a_dot: Some(field(0)?),
        crs: field(1)?,
        dn: field(2)?,
        m_0: field(3)?,
        cuc: field(4)?,
        e: field(5)?,
        cus: field(6)?,
        sqrt_a: field(7)?,
        cic: field(9)?,
        omega_0: field(10)?,
        cis: field(11)?,
        i_0: field(12)?,
        crc: field(13)?,
        omega: field(14)?,
        omega_dot: field(15)?,
        i_dot: field(16)?,
    };

    let health = field(21)? as u32;
    let eph = Ephemeris {
        sv,
        nav,
        toc,
        clock_bias: clock_field(0)?,
        clock_drift: clock_field(1)?,
        clock_drift_rate: clock_field(2)?,
        orbit,
        iode: 0,
        iodc: 0,
        week: week_of(toc),
        health,
        accuracy: field(20)?,
        fit_interval: None,
        data_sources: None,
    };

    let isc = Isc {
        constellation: sv.constellation,
        tgd: field(22)?,
        tgd2: None,
    };

    let t_tm = match nav {
        NavType::GpsCnav2 => fields.get(32).copied().flatten(),
        _ => fields.get(28).copied().flatten(),
    };
    let xmit = t_tm
        .map(|sow| sow_near(toc, sow))
        .filter(|xmit| plausible_xmit(toc, *xmit));

    Ok(ephemeris_family(eph, isc, xmit, header.format()))
}

/// System time offset frame
fn parse_sto(
    header: &Header,
    sv: SV,
    msg: &str,
    body: &[String],
) -> Result<Option<NavData>, ParsingError> {
    if body.len() < 2 {
        return Err(ParsingError::MissingField(0));
    }
    let items = body[0].split_ascii_whitespace().collect::<Vec<_>>();
    if items.len() < 7 {
        return Err(ParsingError::FrameParsing(body[0].trim().to_string()));
    }
    let code = items[6];
    let (lhs, rhs, _) = match time_system_pair(code) {
        Some(pair) => pair,
        None => {
            debug!("skipping {} {} \"{}\" time offset", sv, msg, code);
            return Ok(None);
        },
    };

    let t_ref = parse_epoch(&items[..6].join(" "), lhs)?;

    let fields = parse_fields(&body[1], 4, 4)?;
    let field = |i: usize| fields[i].ok_or(ParsingError::MissingField(i));

    let mut offset = TimeOffset::new(lhs, rhs, t_ref, (field(1)?, field(2)?, field(3)?));
    if let Some(utc_id) = items.get(7) {
        offset = offset.with_utc_id(utc_id);
    }
    if let Some(leap) = header.leap_seconds {
        offset = offset.with_leap_seconds(leap);
    }

    let sat = SatId::any_of(sv.constellation);
    let data = NavData::new(
        NavMessageID::new(NavMessageType::TimeOffset, sat).with_xmit(SatId::from(sv)),
        t_ref,
        NavPayload::TimeOffset(offset),
        header.format(),
    );
    let xmit = sow_near(t_ref, field(0)?);
    if plausible_xmit(t_ref, xmit) {
        return Ok(Some(data.with_xmit_time(xmit)));
    }
    Ok(Some(data))
}

/// Ionospheric model frame. Only Klobuchar models are supported
fn parse_ion(
    header: &Header,
    sv: SV,
    msg: &str,
    body: &[String],
) -> Result<Option<NavData>, ParsingError> {
    let klobuchar = match sv.constellation {
        Constellation::GPS | Constellation::QZSS | Constellation::IRNSS => true,
        Constellation::BeiDou => msg == "D1D2" || msg == "D1" || msg == "D2",
        _ => false,
    };
    if !klobuchar {
        debug!("skipping {} {} ionospheric model", sv, msg);
        return Ok(None);
    }
    if body.len() < 3 {
        return Err(ParsingError::MissingField(0));
    }

    let ts = system_time_scale(sv.constellation)
        .ok_or(ParsingError::NoTimeScale(sv.constellation))?;
    let t = parse_epoch(column(&body[0], 4, 23), ts)?;

    let mut values = parse_fields(&body[0], 23, 3)?;
    values.extend(parse_fields(&body[1], 4, 4)?);
    values.extend(parse_fields(&body[2], 4, 1)?);
    let value = |i: usize| values[i].ok_or(ParsingError::MissingField(i));

    let model = KbModel {
        alpha: (value(0)?, value(1)?, value(2)?, value(3)?),
        beta: (value(4)?, value(5)?, value(6)?, value(7)?),
    };

    let sat = SatId::any_of(sv.constellation);
    let id = NavMessageID::new(NavMessageType::Iono, sat).with_xmit(SatId::from(sv));
    let id = match nav_type(sv.constellation, msg) {
        Some(nav) => id.with_nav(nav),
        None => id,
    };
    Ok(Some(
        NavData::new(id, t, NavPayload::Iono(model), header.format()).with_xmit_time(t),
    ))
}
