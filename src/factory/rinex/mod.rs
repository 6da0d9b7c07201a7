//! NAV RINEX (V2, V3 and V4) decoder
use std::io::BufRead;

use hifitime::{Epoch, TimeScale, Unit};

use gnss::prelude::SV;

use crate::{
    factory::{NavDataSource, ParsingError},
    navigation::{NavData, NavPayload},
    time::{calendar, seconds_of_week},
    Error,
};

mod header;
mod record;
mod v4;

use header::Header;

/// Decodes NAV RINEX files. Header ionospheric models and
/// time system corrections are turned into records as well.
#[derive(Debug, Default, Clone, Copy)]
pub struct RinexNavDecoder {}

impl NavDataSource for RinexNavDecoder {
    fn name(&self) -> &'static str {
        "RINEX NAV"
    }

    fn recognize(&self, reader: &mut dyn BufRead) -> bool {
        let mut line = String::new();
        if reader.read_line(&mut line).is_err() {
            return false;
        }
        Header::is_nav_rinex(&line)
    }

    fn decode(
        &self,
        source_name: &str,
        reader: &mut dyn BufRead,
        sink: &mut dyn FnMut(NavData),
    ) -> Result<usize, Error> {
        let lines = reader.lines().collect::<Result<Vec<_>, _>>()?;

        let located = |line: usize, reason: ParsingError| Error::Parsing {
            source_name: source_name.to_string(),
            line: line + 1,
            reason,
        };

        let (header, body) = Header::parse(&lines).map_err(|(line, e)| located(line, e))?;

        debug!(
            "{}: RINEX V{}.{:02} {}",
            source_name,
            header.version.major,
            header.version.minor,
            header
                .constellation
                .map_or("mixed".to_string(), |c| c.to_string())
        );

        let mut records = Vec::<NavData>::new();

        if header.version.major < 4 {
            record::parse_body(&header, &lines, body, &mut records)
        } else {
            v4::parse_body(&header, &lines, body, &mut records)
        }
        .map_err(|(line, e)| located(line, e))?;

        let mut total = 0;
        for data in header.records(&records) {
            sink(data);
            total += 1;
        }
        for data in records {
            sink(data);
            total += 1;
        }
        Ok(total)
    }
}

/// Parses a 19 character wide data field, `D` exponents included.
/// Blank fields are omitted fields.
pub(crate) fn parse_field(content: &str) -> Result<Option<f64>, ParsingError> {
    let content = content.trim();
    if content.is_empty() {
        return Ok(None);
    }
    let value = content.replace(['D', 'd'], "E").parse::<f64>()?;
    Ok(Some(value))
}

/// Slices `line` without panicking on short lines
pub(crate) fn column(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    if start >= end {
        return "";
    }
    line.get(start..end).unwrap_or("")
}

/// Parses `count` 19 character wide fields, starting at `offset`
pub(crate) fn parse_fields(
    line: &str,
    offset: usize,
    count: usize,
) -> Result<Vec<Option<f64>>, ParsingError> {
    (0..count)
        .map(|i| parse_field(column(line, offset + i * 19, offset + (i + 1) * 19)))
        .collect()
}

/// Parses "YYYY MM DD HH MM SS" (or "YY MM DD HH MM SS.S" in V2) in given [TimeScale]
pub(crate) fn parse_epoch(content: &str, ts: TimeScale) -> Result<Epoch, ParsingError> {
    let invalid = || ParsingError::DatetimeParsing(content.trim().to_string());
    let items = content.split_ascii_whitespace().collect::<Vec<_>>();
    if items.len() != 6 {
        return Err(invalid());
    }
    let mut y = items[0].parse::<i32>().map_err(|_| invalid())?;
    if items[0].len() < 3 {
        y += if y < 80 { 2000 } else { 1900 };
    }
    let m = items[1].parse::<u8>().map_err(|_| invalid())?;
    let d = items[2].parse::<u8>().map_err(|_| invalid())?;
    let hh = items[3].parse::<u8>().map_err(|_| invalid())?;
    let mm = items[4].parse::<u8>().map_err(|_| invalid())?;
    let ss = items[5].parse::<f64>().map_err(|_| invalid())?;
    if !(1..=12).contains(&m) || !(1..=31).contains(&d) || hh > 23 || mm > 59 {
        return Err(invalid());
    }
    if !(0.0..61.0).contains(&ss) {
        return Err(invalid());
    }
    let whole = ss.trunc();
    let ns = ((ss - whole) * 1.0E9).round().min(999_999_999.0) as u32;
    Epoch::maybe_from_gregorian(y, m, d, hh, mm, whole as u8, ns, ts).map_err(|_| invalid())
}

/// Parses a satellite descriptor ("G01", "E 5", ..)
pub(crate) fn parse_sv(content: &str) -> Result<SV, ParsingError> {
    let content = content.trim();
    if content.len() < 2 {
        return Err(ParsingError::SvParsing(content.to_string()));
    }
    content
        .parse::<SV>()
        .map_err(|_| ParsingError::SvParsing(content.to_string()))
}

/// Start of week #`week`, counted from the origin of this [TimeScale]
pub(crate) fn week_start(ts: TimeScale, week: u32) -> Epoch {
    let origin = match ts {
        TimeScale::BDT => Epoch::from_gregorian(2006, 1, 1, 0, 0, 0, 0, ts),
        _ => Epoch::from_gregorian(1980, 1, 6, 0, 0, 0, 0, ts),
    };
    origin + (week as f64) * Unit::Week
}

/// Week counter of this [Epoch], counted from the origin of its own time scale
pub(crate) fn week_of(t: Epoch) -> u32 {
    let origin = week_start(t.time_scale, 0);
    ((t - origin).to_seconds() / 604800.0).floor().max(0.0) as u32
}

/// Resolves seconds of week in the week closest to `reference`
pub(crate) fn sow_near(reference: Epoch, sow: f64) -> Epoch {
    let mut dt = sow - seconds_of_week(reference);
    if dt > 302400.0 {
        dt -= 604800.0;
    } else if dt < -302400.0 {
        dt += 604800.0;
    }
    reference + dt * Unit::Second
}

/// Midnight starting the day `t` belongs to, in its own time scale
pub(crate) fn midnight(t: Epoch) -> Epoch {
    let (y, m, d, _, _, _, _) = calendar(t);
    Epoch::from_gregorian(y, m, d, 0, 0, 0, 0, t.time_scale)
}

/// True for payloads whose transmission time is plausible
pub(crate) fn plausible_xmit(reference: Epoch, xmit: Epoch) -> bool {
    (xmit - reference).to_seconds().abs() <= 604800.0
}

/// Payload kind, for logging purposes
pub(crate) fn payload_kind(payload: &NavPayload) -> &'static str {
    match payload {
        NavPayload::Ephemeris(_) => "ephemeris",
        NavPayload::Glonass(_) => "glonass ephemeris",
        NavPayload::Sbas(_) => "sbas ephemeris",
        NavPayload::Almanac(_) => "almanac",
        NavPayload::Health { .. } => "health",
        NavPayload::TimeOffset(_) => "time offset",
        NavPayload::Iono(_) => "iono",
        NavPayload::Isc(_) => "isc",
    }
}
