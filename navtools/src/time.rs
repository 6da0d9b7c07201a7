//! Time descriptions read and printed by the tools
use std::{ops::RangeInclusive, str::FromStr};

use hifitime::{Duration, Epoch, TimeScale, Unit};

use navlib::time::{calendar, from_year_doy, reading, reinterpret, year_doy_sod};

use crate::Error;

/// Years the tools read and print (four digits)
const YEARS: RangeInclusive<i32> = 1000..=9999;

/// Origin of GPS weeks, as a reading
fn gps_origin() -> Epoch {
    Epoch::from_gregorian_tai_at_midnight(1980, 1, 6)
}

/// Origin of unix time, as a reading
fn unix_origin() -> Epoch {
    Epoch::from_gregorian_tai_at_midnight(1970, 1, 1)
}

/// Difference (s) between the readings of two [Epoch]s,
/// each read in its own time scale
pub fn reading_offset(from: Epoch, to: Epoch) -> f64 {
    (reading(to) - reading(from)).to_seconds()
}

fn numbers<const N: usize>(desc: &str, field: &'static str) -> Result<[f64; N], Error> {
    let items = desc
        .split(|c: char| c.is_ascii_whitespace() || c == ':' || c == '/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();
    if items.len() != N {
        return Err(Error::invalid(field, desc));
    }
    let mut values = [0.0_f64; N];
    for (value, item) in values.iter_mut().zip(items.iter()) {
        *value = f64::from_str(item).map_err(|_| Error::invalid(field, desc))?;
        if !value.is_finite() {
            return Err(Error::invalid(field, desc));
        }
    }
    Ok(values)
}

/// Whole number within `range`
fn whole<T: TryFrom<i64>>(
    value: f64,
    range: RangeInclusive<i64>,
    desc: &str,
) -> Result<T, Error> {
    let (min, max) = (*range.start() as f64, *range.end() as f64);
    if value.fract() != 0.0 || !(min..=max).contains(&value) {
        return Err(Error::invalid("time", desc));
    }
    T::try_from(value as i64).map_err(|_| Error::invalid("time", desc))
}

fn year(value: f64, desc: &str) -> Result<i32, Error> {
    whole(value, *YEARS.start() as i64..=*YEARS.end() as i64, desc)
}

/// Seconds, within what the supported years span
fn seconds(value: f64, desc: &str) -> Result<Duration, Error> {
    if !value.is_finite() || value.abs() > 1.0E12 {
        return Err(Error::invalid("time", desc));
    }
    Ok(value * Unit::Second)
}

/// [Epoch] with this reading in given time scale, if its year is supported
fn from_reading(reading: Epoch, ts: TimeScale, desc: &str) -> Result<Epoch, Error> {
    if !YEARS.contains(&calendar(reading).0) {
        return Err(Error::invalid("time", desc));
    }
    Ok(reinterpret(reading, ts))
}

fn civil(ymd: [f64; 3], hms: [f64; 3], ts: TimeScale, desc: &str) -> Result<Epoch, Error> {
    let [y, m, d] = ymd;
    let [hh, mm, ss] = hms;
    let y = year(y, desc)?;
    let m = whole::<u8>(m, 1..=12, desc)?;
    let d = whole::<u8>(d, 1..=31, desc)?;
    if !(0.0..24.0).contains(&hh) || !(0.0..60.0).contains(&mm) || !(0.0..61.0).contains(&ss) {
        return Err(Error::invalid("time", desc));
    }
    let day = Epoch::maybe_from_gregorian(y, m, d, 0, 0, 0, 0, TimeScale::TAI)
        .map_err(|_| Error::invalid("time", desc))?;
    let sod = hh * 3600.0 + mm * 60.0 + ss;
    from_reading(day + sod * Unit::Second, ts, desc)
}

/// "MM/DD/YYYY HH:MM:SS"
pub fn parse_mdy_hms(desc: &str, ts: TimeScale) -> Result<Epoch, Error> {
    let [m, d, y, hh, mm, ss] = numbers::<6>(desc, "time")?;
    civil([y, m, d], [hh, mm, ss], ts, desc)
}

/// "MONTH DAY YEAR HH:MM:SS"
pub fn parse_civil(desc: &str, ts: TimeScale) -> Result<Epoch, Error> {
    parse_mdy_hms(desc, ts)
}

/// "YY MM DD HH MM SS", as found in RINEX files
pub fn parse_rinex(desc: &str, ts: TimeScale) -> Result<Epoch, Error> {
    let [yy, m, d, hh, mm, ss] = numbers::<6>(desc, "time")?;
    let y = if (0.0..80.0).contains(&yy) {
        2000.0 + yy
    } else if (80.0..100.0).contains(&yy) {
        1900.0 + yy
    } else {
        yy
    };
    civil([y, m, d], [hh, mm, ss], ts, desc)
}

/// "YEAR DOY SOD"
pub fn parse_year_doy_sod(desc: &str, ts: TimeScale) -> Result<Epoch, Error> {
    let [y, doy, sod] = numbers::<3>(desc, "time")?;
    let y = year(y, desc)?;
    let doy = whole::<u16>(doy, 1..=366, desc)?;
    if !(0.0..86401.0).contains(&sod) {
        return Err(Error::invalid("time", desc));
    }
    let t = from_year_doy(y, doy, sod, TimeScale::TAI)
        .ok_or_else(|| Error::invalid("time", desc))?;
    from_reading(t, ts, desc)
}

/// "FULLWEEK SOW"
pub fn parse_week_sow(desc: &str, ts: TimeScale) -> Result<Epoch, Error> {
    let [week, sow] = numbers::<2>(desc, "time")?;
    // week 417,000 is past year 9999
    let week = whole::<u32>(week, 0..=417_000, desc)?;
    if !(0.0..604800.0).contains(&sow) {
        return Err(Error::invalid("time", desc));
    }
    let nanos = (sow * 1.0E9).round() as u64;
    let t = Epoch::from_time_of_week(week, nanos, TimeScale::GPST);
    from_reading(reading(t), ts, desc)
}

/// Modified julian date
pub fn parse_mjd(desc: &str, ts: TimeScale) -> Result<Epoch, Error> {
    let [mjd] = numbers::<1>(desc, "time")?;
    // MJD 3,000,000 is past year 9999
    if mjd.abs() > 3.0E6 {
        return Err(Error::invalid("time", desc));
    }
    from_reading(Epoch::from_mjd_tai(mjd), ts, desc)
}

/// "SECONDS MICROSECONDS" since 1970-01-01
pub fn parse_unix(desc: &str, ts: TimeScale) -> Result<Epoch, Error> {
    let [secs, micros] = numbers::<2>(desc, "time")?;
    let elapsed = seconds(secs, desc)? + seconds(micros * 1.0E-6, desc)?;
    from_reading(unix_origin() + elapsed, ts, desc)
}

/// Shifts this [Epoch] by `secs`, within supported years
pub fn shift(t: Epoch, secs: f64) -> Result<Epoch, Error> {
    let desc = secs.to_string();
    let shifted = t + seconds(secs, &desc)?;
    if !YEARS.contains(&calendar(shifted).0) {
        return Err(Error::invalid("time", &desc));
    }
    Ok(shifted)
}

/// Time increment of a scan: at least one nanosecond
pub fn time_step(step: f64) -> Result<Duration, Error> {
    let invalid = || Error::invalid("time increment", &step.to_string());
    let increment = seconds(step, &step.to_string()).map_err(|_| invalid())?;
    if increment > Duration::ZERO {
        Ok(increment)
    } else {
        Err(invalid())
    }
}

/// Time system as printed by the tools
fn time_system(ts: TimeScale) -> &'static str {
    match ts {
        TimeScale::GPST => "GPS",
        TimeScale::GST => "GAL",
        TimeScale::BDT => "BDT",
        TimeScale::QZSST => "QZS",
        TimeScale::UTC => "UTC",
        TimeScale::TAI => "TAI",
        TimeScale::TT => "TT",
        TimeScale::TDB => "TDB",
        _ => "ET",
    }
}

/// Every field a format may print, for one [Epoch]
struct Fields {
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: f64,
    doy: u16,
    sod: f64,
    week: i64,
    dow: i64,
    sow: f64,
    mjd: f64,
    unix: f64,
    system: &'static str,
}

impl Fields {
    fn new(epoch: Epoch) -> Self {
        let reading = reading(epoch);
        let (y, m, d, hh, mm, ss, ns) = reading.to_gregorian_tai();
        let (_, doy, sod) = year_doy_sod(epoch);
        let gps = reading - gps_origin();
        let week = gps.to_unit(Unit::Week).floor();
        let sow = (gps - week * Unit::Week).to_seconds();
        Self {
            year: y,
            month: m,
            day: d,
            hour: hh,
            minute: mm,
            second: ss as f64 + ns as f64 * 1.0E-9,
            doy,
            sod,
            week: week as i64,
            dow: (sow / 86400.0).floor() as i64,
            sow,
            mjd: reading.to_mjd_tai_days(),
            unix: (reading - unix_origin()).to_seconds(),
            system: time_system(epoch.time_scale),
        }
    }
}

enum Value {
    Int(i64),
    Float(f64),
    Text(&'static str),
}

/// printf like conversion specification: flags, width and precision
#[derive(Default)]
struct Spec {
    zero: bool,
    width: usize,
    precision: Option<usize>,
}

impl Spec {
    fn render(&self, value: Value) -> String {
        let width = self.width;
        match value {
            Value::Int(v) if self.zero => format!("{:0width$}", v),
            Value::Int(v) => format!("{:width$}", v),
            Value::Float(v) => {
                let precision = self.precision.unwrap_or(6);
                if self.zero {
                    format!("{:0width$.precision$}", v)
                } else {
                    format!("{:width$.precision$}", v)
                }
            },
            Value::Text(v) => format!("{:>width$}", v),
        }
    }
}

/// Prints an [Epoch] with `%` tokens:
/// - %Y %y: year (4 and 2 digits), %m: month, %d: day of month
/// - %H %M: hours and minutes, %S %f: integer and decimal seconds
/// - %j: day of year, %s: seconds of day
/// - %F %G: full and 10 bit GPS week, %w: day of week, %g: seconds of week
/// - %Q: modified julian date
/// - %U %u: unix seconds and microseconds
/// - %P: time system
///
/// Flags, width and precision follow printf ("%02m", "%04.1f").
/// Unknown tokens are printed as is.
pub fn format_time(epoch: Epoch, format: &str) -> String {
    let fields = Fields::new(epoch);
    let mut output = String::with_capacity(format.len() * 2);
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            output.push(c);
            continue;
        }

        let mut spec = Spec::default();
        let mut raw = String::from("%");

        while let Some(&flag) = chars.peek() {
            match flag {
                '0' if spec.width == 0 && !spec.zero => spec.zero = true,
                ' ' | '-' | '+' => {},
                _ => break,
            }
            raw.push(flag);
            chars.next();
        }
        while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
            spec.width = spec.width * 10 + digit as usize;
            raw.push(chars.next().unwrap_or_default());
        }
        if chars.peek() == Some(&'.') {
            raw.push('.');
            chars.next();
            let mut precision = 0;
            while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
                precision = precision * 10 + digit as usize;
                raw.push(chars.next().unwrap_or_default());
            }
            spec.precision = Some(precision);
        }

        let Some(token) = chars.next() else {
            output.push_str(&raw);
            break;
        };

        let value = match token {
            'Y' => Value::Int(fields.year as i64),
            'y' => Value::Int(fields.year.rem_euclid(100) as i64),
            'm' => Value::Int(fields.month as i64),
            'd' => Value::Int(fields.day as i64),
            'H' => Value::Int(fields.hour as i64),
            'M' => Value::Int(fields.minute as i64),
            'S' => Value::Int(fields.second.floor() as i64),
            'f' => Value::Float(fields.second),
            'j' => Value::Int(fields.doy as i64),
            's' => Value::Float(fields.sod),
            'F' => Value::Int(fields.week),
            'G' => Value::Int(fields.week.rem_euclid(1024)),
            'w' => Value::Int(fields.dow),
            'g' => Value::Float(fields.sow),
            'Q' => Value::Float(fields.mjd),
            'U' => Value::Int(fields.unix.floor() as i64),
            'u' => Value::Int(((fields.unix - fields.unix.floor()) * 1.0E6).round() as i64),
            'P' => Value::Text(fields.system),
            '%' => {
                output.push('%');
                continue;
            },
            other => {
                output.push_str(&raw);
                output.push(other);
                continue;
            },
        };
        output.push_str(&spec.render(value));
    }
    output
}

/// Reading of the current system time, in UTC
pub fn now() -> Result<Epoch, Error> {
    let now = Epoch::now().map_err(|e| Error::SystemClock(e.to_string()))?;
    Ok(now.to_time_scale(TimeScale::UTC))
}

#[cfg(test)]
mod test {
    use super::*;

    fn gpst(y: i32, m: u8, d: u8, hh: u8, mm: u8, ss: u8) -> Epoch {
        Epoch::from_gregorian(y, m, d, hh, mm, ss, 0, TimeScale::GPST)
    }

    #[test]
    fn input_descriptions() {
        let expected = gpst(1985, 5, 6, 13, 50, 2);
        for (parser, desc) in [
            (parse_civil as fn(&str, TimeScale) -> Result<Epoch, Error>, "5 6 1985 13:50:02"),
            (parse_mdy_hms, "05/06/1985 13:50:02"),
            (parse_rinex, "85 05 06 13 50 02"),
            (parse_year_doy_sod, "1985 126 49802"),
            (parse_week_sow, "278 136202"),
            (parse_unix, "484235402 0"),
        ] {
            let t = parser(desc, TimeScale::GPST).unwrap();
            assert_eq!(t, expected, "{}", desc);
        }

        let t = parse_mjd("46191.5", TimeScale::GPST).unwrap();
        assert_eq!(t, gpst(1985, 5, 6, 12, 0, 0));

        for desc in ["", "1985 126", "1985 400 0", "x 1 2"] {
            assert!(parse_year_doy_sod(desc, TimeScale::GPST).is_err(), "{}", desc);
        }
        for desc in ["", "13 40 1985 00:00:00", "x 6 1985 13:50:02", "5 6 1985"] {
            assert!(parse_civil(desc, TimeScale::GPST).is_err(), "{}", desc);
        }
    }

    #[test]
    fn out_of_range_descriptions() {
        for (parser, desc) in [
            (parse_civil as fn(&str, TimeScale) -> Result<Epoch, Error>, "2 31 2021 00:00:00"),
            (parse_mdy_hms, "01/01/99999999 00:00:00"),
            (parse_mdy_hms, "01/01/2015 23:75:00"),
            (parse_mdy_hms, "01/01/2015 NaN:00:00"),
            (parse_rinex, "21 02 29 00 00 00"),
            (parse_year_doy_sod, "2015 366 0"),
            (parse_year_doy_sod, "2015.5 1 0"),
            (parse_week_sow, "99999999999 0"),
            (parse_week_sow, "1854.5 0"),
            (parse_mjd, "1e15"),
            (parse_mjd, "inf"),
            (parse_unix, "1e300 0"),
            (parse_unix, "0 NaN"),
        ] {
            assert!(parser(desc, TimeScale::GPST).is_err(), "{}", desc);
        }

        let t = gpst(1985, 5, 6, 13, 50, 2);
        assert!(shift(t, 1.0E300).is_err());
        assert!(shift(t, f64::NAN).is_err());
        assert_eq!(shift(t, -86400.0).unwrap(), gpst(1985, 5, 5, 13, 50, 2));
    }

    #[test]
    fn time_steps() {
        for step in [0.0, -1.0, 1.0E-12, f64::NAN, f64::INFINITY] {
            assert!(time_step(step).is_err(), "{}", step);
        }
        assert_eq!(time_step(900.0).unwrap(), 900.0 * Unit::Second);
        assert!(time_step(1.0E-6).unwrap() > Duration::ZERO);
    }

    #[test]
    fn formats() {
        let t = gpst(1985, 5, 6, 13, 50, 2);
        for (format, expected) in [
            ("%02m/%02d/%04Y %02H:%02M:%02S", "05/06/1985 13:50:02"),
            ("%02m/%02d/%04Y %02H:%02M:%04.1f", "05/06/1985 13:50:02.0"),
            ("%04Y %03j %05.0s", "1985 126 49802"),
            ("%F %w %.1g", "278 1 136202.0"),
            ("%G", "278"),
            ("%15.9Q", "46191.576412037"),
            ("%U %u", "484235402 0"),
            ("%y %P", "85 GPS"),
            ("100%%", "100%"),
            ("%k", "%k"),
        ] {
            assert_eq!(format_time(t, format), expected, "{}", format);
        }

        let t = Epoch::from_gregorian(2021, 2, 10, 0, 0, 0, 0, TimeScale::GPST);
        assert_eq!(format_time(t, "%F %G"), "2144 96");
    }

    #[test]
    fn readings() {
        let gps = gpst(2021, 1, 1, 0, 0, 18);
        let utc = Epoch::from_gregorian_utc(2020, 12, 31, 23, 59, 59, 0);
        assert_eq!(reading_offset(gps, utc), -19.0);
        assert_eq!(reading_offset(utc, gps), 19.0);
    }
}
