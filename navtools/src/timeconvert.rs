//! Time conversions between formats and time systems
use std::{
    collections::BTreeSet,
    io::{stdout, Write},
};

use clap::ArgMatches;
use hifitime::{Epoch, TimeScale};

use navlib::{
    prelude::{DumpDetail, NavLibrary, NavMessageType, NavTime, NavTimeSystemConverter},
    time::parse_time_scale,
};

use crate::{
    load_library,
    time::{
        format_time, now, parse_civil, parse_mjd, parse_rinex, parse_unix, parse_week_sow,
        parse_year_doy_sod, reading_offset, shift,
    },
    Error,
};

/// Input options, with their parser
const INPUTS: [(&str, fn(&str, TimeScale) -> Result<Epoch, Error>); 6] = [
    ("civil", parse_civil),
    ("rinex-file", parse_rinex),
    ("ws", parse_week_sow),
    ("mjd", parse_mjd),
    ("unixtime", parse_unix),
    ("doy", parse_year_doy_sod),
];

fn time_scale(matches: &ArgMatches, id: &str) -> Result<Option<TimeScale>, Error> {
    matches
        .get_one::<String>(id)
        .map(|desc| parse_time_scale(desc).map_err(|_| Error::invalid("time system", desc)))
        .transpose()
}

/// Converter to use: broadcast offsets when navigation files are provided
fn library(matches: &ArgMatches) -> Result<NavLibrary, Error> {
    if !matches.contains_id("nav") {
        return Ok(NavLibrary::default());
    }
    let filter = BTreeSet::from([NavMessageType::TimeOffset]);
    let mut library = load_library(
        matches.get_many::<String>("nav").unwrap_or_default(),
        &filter,
    )?;
    library.set_time_converter(Box::<NavTimeSystemConverter>::default());
    if log_enabled!(log::Level::Debug) {
        let mut dump = Vec::new();
        library.dump(&mut dump, DumpDetail::OneLine)?;
        debug!("time offsets:\n{}", String::from_utf8_lossy(&dump));
    }
    Ok(library)
}

/// Time as described by the user, or current time
fn input(matches: &ArgMatches) -> Result<Epoch, Error> {
    let source = time_scale(matches, "src-sys")?;
    for (id, parser) in INPUTS {
        if let Some(desc) = matches.get_one::<String>(id) {
            return parser(desc, source.unwrap_or(TimeScale::GPST));
        }
    }
    now()
}

fn summary(t: Epoch, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w)?;
    for (label, format) in [
        ("Month/Day/Year H:M:S", "%02m/%02d/%04Y %02H:%02M:%02S"),
        ("Modified Julian Date", "%15.9Q"),
        ("GPSweek DayOfWeek SecOfWeek", "%G %w %13.6g"),
        ("FullGPSweek SecOfWeek", "%F %13.6g"),
        ("Year DayOfYear SecondOfDay", "%Y %03j %12.6s"),
        ("Unix: Second Microsecond", "%U %6u"),
        ("Time System", "%P"),
    ] {
        writeln!(w, "{:8}{:<32}{}", "", label, format_time(t, format))?;
    }
    writeln!(w)
}

pub fn run(matches: &ArgMatches) -> Result<(), Error> {
    let library = library(matches)?;

    let mut t = input(matches)?;
    for secs in matches.get_many::<f64>("add-offset").unwrap_or_default() {
        t = shift(t, *secs)?;
    }
    for secs in matches.get_many::<f64>("sub-offset").unwrap_or_default() {
        t = shift(t, -*secs)?;
    }

    let mut out = stdout().lock();

    if let Some(target) = time_scale(matches, "tgt-sys")? {
        let converted = library
            .convert_time(&NavTime::new(t), target)
            .map_err(Error::TimeConversion)?;
        if matches.get_flag("offset") {
            let offset = reading_offset(t, converted);
            writeln!(out, "{}", offset)?;
            return Ok(());
        }
        t = converted;
    }

    match matches.get_one::<String>("format") {
        Some(format) => writeln!(out, "{}", format_time(t, format))?,
        None => summary(t, &mut out)?,
    }
    Ok(())
}
