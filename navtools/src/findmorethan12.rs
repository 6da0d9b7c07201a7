//! Epochs with more than 12 GPS satellites in view
use std::{
    collections::BTreeSet,
    io::{stdout, Write},
};

use clap::ArgMatches;
use hifitime::{Duration, Epoch, TimeScale};
use nalgebra::Vector3;

use gnss::prelude::Constellation;

use navlib::prelude::{
    LookAngles, NavLibrary, NavMessageID, NavMessageType, NavTime, SatId, SearchOrder,
    SvHealthFilter, ValidityFilter,
};

use crate::{
    cli::parse_3d_coordinates,
    load_library,
    time::{format_time, parse_year_doy_sod, time_step},
    Error,
};

const TIME_FORMAT: &str = "%02m/%02d/%04Y %02H:%02M:%02S";

/// More satellites than this are reported
const MAX_SATS: usize = 12;

/// Line of sight to every GPS satellite with a state at `t`
fn visible(
    library: &NavLibrary,
    rx: &Vector3<f64>,
    t: Epoch,
) -> Result<Vec<(u8, LookAngles)>, Error> {
    let when = NavTime::any(t);
    let mut sats = Vec::with_capacity(32);
    for prn in 1..=32 {
        let id = NavMessageID::new(
            NavMessageType::Ephemeris,
            SatId::new(Constellation::GPS, prn),
        );
        let xvt = library.get_xvt(
            &id,
            &when,
            SvHealthFilter::Any,
            ValidityFilter::ValidOnly,
            SearchOrder::Nearest,
        )?;
        if let Some(xvt) = xvt {
            sats.push((prn, LookAngles::new(rx, &xvt.position)));
        }
    }
    Ok(sats)
}

/// Scans [start, end) and reports every crowded epoch.
/// Returns the number of such epochs.
fn process(
    library: &NavLibrary,
    rx: &Vector3<f64>,
    mask: f64,
    (start, end, step): (Epoch, Epoch, Duration),
    w: &mut dyn Write,
) -> Result<usize, Error> {
    writeln!(
        w,
        "Start Time: {} End Time: {}",
        format_time(start, TIME_FORMAT),
        format_time(end, TIME_FORMAT)
    )?;
    let mut crowded = 0;
    let mut t = start;
    while t < end {
        let sats = visible(library, rx, t)?;
        let count = sats.iter().filter(|(_, los)| los.elevation > mask).count();
        if count > MAX_SATS {
            crowded += 1;
            let time = format_time(t, TIME_FORMAT);
            writeln!(w, "Found {} SVs above {} degrees at {}", count, mask, time)?;
            for (prn, los) in sats.iter().filter(|(_, los)| los.elevation > 0.0) {
                writeln!(
                    w,
                    "{}  PRN {:2} : elev: {:.2}  azim: {:.2} degrees",
                    time, prn, los.elevation, los.azimuth
                )?;
            }
        }
        t += step;
    }
    writeln!(
        w,
        "{} epoch(s) with more than {} SVs above {} degrees",
        crowded, MAX_SATS, mask
    )?;
    Ok(crowded)
}

fn time_bound(
    matches: &ArgMatches,
    id: &str,
    fallback: Option<Epoch>,
) -> Result<Epoch, Error> {
    match matches.get_one::<String>(id) {
        Some(desc) => parse_year_doy_sod(desc, TimeScale::GPST),
        None => fallback.ok_or(Error::MissingData),
    }
}

pub fn run(matches: &ArgMatches) -> Result<(), Error> {
    let desc = matches
        .get_one::<String>("position")
        .ok_or_else(|| Error::invalid("position", ""))?;
    let rx = parse_3d_coordinates(desc)?;

    let mask = *matches.get_one::<f64>("min-elev").unwrap_or(&0.0);
    if !(0.0..=90.0).contains(&mask) {
        return Err(Error::invalid("elevation mask", &mask.to_string()));
    }
    let step = time_step(*matches.get_one::<f64>("step").unwrap_or(&10.0))?;

    let filter = BTreeSet::from([NavMessageType::Ephemeris]);
    let library = load_library(
        matches.get_many::<String>("eph").unwrap_or_default(),
        &filter,
    )?;

    let start = time_bound(matches, "start", library.initial_time())?;
    let end = time_bound(matches, "end", library.final_time())?;

    process(&library, &rx, mask, (start, end, step), &mut stdout().lock())?;
    Ok(())
}
