//! Satellite positions over a time span
use std::{
    collections::BTreeSet,
    io::{stdout, Write},
    str::FromStr,
};

use clap::ArgMatches;
use hifitime::{Duration, Epoch, TimeScale};
use nalgebra::Vector3;

use gnss::prelude::Constellation;

use navlib::prelude::{
    LookAngles, NavLibrary, NavMessageID, NavMessageType, NavTime, SatId, SearchOrder,
    SvHealthFilter, ValidityFilter, Xvt,
};

use crate::{
    cli::parse_3d_coordinates,
    load_library,
    time::{format_time, parse_mdy_hms, time_step},
    Error,
};

struct Options {
    sats: Vec<SatId>,
    start: Epoch,
    end: Epoch,
    step: Duration,
    rx: Option<Vector3<f64>>,
    velocity: bool,
    format: String,
    health: SvHealthFilter,
    validity: ValidityFilter,
}

fn header(opts: &Options) -> String {
    let mut header = String::from("# time, PRN, X(m), Y(m), Z(m), Clock Correction(ms)");
    if opts.rx.is_some() {
        header.push_str(", Azimuth(deg), Elevation(deg), Range(m)");
    }
    if opts.velocity {
        header.push_str(", Vx(m/s), Vy(m/s), Vz(m/s)");
    }
    header
}

fn row(opts: &Options, t: Epoch, sat: &SatId, xvt: &Xvt) -> String {
    let mut row = format!(
        "{} {:>4} {:14.3} {:14.3} {:14.3} {:10.6}",
        format_time(t, &opts.format),
        sat.to_string(),
        xvt.position[0],
        xvt.position[1],
        xvt.position[2],
        xvt.clock_correction() * 1.0E3,
    );
    if let Some(rx) = &opts.rx {
        let los = LookAngles::new(rx, &xvt.position);
        if los.elevation < 0.0 {
            row.push_str(&format!(" {:>8} {:>8} {:>15}", "-", "-", "-"));
        } else {
            row.push_str(&format!(
                " {:8.2} {:8.2} {:15.3}",
                los.azimuth, los.elevation, los.range
            ));
        }
    }
    if opts.velocity {
        row.push_str(&format!(
            " {:9.3} {:9.3} {:9.3}",
            xvt.velocity[0], xvt.velocity[1], xvt.velocity[2]
        ));
    }
    row
}

/// Positions of every selected satellite, from `start` to `end` included.
/// Returns the number of printed rows.
fn process(library: &NavLibrary, opts: &Options, w: &mut dyn Write) -> Result<usize, Error> {
    writeln!(w, "{}", header(opts))?;
    let mut rows = 0;
    let mut t = opts.start;
    while t <= opts.end {
        // time span is read in any time system
        let when = NavTime::any(t);
        for sat in opts.sats.iter() {
            let id = NavMessageID::new(NavMessageType::Ephemeris, *sat);
            match library.get_xvt(&id, &when, opts.health, opts.validity, SearchOrder::Nearest)? {
                Some(xvt) => {
                    writeln!(w, "{}", row(opts, t, sat, &xvt))?;
                    rows += 1;
                },
                None => debug!("{} {}: no state", t, sat),
            }
        }
        t += opts.step;
    }
    Ok(rows)
}

fn time_bound(
    matches: &ArgMatches,
    id: &str,
    fallback: Option<Epoch>,
) -> Result<Epoch, Error> {
    match matches.get_one::<String>(id) {
        Some(desc) => parse_mdy_hms(desc, TimeScale::GPST),
        None => fallback.ok_or(Error::MissingData),
    }
}

pub fn run(matches: &ArgMatches) -> Result<(), Error> {
    let mut sats = BTreeSet::new();
    for desc in matches.get_many::<String>("sat").unwrap_or_default() {
        let sat = SatId::from_str(desc)
            .ok()
            .filter(|sat| sat.is_concrete())
            .ok_or_else(|| Error::invalid("satellite", desc))?;
        sats.insert(sat);
    }
    for prn in matches.get_many::<u8>("prn").unwrap_or_default() {
        sats.insert(SatId::new(Constellation::GPS, *prn));
    }

    let rx = matches
        .get_one::<String>("position")
        .map(|desc| parse_3d_coordinates(desc))
        .transpose()?;

    let step = time_step(*matches.get_one::<f64>("step").unwrap_or(&900.0))?;

    let filter = BTreeSet::from([NavMessageType::Ephemeris]);
    let library = load_library(
        matches.get_many::<String>("eph").unwrap_or_default(),
        &filter,
    )?;

    if sats.is_empty() {
        sats = library.index_set(None);
    }

    let (health, validity) = if matches.get_flag("ignore-health") {
        (SvHealthFilter::Any, ValidityFilter::Any)
    } else {
        (SvHealthFilter::Healthy, ValidityFilter::ValidOnly)
    };

    let opts = Options {
        sats: sats.into_iter().collect(),
        start: time_bound(matches, "start", library.initial_time())?,
        end: time_bound(matches, "end", library.final_time())?,
        step,
        rx,
        velocity: matches.get_flag("velocity"),
        format: matches
            .get_one::<String>("format")
            .cloned()
            .unwrap_or_default(),
        health,
        validity,
    };

    let rows = process(&library, &opts, &mut stdout().lock())?;
    if rows == 0 {
        return Err(Error::NoSolutions);
    }
    Ok(())
}
