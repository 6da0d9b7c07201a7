//! Navigation data dumps and queries
use std::{
    collections::BTreeSet,
    io::{stdout, Write},
    str::FromStr,
};

use clap::ArgMatches;
use itertools::Itertools;
use strum::IntoEnumIterator;

use gnss::prelude::Constellation;

use navlib::prelude::{
    CarrierBand, DumpDetail, Health, NavLibrary, NavMessageType, NavType, Query, SearchOrder,
    SvHealthFilter, TrackingCode, ValidityFilter,
};

use crate::{load_library, Error};

const SYSTEMS: [Constellation; 7] = [
    Constellation::GPS,
    Constellation::Glonass,
    Constellation::Galileo,
    Constellation::BeiDou,
    Constellation::QZSS,
    Constellation::IRNSS,
    Constellation::SBAS,
];

/// Lists every name queries accept
fn enumerations(w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "navmsgtype: {}", NavMessageType::iter().join(" "))?;
    writeln!(w, "system:     {}", SYSTEMS.iter().join(" "))?;
    writeln!(w, "carrier:    {}", CarrierBand::iter().join(" "))?;
    writeln!(w, "code:       {}", TrackingCode::iter().join(" "))?;
    writeln!(w, "navtype:    {}", NavType::iter().join(" "))?;
    writeln!(w, "health:     {}", SvHealthFilter::iter().join(" "))?;
    writeln!(w, "validity:   {}", ValidityFilter::iter().join(" "))?;
    writeln!(w, "detail:     {}", DumpDetail::iter().join(" "))?;
    writeln!(w, "(record health: {})", Health::iter().join(" "))
}

fn parse_queries(matches: &ArgMatches, id: &str, strict: bool) -> Result<Vec<Query>, Error> {
    matches
        .get_many::<String>(id)
        .unwrap_or_default()
        .map(|text| Query::parse(text, strict).map_err(Error::from))
        .collect()
}

fn find(
    library: &NavLibrary,
    query: &Query,
    detail: DumpDetail,
    w: &mut dyn Write,
) -> Result<(), Error> {
    let when = query.time(library)?;
    match library.find(
        &query.id,
        &when,
        query.health,
        query.validity,
        SearchOrder::Nearest,
    )? {
        Some(record) => record.dump(w, detail)?,
        None => writeln!(w, "Not found")?,
    }
    Ok(())
}

fn xvt(library: &NavLibrary, query: &Query, w: &mut dyn Write) -> Result<(), Error> {
    match query.id.message {
        NavMessageType::Ephemeris | NavMessageType::Almanac | NavMessageType::Unknown => {
            let when = query.time(library)?;
            match library.get_xvt(
                &query.id,
                &when,
                query.health,
                query.validity,
                SearchOrder::Nearest,
            )? {
                Some(xvt) => writeln!(w, "{}", xvt)?,
                None => writeln!(w, "Not found")?,
            }
        },
        other => {
            eprintln!("Can't compute an XVT using message type \"{}\"", other);
        },
    }
    Ok(())
}

pub fn run(matches: &ArgMatches) -> Result<(), Error> {
    let mut out = stdout().lock();

    if matches.get_flag("enum") {
        enumerations(&mut out)?;
        return Ok(());
    }

    let mut filter = BTreeSet::new();
    for name in matches.get_many::<String>("type").unwrap_or_default() {
        let message = NavMessageType::from_str(name)
            .ok()
            .filter(|t| *t != NavMessageType::Unknown)
            .ok_or_else(|| Error::invalid("navigation message type", name))?;
        filter.insert(message);
    }

    let detail = matches
        .get_one::<String>("level")
        .map(|level| DumpDetail::from_str(level).map_err(|_| Error::invalid("detail level", level)))
        .transpose()?
        .unwrap_or(DumpDetail::Full);

    // queries are validated prior loading anything
    let strict = matches.get_flag("strict");
    let finds = parse_queries(matches, "find", strict)?;
    let xvts = parse_queries(matches, "xvt", strict)?;

    let library = load_library(
        matches.get_many::<String>("files").unwrap_or_default(),
        &filter,
    )?;

    for query in finds.iter() {
        info!("looking for {}", query);
        find(&library, query, detail, &mut out)?;
    }
    for query in xvts.iter() {
        info!("looking for {}", query);
        xvt(&library, query, &mut out)?;
    }
    if finds.is_empty() && xvts.is_empty() {
        library.dump(&mut out, detail)?;
    }
    Ok(())
}
