use std::str::FromStr;

use clap::{ArgMatches, ColorChoice, Command};
use nalgebra::Vector3;

use crate::Error;

mod findmorethan12;
mod navdump;
mod timeconvert;
mod wheresat;

pub struct Cli {
    /// Arguments passed by user
    pub matches: ArgMatches,
}

impl Default for Cli {
    fn default() -> Self {
        Self::new()
    }
}

impl Cli {
    /// Build new command line interface
    pub fn new() -> Self {
        Self {
            matches: Self::command().get_matches(),
        }
    }

    pub fn command() -> Command {
        Command::new("navtools")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Navigation data tools")
            .long_about(
                "navtools dumps and searches broadcast navigation data (RINEX, Yuma),
computes satellite positions and visibility, and converts times
between formats and GNSS time systems.",
            )
            .arg_required_else_help(true)
            .color(ColorChoice::Always)
            .subcommand(navdump::subcommand())
            .subcommand(wheresat::subcommand())
            .subcommand(findmorethan12::subcommand())
            .subcommand(timeconvert::subcommand())
    }
}

/// Parses "x y z" (or "x,y,z") ECEF coordinates, in meters
pub fn parse_3d_coordinates(desc: &str) -> Result<Vector3<f64>, Error> {
    let content = desc
        .split(|c: char| c == ',' || c.is_ascii_whitespace())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();
    if content.len() != 3 {
        return Err(Error::invalid("ECEF coordinates", desc));
    }
    let mut ecef = Vector3::zeros();
    for (i, item) in content.iter().enumerate() {
        ecef[i] = f64::from_str(item).map_err(|_| Error::invalid("ECEF coordinates", desc))?;
    }
    Ok(ecef)
}
