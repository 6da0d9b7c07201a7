//! Command line tools built on top of `navlib`:
//! navigation data dumps, satellite positions, visibility
//! and time conversions. Refer to README for command line arguments.

mod cli; // command line interface
mod findmorethan12;
mod navdump;
mod time;
mod timeconvert;
mod wheresat;

extern crate gnss_rs as gnss;

#[macro_use]
extern crate log;

use std::{collections::BTreeSet, path::Path, process::ExitCode};

use env_logger::{Builder, Env, Target};
use thiserror::Error;

use navlib::prelude::{MultiFormatNavDataFactory, NavLibrary, NavMessageType};

use cli::Cli;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    StdioError(#[from] std::io::Error),
    #[error("{0}")]
    NavError(#[from] navlib::Error),
    #[error("unable to load \"{path}\": {reason}")]
    LoadError { path: String, reason: navlib::Error },
    #[error("invalid {field} \"{value}\"")]
    InvalidArgument { field: &'static str, value: String },
    #[error("no navigation data")]
    MissingData,
    #[error("no position could be computed")]
    NoSolutions,
    #[error("unable to change time systems: {0}")]
    TimeConversion(navlib::Error),
    #[error("system clock: {0}")]
    SystemClock(String),
}

impl Error {
    /// 2 for anything the user handed over (files, arguments, queries),
    /// 1 for processing failures.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::LoadError { .. } | Self::InvalidArgument { .. } | Self::MissingData => 2,
            Self::NavError(e) => match e {
                navlib::Error::InsufficientQuery
                | navlib::Error::IncompleteTransmitter
                | navlib::Error::ExtraneousQueryText(_)
                | navlib::Error::InvalidTime(_)
                | navlib::Error::InvalidQueryToken { .. } => 2,
                _ => 1,
            },
            _ => 1,
        }
    }

    pub(crate) fn invalid(field: &'static str, value: &str) -> Self {
        Self::InvalidArgument {
            field,
            value: value.to_string(),
        }
    }
}

/// Builds a [NavLibrary] restricted to these message types
/// (all of them when empty), and loads every file.
pub(crate) fn load_library<'a, I>(
    files: I,
    filter: &BTreeSet<NavMessageType>,
) -> Result<NavLibrary, Error>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut library = NavLibrary::default();
    if !filter.is_empty() {
        library.set_type_filter(filter);
    }
    library.add_factory(Box::<MultiFormatNavDataFactory>::default());
    for file in files {
        let total = library
            .add_data_source(Path::new(file))
            .map_err(|reason| Error::LoadError {
                path: file.to_string(),
                reason,
            })?;
        info!("loaded \"{}\": {} records", file, total);
    }
    Ok(library)
}

fn run(cli: &Cli) -> Result<(), Error> {
    match cli.matches.subcommand() {
        Some(("navdump", submatches)) => navdump::run(submatches),
        Some(("wheresat", submatches)) => wheresat::run(submatches),
        Some(("findmorethan12", submatches)) => findmorethan12::run(submatches),
        Some(("timeconvert", submatches)) => timeconvert::run(submatches),
        _ => Ok(()),
    }
}

pub fn main() -> ExitCode {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    builder
        .target(Target::Stderr)
        .format_timestamp_secs()
        .format_module_path(false)
        .init();

    let cli = Cli::new();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(e.exit_code())
        },
    }
}
