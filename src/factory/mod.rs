//! Navigation data loaders and in memory record stores
use std::{
    collections::BTreeSet,
    io::{BufRead, Write},
    path::Path,
    sync::Arc,
};

use hifitime::{Epoch, TimeScale};
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use gnss::prelude::Constellation;

use crate::{
    message::{NavMessageID, NavMessageType, SatId},
    navigation::{DumpDetail, NavData, SearchOrder, SvHealthFilter, ValidityFilter},
    time::QueryTime,
    Error,
};

mod multi;
mod reader;
mod store;

pub mod rinex;
pub mod yuma;

pub use multi::MultiFormatNavDataFactory;
pub use reader::BufferedReader;
pub use store::NavDataStore;

/// Errors that may rise while decoding a data source
#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("header line too short")]
    HeaderLineTooShort,
    #[error("invalid RINEX version \"{0}\"")]
    VersionParsing(String),
    #[error("not a navigation RINEX (type \"{0}\")")]
    TypeParsing(String),
    #[error("header is not terminated")]
    MissingEndOfHeader,
    #[error("unknown constellation \"{0}\"")]
    ConstellationParsing(String),
    #[error("invalid satellite \"{0}\"")]
    SvParsing(String),
    #[error("invalid epoch \"{0}\"")]
    DatetimeParsing(String),
    #[error("invalid frame description \"{0}\"")]
    FrameParsing(String),
    #[error("failed to parse float value")]
    ParseFloatError(#[from] std::num::ParseFloatError),
    #[error("failed to parse integer value")]
    ParseIntError(#[from] std::num::ParseIntError),
    #[error("missing data field #{0}")]
    MissingField(usize),
    #[error("{0} has no time scale")]
    NoTimeScale(Constellation),
    #[error("missing \"{0}\" field")]
    MissingLabel(&'static str),
    #[error("\"{0}\" field out of range: {1}")]
    OutOfRange(&'static str, f64),
    #[error("unexpected content \"{0}\"")]
    UnexpectedContent(String),
}

/// Format a record was decoded from
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter,
)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DataFormat {
    #[strum(serialize = "RINEX2")]
    Rinex2,
    #[strum(serialize = "RINEX3")]
    Rinex3,
    #[strum(serialize = "RINEX4")]
    Rinex4,
    #[strum(serialize = "Yuma")]
    Yuma,
}

/// Search criteria handed over to every factory
#[derive(Debug, Clone, Copy)]
pub struct Search<'a> {
    /// Identifier template
    pub id: &'a NavMessageID,
    pub health: SvHealthFilter,
    pub validity: ValidityFilter,
    pub order: SearchOrder,
}

/// [NavDataSource] decodes one particular data format
pub trait NavDataSource {
    /// Format name, for logging purposes
    fn name(&self) -> &'static str;

    /// True if this content looks like our format.
    /// Only the first lines are inspected.
    fn recognize(&self, reader: &mut dyn BufRead) -> bool;

    /// Decodes the whole content, handing every record to `sink`.
    /// Returns the number of decoded records.
    fn decode(
        &self,
        source_name: &str,
        reader: &mut dyn BufRead,
        sink: &mut dyn FnMut(NavData),
    ) -> Result<usize, Error>;
}

/// [NavDataFactory] loads data sources and answers searches over
/// the records it holds.
pub trait NavDataFactory {
    fn name(&self) -> &str;

    /// Loads a file. Nothing is retained if it fails to load entirely.
    fn add_data_source(&mut self, path: &Path) -> Result<usize, Error>;

    /// Loads content from a reader. Nothing is retained if it fails to load entirely.
    fn add_reader(&mut self, name: &str, reader: &mut dyn BufRead) -> Result<usize, Error>;

    /// Best record matching these criteria, in this factory
    fn find(&self, search: &Search, when: &QueryTime) -> Result<Option<Arc<NavData>>, Error>;

    /// Best time offset record describing `from` - `to`: the record
    /// left hand side must be `from`, its right hand side `to`.
    fn time_offset(
        &self,
        from: TimeScale,
        to: TimeScale,
        when: &QueryTime,
        order: SearchOrder,
    ) -> Result<Option<Arc<NavData>>, Error>;

    /// Restricts the message types searches may return.
    /// The filter applies at search time: loaded data is always retained.
    fn set_type_filter(&mut self, filter: &BTreeSet<NavMessageType>);

    /// Satellites this factory holds data for
    fn index_set(&self, system: Option<Constellation>) -> BTreeSet<SatId>;

    /// Earliest record time stamp
    fn initial_time(&self) -> Option<Epoch>;

    /// Latest record time stamp
    fn final_time(&self) -> Option<Epoch>;

    /// Drops every record whose time stamp lies outside [from, to]
    fn edit(&mut self, from: Epoch, to: Epoch);

    /// Drops every record
    fn clear(&mut self);

    /// Describes every record
    fn dump(&self, w: &mut dyn Write, detail: DumpDetail) -> std::io::Result<()>;

    /// Number of retained records
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
