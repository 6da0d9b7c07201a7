use thiserror::Error;

use hifitime::TimeScale;

use crate::{factory::ParsingError, message::NavMessageType};

/// Errors that may rise while loading, querying or converting
#[derive(Error, Debug)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// No registered decoder accepted this content
    #[error("unrecognized data source \"{0}\"")]
    UnrecognizedSource(String),
    /// A decoder accepted the content but failed to decode it entirely
    #[error("{source_name}: line {line}: {reason}")]
    Parsing {
        source_name: String,
        line: usize,
        reason: ParsingError,
    },
    #[error("query requires at least: message type, time, satellite id and system")]
    InsufficientQuery,
    #[error("transmitting satellite id also requires a system")]
    IncompleteTransmitter,
    #[error("extraneous text in query: \"{0}\"")]
    ExtraneousQueryText(String),
    #[error("invalid time description \"{0}\"")]
    InvalidTime(String),
    #[error("invalid {field} \"{token}\"")]
    InvalidQueryToken { token: String, field: &'static str },
    /// Cross system comparison without any [crate::time::converter::TimeSystemConverter]
    #[error("no time system converter installed")]
    NoTimeConverter,
    #[error("no time offset available for {from} to {to}")]
    NoTimeOffset { from: TimeScale, to: TimeScale },
    #[error("{0} time scale is not supported")]
    UnsupportedTimeScale(TimeScale),
    #[error("{0} does not describe an orbit")]
    NotOrbital(NavMessageType),
}
