#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::type_complexity)]

/*
 * navlib: broadcast navigation data, typed queries and time system conversions.
 * This framework is shipped under both Apache-2.0 and MIT License.
 */

extern crate gnss_rs as gnss;

#[macro_use]
extern crate log;

#[macro_use]
extern crate lazy_static;

#[cfg(feature = "serde")]
#[macro_use]
extern crate serde;

pub mod factory;
pub mod library;
pub mod message;
pub mod navigation;
pub mod query;
pub mod time;

mod constants;
mod error;

#[cfg(test)]
mod tests;

pub use error::Error;

/// Package to include all basic structures
pub mod prelude {
    pub use crate::error::Error;

    pub use crate::factory::{
        rinex::RinexNavDecoder,
        yuma::YumaDecoder,
        DataFormat, MultiFormatNavDataFactory, NavDataFactory, NavDataSource, ParsingError,
    };

    pub use crate::library::NavLibrary;

    pub use crate::message::{
        CarrierBand, NavMessageID, NavMessageType, NavType, ObsDescriptor, ObsType, SatId,
        TrackingCode, Wild,
    };

    pub use crate::navigation::{
        Almanac, DumpDetail, Ephemeris, GlonassEphemeris, Health, Isc, KbModel, KeplerOrbit,
        LookAngles, NavData, NavPayload, SbasEphemeris, SearchOrder, SvHealthFilter, TimeOffset,
        ValidityFilter, Xvt,
    };

    pub use crate::query::Query;

    pub use crate::time::{
        converter::{
            BasicTimeSystemConverter, NavTimeSystemConverter, TimeOffsetSource,
            TimeSystemConverter,
        },
        NavTime,
    };

    // pub re-export
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale, Unit};
}
