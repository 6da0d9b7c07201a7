use std::path::PathBuf;

use hifitime::{Epoch, TimeScale};

use crate::prelude::*;

/// GPS 2015/07/19 (week 1854) broadcast data
pub const NAV_V2: &str = "NAV/V2/brdc2000.15n";
/// Mixed 2021/01/01 broadcast data, with header time system corrections
pub const NAV_V3: &str = "NAV/V3/MIXED00XXX_R_20210010000_01D_MN.rnx";
/// 2022/06/10 frames
pub const NAV_V4: &str = "NAV/V4/BRD400DLR_S_20221610000_01D_MN.rnx";
/// GPS week 830 (1854) almanac
pub const YUMA: &str = "ALMANAC/almanac.yuma.week0830.061440.txt";

/// Path to a test resource
pub fn resource(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_resources")
        .join(relative)
}

/// Factory able to decode every test resource.
/// Yuma weeks are resolved close to the 2015 resources.
pub fn factory() -> MultiFormatNavDataFactory {
    let mut factory = MultiFormatNavDataFactory::empty();
    factory.add_source(Box::<RinexNavDecoder>::default());
    factory.add_source(Box::new(YumaDecoder::default().with_reference(1854)));
    factory
}

/// Library with a single factory, loaded with these resources
pub fn library(resources: &[&str]) -> NavLibrary {
    let mut library = NavLibrary::default();
    library.add_factory(Box::new(factory()));
    for relative in resources {
        let path = resource(relative);
        library
            .add_data_source(&path)
            .unwrap_or_else(|e| panic!("failed to load {}: {}", path.display(), e));
    }
    library
}

pub fn gpst(y: i32, m: u8, d: u8, hh: u8, mm: u8, ss: u8) -> Epoch {
    Epoch::from_gregorian(y, m, d, hh, mm, ss, 0, TimeScale::GPST)
}

pub fn gps_sat(prn: u8) -> SatId {
    SatId::new(Constellation::GPS, prn)
}

/// Payload of an ephemeris record
pub fn ephemeris(data: &NavData) -> &Ephemeris {
    match &data.payload {
        NavPayload::Ephemeris(eph) => eph,
        other => panic!("expecting an ephemeris, got {:?}", other),
    }
}
