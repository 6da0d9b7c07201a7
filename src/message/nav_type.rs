use strum_macros::{Display, EnumIter, EnumString};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use gnss::prelude::Constellation;

use crate::message::{CarrierBand, ObsDescriptor, TrackingCode};

/// Navigation message structure (signal format)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter,
)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[strum(ascii_case_insensitive)]
pub enum NavType {
    /// GPS (and QZSS) legacy navigation message
    #[strum(to_string = "GPS_LNAV", serialize = "LNAV")]
    GpsLnav,
    /// Civil navigation message on L2
    #[strum(to_string = "GPS_CNAV_L2", serialize = "CNAV")]
    GpsCnavL2,
    /// Civil navigation message on L5
    #[strum(serialize = "GPS_CNAV_L5")]
    GpsCnavL5,
    /// Civil navigation message on L1C
    #[strum(to_string = "GPS_CNAV2", serialize = "CNV2")]
    GpsCnav2,
    #[strum(serialize = "GPS_MNAV")]
    GpsMnav,
    /// BeiDou MEO/IGSO message
    #[strum(to_string = "BeiDou_D1", serialize = "D1")]
    BeiDouD1,
    /// BeiDou GEO message
    #[strum(to_string = "BeiDou_D2", serialize = "D2")]
    BeiDouD2,
    /// Glonass FDMA civil message
    #[strum(to_string = "GloCivilF", serialize = "FDMA")]
    GloCivilF,
    /// Glonass CDMA civil message
    #[strum(serialize = "GloCivilC")]
    GloCivilC,
    /// Galileo free access message (E5a)
    #[strum(to_string = "GalFNAV", serialize = "FNAV")]
    GalFnav,
    /// Galileo integrity message (E1/E5b)
    #[strum(to_string = "GalINAV", serialize = "INAV")]
    GalInav,
    /// NavIC standard positioning message
    #[strum(serialize = "IRNSS_SPS")]
    IrnssSps,
    /// SBAS geostationary message
    #[strum(to_string = "SBAS_L1", serialize = "SBAS")]
    SbasL1,
}

impl NavType {
    /// Default legacy [NavType] broadcast by this [Constellation]
    pub fn legacy(c: Constellation) -> Self {
        match c {
            Constellation::Glonass => Self::GloCivilF,
            Constellation::Galileo => Self::GalInav,
            Constellation::BeiDou => Self::BeiDouD1,
            Constellation::IRNSS => Self::IrnssSps,
            c if c.is_sbas() => Self::SbasL1,
            _ => Self::GpsLnav,
        }
    }

    /// Signal this message type is usually collected from
    pub fn signal(&self) -> ObsDescriptor {
        match self {
            Self::GpsLnav => ObsDescriptor::nav(CarrierBand::L1, TrackingCode::CA),
            Self::GpsCnavL2 => ObsDescriptor::nav(CarrierBand::L2, TrackingCode::L2CM),
            Self::GpsCnavL5 => ObsDescriptor::nav(CarrierBand::L5, TrackingCode::L5I),
            Self::GpsCnav2 => ObsDescriptor::nav(CarrierBand::L1, TrackingCode::L1CD),
            Self::GpsMnav => ObsDescriptor::nav(CarrierBand::L1, TrackingCode::M),
            Self::BeiDouD1 | Self::BeiDouD2 => {
                ObsDescriptor::nav(CarrierBand::B1, TrackingCode::B1I)
            },
            Self::GloCivilF => ObsDescriptor::nav(CarrierBand::G1, TrackingCode::GloCA),
            Self::GloCivilC => ObsDescriptor::nav(CarrierBand::G3, TrackingCode::GloCA),
            Self::GalFnav => ObsDescriptor::nav(CarrierBand::L5, TrackingCode::E5aI),
            Self::GalInav => ObsDescriptor::nav(CarrierBand::L1, TrackingCode::E1B),
            Self::IrnssSps => ObsDescriptor::nav(CarrierBand::L5, TrackingCode::SPS),
            Self::SbasL1 => ObsDescriptor::nav(CarrierBand::L1, TrackingCode::CA),
        }
    }
}
