use strum_macros::{Display, EnumIter, EnumString};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::message::Wild;

/// Observation kind a navigation message was collected from
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter,
)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[strum(ascii_case_insensitive)]
pub enum ObsType {
    /// Navigation message data
    NavMsg,
    /// Pseudo range
    Range,
    /// Carrier phase
    Phase,
    Doppler,
    #[strum(serialize = "SNR")]
    Snr,
}

/// Frequency band
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter,
)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[strum(ascii_case_insensitive)]
pub enum CarrierBand {
    /// GPS L1, Galileo E1, SBAS L1, QZSS L1
    L1,
    /// GPS L2, QZSS L2
    L2,
    /// GPS L5, Galileo E5a, SBAS L5, QZSS L5, BeiDou B2a, NavIC L5
    L5,
    /// Glonass G1
    G1,
    /// Glonass G1a
    G1a,
    /// Glonass G2a
    G2a,
    /// Glonass G2
    G2,
    /// Glonass G3
    G3,
    /// Galileo E5b
    E5b,
    /// Galileo E5, BeiDou B2
    E5ab,
    /// Galileo E6, QZSS L6
    E6,
    /// BeiDou B1
    B1,
    /// BeiDou B2b
    B2,
    /// BeiDou B3
    B3,
    /// NavIC S
    I9,
    /// GPS L1+L2
    L1L2,
}

impl CarrierBand {
    /// Nominal carrier frequency in Hz. Glonass FDMA bands
    /// return the central frequency (channel 0).
    pub fn frequency(&self) -> f64 {
        match self {
            Self::L1 | Self::L1L2 => 1575.42E6,
            Self::L2 => 1227.60E6,
            Self::L5 => 1176.45E6,
            Self::G1 => 1602.0E6,
            Self::G1a => 1600.995E6,
            Self::G2a => 1248.06E6,
            Self::G2 => 1246.0E6,
            Self::G3 => 1202.025E6,
            Self::E5b | Self::B2 => 1207.140E6,
            Self::E5ab => 1191.795E6,
            Self::E6 => 1278.750E6,
            Self::B1 => 1561.098E6,
            Self::B3 => 1268.520E6,
            Self::I9 => 2492.028E6,
        }
    }
}

/// Tracking code (ranging code)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter,
)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[strum(ascii_case_insensitive)]
pub enum TrackingCode {
    /// Legacy GPS civil code
    CA,
    /// Legacy GPS precise code
    P,
    /// Encrypted legacy GPS precise code
    Y,
    /// Modernized GPS military code
    M,
    /// Modernized GPS L2 civil M code
    L2CM,
    /// Modernized GPS L2 civil L code
    L2CL,
    /// Modernized GPS L5 civil in-phase
    L5I,
    /// Modernized GPS L5 civil quadrature
    L5Q,
    /// GPS L1C pilot
    L1CP,
    /// GPS L1C data
    L1CD,
    /// Legacy Glonass civil signal
    GloCA,
    /// Legacy Glonass precise signal
    GloP,
    /// Galileo E1-B
    E1B,
    /// Galileo E1-C
    E1C,
    /// Galileo E5a I
    E5aI,
    /// Galileo E5b I
    E5bI,
    /// BeiDou B1 I
    B1I,
    /// BeiDou B2 I
    B2I,
    /// BeiDou B3 I
    B3I,
    /// BeiDou B1C
    B1C,
    /// BeiDou B2a
    B2a,
    /// NavIC standard positioning service
    SPS,
}

/// Describes the signal a message was collected from.
/// Every field may be a wildcard.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObsDescriptor {
    pub kind: Wild<ObsType>,
    pub carrier: Wild<CarrierBand>,
    pub code: Wild<TrackingCode>,
    /// Glonass frequency channel
    pub freq_offset: Wild<i8>,
}

impl ObsDescriptor {
    /// Navigation message collected on given carrier and code
    pub fn nav(carrier: CarrierBand, code: TrackingCode) -> Self {
        Self {
            kind: Wild::Is(ObsType::NavMsg),
            carrier: Wild::Is(carrier),
            code: Wild::Is(code),
            freq_offset: Wild::Any,
        }
    }

    /// Copy with desired frequency offset
    pub fn with_freq_offset(&self, offset: i8) -> Self {
        let mut s = *self;
        s.freq_offset = Wild::Is(offset);
        s
    }

    pub fn matches(&self, other: &Self) -> bool {
        self.kind.matches(&other.kind)
            && self.carrier.matches(&other.carrier)
            && self.code.matches(&other.code)
            && self.freq_offset.matches(&other.freq_offset)
    }
}

impl std::fmt::Display for ObsDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} {} {}", self.kind, self.carrier, self.code)?;
        if let Wild::Is(offset) = self.freq_offset {
            write!(f, " {:+}", offset)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn carrier_code_parsing() {
        assert_eq!(CarrierBand::from_str("l1").unwrap(), CarrierBand::L1);
        assert_eq!(CarrierBand::from_str("E5ab").unwrap(), CarrierBand::E5ab);
        assert_eq!(TrackingCode::from_str("ca").unwrap(), TrackingCode::CA);
        assert_eq!(ObsType::from_str("snr").unwrap(), ObsType::Snr);
        assert!(CarrierBand::from_str("L9").is_err());

        for carrier in CarrierBand::iter() {
            let parsed = CarrierBand::from_str(&carrier.to_string()).unwrap();
            assert_eq!(parsed, carrier);
        }
    }

    #[test]
    fn descriptor_matching() {
        let l1ca = ObsDescriptor::nav(CarrierBand::L1, TrackingCode::CA);
        let l2cm = ObsDescriptor::nav(CarrierBand::L2, TrackingCode::L2CM);
        assert!(l1ca.matches(&l1ca));
        assert!(!l1ca.matches(&l2cm));
        assert!(ObsDescriptor::default().matches(&l2cm));

        let mut any_code = l1ca;
        any_code.code = Wild::Any;
        assert!(any_code.matches(&l1ca));
        assert!(!any_code.matches(&l2cm));

        let glo = ObsDescriptor::nav(CarrierBand::G1, TrackingCode::GloCA).with_freq_offset(-4);
        assert!(!glo.matches(&glo.with_freq_offset(3)));
        assert_eq!(glo.to_string(), "NavMsg G1 GloCA -4");
    }
}
