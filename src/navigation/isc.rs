#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use gnss::prelude::Constellation;

use crate::message::CarrierBand;

/// Inter signal corrections (broadcast group delays)
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Isc {
    /// Constellation these delays apply to
    pub constellation: Constellation,
    /// GPS/QZSS/IRNSS TGD, Galileo BGD E5a/E1, BeiDou TGD1 (B1/B3) (s)
    pub tgd: f64,
    /// Galileo BGD E5b/E1, BeiDou TGD2 (B2/B3) (s)
    pub tgd2: Option<f64>,
}

impl Isc {
    /// Group delay correction (s) applicable to a single frequency
    /// user of given carrier.
    pub fn correction(&self, carrier: CarrierBand) -> f64 {
        match self.constellation {
            Constellation::Galileo => match carrier {
                CarrierBand::L5 => gamma(CarrierBand::L1, carrier) * self.tgd,
                CarrierBand::E5b => gamma(CarrierBand::L1, carrier) * self.tgd2.unwrap_or(self.tgd),
                _ => self.tgd2.unwrap_or(self.tgd),
            },
            Constellation::BeiDou => match carrier {
                CarrierBand::B3 => 0.0,
                CarrierBand::B2 | CarrierBand::E5b => self.tgd2.unwrap_or(0.0),
                _ => self.tgd,
            },
            _ => gamma(CarrierBand::L1, carrier) * self.tgd,
        }
    }
}

/// (f_ref / f)²
fn gamma(reference: CarrierBand, carrier: CarrierBand) -> f64 {
    (reference.frequency() / carrier.frequency()).powi(2)
}
