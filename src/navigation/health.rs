//! Satellite health interpretation
use strum_macros::{Display, EnumIter, EnumString};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use gnss::prelude::Constellation;

/// Satellite health, as broadcast by the transmitter
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    EnumIter,
)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[strum(ascii_case_insensitive)]
pub enum Health {
    /// Not determined (no health information)
    #[default]
    Unknown,
    Healthy,
    Unhealthy,
    /// Usable with reduced performance (Galileo data validity warnings)
    Degraded,
}

// Galileo health flags (RINEX SV health field)
const GAL_E1B_DVS: u32 = 0x01;
const GAL_E1B_HS: u32 = 0x06;
const GAL_E5A_DVS: u32 = 0x08;
const GAL_E5A_HS: u32 = 0x30;
const GAL_E5B_DVS: u32 = 0x40;
const GAL_E5B_HS: u32 = 0x180;

impl Health {
    /// Interprets a raw broadcast health value of given [Constellation]
    pub fn from_raw(c: Constellation, raw: u32) -> Self {
        match c {
            Constellation::Galileo => {
                if raw & (GAL_E1B_HS | GAL_E5A_HS | GAL_E5B_HS) != 0 {
                    Self::Unhealthy
                } else if raw & (GAL_E1B_DVS | GAL_E5A_DVS | GAL_E5B_DVS) != 0 {
                    Self::Degraded
                } else {
                    Self::Healthy
                }
            },
            Constellation::Glonass => {
                // Bn MSB
                if raw & 0x04 != 0 || raw & 0x01 != 0 {
                    Self::Unhealthy
                } else {
                    Self::Healthy
                }
            },
            _ => {
                if raw == 0 {
                    Self::Healthy
                } else {
                    Self::Unhealthy
                }
            },
        }
    }
}

/// Health criterion applied when searching records
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter,
)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[strum(ascii_case_insensitive)]
pub enum SvHealthFilter {
    /// Accepts any health status, including unknown
    #[default]
    Any,
    Healthy,
    Unhealthy,
    Degraded,
}

impl SvHealthFilter {
    /// True if given [Health] satisfies this criterion.
    /// [Health::Unknown] only passes [SvHealthFilter::Any].
    pub fn accepts(&self, health: Health) -> bool {
        match self {
            Self::Any => true,
            Self::Healthy => health == Health::Healthy,
            Self::Unhealthy => health == Health::Unhealthy,
            Self::Degraded => health == Health::Degraded,
        }
    }
}
