use std::str::FromStr;

use gnss::prelude::{Constellation, SV};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{message::Wild, Error};

/// Satellite identity, where both the system and the number may be wildcards.
/// PRN 0 is a legitimate identifier.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SatId {
    pub system: Wild<Constellation>,
    pub prn: Wild<u8>,
}

/// Augmentation systems are all identified as [Constellation::SBAS]
fn normalize(c: Constellation) -> Constellation {
    if c.is_sbas() {
        Constellation::SBAS
    } else {
        c
    }
}

impl SatId {
    /// Builds a fully defined [SatId]
    pub fn new(system: Constellation, prn: u8) -> Self {
        Self {
            system: Wild::Is(normalize(system)),
            prn: Wild::Is(prn),
        }
    }

    /// Wildcard satellite
    pub fn any() -> Self {
        Self::default()
    }

    /// Any satellite of given system
    pub fn any_of(system: Constellation) -> Self {
        Self {
            system: Wild::Is(normalize(system)),
            prn: Wild::Any,
        }
    }

    pub fn matches(&self, other: &Self) -> bool {
        self.system.matches(&other.system) && self.prn.matches(&other.prn)
    }

    /// True if both fields are concrete
    pub fn is_concrete(&self) -> bool {
        !self.system.is_any() && !self.prn.is_any()
    }

    /// Converts to [SV], only if fully defined
    pub fn sv(&self) -> Option<SV> {
        Some(SV::new(self.system.get()?, self.prn.get()?))
    }

    /// Parses a system token with gnss-rs naming conventions
    pub fn parse_system(s: &str) -> Result<Wild<Constellation>, Error> {
        let s = s.trim();
        if s == "*" || s.eq_ignore_ascii_case("any") {
            return Ok(Wild::Any);
        }
        let c = Constellation::from_str(s).map_err(|_| Error::InvalidQueryToken {
            token: s.to_string(),
            field: "satellite system",
        })?;
        Ok(Wild::Is(normalize(c)))
    }

    /// Builds [SatId] from separate number and system tokens,
    /// as found in text queries.
    pub fn from_tokens(prn: &str, system: &str) -> Result<Self, Error> {
        let system = Self::parse_system(system)?;
        let prn = Wild::<u8>::from_str(prn).map_err(|_| Error::InvalidQueryToken {
            token: prn.to_string(),
            field: "satellite id",
        })?;
        Ok(Self { system, prn })
    }
}

impl From<SV> for SatId {
    fn from(sv: SV) -> Self {
        Self::new(sv.constellation, sv.prn)
    }
}

impl std::fmt::Display for SatId {
    /// Formats as "G01", wildcards printed with '*'
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.system {
            Wild::Any => write!(f, "*")?,
            Wild::Is(c) => write!(f, "{:x}", c)?,
        }
        match self.prn {
            Wild::Any => write!(f, "**"),
            Wild::Is(prn) => write!(f, "{:02}", prn),
        }
    }
}

impl FromStr for SatId {
    type Err = Error;
    /// Parses "G01" like descriptions. "*" or "G**" describe wildcards.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidQueryToken {
                token: s.to_string(),
                field: "satellite",
            });
        }
        if s == "*" {
            return Ok(Self::any());
        }
        let offset = s.chars().next().map(|c| c.len_utf8()).unwrap_or(1);
        let (system, prn) = s.split_at(offset);
        let prn = prn.trim();
        let prn = if prn.is_empty() || prn.chars().all(|c| c == '*') {
            "*"
        } else {
            prn
        };
        Self::from_tokens(prn, system)
    }
}
