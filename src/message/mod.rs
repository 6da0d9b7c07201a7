//! Navigation message identification and matching
use strum_macros::{Display, EnumIter, EnumString};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod nav_type;
mod obs;
mod sat;
mod wild;

pub use nav_type::NavType;
pub use obs::{CarrierBand, ObsDescriptor, ObsType, TrackingCode};
pub use sat::SatId;
pub use wild::Wild;

/// Kind of decoded navigation message
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
pub enum NavMessageType {
    /// Undetermined. In queries, this matches any message type.
    #[default]
    Unknown,
    /// Coarse long term orbit
    Almanac,
    /// Precise short term orbit and clock
    Ephemeris,
    /// Offset between two time systems
    TimeOffset,
    /// Satellite health status
    Health,
    /// Ionospheric model
    Iono,
    /// Inter signal correction (group delay)
    #[strum(to_string = "ISC", serialize = "Isc")]
    Isc,
}

impl NavMessageType {
    /// True if both types are compatible, [NavMessageType::Unknown]
    /// being a wildcard.
    pub fn matches(&self, other: &Self) -> bool {
        *self == Self::Unknown || *other == Self::Unknown || self == other
    }
}

/// Navigation message identifier. Used both as stored record key
/// and, with wildcard fields, as query template.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavMessageID {
    /// Message type
    pub message: NavMessageType,
    /// Satellite this message describes
    pub sat: SatId,
    /// Satellite that broadcast this message
    pub xmit: SatId,
    /// Signal this message was collected from
    pub obs: ObsDescriptor,
    /// Message structure
    pub nav: Wild<NavType>,
}

impl NavMessageID {
    /// Builds a [NavMessageID] for given subject satellite,
    /// every other field being a wildcard.
    pub fn new(message: NavMessageType, sat: SatId) -> Self {
        Self {
            message,
            sat,
            ..Default::default()
        }
    }

    /// Copy with desired transmitting satellite
    pub fn with_xmit(&self, xmit: SatId) -> Self {
        let mut s = *self;
        s.xmit = xmit;
        s
    }

    /// Copy with desired signal
    pub fn with_obs(&self, obs: ObsDescriptor) -> Self {
        let mut s = *self;
        s.obs = obs;
        s
    }

    /// Copy with desired message structure
    pub fn with_nav(&self, nav: NavType) -> Self {
        let mut s = *self;
        s.nav = Wild::Is(nav);
        s
    }

    /// Copy with desired message type
    pub fn with_message(&self, message: NavMessageType) -> Self {
        let mut s = *self;
        s.message = message;
        s
    }

    /// True if every field pair is equal or at least one side is a wildcard
    pub fn matches(&self, other: &Self) -> bool {
        self.message.matches(&other.message)
            && self.sat.matches(&other.sat)
            && self.xmit.matches(&other.xmit)
            && self.obs.matches(&other.obs)
            && self.nav.matches(&other.nav)
    }
}

impl std::fmt::Display for NavMessageID {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} {} xmit:{} {} {}",
            self.message, self.sat, self.xmit, self.obs, self.nav
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use gnss::prelude::Constellation;
    use std::str::FromStr;

    fn g13_lnav() -> NavMessageID {
        let g13 = SatId::new(Constellation::GPS, 13);
        NavMessageID::new(NavMessageType::Ephemeris, g13)
            .with_xmit(g13)
            .with_obs(NavType::GpsLnav.signal())
            .with_nav(NavType::GpsLnav)
    }

    #[test]
    fn message_type_parsing() {
        for (desc, expected) in [
            ("ephemeris", NavMessageType::Ephemeris),
            ("Almanac", NavMessageType::Almanac),
            ("TIMEOFFSET", NavMessageType::TimeOffset),
            ("isc", NavMessageType::Isc),
            ("Unknown", NavMessageType::Unknown),
        ] {
            assert_eq!(NavMessageType::from_str(desc).unwrap(), expected);
        }
        assert!(NavMessageType::from_str("eph").is_err());
    }

    #[test]
    fn reflexive_matching() {
        let id = g13_lnav();
        assert!(id.matches(&id));
    }

    #[test]
    fn wildcard_broadening() {
        let id = g13_lnav();
        let g14 = SatId::new(Constellation::GPS, 14);

        // each single wildcard still matches the original,
        // and also matches identifiers differing only in that field
        let mut query = id;
        query.sat = SatId::any();
        assert!(query.matches(&id));
        let mut other = id;
        other.sat = g14;
        assert!(query.matches(&other));
        assert!(!id.matches(&other));

        let mut query = id;
        query.xmit = SatId::any();
        let mut other = id;
        other.xmit = g14;
        assert!(query.matches(&id));
        assert!(query.matches(&other));
        assert!(!id.matches(&other));

        let mut query = id;
        query.obs.code = Wild::Any;
        let mut other = id;
        other.obs.code = Wild::Is(TrackingCode::P);
        assert!(query.matches(&id));
        assert!(query.matches(&other));
        assert!(!id.matches(&other));

        let mut query = id;
        query.nav = Wild::Any;
        let other = id.with_nav(NavType::GpsCnavL2);
        assert!(query.matches(&id));
        assert!(query.matches(&other));
        assert!(!id.matches(&other));

        let query = id.with_message(NavMessageType::Unknown);
        let other = id.with_message(NavMessageType::Health);
        assert!(query.matches(&id));
        assert!(query.matches(&other));
        assert!(!id.matches(&other));
    }

    #[test]
    fn satellite_only_query() {
        let query = NavMessageID::new(
            NavMessageType::Unknown,
            SatId::new(Constellation::GPS, 13),
        );
        assert!(query.matches(&g13_lnav()));
        assert!(query.matches(&g13_lnav().with_message(NavMessageType::Almanac)));
    }

    #[test]
    fn wildcards_sort_first() {
        let id = g13_lnav();
        let mut wild = id;
        wild.sat = SatId::any();
        assert!(wild < id);
        assert_ne!(wild, id);
    }

    #[test]
    #[cfg(feature = "serde")]
    fn wildcards_serdes() {
        let mut query = g13_lnav();
        query.xmit = SatId::any();
        let content = serde_json::to_string(&query).unwrap();
        let parsed: NavMessageID = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, query);
        assert!(parsed.matches(&g13_lnav()));
    }
}
