//! Text queries
//!
//! A query is made of whitespace separated tokens:
//!
//! `type time prn system [carrier [code [nav [health [validity [xmit-prn xmit-system]]]]]]`
//!
//! - type: [NavMessageType] name
//! - time: `Y/DOY/H:M:S[.frac]`, read in any time system, or
//!   `Y/DOY/H:M:S[.frac]/SRC/TGT`: read in `SRC`, searched in `TGT`
//! - prn, system: subject satellite, `*` for wildcards
//!
//! Omitted trailing tokens are wildcards.
use std::str::FromStr;

use hifitime::TimeScale;

use crate::{
    library::NavLibrary,
    message::{CarrierBand, NavMessageID, NavMessageType, NavType, SatId, TrackingCode, Wild},
    navigation::{SvHealthFilter, ValidityFilter},
    time::{parse_time_scale, NavTime},
    Error,
};

use gnss::prelude::Constellation;

/// Parsed text query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Query {
    /// Identifier template
    pub id: NavMessageID,
    /// Query time, as read
    pub when: NavTime,
    /// Time system the query time should be converted to, prior searching
    pub target: Option<TimeScale>,
    pub health: SvHealthFilter,
    pub validity: ValidityFilter,
}

/// Lenient or strict token interpretation
struct Tokenizer {
    strict: bool,
}

impl Tokenizer {
    /// Interprets `token`, or falls back to `fallback` when lenient
    fn parse<T, F>(
        &self,
        token: &str,
        field: &'static str,
        fallback: T,
        parser: F,
    ) -> Result<T, Error>
    where
        F: FnOnce(&str) -> Option<T>,
    {
        match parser(token) {
            Some(value) => Ok(value),
            None if self.strict => Err(Error::InvalidQueryToken {
                token: token.to_string(),
                field,
            }),
            None => {
                warn!("invalid {} \"{}\": using wildcard", field, token);
                Ok(fallback)
            },
        }
    }

    fn wild<T: FromStr>(&self, token: &str, field: &'static str) -> Result<Wild<T>, Error> {
        self.parse(token, field, Wild::Any, |s| Wild::<T>::from_str(s).ok())
    }

    fn system(&self, token: &str) -> Result<Wild<Constellation>, Error> {
        self.parse(token, "satellite system", Wild::Any, |s| {
            SatId::parse_system(s).ok()
        })
    }

    fn sat(&self, prn: &str, system: &str) -> Result<SatId, Error> {
        Ok(SatId {
            system: self.system(system)?,
            prn: self.wild::<u8>(prn, "satellite id")?,
        })
    }
}

/// Parses `Y/DOY/H:M:S[.frac]` with optional `/SYS` or `/SRC/TGT` suffix
fn parse_time(token: &str) -> Result<(NavTime, Option<TimeScale>), Error> {
    let items = token.split('/').collect::<Vec<_>>();
    match items.len() {
        5 => {
            let when = NavTime::from_str(&items[..4].join("/"))?;
            let target =
                parse_time_scale(items[4]).map_err(|_| Error::InvalidTime(token.to_string()))?;
            Ok((when, Some(target)))
        },
        _ => Ok((NavTime::from_str(token)?, None)),
    }
}

impl Query {
    /// Parses a text query. In strict mode, any malformed token is an error.
    /// Otherwise, malformed tokens are replaced by wildcards.
    pub fn parse(text: &str, strict: bool) -> Result<Self, Error> {
        let tokens = text.split_ascii_whitespace().collect::<Vec<_>>();
        match tokens.len() {
            0..=3 => return Err(Error::InsufficientQuery),
            10 => return Err(Error::IncompleteTransmitter),
            n if n > 11 => return Err(Error::ExtraneousQueryText(tokens[11..].join(" "))),
            _ => {},
        }

        let tokenizer = Tokenizer { strict };

        let message = tokenizer.parse(
            tokens[0],
            "message type",
            NavMessageType::Unknown,
            |s| match s {
                "*" => Some(NavMessageType::Unknown),
                s => NavMessageType::from_str(s).ok(),
            },
        )?;

        let (when, target) = parse_time(tokens[1])?;

        let mut id = NavMessageID::new(message, tokenizer.sat(tokens[2], tokens[3])?);

        let mut health = SvHealthFilter::Any;
        let mut validity = ValidityFilter::Any;

        for (index, token) in tokens.iter().enumerate().skip(4) {
            match index {
                4 => id.obs.carrier = tokenizer.wild::<CarrierBand>(token, "carrier")?,
                5 => id.obs.code = tokenizer.wild::<TrackingCode>(token, "tracking code")?,
                6 => id.nav = tokenizer.wild::<NavType>(token, "navigation type")?,
                7 => {
                    health = tokenizer.parse(token, "health", SvHealthFilter::Any, |s| {
                        SvHealthFilter::from_str(s).ok()
                    })?
                },
                8 => {
                    validity = tokenizer.parse(token, "validity", ValidityFilter::Any, |s| {
                        ValidityFilter::from_str(s).ok()
                    })?
                },
                9 => id.xmit = tokenizer.sat(token, tokens[10])?,
                _ => {},
            }
        }

        Ok(Self {
            id,
            when,
            target,
            health,
            validity,
        })
    }

    /// Query time to search with: converted to the target
    /// time system, if one was requested
    pub fn time(&self, library: &NavLibrary) -> Result<NavTime, Error> {
        match self.target {
            Some(target) => Ok(NavTime::new(library.convert_time(&self.when, target)?)),
            None => Ok(self.when),
        }
    }
}

impl FromStr for Query {
    type Err = Error;
    /// Lenient parsing, see [Query::parse]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, false)
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} @ {}", self.id, self.when)?;
        if let Some(target) = self.target {
            write!(f, " ({})", target)?;
        }
        write!(f, " health:{} validity:{}", self.health, self.validity)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::time::calendar;

    #[test]
    fn minimal_queries() {
        let query = Query::from_str("ephemeris 2015/200/00:15:00 13 GPS").unwrap();
        assert_eq!(query.id.message, NavMessageType::Ephemeris);
        assert_eq!(query.id.sat, SatId::new(Constellation::GPS, 13));
        assert!(query.id.xmit.system.is_any());
        assert!(query.id.nav.is_any());
        assert_eq!(query.when.system, Wild::Any);
        assert_eq!(calendar(query.when.epoch), (2015, 7, 19, 0, 15, 0, 0));
        assert_eq!(query.target, None);
        assert_eq!(query.health, SvHealthFilter::Any);
        assert_eq!(query.validity, ValidityFilter::Any);

        let query = Query::from_str("* 2015/200/00:00:00 * *").unwrap();
        assert_eq!(query.id, NavMessageID::default());
    }

    #[test]
    fn complete_queries() {
        let query = Query::from_str(
            "health 2015/200/00:15:00/GPS/UTC 13 G L1 CA LNAV Healthy ValidOnly 14 GPS",
        )
        .unwrap();
        assert_eq!(query.id.message, NavMessageType::Health);
        assert_eq!(query.when.system, Wild::Is(TimeScale::GPST));
        assert_eq!(query.target, Some(TimeScale::UTC));
        assert_eq!(query.id.obs.carrier, Wild::Is(CarrierBand::L1));
        assert_eq!(query.id.obs.code, Wild::Is(TrackingCode::CA));
        assert_eq!(query.id.nav, Wild::Is(NavType::GpsLnav));
        assert_eq!(query.health, SvHealthFilter::Healthy);
        assert_eq!(query.validity, ValidityFilter::ValidOnly);
        assert_eq!(query.id.xmit, SatId::new(Constellation::GPS, 14));
    }

    #[test]
    fn token_counts() {
        for (text, expected) in [
            ("", "insufficient"),
            ("ephemeris 2015/200/00:00:00 13", "insufficient"),
            ("ephemeris 2015/200/00:00:00 13 GPS * * * * * 14", "transmitter"),
            ("ephemeris 2015/200/00:00:00 13 GPS * * * * * 14 GPS extra", "extraneous"),
        ] {
            let result = Query::from_str(text);
            match expected {
                "insufficient" => assert!(matches!(result, Err(Error::InsufficientQuery))),
                "transmitter" => assert!(matches!(result, Err(Error::IncompleteTransmitter))),
                _ => assert!(
                    matches!(result, Err(Error::ExtraneousQueryText(ref s)) if s == "extra")
                ),
            }
        }
    }

    #[test]
    fn lenient_and_strict() {
        let text = "ephemerides 2015/200/00:00:00 13 XYZ";
        let query = Query::parse(text, false).unwrap();
        assert_eq!(query.id.message, NavMessageType::Unknown);
        assert_eq!(query.id.sat.system, Wild::Any);
        assert_eq!(query.id.sat.prn, Wild::Is(13));

        match Query::parse(text, true) {
            Err(Error::InvalidQueryToken { token, field }) => {
                assert_eq!(token, "ephemerides");
                assert_eq!(field, "message type");
            },
            other => panic!("unexpected result: {:?}", other),
        }

        // time is never defaulted
        for strict in [false, true] {
            let result = Query::parse("ephemeris 2015/200 13 GPS", strict);
            assert!(matches!(result, Err(Error::InvalidTime(_))));
        }
    }
}
