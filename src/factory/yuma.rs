//! Yuma GPS almanac decoder
use std::{io::BufRead, ops::RangeInclusive};

use regex::Regex;

use gnss::prelude::{Constellation, SV};
use hifitime::TimeScale;

use crate::{
    factory::{rinex::week_start, DataFormat, NavDataSource, ParsingError},
    message::{NavMessageID, NavMessageType, NavType, SatId},
    navigation::{Almanac, Health, KeplerOrbit, NavData, NavPayload},
    Error,
};

lazy_static! {
    /// "******** Week 829 almanac for PRN-01 ********"
    static ref BLOCK_HEADER: Regex =
        Regex::new(r"^\*+\s*Week\s+(\d+)\s+almanac\s+for\s+PRN-(\d+)").unwrap();
    /// "Eccentricity:               0.1058769226E-001"
    static ref FIELD: Regex = Regex::new(r"^([^:]+):\s*(\S+)\s*$").unwrap();
}

/// Yuma fields, in order of appearance
#[derive(Debug, Clone, Copy, PartialEq)]
enum Label {
    Id,
    Health,
    Eccentricity,
    Toa,
    Inclination,
    OmegaDot,
    SqrtA,
    Omega0,
    Omega,
    M0,
    Af0,
    Af1,
    Week,
}

const LABELS: [(&str, Label); 13] = [
    ("ID", Label::Id),
    ("Health", Label::Health),
    ("Eccentricity", Label::Eccentricity),
    ("Time of Applicability", Label::Toa),
    ("Orbital Inclination", Label::Inclination),
    ("Rate of Right Ascen", Label::OmegaDot),
    ("SQRT(A)", Label::SqrtA),
    ("Right Ascen at Week", Label::Omega0),
    ("Argument of Perigee", Label::Omega),
    ("Mean Anom", Label::M0),
    ("Af0", Label::Af0),
    ("Af1", Label::Af1),
    ("week", Label::Week),
];

impl Label {
    fn from_text(text: &str) -> Option<Self> {
        let text = text.trim();
        LABELS
            .iter()
            .find(|(name, _)| {
                text.get(..name.len())
                    .map_or(false, |prefix| prefix.eq_ignore_ascii_case(name))
            })
            .map(|(_, label)| *label)
    }

    fn name(&self) -> &'static str {
        LABELS
            .iter()
            .find(|(_, label)| label == self)
            .map(|(name, _)| *name)
            .unwrap_or("?")
    }
}

/// One almanac page being collected
#[derive(Debug)]
struct Block {
    /// line the page started at
    line: usize,
    values: [Option<f64>; 13],
}

impl Block {
    fn new(line: usize) -> Self {
        Self {
            line,
            values: [None; 13],
        }
    }

    fn get(&self, label: Label) -> Result<f64, ParsingError> {
        self.values[label as usize].ok_or(ParsingError::MissingLabel(label.name()))
    }

    /// Integer field, within `range`
    fn integer(&self, label: Label, range: RangeInclusive<u32>) -> Result<u32, ParsingError> {
        let value = self.get(label)?;
        let (min, max) = (*range.start() as f64, *range.end() as f64);
        if value.fract() != 0.0 || !(min..=max).contains(&value) {
            return Err(ParsingError::OutOfRange(label.name(), value));
        }
        Ok(value as u32)
    }
}

/// Decodes Yuma almanac files. Each page produces an [Almanac]
/// and a [Health] record for the subject GPS satellite.
#[derive(Debug, Default, Clone, Copy)]
pub struct YumaDecoder {
    /// Full week counter used to resolve the 10 bit week rollovers
    reference_week: Option<u32>,
}

impl YumaDecoder {
    /// Resolves 10 bit week counters to the rollover closest to this full week counter.
    /// Without reference, weeks are resolved in the third GPS era (week >= 2048).
    pub fn with_reference(&self, week: u32) -> Self {
        Self {
            reference_week: Some(week),
        }
    }

    /// Full week counter of this (possibly 10 bit) week counter
    fn full_week(&self, week: u32) -> u32 {
        if week >= 1024 {
            return week;
        }
        match self.reference_week {
            Some(reference) => {
                let rollovers = (reference as f64 - week as f64) / 1024.0;
                week.saturating_add(1024_u32.saturating_mul(rollovers.round().max(0.0) as u32))
            },
            None => week + 2048,
        }
    }

    fn records(&self, block: &Block) -> Result<[NavData; 2], ParsingError> {
        // 6 bit PRN, 8 bit health
        let prn = block.integer(Label::Id, 1..=63)? as u8;
        let raw_health = block.integer(Label::Health, 0..=255)?;
        let week = self.full_week(block.integer(Label::Week, 0..=9999)?);
        let toa_sow = block.get(Label::Toa)?;

        let toa = week_start(TimeScale::GPST, week) + toa_sow * hifitime::Unit::Second;
        let sv = SV::new(Constellation::GPS, prn);

        let almanac = Almanac {
            sv,
            toa,
            week,
            orbit: KeplerOrbit {
                toe: toa_sow,
                sqrt_a: block.get(Label::SqrtA)?,
                e: block.get(Label::Eccentricity)?,
                i_0: block.get(Label::Inclination)?,
                omega_0: block.get(Label::Omega0)?,
                omega: block.get(Label::Omega)?,
                m_0: block.get(Label::M0)?,
                omega_dot: block.get(Label::OmegaDot)?,
                ..Default::default()
            },
            af0: block.get(Label::Af0)?,
            af1: block.get(Label::Af1)?,
            health: raw_health,
        };

        let sat = SatId::from(sv);

        let almanac = NavData::new(
            NavMessageID::new(NavMessageType::Almanac, sat).with_nav(NavType::GpsLnav),
            toa,
            NavPayload::Almanac(almanac),
            DataFormat::Yuma,
        );

        let health = NavData::new(
            NavMessageID::new(NavMessageType::Health, sat).with_nav(NavType::GpsLnav),
            toa,
            NavPayload::Health {
                status: Health::from_raw(Constellation::GPS, raw_health),
                raw: raw_health,
            },
            DataFormat::Yuma,
        )
        .with_validity(almanac.begin, almanac.end);

        Ok([almanac, health])
    }
}

impl NavDataSource for YumaDecoder {
    fn name(&self) -> &'static str {
        "Yuma"
    }

    fn recognize(&self, reader: &mut dyn BufRead) -> bool {
        for line in reader.lines().take(8) {
            let Ok(line) = line else {
                return false;
            };
            if line.trim().is_empty() {
                continue;
            }
            return BLOCK_HEADER.is_match(line.trim_start());
        }
        false
    }

    fn decode(
        &self,
        source_name: &str,
        reader: &mut dyn BufRead,
        sink: &mut dyn FnMut(NavData),
    ) -> Result<usize, Error> {
        let located = |line: usize, reason: ParsingError| Error::Parsing {
            source_name: source_name.to_string(),
            line: line + 1,
            reason,
        };

        let mut total = 0;
        let mut block: Option<Block> = None;

        let mut flush = |block: &Block| -> Result<(), Error> {
            let records = self.records(block).map_err(|e| located(block.line, e))?;
            trace!("{}: almanac {}", source_name, records[0].id.sat);
            for record in records {
                sink(record);
                total += 1;
            }
            Ok(())
        };

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let content = line.trim();
            if content.is_empty() {
                continue;
            }

            if BLOCK_HEADER.is_match(content) {
                if let Some(done) = block.take() {
                    flush(&done)?;
                }
                block = Some(Block::new(index));
                continue;
            }

            let (Some(current), Some(field)) = (block.as_mut(), FIELD.captures(content)) else {
                return Err(located(
                    index,
                    ParsingError::UnexpectedContent(content.to_string()),
                ));
            };

            let Some(label) = Label::from_text(&field[1]) else {
                debug!("{}: unknown field \"{}\"", source_name, &field[1]);
                continue;
            };

            let value = field[2]
                .parse::<f64>()
                .map_err(|e| located(index, ParsingError::ParseFloatError(e)))?;

            current.values[label as usize] = Some(value);
        }

        if let Some(done) = block.take() {
            flush(&done)?;
        }

        debug!("{}: {} yuma records", source_name, total);
        Ok(total)
    }
}
