//! Navigation library: the query engine
use std::{
    collections::BTreeSet,
    io::{BufRead, Cursor, Read, Write},
    path::Path,
    sync::Arc,
};

use hifitime::{Duration, Epoch, TimeScale};
use nalgebra::Vector3;
use strum::IntoEnumIterator;

use gnss::prelude::Constellation;

use crate::{
    factory::{NavDataFactory, Search},
    message::{CarrierBand, NavMessageID, NavMessageType, SatId, Wild},
    navigation::{
        distance, DumpDetail, Health, LookAngles, NavData, NavPayload, SearchOrder,
        SvHealthFilter, ValidityFilter, Xvt,
    },
    time::{
        converter::{BasicTimeSystemConverter, TimeOffsetSource, TimeSystemConverter},
        NavTime, QueryTime,
    },
    Error,
};

/// [NavLibrary] answers record, satellite state and time offset
/// queries over the data held by its factories.
/// Factories are searched in registration order: on equally good
/// candidates, the first registered factory wins.
pub struct NavLibrary {
    factories: Vec<Box<dyn NavDataFactory>>,
    type_filter: BTreeSet<NavMessageType>,
    converter: Option<Box<dyn TimeSystemConverter>>,
}

impl Default for NavLibrary {
    /// Library without factory, accepting every message type
    /// and converting time systems with [BasicTimeSystemConverter].
    fn default() -> Self {
        Self {
            factories: Vec::new(),
            type_filter: NavMessageType::iter()
                .filter(|t| *t != NavMessageType::Unknown)
                .collect(),
            converter: Some(Box::<BasicTimeSystemConverter>::default()),
        }
    }
}

impl std::fmt::Debug for NavLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("NavLibrary")
            .field(
                "factories",
                &self.factories.iter().map(|f| f.name()).collect::<Vec<_>>(),
            )
            .field("type_filter", &self.type_filter)
            .field("converter", &self.converter.as_ref().map(|c| c.name()))
            .finish()
    }
}

/// True if `candidate` should replace `best`, both being returned by
/// a factory for the same search. Ties keep `best`.
fn is_better(
    candidate: &NavData,
    best: &NavData,
    order: SearchOrder,
    when: &QueryTime,
) -> Result<bool, Error> {
    match order {
        SearchOrder::User => {
            let lhs = when.at(candidate.time_scale())? - candidate.user_time();
            let rhs = when.at(best.time_scale())? - best.user_time();
            Ok(lhs < rhs)
        },
        SearchOrder::Nearest => {
            let lhs = distance(candidate.time_stamp, when.at(candidate.time_scale())?);
            let rhs = distance(best.time_stamp, when.at(best.time_scale())?);
            if lhs != rhs {
                Ok(lhs < rhs)
            } else {
                Ok(candidate.time_stamp < best.time_stamp)
            }
        },
    }
}

impl NavLibrary {
    /// Registers a new factory, with lowest priority.
    /// The current type filter applies to it.
    pub fn add_factory(&mut self, mut factory: Box<dyn NavDataFactory>) {
        factory.set_type_filter(&self.type_filter);
        self.factories.push(factory);
    }

    /// Number of registered factories
    pub fn num_factories(&self) -> usize {
        self.factories.len()
    }

    /// Loads a file into the first factory able to recognize it.
    /// Returns the number of loaded records.
    pub fn add_data_source(&mut self, path: &Path) -> Result<usize, Error> {
        let mut last = Error::UnrecognizedSource(path.to_string_lossy().to_string());
        for factory in self.factories.iter_mut() {
            match factory.add_data_source(path) {
                Ok(total) => {
                    debug!("{}: {} records ({})", path.display(), total, factory.name());
                    return Ok(total);
                },
                Err(Error::UnrecognizedSource(name)) => {
                    last = Error::UnrecognizedSource(name);
                },
                Err(e) => return Err(e),
            }
        }
        Err(last)
    }

    /// Loads content into the first factory able to recognize it
    pub fn add_reader(&mut self, name: &str, reader: &mut dyn BufRead) -> Result<usize, Error> {
        let mut content = Vec::<u8>::new();
        reader.read_to_end(&mut content)?;
        for factory in self.factories.iter_mut() {
            match factory.add_reader(name, &mut Cursor::new(&content)) {
                Ok(total) => return Ok(total),
                Err(Error::UnrecognizedSource(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(Error::UnrecognizedSource(name.to_string()))
    }

    /// Restricts the message types searches may return.
    /// The filter applies at search time, to data already loaded as well
    /// as data loaded later on. Loaded data is always retained, so
    /// widening the filter again restores previous answers.
    pub fn set_type_filter(&mut self, filter: &BTreeSet<NavMessageType>) {
        self.type_filter = filter.clone();
        for factory in self.factories.iter_mut() {
            factory.set_type_filter(filter);
        }
    }

    /// Message types searches may return
    pub fn type_filter(&self) -> &BTreeSet<NavMessageType> {
        &self.type_filter
    }

    /// Installs a new time system conversion strategy
    pub fn set_time_converter(&mut self, converter: Box<dyn TimeSystemConverter>) {
        debug!("time converter: {}", converter.name());
        self.converter = Some(converter);
    }

    /// Removes the time system converter. Any search or conversion
    /// involving two different time systems will then fail.
    pub fn clear_time_converter(&mut self) {
        self.converter = None;
    }

    /// Installed time system converter, if any
    pub fn time_converter(&self) -> Option<&dyn TimeSystemConverter> {
        self.converter.as_deref()
    }

    /// Expresses `t` in desired [TimeScale], with the installed converter
    pub fn convert_time(&self, t: &NavTime, to: TimeScale) -> Result<Epoch, Error> {
        t.convert(to, self.time_converter(), self)
    }

    fn query_time(&self, when: &NavTime) -> QueryTime<'_> {
        QueryTime::new(*when, self.time_converter(), self)
    }

    fn best_of<F>(
        &self,
        order: SearchOrder,
        when: &QueryTime,
        search: F,
    ) -> Result<Option<Arc<NavData>>, Error>
    where
        F: Fn(&dyn NavDataFactory) -> Result<Option<Arc<NavData>>, Error>,
    {
        let mut best: Option<Arc<NavData>> = None;
        for factory in self.factories.iter() {
            let Some(candidate) = search(factory.as_ref())? else {
                continue;
            };
            best = match best {
                Some(current) if !is_better(&candidate, &current, order, when)? => Some(current),
                _ => Some(candidate),
            };
        }
        Ok(best)
    }

    /// Searches the record matching `id` that best suits `when`.
    /// - health: health criterion
    /// - validity: validity criterion, `when` being compared to the record
    ///   validity interval in the time system of the record
    /// - order: selection policy
    ///
    /// Absence of data is not an error: only time conversion failures are.
    pub fn find(
        &self,
        id: &NavMessageID,
        when: &NavTime,
        health: SvHealthFilter,
        validity: ValidityFilter,
        order: SearchOrder,
    ) -> Result<Option<Arc<NavData>>, Error> {
        let query = self.query_time(when);
        let search = Search {
            id,
            health,
            validity,
            order,
        };
        let found = self.best_of(order, &query, |factory| factory.find(&search, &query))?;
        match &found {
            Some(record) => trace!("{} @ {}: found {}", id, when, record.id),
            None => trace!("{} @ {}: not found", id, when),
        }
        Ok(found)
    }

    /// Evaluates the satellite state at `when`, from the best orbital record.
    /// [NavMessageType::Unknown] searches ephemerides first, then almanacs.
    pub fn get_xvt(
        &self,
        id: &NavMessageID,
        when: &NavTime,
        health: SvHealthFilter,
        validity: ValidityFilter,
        order: SearchOrder,
    ) -> Result<Option<Xvt>, Error> {
        let messages = match id.message {
            NavMessageType::Unknown => vec![NavMessageType::Ephemeris, NavMessageType::Almanac],
            NavMessageType::Ephemeris | NavMessageType::Almanac => vec![id.message],
            other => return Err(Error::NotOrbital(other)),
        };
        for message in messages {
            let id = id.with_message(message);
            if let Some(record) = self.find(&id, when, health, validity, order)? {
                let t = self.convert_time(when, record.time_scale())?;
                return Ok(record.xvt(t));
            }
        }
        Ok(None)
    }

    /// Residual offset to add to the nominal conversion of a `from`
    /// time stamp into `to`, at `when`, resolved from broadcast time
    /// offset messages. Messages are compared to `when` without
    /// time system conversion.
    pub fn get_offset(
        &self,
        from: TimeScale,
        to: TimeScale,
        when: &NavTime,
    ) -> Result<Duration, Error> {
        if from == to {
            return Ok(Duration::ZERO);
        }

        // wildcard time system: never converts, so no converter is needed
        let query = QueryTime::new(when.as_any(), None, self);

        for (lhs, rhs) in [(from, to), (to, from)] {
            for order in [SearchOrder::User, SearchOrder::Nearest] {
                let found = self.best_of(order, &query, |factory| {
                    factory.time_offset(lhs, rhs, &query, order)
                })?;
                let Some(record) = found else {
                    continue;
                };
                let NavPayload::TimeOffset(offset) = &record.payload else {
                    error!("{}: not a time offset payload", record.id);
                    continue;
                };
                let t = query.at(record.time_scale())?;
                if let Some(residual) = offset.conversion_residual(from, to, t) {
                    trace!("{}-{} @ {}: {}", from, to, when, residual);
                    return Ok(residual);
                }
            }
        }
        Err(Error::NoTimeOffset { from, to })
    }

    /// Health of this satellite at `when`, from health messages
    pub fn get_health(
        &self,
        sat: &SatId,
        when: &NavTime,
        order: SearchOrder,
    ) -> Result<Option<Health>, Error> {
        let id = NavMessageID::new(NavMessageType::Health, *sat);
        let found = self.find(
            &id,
            when,
            SvHealthFilter::Any,
            ValidityFilter::ValidOnly,
            order,
        )?;
        Ok(found.map(|record| record.health()))
    }

    /// Klobuchar slant ionospheric delay (m) on given carrier, along the
    /// line of sight between two ECEF positions (m).
    /// The model broadcast by the system of `sat` is preferred, any other
    /// model serves as fallback.
    pub fn get_iono_corr(
        &self,
        sat: &SatId,
        when: &NavTime,
        rx_ecef: &Vector3<f64>,
        sv_ecef: &Vector3<f64>,
        carrier: CarrierBand,
    ) -> Result<Option<f64>, Error> {
        let mut templates = vec![SatId::any()];
        if let Wild::Is(system) = sat.system {
            templates.insert(0, SatId::any_of(system));
        }
        for template in templates {
            let id = NavMessageID::new(NavMessageType::Iono, template);
            let Some(record) = self.find(
                &id,
                when,
                SvHealthFilter::Any,
                ValidityFilter::ValidOnly,
                SearchOrder::User,
            )?
            else {
                continue;
            };
            let NavPayload::Iono(model) = &record.payload else {
                continue;
            };
            let t = self.convert_time(when, record.time_scale())?;
            let los = LookAngles::new(rx_ecef, sv_ecef);
            let delay = model.meters_delay(
                t,
                los.elevation.to_radians(),
                los.azimuth.to_radians(),
                los.rx_latitude,
                los.rx_longitude,
                carrier,
            );
            return Ok(Some(delay));
        }
        Ok(None)
    }

    /// Inter signal correction (s) for the satellite and signal
    /// described by `id`. A wildcard carrier stands for L1 (E1, B1).
    pub fn get_isc(&self, id: &NavMessageID, when: &NavTime) -> Result<Option<f64>, Error> {
        let carrier = id.obs.carrier.get().unwrap_or(CarrierBand::L1);
        // the signal only selects the correction, not the record
        let mut template = id.with_message(NavMessageType::Isc);
        template.obs = Default::default();
        let found = self.find(
            &template,
            when,
            SvHealthFilter::Any,
            ValidityFilter::ValidOnly,
            SearchOrder::User,
        )?;
        Ok(found.and_then(|record| match &record.payload {
            NavPayload::Isc(isc) => Some(isc.correction(carrier)),
            _ => None,
        }))
    }

    /// Satellites with data, in any factory
    pub fn index_set(&self, system: Option<Constellation>) -> BTreeSet<SatId> {
        self.factories
            .iter()
            .flat_map(|factory| factory.index_set(system))
            .collect()
    }

    /// Earliest record time stamp
    pub fn initial_time(&self) -> Option<Epoch> {
        self.factories
            .iter()
            .filter_map(|factory| factory.initial_time())
            .min()
    }

    /// Latest record time stamp
    pub fn final_time(&self) -> Option<Epoch> {
        self.factories
            .iter()
            .filter_map(|factory| factory.final_time())
            .max()
    }

    /// Drops every record whose time stamp lies outside [from, to]
    pub fn edit(&mut self, from: Epoch, to: Epoch) {
        for factory in self.factories.iter_mut() {
            factory.edit(from, to);
        }
    }

    /// Drops every record. Factories remain registered.
    pub fn clear(&mut self) {
        for factory in self.factories.iter_mut() {
            factory.clear();
        }
    }

    /// Describes every record, factory after factory
    pub fn dump(&self, w: &mut dyn Write, detail: DumpDetail) -> std::io::Result<()> {
        for factory in self.factories.iter() {
            factory.dump(w, detail)?;
        }
        Ok(())
    }

    /// Total number of records
    pub fn len(&self) -> usize {
        self.factories.iter().map(|factory| factory.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TimeOffsetSource for NavLibrary {
    fn time_offset(
        &self,
        from: TimeScale,
        to: TimeScale,
        when: &NavTime,
    ) -> Result<Duration, Error> {
        self.get_offset(from, to, when)
    }
}
