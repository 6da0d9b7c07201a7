use std::{
    collections::{BTreeMap, BTreeSet},
    io::Write,
    sync::Arc,
};

use hifitime::{Duration, Epoch, TimeScale};
use itertools::Itertools;
use strum::IntoEnumIterator;

use gnss::prelude::Constellation;

use crate::{
    factory::Search,
    message::{NavMessageType, SatId},
    navigation::{distance, DumpDetail, NavData, NavPayload, SearchOrder},
    time::QueryTime,
    Error,
};

#[derive(Debug, Clone)]
struct Entry {
    /// insertion counter
    seq: u64,
    data: Arc<NavData>,
}

/// Current best candidate of a search
struct Best<'a> {
    entry: &'a Entry,
    distance: Duration,
}

/// In memory, time sorted record store.
/// Records are indexed by message type, then by subject satellite,
/// and sorted by time stamp (in insertion order for identical time stamps).
#[derive(Debug, Clone)]
pub struct NavDataStore {
    data: BTreeMap<NavMessageType, BTreeMap<SatId, Vec<Entry>>>,
    filter: BTreeSet<NavMessageType>,
    seq: u64,
}

impl Default for NavDataStore {
    fn default() -> Self {
        Self {
            data: Default::default(),
            filter: NavMessageType::iter()
                .filter(|t| *t != NavMessageType::Unknown)
                .collect(),
            seq: 0,
        }
    }
}

impl NavDataStore {
    /// Inserts a new record
    pub fn insert(&mut self, data: NavData) {
        let entries = self
            .data
            .entry(data.id.message)
            .or_default()
            .entry(data.id.sat)
            .or_default();
        let pos = entries.partition_point(|e| e.data.time_stamp <= data.time_stamp);
        entries.insert(
            pos,
            Entry {
                seq: self.seq,
                data: Arc::new(data),
            },
        );
        self.seq += 1;
    }

    pub fn set_type_filter(&mut self, filter: &BTreeSet<NavMessageType>) {
        self.filter = filter.clone();
    }

    fn type_enabled(&self, t: NavMessageType) -> bool {
        self.filter.contains(&t)
    }

    /// Best record matching `search` and `accept`
    pub fn find_by(
        &self,
        search: &Search,
        when: &QueryTime,
        accept: &dyn Fn(&NavData) -> bool,
    ) -> Result<Option<Arc<NavData>>, Error> {
        let mut best: Option<Best> = None;

        for (message, sats) in self.data.iter() {
            if !self.type_enabled(*message) || !search.id.message.matches(message) {
                continue;
            }
            for (sat, entries) in sats.iter() {
                if !search.id.sat.matches(sat) {
                    continue;
                }
                for entry in entries.iter() {
                    let record = &entry.data;
                    if !search.id.matches(&record.id) || !accept(record) {
                        continue;
                    }
                    if !search.health.accepts(record.health()) {
                        continue;
                    }
                    let t = when.at(record.time_scale())?;
                    if !search.validity.accepts(record.is_valid(t)) {
                        continue;
                    }
                    let candidate = match search.order {
                        SearchOrder::User => {
                            if record.user_time() > t {
                                continue;
                            }
                            Best {
                                entry,
                                distance: t - record.user_time(),
                            }
                        },
                        SearchOrder::Nearest => Best {
                            entry,
                            distance: distance(record.time_stamp, t),
                        },
                    };
                    if best
                        .as_ref()
                        .map_or(true, |best| candidate.is_better(best, search.order))
                    {
                        best = Some(candidate);
                    }
                }
            }
        }
        Ok(best.map(|best| best.entry.data.clone()))
    }

    /// Best time offset record describing `from` - `to`
    pub fn time_offset(
        &self,
        search: &Search,
        from: TimeScale,
        to: TimeScale,
        when: &QueryTime,
    ) -> Result<Option<Arc<NavData>>, Error> {
        self.find_by(search, when, &|record| match &record.payload {
            NavPayload::TimeOffset(offset) => offset.lhs == from && offset.rhs == to,
            _ => false,
        })
    }

    /// Every satellite with data, all message types included
    pub fn index_set(&self, system: Option<Constellation>) -> BTreeSet<SatId> {
        let system = system.map_or(SatId::any(), SatId::any_of);
        self.data
            .values()
            .flat_map(|sats| sats.keys())
            .filter(|sat| sat.is_concrete() && system.matches(sat))
            .copied()
            .collect()
    }

    fn records(&self) -> impl Iterator<Item = &Arc<NavData>> + '_ {
        self.data
            .values()
            .flat_map(|sats| sats.values())
            .flat_map(|entries| entries.iter().map(|e| &e.data))
    }

    pub fn initial_time(&self) -> Option<Epoch> {
        self.records().map(|record| record.time_stamp).min()
    }

    pub fn final_time(&self) -> Option<Epoch> {
        self.records().map(|record| record.time_stamp).max()
    }

    pub fn edit(&mut self, from: Epoch, to: Epoch) {
        for sats in self.data.values_mut() {
            for entries in sats.values_mut() {
                entries.retain(|e| e.data.time_stamp >= from && e.data.time_stamp <= to);
            }
            sats.retain(|_, entries| !entries.is_empty());
        }
        self.data.retain(|_, sats| !sats.is_empty());
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Describes every record the type filter enables
    pub fn dump(&self, w: &mut dyn Write, detail: DumpDetail) -> std::io::Result<()> {
        for record in self
            .records()
            .filter(|record| self.type_enabled(record.id.message))
        {
            record.dump(w, detail)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records().count()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Constellations with data
    pub fn systems(&self) -> Vec<Constellation> {
        self.index_set(None)
            .iter()
            .filter_map(|sat| sat.system.get())
            .unique()
            .collect()
    }
}

impl Best<'_> {
    /// True if self should replace `other`
    fn is_better(&self, other: &Self, order: SearchOrder) -> bool {
        if self.distance != other.distance {
            return self.distance < other.distance;
        }
        if order == SearchOrder::Nearest {
            let (t, other_t) = (self.entry.data.time_stamp, other.entry.data.time_stamp);
            if t != other_t {
                return t < other_t;
            }
        }
        self.entry.seq < other.entry.seq
    }
}
