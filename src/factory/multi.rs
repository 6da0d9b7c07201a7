use std::{
    collections::BTreeSet,
    io::{BufRead, Cursor, Read, Write},
    path::Path,
    sync::Arc,
};

use hifitime::{Epoch, TimeScale};

use gnss::prelude::Constellation;

use crate::{
    factory::{
        rinex::RinexNavDecoder, yuma::YumaDecoder, BufferedReader, NavDataFactory, NavDataSource,
        NavDataStore, Search,
    },
    message::{NavMessageID, NavMessageType, SatId},
    navigation::{DumpDetail, NavData, SearchOrder, SvHealthFilter, ValidityFilter},
    time::QueryTime,
    Error,
};

/// [MultiFormatNavDataFactory] identifies the format of every data source
/// it is handed, by content, and retains all decoded records in a single store.
pub struct MultiFormatNavDataFactory {
    /// Registered decoders, by order of priority
    sources: Vec<Box<dyn NavDataSource>>,
    store: NavDataStore,
}

impl Default for MultiFormatNavDataFactory {
    /// Builds a factory supporting NAV RINEX then Yuma
    fn default() -> Self {
        let sources: Vec<Box<dyn NavDataSource>> = vec![
            Box::<RinexNavDecoder>::default(),
            Box::<YumaDecoder>::default(),
        ];
        Self {
            sources,
            store: NavDataStore::default(),
        }
    }
}

impl std::fmt::Debug for MultiFormatNavDataFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("MultiFormatNavDataFactory")
            .field(
                "sources",
                &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("records", &self.store.len())
            .finish()
    }
}

impl MultiFormatNavDataFactory {
    /// Factory without any decoder
    pub fn empty() -> Self {
        Self {
            sources: Vec::new(),
            store: NavDataStore::default(),
        }
    }

    /// Registers a new decoder, with lowest priority
    pub fn add_source(&mut self, source: Box<dyn NavDataSource>) {
        self.sources.push(source);
    }

    /// Registered decoder names, by order of priority
    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Constellations this factory holds data for
    pub fn systems(&self) -> Vec<Constellation> {
        self.store.systems()
    }

    fn load(&mut self, name: &str, content: &[u8]) -> Result<usize, Error> {
        let source = self
            .sources
            .iter()
            .find(|source| source.recognize(&mut Cursor::new(content)))
            .ok_or_else(|| Error::UnrecognizedSource(name.to_string()))?;

        debug!("{}: identified as {}", name, source.name());

        // partial content is never committed
        let mut decoded = Vec::<NavData>::new();
        source.decode(name, &mut Cursor::new(content), &mut |data| {
            decoded.push(data)
        })?;

        let total = decoded.len();
        for data in decoded {
            self.store.insert(data);
        }

        debug!("{}: {} records", name, total);
        Ok(total)
    }
}

impl NavDataFactory for MultiFormatNavDataFactory {
    fn name(&self) -> &str {
        "multi format"
    }

    fn add_data_source(&mut self, path: &Path) -> Result<usize, Error> {
        let mut reader = BufferedReader::new(path)?;
        let name = path.to_string_lossy().to_string();
        self.add_reader(&name, &mut reader)
    }

    fn add_reader(&mut self, name: &str, reader: &mut dyn BufRead) -> Result<usize, Error> {
        let mut content = Vec::<u8>::new();
        reader.read_to_end(&mut content)?;
        self.load(name, &content)
    }

    fn find(&self, search: &Search, when: &QueryTime) -> Result<Option<Arc<NavData>>, Error> {
        self.store.find_by(search, when, &|_| true)
    }

    fn time_offset(
        &self,
        from: TimeScale,
        to: TimeScale,
        when: &QueryTime,
        order: SearchOrder,
    ) -> Result<Option<Arc<NavData>>, Error> {
        let id = NavMessageID::new(NavMessageType::TimeOffset, SatId::any());
        let search = Search {
            id: &id,
            health: SvHealthFilter::Any,
            validity: ValidityFilter::Any,
            order,
        };
        self.store.time_offset(&search, from, to, when)
    }

    fn set_type_filter(&mut self, filter: &BTreeSet<NavMessageType>) {
        self.store.set_type_filter(filter);
    }

    fn index_set(&self, system: Option<Constellation>) -> BTreeSet<SatId> {
        self.store.index_set(system)
    }

    fn initial_time(&self) -> Option<Epoch> {
        self.store.initial_time()
    }

    fn final_time(&self) -> Option<Epoch> {
        self.store.final_time()
    }

    fn edit(&mut self, from: Epoch, to: Epoch) {
        self.store.edit(from, to);
    }

    fn clear(&mut self) {
        self.store.clear();
    }

    fn dump(&self, w: &mut dyn Write, detail: DumpDetail) -> std::io::Result<()> {
        self.store.dump(w, detail)
    }

    fn len(&self) -> usize {
        self.store.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::factory::ParsingError;

    #[test]
    fn unrecognized_content() {
        let mut factory = MultiFormatNavDataFactory::default();
        assert_eq!(factory.source_names(), vec!["RINEX NAV", "Yuma"]);

        let result = factory.add_reader("garbage", &mut Cursor::new("hello world\n"));
        assert!(matches!(result, Err(Error::UnrecognizedSource(name)) if name == "garbage"));
        assert!(factory.is_empty());

        let mut empty = MultiFormatNavDataFactory::empty();
        let page = "******** Week 829 almanac for PRN-01 ********\n";
        let result = empty.add_reader("yuma", &mut Cursor::new(page));
        assert!(matches!(result, Err(Error::UnrecognizedSource(_))));

        empty.add_source(Box::<YumaDecoder>::default());
        // recognized, but truncated
        let result = empty.add_reader("yuma", &mut Cursor::new(page));
        assert!(matches!(
            result,
            Err(Error::Parsing {
                reason: ParsingError::MissingLabel(_),
                ..
            })
        ));
        assert!(empty.is_empty());
    }
}
