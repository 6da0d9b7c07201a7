//! Benchmarking data loading and record searches
extern crate criterion;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rand::{rngs::StdRng, Rng, SeedableRng};

use std::path::Path;

use navlib::prelude::*;

const NAV_V2: &str = "test_resources/NAV/V2/brdc2000.15n";
const NAV_V3: &str = "test_resources/NAV/V3/MIXED00XXX_R_20210010000_01D_MN.rnx";

fn load(paths: &[&str]) -> NavLibrary {
    let mut library = NavLibrary::default();
    library.add_factory(Box::<MultiFormatNavDataFactory>::default());
    for path in paths {
        library.add_data_source(Path::new(path)).unwrap();
    }
    library
}

fn benchmark(c: &mut Criterion) {
    let mut loading_grp = c.benchmark_group("loading");

    loading_grp.bench_function("NAV/V2", |b| {
        b.iter(|| load(&[NAV_V2]));
    });

    loading_grp.bench_function("NAV/V3", |b| {
        b.iter(|| load(&[NAV_V3]));
    });

    loading_grp.finish();

    let library = load(&[NAV_V2]);
    let t0 = Epoch::from_gregorian(2015, 7, 19, 0, 0, 0, 0, TimeScale::GPST);
    let id = NavMessageID::new(NavMessageType::Ephemeris, SatId::new(Constellation::GPS, 13));

    // reproducible query times, over the first 4 hours
    let mut rng = StdRng::seed_from_u64(1854);
    let times = (0..256)
        .map(|_| NavTime::new(t0 + rng.gen_range(0.0..14400.0) * Unit::Second))
        .collect::<Vec<_>>();

    let mut search_grp = c.benchmark_group("search");

    for (name, order) in [("user", SearchOrder::User), ("nearest", SearchOrder::Nearest)] {
        search_grp.bench_function(name, |b| {
            b.iter(|| {
                for t in times.iter() {
                    let _ = black_box(library.find(
                        &id,
                        t,
                        SvHealthFilter::Any,
                        ValidityFilter::ValidOnly,
                        order,
                    ));
                }
            })
        });
    }

    search_grp.bench_function("xvt", |b| {
        b.iter(|| {
            for t in times.iter() {
                let _ = black_box(library.get_xvt(
                    &id,
                    t,
                    SvHealthFilter::Any,
                    ValidityFilter::ValidOnly,
                    SearchOrder::User,
                ));
            }
        })
    });

    // every query requires a time system conversion
    let utc = times
        .iter()
        .map(|t| NavTime::new(t.epoch.to_time_scale(TimeScale::UTC)))
        .collect::<Vec<_>>();

    search_grp.bench_function("user/utc", |b| {
        b.iter(|| {
            for t in utc.iter() {
                let _ = black_box(library.find(
                    &id,
                    t,
                    SvHealthFilter::Any,
                    ValidityFilter::ValidOnly,
                    SearchOrder::User,
                ));
            }
        })
    });

    search_grp.finish();
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
