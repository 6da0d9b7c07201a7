#[cfg(test)]
mod test {
    use crate::prelude::*;
    use crate::tests::toolkit::*;
    use crate::time::calendar;

    /// GPUT (a0, a1)
    const GPUT: (f64, f64) = (-3.7252902985E-09, -1.065814104E-14);

    #[test]
    fn broadcast_offsets() {
        let library = library(&[NAV_V3]);
        let t = gpst(2021, 1, 1, 12, 0, 0);
        let when = NavTime::new(t);

        let dt = (t - gpst(2020, 12, 31, 16, 38, 24)).to_seconds();
        let residual = GPUT.0 + GPUT.1 * dt;

        let offset = |from: TimeScale, to: TimeScale| library.get_offset(from, to, &when);

        let forward = offset(TimeScale::GPST, TimeScale::UTC).unwrap();
        assert!(
            (forward.to_seconds() + residual).abs() < 1.0E-9,
            "GPST-UTC residual {}",
            forward
        );

        // swapped pair
        let backward = offset(TimeScale::UTC, TimeScale::GPST).unwrap();
        assert!((forward + backward).to_seconds().abs() <= 1.0E-9);

        assert!(offset(TimeScale::GST, TimeScale::GPST).is_ok());
        assert!(offset(TimeScale::GPST, TimeScale::GST).is_ok());
        assert!(offset(TimeScale::GST, TimeScale::UTC).is_ok());

        assert_eq!(
            offset(TimeScale::BDT, TimeScale::BDT).unwrap(),
            Duration::ZERO
        );
        assert!(matches!(
            offset(TimeScale::BDT, TimeScale::UTC),
            Err(Error::NoTimeOffset {
                from: TimeScale::BDT,
                to: TimeScale::UTC
            })
        ));
    }

    #[test]
    fn converter_round_trips() {
        let t = gpst(2021, 1, 1, 12, 0, 0);

        let mut library = library(&[NAV_V3]);
        assert_eq!(library.time_converter().map(|c| c.name()), Some("basic"));

        for converter in ["basic", "navigation"] {
            if converter == "navigation" {
                library.set_time_converter(Box::<NavTimeSystemConverter>::default());
            }
            assert_eq!(library.time_converter().map(|c| c.name()), Some(converter));

            for target in [TimeScale::UTC, TimeScale::GST] {
                let converted = library.convert_time(&NavTime::new(t), target).unwrap();
                assert_eq!(converted.time_scale, target);

                let back = library
                    .convert_time(&NavTime::new(converted), TimeScale::GPST)
                    .unwrap();
                assert!(
                    (back - t).abs().to_seconds() <= 1.0E-9,
                    "{} round trip through {}: {}",
                    converter,
                    target,
                    back - t
                );
            }
        }

        // residual on top of the nominal conversion
        let nominal = t.to_time_scale(TimeScale::UTC);
        let converted = library
            .convert_time(&NavTime::new(t), TimeScale::UTC)
            .unwrap();
        let expected = library
            .get_offset(TimeScale::GPST, TimeScale::UTC, &NavTime::new(t))
            .unwrap();
        assert_eq!(converted - nominal, expected);
        assert_ne!(expected, Duration::ZERO);
    }

    #[test]
    fn navigation_converter_requires_data() {
        let mut library = library(&[NAV_V2]);
        library.set_time_converter(Box::<NavTimeSystemConverter>::default());

        let t = NavTime::new(gpst(2015, 7, 19, 0, 15, 0));
        // DELTA-UTC only describes GPST-UTC
        assert!(library.convert_time(&t, TimeScale::UTC).is_ok());
        assert!(matches!(
            library.convert_time(&t, TimeScale::GST),
            Err(Error::NoTimeOffset { .. })
        ));

        // wildcard readings never need a converter
        let any = NavTime::any(gpst(2015, 7, 19, 0, 15, 0));
        let converted = library.convert_time(&any, TimeScale::GST).unwrap();
        assert_eq!(converted.time_scale, TimeScale::GST);
        assert_eq!(
            calendar(converted),
            calendar(gpst(2015, 7, 19, 0, 15, 0))
        );
    }
}
