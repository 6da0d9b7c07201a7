//! Time system conversion strategies
use hifitime::{Duration, TimeScale};

use crate::{time::NavTime, Error};

/// [TimeOffsetSource] is implemented by anything able to resolve
/// the residual offset between two time systems, for example a
/// [crate::library::NavLibrary] holding broadcast time offset messages.
pub trait TimeOffsetSource {
    /// Returns the residual offset to add to the nominal
    /// `from` to `to` conversion, at `when`.
    fn time_offset(&self, from: TimeScale, to: TimeScale, when: &NavTime)
        -> Result<Duration, Error>;
}

/// [TimeSystemConverter] is the strategy invoked whenever a time stamp
/// must be expressed in another time system. hifitime performs the nominal
/// conversion (leap seconds, fixed GNSS offsets), the converter returns
/// the residual to add on top of it.
pub trait TimeSystemConverter {
    /// Strategy name, for logging purposes
    fn name(&self) -> &'static str;

    /// Residual offset for `from` to `to` conversion at `when`.
    /// `source` is offered by the caller for strategies that need data.
    fn offset(
        &self,
        source: &dyn TimeOffsetSource,
        from: TimeScale,
        to: TimeScale,
        when: &NavTime,
    ) -> Result<Duration, Error>;
}

/// [BasicTimeSystemConverter] only relies on constants:
/// leap second table and nominal GNSS time scale offsets.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicTimeSystemConverter {}

impl TimeSystemConverter for BasicTimeSystemConverter {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn offset(
        &self,
        _: &dyn TimeOffsetSource,
        _: TimeScale,
        _: TimeScale,
        _: &NavTime,
    ) -> Result<Duration, Error> {
        Ok(Duration::ZERO)
    }
}

/// [NavTimeSystemConverter] resolves offsets from broadcast
/// navigation messages. The matching data must be loaded beforehand.
#[derive(Debug, Default, Clone, Copy)]
pub struct NavTimeSystemConverter {}

impl TimeSystemConverter for NavTimeSystemConverter {
    fn name(&self) -> &'static str {
        "navigation"
    }

    fn offset(
        &self,
        source: &dyn TimeOffsetSource,
        from: TimeScale,
        to: TimeScale,
        when: &NavTime,
    ) -> Result<Duration, Error> {
        if from == to {
            return Ok(Duration::ZERO);
        }
        // offset messages are looked up in the wildcard time system,
        // which never requires any conversion
        source.time_offset(from, to, &when.as_any())
    }
}
