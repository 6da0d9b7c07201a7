//! const value of Gnss

use gnss::prelude::Constellation;

pub(crate) struct GM;

impl GM {
    pub const GPS: f64 = 3.9860050E14;
    pub const BDS: f64 = 3.986004418E14;
    pub const GLO: f64 = 3.9860044E14;
    pub const GAL: f64 = 3.986004418E14;
}

pub(crate) struct Omega;

impl Omega {
    pub const GPS: f64 = 7.2921151467E-5;
    pub const BDS: f64 = 7.292115E-5;
    pub const GLO: f64 = 7.292115E-5;
    pub const GAL: f64 = 7.2921151467E-5;
}

/// - 2 * sqrt(gm) / c / c
pub(crate) struct DtrF;

impl DtrF {
    pub const GPS: f64 = -0.000000000444280763339306;
    pub const BDS: f64 = -0.00000000044428073090439775;
    pub const GAL: f64 = -0.00000000044428073090439775;
}

/// PZ-90 constants for the GLONASS state vector integration
pub(crate) struct Pz90;

impl Pz90 {
    /// Equatorial radius (m)
    pub const AE: f64 = 6378136.0;
    /// Second zonal harmonic
    pub const J2: f64 = 1.0826257E-3;
}

/// Const values used in this crate
pub(crate) struct Constants;

impl Constants {
    /// Maximal iterations of the Kepler equation solver
    pub const MAX_KEPLER_ITER: usize = 30;

    /// Speed of light in vacuum (m.s⁻¹)
    pub const SPEED_OF_LIGHT: f64 = 299792458.0;

    // earth
    pub const fn gm(c: Constellation) -> f64 {
        match c {
            Constellation::BeiDou => GM::BDS,
            Constellation::Galileo => GM::GAL,
            Constellation::Glonass => GM::GLO,
            _ => GM::GPS,
        }
    }

    /// Earth rotation rate
    pub const fn omega(c: Constellation) -> f64 {
        match c {
            Constellation::BeiDou => Omega::BDS,
            Constellation::Galileo => Omega::GAL,
            Constellation::Glonass => Omega::GLO,
            _ => Omega::GPS,
        }
    }

    ///  Auxiliary Quantities for Calculating Relativistic Effects in Clock Correction
    pub const fn dtr_f(c: Constellation) -> f64 {
        match c {
            Constellation::BeiDou => DtrF::BDS,
            Constellation::Galileo => DtrF::GAL,
            _ => DtrF::GPS,
        }
    }
}
