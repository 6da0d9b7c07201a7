//! Keplerian orbit propagation (broadcast ephemeris and almanac)
use nalgebra::{Matrix3, Rotation3, SMatrix, Vector3, Vector4};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use gnss::prelude::Constellation;

use crate::constants::Constants;

/// Broadcast Keplerian elements and their harmonic perturbations.
/// Angles are expressed in radians.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeplerOrbit {
    /// Time of ephemeris, in seconds of week
    pub toe: f64,
    /// Square root of the semi major axis (m^1/2)
    pub sqrt_a: f64,
    /// Eccentricity (n.a)
    pub e: f64,
    /// Inclination angle at reference time
    pub i_0: f64,
    /// Longitude of ascending node at weekly epoch
    pub omega_0: f64,
    /// Argument of perigee
    pub omega: f64,
    /// Mean anomaly at reference time
    pub m_0: f64,
    /// Mean motion difference from computed value (rad.s⁻¹)
    pub dn: f64,
    /// Inclination rate of change (rad.s⁻¹)
    pub i_dot: f64,
    /// Right ascension rate of change (rad.s⁻¹)
    pub omega_dot: f64,
    /// Amplitude of cosine harmonic correction term of the argument of latitude
    pub cuc: f64,
    /// Amplitude of sine harmonic correction term of the argument of latitude
    pub cus: f64,
    /// Amplitude of cosine harmonic correction term of the orbit radius (m)
    pub crc: f64,
    /// Amplitude of sine harmonic correction term of the orbit radius (m)
    pub crs: f64,
    /// Amplitude of cosine harmonic correction term of the inclination angle
    pub cic: f64,
    /// Amplitude of sine harmonic correction term of the inclination angle
    pub cis: f64,
    /// Semi major axis rate of change (CNAV, m.s⁻¹)
    pub a_dot: Option<f64>,
}

/// Orbital state resolved at t_k seconds from ToE
#[derive(Debug, Clone, Copy)]
pub(crate) struct Helper {
    geo: bool,
    omega_e: f64,
    t_k: f64,
    u_k: f64,
    r_k: f64,
    i_k: f64,
    omega_k: f64,
    fd_u_k: f64,
    fd_r_k: f64,
    fd_i_k: f64,
    fd_omega_k: f64,
    /// Relativistic clock correction (s)
    pub dtr: f64,
    /// Relativistic clock correction drift (s.s⁻¹)
    pub fd_dtr: f64,
    /// position in the orbital plane (m)
    r_sv: (f64, f64),
}

impl KeplerOrbit {
    /// Semi major axis (m) at t_k seconds from ToE
    pub fn semi_major_axis(&self, t_k: f64) -> f64 {
        self.sqrt_a.powi(2) + self.a_dot.unwrap_or(0.0) * t_k
    }

    /// Solves the Kepler equation and the perturbation terms at t_k
    /// seconds from ToE. `geo` selects the BeiDou GEO variant.
    pub(crate) fn helper(&self, c: Constellation, geo: bool, t_k: f64) -> Helper {
        let gm_m3_s2 = Constants::gm(c);
        let omega_e = Constants::omega(c);
        let dtr_f = Constants::dtr_f(c);

        let a = self.semi_major_axis(t_k);
        let n0 = (gm_m3_s2 / a.powi(3)).sqrt();
        let n = n0 + self.dn;
        let m_k = self.m_0 + n * t_k;

        let mut e_k = m_k;
        let mut converged = false;
        for _ in 0..Constants::MAX_KEPLER_ITER {
            let next = m_k + self.e * e_k.sin();
            let delta = (next - e_k).abs();
            e_k = next;
            if delta < 1.0E-12 {
                converged = true;
                break;
            }
        }
        if !converged {
            warn!("kepler equation did not converge (e={})", self.e);
        }

        let (sin_e_k, cos_e_k) = e_k.sin_cos();
        let sqrt_1_e2 = (1.0 - self.e.powi(2)).sqrt();
        let v_k = (sqrt_1_e2 * sin_e_k).atan2(cos_e_k - self.e);

        let phi_k = v_k + self.omega;
        let (x2_sin_phi_k, x2_cos_phi_k) = (2.0 * phi_k).sin_cos();

        let du_k = self.cus * x2_sin_phi_k + self.cuc * x2_cos_phi_k;
        let dr_k = self.crs * x2_sin_phi_k + self.crc * x2_cos_phi_k;
        let di_k = self.cis * x2_sin_phi_k + self.cic * x2_cos_phi_k;

        let u_k = phi_k + du_k;
        let r_k = a * (1.0 - self.e * cos_e_k) + dr_k;
        let i_k = self.i_0 + di_k + self.i_dot * t_k;

        // first derivatives
        let fd_e_k = n / (1.0 - self.e * cos_e_k);
        let fd_phi_k = fd_e_k * sqrt_1_e2 / (1.0 - self.e * cos_e_k);
        let fd_u_k = fd_phi_k * (1.0 + 2.0 * (self.cus * x2_cos_phi_k - self.cuc * x2_sin_phi_k));
        let fd_r_k = a * self.e * sin_e_k * fd_e_k
            + 2.0 * fd_phi_k * (self.crs * x2_cos_phi_k - self.crc * x2_sin_phi_k);
        let fd_i_k =
            self.i_dot + 2.0 * fd_phi_k * (self.cis * x2_cos_phi_k - self.cic * x2_sin_phi_k);

        let (omega_k, fd_omega_k) = if geo {
            // expressed in inertial axes, rotated to ECEF afterwards
            (
                self.omega_0 + self.omega_dot * t_k - omega_e * self.toe,
                self.omega_dot,
            )
        } else {
            (
                self.omega_0 + (self.omega_dot - omega_e) * t_k - omega_e * self.toe,
                self.omega_dot - omega_e,
            )
        };

        let dtr = dtr_f * self.e * self.sqrt_a * sin_e_k;
        let fd_dtr = dtr_f * self.e * self.sqrt_a * cos_e_k * fd_e_k;

        Helper {
            geo,
            omega_e,
            t_k,
            u_k,
            r_k,
            i_k,
            omega_k,
            fd_u_k,
            fd_r_k,
            fd_i_k,
            fd_omega_k,
            dtr,
            fd_dtr,
            r_sv: (r_k * u_k.cos(), r_k * u_k.sin()),
        }
    }
}

impl Helper {
    /// Orbital plane to ECEF (or inertial, for GEO) rotation
    fn orbit_to_ecef_rotation_matrix(&self) -> Rotation3<f64> {
        let rotation_x = Rotation3::from_axis_angle(&Vector3::x_axis(), self.i_k);
        let rotation_z = Rotation3::from_axis_angle(&Vector3::z_axis(), self.omega_k);
        rotation_z * rotation_x
    }

    /// BeiDou GEO: inertial to ECEF rotation
    fn geo_to_ecef_rotation_matrix(&self) -> Rotation3<f64> {
        let rotation_x = Rotation3::from_axis_angle(&Vector3::x_axis(), 5.0_f64.to_radians());
        let rotation_z = Rotation3::from_axis_angle(&Vector3::z_axis(), -self.omega_e * self.t_k);
        rotation_z * rotation_x
    }

    /// Temporal derivative of the orbital plane coordinates
    fn orbit_velocity(&self) -> (f64, f64) {
        let (sin_u_k, cos_u_k) = self.u_k.sin_cos();
        let fd_x = self.fd_r_k * cos_u_k - self.r_k * self.fd_u_k * sin_u_k;
        let fd_y = self.fd_r_k * sin_u_k + self.r_k * self.fd_u_k * cos_u_k;
        (fd_x, fd_y)
    }

    /// Position prior any GEO specific rotation
    fn plane_position(&self) -> Vector3<f64> {
        let (x, y) = self.r_sv;
        self.orbit_to_ecef_rotation_matrix() * Vector3::new(x, y, 0.0)
    }

    /// Velocity prior any GEO specific rotation
    fn plane_velocity(&self) -> Vector3<f64> {
        let (x, y) = self.r_sv;
        let (sin_omega_k, cos_omega_k) = self.omega_k.sin_cos();
        let (sin_i_k, cos_i_k) = self.i_k.sin_cos();
        let (fd_x, fd_y) = self.orbit_velocity();

        let mut fd_r = SMatrix::<f64, 3, 4>::zeros();
        fd_r[(0, 0)] = cos_omega_k;
        fd_r[(0, 1)] = -sin_omega_k * cos_i_k;
        fd_r[(0, 2)] = -(x * sin_omega_k + y * cos_omega_k * cos_i_k);
        fd_r[(0, 3)] = y * sin_omega_k * sin_i_k;
        fd_r[(1, 0)] = sin_omega_k;
        fd_r[(1, 1)] = cos_omega_k * cos_i_k;
        fd_r[(1, 2)] = x * cos_omega_k - y * sin_omega_k * cos_i_k;
        fd_r[(1, 3)] = -y * cos_omega_k * sin_i_k;
        fd_r[(2, 1)] = sin_i_k;
        fd_r[(2, 3)] = y * cos_i_k;

        fd_r * Vector4::new(fd_x, fd_y, self.fd_omega_k, self.fd_i_k)
    }

    /// ECEF position (m)
    pub fn ecef_position(&self) -> Vector3<f64> {
        if self.geo {
            self.geo_to_ecef_rotation_matrix() * self.plane_position()
        } else {
            self.plane_position()
        }
    }

    /// ECEF velocity (m.s⁻¹)
    pub fn ecef_velocity(&self) -> Vector3<f64> {
        if !self.geo {
            return self.plane_velocity();
        }
        let rotation_x = Rotation3::from_axis_angle(&Vector3::x_axis(), 5.0_f64.to_radians());
        let theta = -self.omega_e * self.t_k;
        let (sin_theta, cos_theta) = theta.sin_cos();
        // d(Rz(theta))/dt
        let fd_rz = -self.omega_e
            * Matrix3::new(
                -sin_theta, -cos_theta, 0.0, cos_theta, -sin_theta, 0.0, 0.0, 0.0, 0.0,
            );
        let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), theta);
        let rx_pos = rotation_x * self.plane_position();
        fd_rz * rx_pos + rz * (rotation_x * self.plane_velocity())
    }
}
