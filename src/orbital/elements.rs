use std::f64::consts::TAU;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::physics::gravity::{MU_EARTH, R_EARTH_ECI};

// Relative thresholds below which the node / periapsis direction is treated
// as undefined. Far below any eccentricity or inclination a caller can
// meaningfully propagate, but they stop a division by a zero-length vector.
const NODE_EPS: f64 = 1e-12;
const ECC_EPS: f64 = 1e-12;

/// Classical Keplerian orbital elements.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KeplerianElements {
    pub sma: f64,       // semi-major axis, m
    pub ecc: f64,       // eccentricity (elliptical: 0 <= e < 1)
    pub inc: f64,       // inclination, rad
    pub raan: f64,      // right ascension of ascending node, rad
    pub argp: f64,      // argument of periapsis, rad
    pub true_anom: f64, // true anomaly, rad
}

impl KeplerianElements {
    /// Convert Keplerian elements to an ECI state vector (position, velocity).
    pub fn to_state_vector(&self) -> Result<(Vector3<f64>, Vector3<f64>), SimError> {
        self.to_state_vector_mu(MU_EARTH)
    }

    /// Convert with an explicit gravitational parameter.
    ///
    /// Defined for the elliptical domain only: 0 ≤ e < 1, a > 0.
    pub fn to_state_vector_mu(&self, mu: f64) -> Result<(Vector3<f64>, Vector3<f64>), SimError> {
        if !self.ecc.is_finite() || !(0.0..1.0).contains(&self.ecc) {
            return Err(SimError::EccentricityOutOfRange { ecc: self.ecc });
        }
        if !self.sma.is_finite() || self.sma <= 0.0 {
            return Err(SimError::InvalidSemiMajorAxis { sma: self.sma });
        }

        let e = self.ecc;
        let nu = self.true_anom;

        // Eccentric anomaly from the half-angle relation. The atan2 form is
        // continuous through nu = pi, where the tan form has a branch cut.
        let ecc_anom = 2.0 * f64::atan2(
            (1.0 - e).sqrt() * (nu / 2.0).sin(),
            (1.0 + e).sqrt() * (nu / 2.0).cos(),
        );

        // In-plane position from the eccentric anomaly, velocity from the
        // semi-latus rectum p = a(1 - e^2).
        let b = self.sma * (1.0 - e * e).sqrt();
        let r_pqw = Vector3::new(self.sma * (ecc_anom.cos() - e), b * ecc_anom.sin(), 0.0);

        let v_scale = (mu / (self.sma * (1.0 - e * e))).sqrt();
        let v_pqw = Vector3::new(-v_scale * nu.sin(), v_scale * (e + nu.cos()), 0.0);

        // 3-1-3 rotation from the perifocal to the inertial frame
        let cos_raan = self.raan.cos();
        let sin_raan = self.raan.sin();
        let cos_argp = self.argp.cos();
        let sin_argp = self.argp.sin();
        let cos_inc = self.inc.cos();
        let sin_inc = self.inc.sin();

        let rot = |v: &Vector3<f64>| -> Vector3<f64> {
            Vector3::new(
                (cos_raan * cos_argp - sin_raan * sin_argp * cos_inc) * v.x
                    + (-cos_raan * sin_argp - sin_raan * cos_argp * cos_inc) * v.y,
                (sin_raan * cos_argp + cos_raan * sin_argp * cos_inc) * v.x
                    + (-sin_raan * sin_argp + cos_raan * cos_argp * cos_inc) * v.y,
                (sin_argp * sin_inc) * v.x + (cos_argp * sin_inc) * v.y,
            )
        };

        Ok((rot(&r_pqw), rot(&v_pqw)))
    }

    /// Convert an ECI state vector to Keplerian elements.
    pub fn from_state_vector(
        pos: &Vector3<f64>,
        vel: &Vector3<f64>,
    ) -> Result<Self, SimError> {
        Self::from_state_vector_mu(pos, vel, MU_EARTH)
    }

    /// Convert with an explicit gravitational parameter.
    ///
    /// Equatorial (i = 0) and circular (e = 0) configurations leave the node
    /// or periapsis direction undefined and are rejected rather than left to
    /// divide by a zero-length vector; e ≥ 1 is outside the elliptical
    /// domain.
    pub fn from_state_vector_mu(
        pos: &Vector3<f64>,
        vel: &Vector3<f64>,
        mu: f64,
    ) -> Result<Self, SimError> {
        let r = pos.norm();

        // First integrals: angular momentum and the Laplace vector.
        let c = pos.cross(vel);
        let f = vel.cross(&c) - mu / r * pos;

        let ecc = f.norm() / mu;
        if ecc >= 1.0 {
            return Err(SimError::EccentricityOutOfRange { ecc });
        }
        if ecc < ECC_EPS {
            return Err(SimError::CircularOrbit);
        }

        // Node direction l and its in-plane complement m.
        let node = Vector3::z().cross(&c);
        if node.norm() <= NODE_EPS * c.norm() {
            return Err(SimError::EquatorialOrbit);
        }
        let l = node / node.norm();
        let m = c.cross(&l) / c.norm(); // c is orthogonal to l

        let inc = (c.z / c.norm()).clamp(-1.0, 1.0).acos();
        let raan = f64::atan2(l.y, l.x);
        let argp = f64::atan2(f.dot(&m), f.dot(&l));
        let mut true_anom = f64::atan2(pos.dot(&m), pos.dot(&l)) - argp;
        if true_anom < 0.0 {
            true_anom += TAU;
        }
        let sma = c.dot(&c) / (mu * (1.0 - ecc * ecc));

        Ok(KeplerianElements {
            sma,
            ecc,
            inc,
            raan,
            argp,
            true_anom,
        })
    }

    /// Orbital period for an elliptical orbit (s).
    pub fn period(&self) -> f64 {
        self.period_mu(MU_EARTH)
    }

    pub fn period_mu(&self, mu: f64) -> f64 {
        TAU * (self.sma.powi(3) / mu).sqrt()
    }

    /// Create a near-circular orbit at given altitude and inclination.
    pub fn circular(altitude: f64, inc: f64) -> Self {
        KeplerianElements {
            sma: R_EARTH_ECI + altitude,
            ecc: 1e-6,
            inc,
            raan: 0.0,
            argp: 0.0,
            true_anom: 0.0,
        }
    }
}

/// Normalize an angle into [0, 2π).
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle % TAU;
    if a < 0.0 {
        a + TAU
    } else {
        a
    }
}
