use nalgebra::Vector3;

use crate::error::SimError;
use crate::physics::gravity::{J2_EARTH, J3_EARTH, J4_EARTH};

// ---------------------------------------------------------------------------
// Perturbing-acceleration capability
// ---------------------------------------------------------------------------

/// An acceleration layered additively onto the point-mass term.
///
/// `t` is elapsed integration time in seconds. A provider that needs an
/// absolute epoch owns the mapping from elapsed time to that epoch; the
/// stepper only ever hands it elapsed time.
pub trait Perturbation {
    /// Perturbing acceleration (m/s²) at an inertial position (m).
    fn acceleration(&self, pos: &Vector3<f64>, t: f64) -> Result<Vector3<f64>, SimError>;
}

// ---------------------------------------------------------------------------
// Zonal-harmonics field (J2..J4)
// ---------------------------------------------------------------------------

pub const MAX_ZONAL_DEGREE: u32 = 4;

/// Axially symmetric gravity-field perturbation truncated at `degree`.
///
/// Covers the zonal terms J2 through J4; the central −μ/r² term is not
/// included here, it stays with the two-body field.
pub struct ZonalHarmonics {
    mu: f64,
    r_ref: f64,
    degree: u32,
    j2: f64,
    j3: f64,
    j4: f64,
}

impl ZonalHarmonics {
    /// Earth-valued zonal field truncated at `degree` (2..=4).
    ///
    /// An out-of-range degree is rejected here, before any propagation
    /// starts.
    pub fn new(mu: f64, r_ref: f64, degree: u32) -> Result<Self, SimError> {
        if !(2..=MAX_ZONAL_DEGREE).contains(&degree) {
            return Err(SimError::UnsupportedDegree {
                degree,
                max: MAX_ZONAL_DEGREE,
            });
        }
        Ok(Self {
            mu,
            r_ref,
            degree,
            j2: J2_EARTH,
            j3: J3_EARTH,
            j4: J4_EARTH,
        })
    }

    /// The degree-2 (J2-only) field.
    pub fn j2(mu: f64, r_ref: f64) -> Self {
        Self {
            mu,
            r_ref,
            degree: 2,
            j2: J2_EARTH,
            j3: J3_EARTH,
            j4: J4_EARTH,
        }
    }

    /// Override the zonal coefficients (non-Earth bodies).
    pub fn with_coefficients(mut self, j2: f64, j3: f64, j4: f64) -> Self {
        self.j2 = j2;
        self.j3 = j3;
        self.j4 = j4;
        self
    }

    pub fn degree(&self) -> u32 {
        self.degree
    }
}

impl Perturbation for ZonalHarmonics {
    fn acceleration(&self, pos: &Vector3<f64>, _t: f64) -> Result<Vector3<f64>, SimError> {
        let r = pos.norm();
        let r2 = r * r;
        let mu_r2 = self.mu / r2;
        let re_r = self.r_ref / r;
        let u = pos.z / r; // sin(geocentric latitude)
        let u2 = u * u;

        // J2
        let f2 = -1.5 * self.j2 * mu_r2 * re_r * re_r / r;
        let mut acc = Vector3::new(
            f2 * pos.x * (1.0 - 5.0 * u2),
            f2 * pos.y * (1.0 - 5.0 * u2),
            f2 * pos.z * (3.0 - 5.0 * u2),
        );

        // J3
        if self.degree >= 3 {
            let f3 = -2.5 * self.j3 * mu_r2 * re_r * re_r * re_r;
            acc.x += f3 * pos.x / r * u * (3.0 - 7.0 * u2);
            acc.y += f3 * pos.y / r * u * (3.0 - 7.0 * u2);
            acc.z += f3 * (6.0 * u2 - 7.0 * u2 * u2 - 0.6);
        }

        // J4
        if self.degree >= 4 {
            let f4 = 1.875 * self.j4 * mu_r2 * re_r.powi(4) / r;
            acc.x += f4 * pos.x * (1.0 - 14.0 * u2 + 21.0 * u2 * u2);
            acc.y += f4 * pos.y * (1.0 - 14.0 * u2 + 21.0 * u2 * u2);
            acc.z += f4 * pos.z * (5.0 - 70.0 / 3.0 * u2 + 21.0 * u2 * u2);
        }

        Ok(acc)
    }
}

// ---------------------------------------------------------------------------
// Adapter around an external gravity-field evaluator
// ---------------------------------------------------------------------------

type Evaluator = Box<dyn Fn(&Vector3<f64>, f64) -> Result<Vector3<f64>, String>>;

/// Wraps an opaque gravity-field model (typically a native high-order
/// spherical-harmonics library) behind the [`Perturbation`] interface.
///
/// The evaluator is called with the inertial position and the absolute
/// epoch `start_epoch + t` in seconds on the evaluator's own time scale.
/// An evaluator error fails the whole run; the unperturbed term is never
/// substituted for a failed call.
pub struct ExternalField {
    start_epoch: f64,
    eval: Evaluator,
}

impl ExternalField {
    pub fn new<F>(start_epoch: f64, eval: F) -> Result<Self, SimError>
    where
        F: Fn(&Vector3<f64>, f64) -> Result<Vector3<f64>, String> + 'static,
    {
        if !start_epoch.is_finite() {
            return Err(SimError::InvalidStartTime { t0: start_epoch });
        }
        Ok(Self {
            start_epoch,
            eval: Box::new(eval),
        })
    }

    pub fn start_epoch(&self) -> f64 {
        self.start_epoch
    }
}

impl Perturbation for ExternalField {
    fn acceleration(&self, pos: &Vector3<f64>, t: f64) -> Result<Vector3<f64>, SimError> {
        (self.eval)(pos, self.start_epoch + t)
            .map_err(|message| SimError::FieldEvaluation { t, message })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
