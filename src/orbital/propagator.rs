use std::cell::OnceCell;

use nalgebra::Vector3;

use crate::error::SimError;
use crate::orbital::elements::KeplerianElements;
use crate::orbital::invariants::FirstIntegrals;
use crate::physics::gravity::pointmass_accel;
use crate::physics::perturbation::Perturbation;
use crate::sim::integrator::{integrate, VectorField};

// ---------------------------------------------------------------------------
// Two-body vector field, optionally perturbed
// ---------------------------------------------------------------------------

/// Point-mass gravity plus at most one perturbing acceleration.
struct TwoBodyField<'a> {
    mu: f64,
    perturbation: Option<&'a dyn Perturbation>,
}

impl VectorField<6> for TwoBodyField<'_> {
    type Aux = ();

    fn eval(&self, t: f64, y: &[f64; 6], _aux: &()) -> Result<[f64; 6], SimError> {
        let pos = Vector3::new(y[0], y[1], y[2]);
        let mut accel = pointmass_accel(self.mu, &pos);
        if let Some(p) = self.perturbation {
            accel += p.acceleration(&pos, t)?;
        }
        Ok([y[3], y[4], y[5], accel.x, accel.y, accel.z])
    }
}

// ---------------------------------------------------------------------------
// Propagator
// ---------------------------------------------------------------------------

/// One end-to-end propagation setup: initial elements, gravitational
/// parameter, optional perturbing field. A single fixed configuration runs
/// to completion or fails outright; there is no retry and no step
/// adaptation.
pub struct Propagator {
    elements: KeplerianElements,
    mu: f64,
    t0: f64,
    perturbation: Option<Box<dyn Perturbation>>,
}

impl Propagator {
    pub fn new(elements: KeplerianElements, mu: f64) -> Self {
        Self {
            elements,
            mu,
            t0: 0.0,
            perturbation: None,
        }
    }

    /// Attach a perturbing acceleration on top of the point-mass term.
    pub fn with_perturbation(mut self, perturbation: Box<dyn Perturbation>) -> Self {
        self.perturbation = Some(perturbation);
        self
    }

    /// Shift the integration start time (default 0). Providers that map
    /// elapsed time onto an absolute epoch carry that epoch themselves.
    pub fn with_start_time(mut self, t0: f64) -> Self {
        self.t0 = t0;
        self
    }

    /// Run `n` steps of size `h` seconds.
    pub fn run(&self, h: f64, n: usize) -> Result<Trajectory, SimError> {
        let (pos, vel) = self.elements.to_state_vector_mu(self.mu)?;
        let y0 = [pos.x, pos.y, pos.z, vel.x, vel.y, vel.z];

        let field = TwoBodyField {
            mu: self.mu,
            perturbation: self.perturbation.as_deref(),
        };

        log::debug!(
            "propagating {} steps of {} s (perturbed: {})",
            n,
            h,
            self.perturbation.is_some()
        );
        let (times, states) = integrate(&field, self.t0, y0, h, n, ())?;
        log::debug!("propagation reached t = {} s", times[times.len() - 1]);

        Ok(Trajectory {
            mu: self.mu,
            times,
            states,
            elements: OnceCell::new(),
            integrals: OnceCell::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// Trajectory
// ---------------------------------------------------------------------------

/// Equally spaced (time, Cartesian state) samples from a single run.
///
/// The state layout is [x, y, z, vx, vy, vz] in meters and m/s. The sample
/// arrays are immutable once produced; the derived series (per-sample
/// orbital elements, first integrals) are computed on first access and
/// cached.
pub struct Trajectory {
    mu: f64,
    times: Vec<f64>,
    states: Vec<[f64; 6]>,
    elements: OnceCell<Vec<KeplerianElements>>,
    integrals: OnceCell<Vec<FirstIntegrals>>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn states(&self) -> &[[f64; 6]] {
        &self.states
    }

    pub fn position(&self, k: usize) -> Vector3<f64> {
        let y = &self.states[k];
        Vector3::new(y[0], y[1], y[2])
    }

    pub fn velocity(&self, k: usize) -> Vector3<f64> {
        let y = &self.states[k];
        Vector3::new(y[3], y[4], y[5])
    }

    /// Per-sample orbital elements, extracted on first call and cached.
    ///
    /// Fails if any sample sits in a degenerate geometry (equatorial or
    /// circular); a failed extraction is not cached.
    pub fn elements(&self) -> Result<&[KeplerianElements], SimError> {
        match self.elements.get() {
            Some(series) => Ok(series),
            None => {
                let series = self
                    .states
                    .iter()
                    .map(|y| {
                        KeplerianElements::from_state_vector_mu(
                            &Vector3::new(y[0], y[1], y[2]),
                            &Vector3::new(y[3], y[4], y[5]),
                            self.mu,
                        )
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(self.elements.get_or_init(|| series))
            }
        }
    }

    /// Per-sample first integrals, computed on first call and cached.
    pub fn first_integrals(&self) -> &[FirstIntegrals] {
        self.integrals.get_or_init(|| {
            self.states
                .iter()
                .map(|y| {
                    FirstIntegrals::from_state(
                        &Vector3::new(y[0], y[1], y[2]),
                        &Vector3::new(y[3], y[4], y[5]),
                        self.mu,
                    )
                })
                .collect()
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
