use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::sim::integrator::VectorField;

/// Plane pendulum driven by an external control torque.
///
/// State layout: [angle (rad), angular rate (rad/s)]; the auxiliary context
/// is the current control input u, so α̈ = −(g/l)·sin α + u.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pendulum {
    pub g: f64, // m/s^2
    pub l: f64, // m
    pub m: f64, // kg
}

impl Pendulum {
    /// Total mechanical energy at (angle, rate), zero at rest hanging down.
    pub fn energy(&self, angle: f64, rate: f64) -> f64 {
        0.5 * self.m * self.l * self.l * rate * rate
            + self.m * self.g * self.l * (1.0 - angle.cos())
    }
}

impl VectorField<2> for Pendulum {
    type Aux = f64;

    fn eval(&self, _t: f64, y: &[f64; 2], u: &f64) -> Result<[f64; 2], SimError> {
        Ok([y[1], -self.g / self.l * y[0].sin() + u])
    }
}
