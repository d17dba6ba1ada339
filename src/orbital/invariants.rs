use nalgebra::Vector3;

/// First integrals of unperturbed two-body motion.
///
/// Constant along a Keplerian trajectory up to integration error. Derived
/// from the state on demand and used to validate propagation accuracy,
/// never as authoritative state.
#[derive(Debug, Clone, Copy)]
pub struct FirstIntegrals {
    /// Specific angular momentum c = r × v (m²/s)
    pub angular_momentum: Vector3<f64>,
    /// Laplace vector f = v × c − μ·r/|r| (m³/s²), points toward periapsis
    /// with magnitude μe
    pub laplace: Vector3<f64>,
    /// Specific orbital energy |v|²/2 − μ/|r| (m²/s²)
    pub energy: f64,
}

impl FirstIntegrals {
    pub fn from_state(pos: &Vector3<f64>, vel: &Vector3<f64>, mu: f64) -> Self {
        let c = pos.cross(vel);
        Self {
            angular_momentum: c,
            laplace: vel.cross(&c) - mu / pos.norm() * pos,
            energy: 0.5 * vel.norm_squared() - mu / pos.norm(),
        }
    }
}
