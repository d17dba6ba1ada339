use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// Gravitational constants (Earth, zonal model values)
// ---------------------------------------------------------------------------

pub const MU_EARTH: f64 = 3.986_004_418e14; // m^3/s^2
pub const R_EARTH_ECI: f64 = 6_378_137.0;   // equatorial radius, m
pub const J2_EARTH: f64 = 1.082_63e-3;
pub const J3_EARTH: f64 = -2.532_7e-6;
pub const J4_EARTH: f64 = -1.619_6e-6;

/// Point-mass gravitational acceleration −μ·r/|r|³ (inertial frame).
///
/// Not defined at the origin; a vanishing radius produces non-finite
/// components that propagate into the trajectory for the caller to detect.
pub fn pointmass_accel(mu: f64, pos: &Vector3<f64>) -> Vector3<f64> {
    let r = pos.norm();
    -mu / (r * r * r) * pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn leo_magnitude() {
        let r = R_EARTH_ECI + 400_000.0;
        let a = pointmass_accel(MU_EARTH, &Vector3::new(r, 0.0, 0.0));
        assert_relative_eq!(a.norm(), MU_EARTH / (r * r), max_relative = 1e-12);
    }

    #[test]
    fn points_toward_the_center() {
        let pos = Vector3::new(5.0e6, -3.0e6, 1.0e6);
        let a = pointmass_accel(MU_EARTH, &pos);
        let cos_angle = a.dot(&pos) / (a.norm() * pos.norm());
        assert_relative_eq!(cos_angle, -1.0, epsilon = 1e-12);
    }
}
