use thiserror::Error;

/// Errors surfaced by the propagation core.
///
/// Nothing here is retried internally; every variant is reported at the
/// point of detection and a failed run produces no partial trajectory.
/// Non-finite values appearing *during* integration are deliberately not an
/// error: divergence is a property of the output the caller inspects.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("step size must be positive and finite, got {h}")]
    InvalidStepSize { h: f64 },

    #[error("initial time must be finite, got {t0}")]
    InvalidStartTime { t0: f64 },

    #[error("initial state component {index} is not finite")]
    NonFiniteInitialState { index: usize },

    #[error("update cadence must be at least one step")]
    ZeroUpdateCadence,

    #[error("eccentricity {ecc} is outside the elliptical range [0, 1)")]
    EccentricityOutOfRange { ecc: f64 },

    #[error("semi-major axis must be positive and finite, got {sma}")]
    InvalidSemiMajorAxis { sma: f64 },

    #[error("equatorial orbit: the ascending-node direction is undefined")]
    EquatorialOrbit,

    #[error("circular orbit: the periapsis direction is undefined")]
    CircularOrbit,

    #[error("zonal field degree {degree} unsupported (expected 2..={max})")]
    UnsupportedDegree { degree: u32, max: u32 },

    #[error("gravity-field evaluator failed at t = {t}: {message}")]
    FieldEvaluation { t: f64, message: String },

    #[error("controller gains outside the stable region: \
             k_rate = {k_rate}, k_angle = {k_angle}, limit = {limit}")]
    UnstableGains {
        k_rate: f64,
        k_angle: f64,
        limit: f64,
    },
}
