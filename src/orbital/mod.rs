pub mod elements;
pub mod invariants;
pub mod propagator;

pub use elements::{normalize_angle, KeplerianElements};
pub use invariants::FirstIntegrals;
pub use propagator::{Propagator, Trajectory};
