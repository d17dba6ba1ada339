pub mod integrator;

pub use integrator::{integrate, integrate_with, rk4_step, VectorField};
