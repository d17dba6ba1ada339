use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::physics::pendulum::Pendulum;
use crate::sim::integrator::integrate_with;

// ---------------------------------------------------------------------------
// Deterministic Gaussian noise
// ---------------------------------------------------------------------------

/// Seedable Gaussian noise source (LCG uniforms through a Box-Muller
/// transform). Identical seeds reproduce identical sample streams, which
/// keeps noisy control runs replayable.
#[derive(Debug, Clone)]
pub struct GaussianNoise {
    state: u64,
}

impl GaussianNoise {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_uniform(&mut self) -> f64 {
        // LCG parameters (Numerical Recipes)
        self.state = self.state.wrapping_mul(1103515245).wrapping_add(12345);
        ((self.state >> 16) & 0x7fff) as f64 / 32768.0
    }

    /// One N(mean, std²) sample.
    pub fn sample(&mut self, mean: f64, std: f64) -> f64 {
        let u1 = self.next_uniform().max(1e-12); // avoid ln(0)
        let u2 = self.next_uniform();
        mean + std * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}

// ---------------------------------------------------------------------------
// Proportional angle controller
// ---------------------------------------------------------------------------

/// One record of the discrete control history.
///
/// `angle` and `rate` are the measured (noisy) values the law actually saw,
/// not the true state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ControlSample {
    pub t: f64,
    pub angle: f64,
    pub rate: f64,
    pub command: f64,
}

/// Proportional angle/rate feedback with a gravity feed-forward term:
///
/// u = k_angle·(α − α_target) − k_rate·α̇ + (g/l)·sin α_target
///
/// The g and l the law uses are perturbed once at construction (imperfect
/// plant knowledge); the measurements are perturbed on every update.
pub struct AngleController {
    target: f64,
    k_angle: f64,
    k_rate: f64,
    g_over_l: f64,
    angle_std: f64,
    rate_std: f64,
    rng: GaussianNoise,
}

impl AngleController {
    /// Build a controller for `pendulum` driving the angle to `target`.
    ///
    /// `param_std` is the standard deviation of the plant-knowledge error,
    /// `angle_std`/`rate_std` of the measurement noise. Gains outside the
    /// region k_rate ≥ 0, k_angle ≤ (g/l)·sin(target) are rejected.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pendulum: &Pendulum,
        target: f64,
        k_angle: f64,
        k_rate: f64,
        param_std: f64,
        angle_std: f64,
        rate_std: f64,
        seed: u64,
    ) -> Result<Self, SimError> {
        let mut rng = GaussianNoise::new(seed);
        let g = pendulum.g + rng.sample(0.0, clamp_std(param_std));
        let l = pendulum.l + rng.sample(0.0, clamp_std(param_std));
        let g_over_l = g / l;

        let limit = g_over_l * target.sin();
        if k_rate < 0.0 || k_angle > limit {
            return Err(SimError::UnstableGains {
                k_rate,
                k_angle,
                limit,
            });
        }

        Ok(Self {
            target,
            k_angle,
            k_rate,
            g_over_l,
            angle_std: clamp_std(angle_std),
            rate_std: clamp_std(rate_std),
            rng,
        })
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Evaluate the law on noisy measurements of (angle, rate).
    ///
    /// Returns the history record; the caller owns where it is kept.
    pub fn update(&mut self, t: f64, angle: f64, rate: f64) -> ControlSample {
        let angle = angle + self.rng.sample(0.0, self.angle_std);
        let rate = rate + self.rng.sample(0.0, self.rate_std);
        let command = self.k_angle * (angle - self.target) - self.k_rate * rate
            + self.g_over_l * self.target.sin();
        ControlSample {
            t,
            angle,
            rate,
            command,
        }
    }
}

fn clamp_std(std: f64) -> f64 {
    if std < 0.0 {
        log::warn!("negative noise std {} clamped to zero", std);
        0.0
    } else {
        std
    }
}

/// Drive a pendulum under discrete feedback.
///
/// The control command is refreshed every `update_every` steps (starting at
/// step 0) and held constant in between. Returns the sample arrays plus the
/// control history buffer.
#[allow(clippy::type_complexity)]
pub fn run_controlled(
    pendulum: &Pendulum,
    controller: &mut AngleController,
    t0: f64,
    y0: [f64; 2],
    h: f64,
    n: usize,
    update_every: usize,
) -> Result<(Vec<f64>, Vec<[f64; 2]>, Vec<ControlSample>), SimError> {
    let mut history = Vec::with_capacity(n / update_every.max(1) + 1);
    let (times, states) = integrate_with(
        pendulum,
        t0,
        y0,
        h,
        n,
        0.0,
        update_every,
        |t, y, u| {
            let sample = controller.update(t, y[0], y[1]);
            *u = sample.command;
            history.push(sample);
        },
    )?;
    Ok((times, states, history))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_3, FRAC_PI_4};

    fn test_pendulum() -> Pendulum {
        Pendulum { g: 9.8, l: 1.0, m: 1.0 }
    }

    #[test]
    fn noise_is_reproducible() {
        let mut a = GaussianNoise::new(42);
        let mut b = GaussianNoise::new(42);
        for _ in 0..100 {
            assert_eq!(a.sample(0.0, 1.0), b.sample(0.0, 1.0));
        }
    }

    #[test]
    fn noise_statistics() {
        let mut rng = GaussianNoise::new(7);
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| rng.sample(0.0, 1.0)).collect();

        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / n as f64;

        assert!(mean.abs() < 0.1, "sample mean {} too far from 0", mean);
        assert!(
            var.sqrt() > 0.85 && var.sqrt() < 1.15,
            "sample std {} too far from 1",
            var.sqrt()
        );
    }

    #[test]
    fn unstable_gains_rejected() {
        let p = test_pendulum();
        // Negative rate gain
        assert!(matches!(
            AngleController::new(&p, FRAC_PI_4, -2.0, -1.0, 0.0, 0.0, 0.0, 1),
            Err(SimError::UnstableGains { .. })
        ));
        // Angle gain above the (g/l) sin(target) limit
        assert!(matches!(
            AngleController::new(&p, FRAC_PI_4, 10.0, 3.0, 0.0, 0.0, 0.0, 1),
            Err(SimError::UnstableGains { .. })
        ));
    }

    #[test]
    fn settles_at_the_target_angle() {
        let p = test_pendulum();
        let mut ctrl =
            AngleController::new(&p, FRAC_PI_4, -2.0, 3.0, 0.0, 0.0, 0.0, 1).unwrap();

        let (_, states, history) =
            run_controlled(&p, &mut ctrl, 0.0, [FRAC_PI_3, -2.0], 0.01, 800, 10).unwrap();

        let last = states[states.len() - 1];
        assert!(
            (last[0] - FRAC_PI_4).abs() < 1e-3,
            "final angle {} should sit at the target {}",
            last[0],
            FRAC_PI_4
        );
        assert!(last[1].abs() < 1e-3, "final rate {} should be near zero", last[1]);

        // Steps 0, 10, ..., 790 each produce one history record.
        assert_eq!(history.len(), 80);
        assert_eq!(history[0].t, 0.0);
        assert_eq!(history[1].t, 0.1);
    }

    #[test]
    fn noisy_runs_reproduce_with_the_same_seed() {
        let p = test_pendulum();
        let run = |seed| {
            let mut ctrl =
                AngleController::new(&p, FRAC_PI_4, -2.0, 3.0, 0.01, 0.01, 0.03, seed).unwrap();
            run_controlled(&p, &mut ctrl, 0.0, [FRAC_PI_3, -2.0], 0.01, 200, 10).unwrap()
        };

        let (ta, sa, ha) = run(99);
        let (tb, sb, hb) = run(99);
        assert_eq!(ta, tb);
        assert_eq!(sa, sb);
        for (x, y) in ha.iter().zip(&hb) {
            assert_eq!(x.command, y.command);
        }
    }
}
