use crate::error::SimError;

// ---------------------------------------------------------------------------
// Right-hand-side capability
// ---------------------------------------------------------------------------

/// A system of first-order ODEs dy/dt = f(t, y) with state dimension `N`.
///
/// `Aux` is an opaque context handed unchanged to every stage evaluation —
/// the current control input for the pendulum, `()` for free orbital motion.
/// The stepper never mutates it; callers that need a time-varying context
/// update it between steps through [`integrate_with`].
pub trait VectorField<const N: usize> {
    type Aux;

    /// Evaluate the state derivative at (t, y).
    fn eval(&self, t: f64, y: &[f64; N], aux: &Self::Aux) -> Result<[f64; N], SimError>;
}

// ---------------------------------------------------------------------------
// Classical fixed-step RK4
// ---------------------------------------------------------------------------

/// Single RK4 step of size `h` with the auxiliary context held constant
/// across all four stage evaluations.
pub fn rk4_step<const N: usize, F: VectorField<N>>(
    field: &F,
    t: f64,
    y: &[f64; N],
    h: f64,
    aux: &F::Aux,
) -> Result<[f64; N], SimError> {
    let half = 0.5 * h;

    let k1 = field.eval(t, y, aux)?;
    let k2 = field.eval(t + half, &offset(y, &k1, half), aux)?;
    let k3 = field.eval(t + half, &offset(y, &k2, half), aux)?;
    let k4 = field.eval(t + h, &offset(y, &k3, h), aux)?;

    let mut next = [0.0; N];
    for i in 0..N {
        next[i] = y[i] + (h / 6.0) * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
    }
    Ok(next)
}

/// y + scale·k, component-wise.
fn offset<const N: usize>(y: &[f64; N], k: &[f64; N], scale: f64) -> [f64; N] {
    let mut out = [0.0; N];
    for i in 0..N {
        out[i] = y[i] + scale * k[i];
    }
    out
}

/// Integrate `n` fixed steps of size `h` from `(t0, y0)`.
///
/// Returns the aligned sample arrays `(times, states)` of length `n + 1`
/// with `times[k] == t0 + k*h` exactly (times are computed, not
/// accumulated). The run is deterministic: identical inputs reproduce the
/// output bit for bit.
pub fn integrate<const N: usize, F: VectorField<N>>(
    field: &F,
    t0: f64,
    y0: [f64; N],
    h: f64,
    n: usize,
    aux: F::Aux,
) -> Result<(Vec<f64>, Vec<[f64; N]>), SimError> {
    integrate_with(field, t0, y0, h, n, aux, 1, |_, _, _| {})
}

/// Integrate with a caller-supplied context update hook.
///
/// `update` runs before every step whose index is a multiple of
/// `update_every` (step 0 included) and may mutate the auxiliary context;
/// the new context is then held constant until the hook fires again. This
/// keeps discrete-time behavior — a control law sampled slower than the
/// integration grid — out of the stepper itself.
#[allow(clippy::too_many_arguments)]
pub fn integrate_with<const N: usize, F, H>(
    field: &F,
    t0: f64,
    y0: [f64; N],
    h: f64,
    n: usize,
    mut aux: F::Aux,
    update_every: usize,
    mut update: H,
) -> Result<(Vec<f64>, Vec<[f64; N]>), SimError>
where
    F: VectorField<N>,
    H: FnMut(f64, &[f64; N], &mut F::Aux),
{
    if !h.is_finite() || h <= 0.0 {
        return Err(SimError::InvalidStepSize { h });
    }
    if !t0.is_finite() {
        return Err(SimError::InvalidStartTime { t0 });
    }
    if let Some(index) = y0.iter().position(|v| !v.is_finite()) {
        return Err(SimError::NonFiniteInitialState { index });
    }
    if update_every == 0 {
        return Err(SimError::ZeroUpdateCadence);
    }

    let mut times = Vec::with_capacity(n + 1);
    let mut states = Vec::with_capacity(n + 1);
    times.push(t0);
    states.push(y0);

    let mut y = y0;
    for k in 0..n {
        let t = t0 + k as f64 * h;
        if k % update_every == 0 {
            update(t, &y, &mut aux);
        }
        y = rk4_step(field, t, &y, h, &aux)?;
        times.push(t0 + (k + 1) as f64 * h);
        states.push(y);
    }

    Ok((times, states))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// y' = -y, exact solution e^{-t}.
    struct Decay;

    impl VectorField<1> for Decay {
        type Aux = ();

        fn eval(&self, _t: f64, y: &[f64; 1], _aux: &()) -> Result<[f64; 1], SimError> {
            Ok([-y[0]])
        }
    }

    /// y' = u, with u supplied through the auxiliary context.
    struct ConstRate;

    impl VectorField<1> for ConstRate {
        type Aux = f64;

        fn eval(&self, _t: f64, _y: &[f64; 1], u: &f64) -> Result<[f64; 1], SimError> {
            Ok([*u])
        }
    }

    #[test]
    fn single_step_matches_fourth_order_taylor() {
        // For the linear system y' = -y one RK4 step reproduces the
        // degree-4 Taylor polynomial of e^{-h} exactly.
        let h = 0.1;
        let y1 = rk4_step(&Decay, 0.0, &[1.0], h, &()).unwrap()[0];

        let taylor = 1.0 - h + h * h / 2.0 - h * h * h / 6.0 + h * h * h * h / 24.0;
        assert!(
            (y1 - taylor).abs() < 1e-15,
            "RK4 on a linear system should equal the 4th-order Taylor sum, diff {:.3e}",
            (y1 - taylor).abs()
        );

        // Remaining distance to e^{-h} is the O(h^5) truncation term.
        let err = (y1 - (-h).exp()).abs();
        assert!(err < 1e-7, "local error {:.3e} should be O(h^5)", err);
    }

    #[test]
    fn sample_times_are_exact() {
        let (times, states) = integrate(&Decay, 3.5, [1.0], 0.1, 1000, ()).unwrap();
        assert_eq!(times.len(), 1001);
        assert_eq!(states.len(), 1001);
        for (k, &t) in times.iter().enumerate() {
            assert_eq!(t, 3.5 + k as f64 * 0.1, "times[{}] drifted", k);
        }
    }

    #[test]
    fn zero_steps_returns_initial_sample() {
        let (times, states) = integrate(&Decay, 2.0, [0.5], 0.1, 0, ()).unwrap();
        assert_eq!(times, vec![2.0]);
        assert_eq!(states, vec![[0.5]]);
    }

    #[test]
    fn invalid_inputs_rejected() {
        assert!(matches!(
            integrate(&Decay, 0.0, [1.0], 0.0, 10, ()),
            Err(SimError::InvalidStepSize { .. })
        ));
        assert!(matches!(
            integrate(&Decay, 0.0, [1.0], -0.1, 10, ()),
            Err(SimError::InvalidStepSize { .. })
        ));
        assert!(matches!(
            integrate(&Decay, 0.0, [1.0], f64::NAN, 10, ()),
            Err(SimError::InvalidStepSize { .. })
        ));
        assert!(matches!(
            integrate(&Decay, f64::INFINITY, [1.0], 0.1, 10, ()),
            Err(SimError::InvalidStartTime { .. })
        ));
        assert!(matches!(
            integrate(&Decay, 0.0, [f64::NAN], 0.1, 10, ()),
            Err(SimError::NonFiniteInitialState { index: 0 })
        ));
        assert!(matches!(
            integrate_with(&ConstRate, 0.0, [0.0], 0.1, 10, 1.0, 0, |_, _, _| {}),
            Err(SimError::ZeroUpdateCadence)
        ));
    }

    #[test]
    fn global_error_is_fourth_order() {
        let exact = (-1.0_f64).exp();

        let err_at = |h: f64| {
            let n = (1.0 / h).round() as usize;
            let (_, states) = integrate(&Decay, 0.0, [1.0], h, n, ()).unwrap();
            (states[n][0] - exact).abs()
        };

        let ratio = err_at(0.05) / err_at(0.025);
        assert!(
            ratio > 12.0 && ratio < 20.0,
            "halving h should cut the global error ~16x, got {:.1}x",
            ratio
        );
    }

    #[test]
    fn update_hook_fires_on_cadence() {
        let mut calls = Vec::new();
        let (_, states) = integrate_with(
            &ConstRate,
            0.0,
            [0.0],
            0.5,
            10,
            1.0,
            3,
            |t, _y, _u| calls.push(t),
        )
        .unwrap();

        // Steps 0, 3, 6, 9 trigger the hook.
        assert_eq!(calls, vec![0.0, 1.5, 3.0, 4.5]);
        // u stays 1.0 throughout, so y grows linearly.
        assert!((states[10][0] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn hook_changes_take_effect_between_steps() {
        // Switch the rate off after the first half of the run.
        let (_, states) = integrate_with(
            &ConstRate,
            0.0,
            [0.0],
            1.0,
            10,
            1.0,
            1,
            |t, _y, u| {
                if t >= 5.0 {
                    *u = 0.0;
                }
            },
        )
        .unwrap();

        assert!((states[10][0] - 5.0).abs() < 1e-12, "rate should stop at t = 5");
    }

    #[test]
    fn runs_are_reproducible() {
        let a = integrate(&Decay, 0.0, [1.0], 0.01, 500, ()).unwrap();
        let b = integrate(&Decay, 0.0, [1.0], 0.01, 500, ()).unwrap();
        assert_eq!(a.0, b.0);
        assert_eq!(a.1, b.1);
    }
}
