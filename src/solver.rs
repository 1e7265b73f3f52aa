//! Embedded Runge-Kutta-Fehlberg 4(5) integration with adaptive step size.
//!
//! The workspace persists across update calls: it owns the scratch vectors
//! and the step size suggested by the last accepted step.

const SAFETY: f64 = 0.9;
const MAX_SHRINK: f64 = 0.2;
const MAX_GROWTH: f64 = 5.0;
const ORDER: f64 = 5.0;
const MAX_STEP_RETRIES: usize = 64;

const C2: f64 = 1.0 / 4.0;
const C3: f64 = 3.0 / 8.0;
const C4: f64 = 12.0 / 13.0;
const C6: f64 = 1.0 / 2.0;

const A21: f64 = 1.0 / 4.0;
const A31: f64 = 3.0 / 32.0;
const A32: f64 = 9.0 / 32.0;
const A41: f64 = 1932.0 / 2197.0;
const A42: f64 = -7200.0 / 2197.0;
const A43: f64 = 7296.0 / 2197.0;
const A51: f64 = 439.0 / 216.0;
const A52: f64 = -8.0;
const A53: f64 = 3680.0 / 513.0;
const A54: f64 = -845.0 / 4104.0;
const A61: f64 = -8.0 / 27.0;
const A62: f64 = 2.0;
const A63: f64 = -3544.0 / 2565.0;
const A64: f64 = 1859.0 / 4104.0;
const A65: f64 = -11.0 / 40.0;

// fifth order solution
const B1: f64 = 16.0 / 135.0;
const B3: f64 = 6656.0 / 12825.0;
const B4: f64 = 28561.0 / 56430.0;
const B5: f64 = -9.0 / 50.0;
const B6: f64 = 2.0 / 55.0;

// difference between fifth and fourth order solutions
const E1: f64 = 1.0 / 360.0;
const E3: f64 = -128.0 / 4275.0;
const E4: f64 = -2197.0 / 75240.0;
const E5: f64 = 1.0 / 50.0;
const E6: f64 = 2.0 / 55.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorControl {
    pub eps_abs: f64,
    pub eps_rel: f64,
}

impl Default for ErrorControl {
    fn default() -> Self {
        Self {
            eps_abs: 1e-3,
            eps_rel: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolverFailure {
    StepSizeUnderflow { t: f64, h: f64 },
    RetriesExhausted { t: f64, h: f64 },
    NonFiniteState { t: f64 },
}

impl std::fmt::Display for SolverFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverFailure::StepSizeUnderflow { t, h } => {
                write!(f, "step size {:e} too small at t = {}", h, t)
            }
            SolverFailure::RetriesExhausted { t, h } => write!(
                f,
                "error tolerance not met after {} retries at t = {} (h = {:e})",
                MAX_STEP_RETRIES, t, h
            ),
            SolverFailure::NonFiniteState { t } => write!(f, "non-finite state at t = {}", t),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OdeWorkspace {
    control: ErrorControl,
    integration_step: f64,
    k: [Vec<f64>; 6],
    y0: Vec<f64>,
    y_tmp: Vec<f64>,
    y_err: Vec<f64>,
}

enum StepAdjustment {
    Decrease(f64),
    Increase(f64),
    Keep,
}

impl OdeWorkspace {
    pub fn new(dim: usize, initial_step: f64, control: ErrorControl) -> Self {
        Self {
            control,
            integration_step: initial_step,
            k: Default::default(),
            y0: Vec::new(),
            y_tmp: Vec::new(),
            y_err: Vec::new(),
        }
        .with_dimension(dim)
    }

    fn with_dimension(mut self, dim: usize) -> Self {
        self.resize(dim);
        self
    }

    pub fn resize(&mut self, dim: usize) {
        for k in self.k.iter_mut() {
            k.resize(dim, 0.0);
        }
        self.y0.resize(dim, 0.0);
        self.y_tmp.resize(dim, 0.0);
        self.y_err.resize(dim, 0.0);
    }

    pub fn dimension(&self) -> usize {
        self.y0.len()
    }

    pub fn integration_step(&self) -> f64 {
        self.integration_step
    }

    pub fn reset(&mut self, initial_step: f64) {
        self.integration_step = initial_step;
    }

    /// Integrates `y` from `t = 0` to `t = t1` in as many adaptive steps as needed.
    pub fn integrate<F>(
        &mut self,
        mut rhs: F,
        t1: f64,
        y: &mut [f64],
        max_substeps: usize,
    ) -> Result<(), SolverFailure>
    where
        F: FnMut(f64, &[f64], &mut [f64]),
    {
        let mut t = 0.0;
        let mut substeps = 0;

        while t < t1 {
            if substeps == max_substeps {
                return Err(SolverFailure::RetriesExhausted {
                    t,
                    h: self.integration_step,
                });
            }
            self.evolve_apply(&mut rhs, &mut t, t1, y)?;
            substeps += 1;
        }

        Ok(())
    }

    /// Advances `t` by one accepted step towards `t1`, retrying with smaller
    /// steps while the local error estimate exceeds the tolerance.
    pub fn evolve_apply<F>(
        &mut self,
        rhs: &mut F,
        t: &mut f64,
        t1: f64,
        y: &mut [f64],
    ) -> Result<(), SolverFailure>
    where
        F: FnMut(f64, &[f64], &mut [f64]),
    {
        debug_assert_eq!(y.len(), self.dimension());

        let t0 = *t;
        let mut h = self.integration_step;
        let mut final_step = false;

        if t0 + h > t1 {
            h = t1 - t0;
            final_step = true;
        }

        self.y0.copy_from_slice(y);

        for _ in 0..MAX_STEP_RETRIES {
            self.rkf45_step(rhs, t0, h, y);

            match self.adjust_step(y, h) {
                StepAdjustment::Decrease(h_new) => {
                    if t0 + h_new == t0 || h_new <= 0.0 {
                        y.copy_from_slice(&self.y0);
                        return Err(SolverFailure::StepSizeUnderflow { t: t0, h: h_new });
                    }
                    y.copy_from_slice(&self.y0);
                    h = h_new;
                    final_step = false;
                }
                adjustment => {
                    if y.iter().any(|v| !v.is_finite()) {
                        y.copy_from_slice(&self.y0);
                        return Err(SolverFailure::NonFiniteState { t: t0 });
                    }

                    *t = if final_step { t1 } else { t0 + h };
                    self.integration_step = match adjustment {
                        StepAdjustment::Increase(h_new) => h_new,
                        _ => h,
                    };
                    return Ok(());
                }
            }
        }

        y.copy_from_slice(&self.y0);
        Err(SolverFailure::RetriesExhausted { t: t0, h })
    }

    fn rkf45_step<F>(&mut self, rhs: &mut F, t: f64, h: f64, y: &mut [f64])
    where
        F: FnMut(f64, &[f64], &mut [f64]),
    {
        let [k1, k2, k3, k4, k5, k6] = &mut self.k;
        let y0 = &self.y0;
        let y_tmp = &mut self.y_tmp;
        let dim = y0.len();

        rhs(t, y0.as_slice(), k1.as_mut_slice());

        for i in 0..dim {
            y_tmp[i] = y0[i] + h * A21 * k1[i];
        }
        rhs(t + C2 * h, y_tmp.as_slice(), k2.as_mut_slice());

        for i in 0..dim {
            y_tmp[i] = y0[i] + h * (A31 * k1[i] + A32 * k2[i]);
        }
        rhs(t + C3 * h, y_tmp.as_slice(), k3.as_mut_slice());

        for i in 0..dim {
            y_tmp[i] = y0[i] + h * (A41 * k1[i] + A42 * k2[i] + A43 * k3[i]);
        }
        rhs(t + C4 * h, y_tmp.as_slice(), k4.as_mut_slice());

        for i in 0..dim {
            y_tmp[i] = y0[i] + h * (A51 * k1[i] + A52 * k2[i] + A53 * k3[i] + A54 * k4[i]);
        }
        rhs(t + h, y_tmp.as_slice(), k5.as_mut_slice());

        for i in 0..dim {
            y_tmp[i] = y0[i]
                + h * (A61 * k1[i] + A62 * k2[i] + A63 * k3[i] + A64 * k4[i] + A65 * k5[i]);
        }
        rhs(t + C6 * h, y_tmp.as_slice(), k6.as_mut_slice());

        for i in 0..dim {
            y[i] = y0[i] + h * (B1 * k1[i] + B3 * k3[i] + B4 * k4[i] + B5 * k5[i] + B6 * k6[i]);
            self.y_err[i] =
                h * (E1 * k1[i] + E3 * k3[i] + E4 * k4[i] + E5 * k5[i] + E6 * k6[i]);
        }
    }

    fn adjust_step(&self, y: &[f64], h: f64) -> StepAdjustment {
        let mut r_max: f64 = 0.0;

        for (y_i, err_i) in y.iter().zip(&self.y_err) {
            let d0 = self.control.eps_abs + self.control.eps_rel * y_i.abs();
            let r = err_i.abs() / d0;
            if r.is_nan() {
                return StepAdjustment::Decrease(h * MAX_SHRINK);
            }
            r_max = r_max.max(r);
        }

        if r_max > 1.1 {
            let factor = (SAFETY / r_max.powf(1.0 / ORDER)).max(MAX_SHRINK);
            StepAdjustment::Decrease(h * factor)
        } else if r_max < 0.5 {
            let factor = (SAFETY / r_max.powf(1.0 / (ORDER + 1.0))).clamp(1.0, MAX_GROWTH);
            StepAdjustment::Increase(h * factor)
        } else {
            StepAdjustment::Keep
        }
    }
}
