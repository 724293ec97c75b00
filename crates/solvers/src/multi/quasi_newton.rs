//! Quasi-Newton (variable metric) minimization with BFGS updates.
//!
//! # Algorithm
//!
//! The solver keeps an approximation `H` of the inverse Hessian, starting
//! from the identity. Each iteration
//!
//! 1. searches along `-H·g` with a backtracking line search that accepts the
//!    first step giving sufficient decrease, with the step length capped
//!    relative to the size of `x`,
//! 2. forms the secant pair `s = Δx`, `y = Δg`, and
//! 3. applies the BFGS rank-two update to `H` when `s·y` is safely positive.
//!
//! Skipping the update when the curvature test fails keeps `H` positive
//! definite. If `H` still stops producing a downhill direction, or becomes
//! non-finite, it is reset to the identity.
//!
//! # Stopping
//!
//! A run converges when one iteration lowers the objective by less than the
//! configured fraction of its magnitude, when the step is negligible relative
//! to `x`, or when the gradient scaled by `|x| / |f|` falls below the
//! tolerance.
//!
//! A line search that cannot make progress from a point whose gradient is not
//! small fails with [`Failure::NonDescent`], which usually points at a
//! gradient inconsistent with the objective.

mod event;
mod line_search;


pub use event::Event;

use minima_core::{Gradient, Objective, Observer};

use crate::{
    config::{Config, ConfigError, validate_point},
    error::{Error, Failure, Missing},
    evaluate::{evaluate, gradient},
    lifecycle::{Lifecycle, State},
    vector::{dot, identity, mat_vec, neg, norm, sub},
};

use super::{Solution, is_fractional_decrease_small};

use line_search::{Step, TOLX, backtrack};

/// Default cap on the line search step, relative to `max(|x|, N)`.
const MAX_STEP: f64 = 100.0;

/// Quasi-Newton minimizer for an objective `F` with gradient `G`.
pub struct QuasiNewton<F, G, const N: usize> {
    objective: Option<F>,
    gradient: Option<G>,
    start: Option<[f64; N]>,
    max_step: f64,
    config: Config,
    lifecycle: Lifecycle<Solution<N>>,
}

impl<F, G, const N: usize> Default for QuasiNewton<F, G, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F, G, const N: usize> QuasiNewton<F, G, N> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            objective: None,
            gradient: None,
            start: None,
            max_step: MAX_STEP,
            config: Config::default(),
            lifecycle: Lifecycle::new(),
        }
    }
}

impl<F, G, const N: usize> QuasiNewton<F, G, N>
where
    F: Objective<N>,
    G: Gradient<N>,
{
    #[must_use]
    pub fn state(&self) -> State {
        let ready = self.objective.is_some() && self.gradient.is_some() && self.start.is_some();
        self.lifecycle.state(ready)
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lifecycle.is_locked()
    }

    /// Sets the objective.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Locked`] during a minimization.
    pub fn set_objective(&mut self, objective: F) -> Result<(), Error> {
        self.lifecycle.ensure_unlocked()?;
        self.lifecycle.invalidate();
        self.objective = Some(objective);
        Ok(())
    }

    /// Sets the gradient of the objective.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Locked`] during a minimization.
    pub fn set_gradient(&mut self, gradient: G) -> Result<(), Error> {
        self.lifecycle.ensure_unlocked()?;
        self.lifecycle.invalidate();
        self.gradient = Some(gradient);
        Ok(())
    }

    /// Sets the start point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for non-finite coordinates, or
    /// [`Error::Locked`] during a minimization.
    pub fn set_start(&mut self, start: [f64; N]) -> Result<(), Error> {
        self.lifecycle.ensure_unlocked()?;
        validate_point(&start)?;
        self.lifecycle.invalidate();
        self.start = Some(start);
        Ok(())
    }

    /// Returns the start point of the next run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] if no start point has been set.
    pub fn start(&self) -> Result<&[f64; N], Error> {
        self.start.as_ref().ok_or(Error::NotReady(Missing::StartPoint))
    }

    /// Returns the line search step cap, relative to `max(|x|, N)`.
    #[must_use]
    pub fn max_step(&self) -> f64 {
        self.max_step
    }

    /// Sets the line search step cap.
    ///
    /// Each step is limited to `max_step · max(|x_start|, N)`, which keeps the
    /// first iterations from leaping into distant regions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] unless `max_step` is finite and
    /// positive, or [`Error::Locked`] during a minimization.
    pub fn set_max_step(&mut self, max_step: f64) -> Result<(), Error> {
        self.lifecycle.ensure_unlocked()?;
        if !max_step.is_finite() || max_step <= 0.0 {
            return Err(ConfigError::MaxStep.into());
        }
        self.lifecycle.invalidate();
        self.max_step = max_step;
        Ok(())
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replaces the convergence settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Locked`] during a minimization.
    pub fn set_config(&mut self, config: Config) -> Result<(), Error> {
        self.lifecycle.ensure_unlocked()?;
        self.lifecycle.invalidate();
        self.config = config;
        Ok(())
    }

    /// Sets the relative tolerance, keeping the iteration cap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the tolerance is not finite and
    /// positive, or [`Error::Locked`] during a minimization.
    pub fn set_tolerance(&mut self, tolerance: f64) -> Result<(), Error> {
        self.lifecycle.ensure_unlocked()?;
        let config = self.config.with_tolerance(tolerance)?;
        self.lifecycle.invalidate();
        self.config = config;
        Ok(())
    }

    /// Iterates until convergence, reporting each iteration to `observer`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] if an input is missing, an evaluation
    /// error, [`Failure::NonDescent`] if the line search cannot make
    /// progress, or [`Failure::MaxIters`] if the iteration cap is reached.
    /// On failure the start point is moved to the last completed iterate and
    /// no result is stored.
    pub fn minimize<O>(&mut self, mut observer: O) -> Result<Solution<N>, Error>
    where
        O: for<'a> Observer<Event<'a, N>>,
    {
        let objective = self
            .objective
            .as_ref()
            .ok_or(Error::NotReady(Missing::Objective))?;
        let gradient = self
            .gradient
            .as_ref()
            .ok_or(Error::NotReady(Missing::Gradient))?;
        let start = self.start.ok_or(Error::NotReady(Missing::StartPoint))?;

        let running = self.lifecycle.lock()?;
        let mut run = Run {
            objective,
            gradient,
            max_step: self.max_step,
            config: &self.config,
            state: State::Locked,
            last: start,
        };
        let outcome = run.execute(start, &mut observer);
        if outcome.is_err() {
            self.start = Some(run.last);
        }
        running.finish(outcome)
    }

    /// Returns the stored solution of the last successful run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] if there is no stored solution.
    pub fn result(&self) -> Result<&Solution<N>, Error> {
        self.lifecycle.result()
    }

    #[cfg(test)]
    pub(crate) fn force_lock(&mut self) {
        self.lifecycle.force_lock();
    }
}

struct Run<'s, F, G, const N: usize> {
    objective: &'s F,
    gradient: &'s G,
    max_step: f64,
    config: &'s Config,
    state: State,
    last: [f64; N],
}

impl<F, G, const N: usize> Run<'_, F, G, N>
where
    F: Objective<N>,
    G: Gradient<N>,
{
    fn execute<O>(&mut self, start: [f64; N], observer: &mut O) -> Result<Solution<N>, Error>
    where
        O: for<'a> Observer<Event<'a, N>>,
    {
        let tolerance = self.config.tolerance();
        let mut p = evaluate(self.objective, start)?;
        let mut g = gradient(self.gradient, &p.x)?;
        if scaled_gradient(&g, &p.x, p.objective) < tolerance {
            return Ok(Solution {
                x: p.x,
                objective: p.objective,
                iters: 0,
            });
        }

        let mut h: [[f64; N]; N] = identity();
        let mut direction = neg(&g);
        #[allow(clippy::cast_precision_loss)]
        let max_step = self.max_step * norm(&p.x).max(N as f64);

        for iter in 1..=self.config.max_iters() {
            let next = match backtrack(self.objective, &p, &g, &direction, max_step)? {
                Step::Accepted(next) => next,
                // No progress is possible from a point that is nearly stationary.
                Step::Exhausted if scaled_gradient(&g, &p.x, p.objective) < tolerance.sqrt() => {
                    return Ok(Solution {
                        x: p.x,
                        objective: p.objective,
                        iters: iter - 1,
                    });
                }
                Step::Exhausted => return Err(Failure::NonDescent.into()),
            };

            let s = sub(&next.x, &p.x);
            let negligible_step = (0..N)
                .map(|i| s[i].abs() / next.x[i].abs().max(1.0))
                .fold(0.0, f64::max)
                < TOLX;
            let small_decrease = is_fractional_decrease_small(p.objective, next.objective, tolerance);
            p = next;

            let g_new = gradient(self.gradient, &p.x)?;
            let converged = negligible_step
                || small_decrease
                || scaled_gradient(&g_new, &p.x, p.objective) < tolerance;
            let y = sub(&g_new, &g);
            g = g_new;

            let mut updated = false;
            let mut reset = false;
            if !converged {
                updated = bfgs_update(&mut h, &s, &y);
                direction = neg(&mat_vec(&h, &g));
                let finite = h.iter().flatten().all(|v| v.is_finite());
                if !finite || dot(&direction, &g) >= 0.0 {
                    h = identity();
                    direction = neg(&g);
                    reset = true;
                }
            }

            self.last = p.x;
            observer.observe(&Event {
                iter,
                max_iters: self.config.max_iters(),
                point: p,
                state: self.state,
                gradient: &g,
                direction: &direction,
                inverse_hessian: &h,
                updated,
                reset,
            });

            if converged {
                return Ok(Solution {
                    x: p.x,
                    objective: p.objective,
                    iters: iter,
                });
            }
        }

        Err(Failure::MaxIters {
            max_iters: self.config.max_iters(),
        }
        .into())
    }
}

/// Largest gradient component scaled by `max(|x_i|, 1) / max(|f|, 1)`.
fn scaled_gradient<const N: usize>(g: &[f64; N], x: &[f64; N], f: f64) -> f64 {
    let denominator = f.abs().max(1.0);
    (0..N)
        .map(|i| g[i].abs() * x[i].abs().max(1.0) / denominator)
        .fold(0.0, f64::max)
}

/// Applies the BFGS update for the secant pair `(s, y)`.
///
/// Returns false, leaving `h` unchanged, when `s·y` is not safely positive.
fn bfgs_update<const N: usize>(h: &mut [[f64; N]; N], s: &[f64; N], y: &[f64; N]) -> bool {
    let hy = mat_vec(h, y);
    let sy = dot(s, y);
    let yhy = dot(y, &hy);

    if sy <= (f64::EPSILON * dot(y, y) * dot(s, s)).sqrt() {
        return false;
    }

    let fac = 1.0 / sy;
    let fad = 1.0 / yhy;
    let u: [f64; N] = std::array::from_fn(|i| fac * s[i] - fad * hy[i]);
    for i in 0..N {
        for j in 0..N {
            h[i][j] += fac * s[i] * s[j] - fad * hy[i] * hy[j] + yhy * u[i] * u[j];
        }
    }
    true
}
