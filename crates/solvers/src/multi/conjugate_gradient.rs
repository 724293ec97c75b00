//! Nonlinear conjugate-gradient minimization.
//!
//! # Algorithm
//!
//! Each iteration minimizes along the current direction `d` using the
//! directional derivative, then builds the next direction as `-g + β·d` from
//! the new gradient `g`. The coefficient `β` is either
//!
//! - Fletcher–Reeves: `|g|² / |g_prev|²` (the default), or
//! - Polak–Ribière: `max(0, g·(g - g_prev)) / |g_prev|²`, which restarts
//!   itself when progress stalls.
//!
//! The direction is reset to steepest descent every `N` iterations, and
//! whenever the conjugate direction fails to point downhill.
//!
//! # Stopping
//!
//! A run converges when one iteration lowers the objective by less than the
//! configured fraction of its magnitude, or the gradient vanishes.

mod event;

#[cfg(test)]
mod tests;

pub use event::Event;

use minima_core::{Gradient, Objective, Observer};

use crate::{
    Point,
    config::{Config, ConfigError, validate_point},
    error::{Error, Failure, Missing},
    evaluate::{evaluate, gradient},
    lifecycle::{Lifecycle, State},
    line::{LineConfig, minimize_along_with_derivative},
    vector::{axpy, dot, neg, sub},
};

use super::{Solution, TINY, is_fractional_decrease_small};

/// Conjugate-gradient minimizer for an objective `F` with gradient `G`.
pub struct ConjugateGradient<F, G, const N: usize> {
    objective: Option<F>,
    gradient: Option<G>,
    start: Option<[f64; N]>,
    initial_direction: Option<[f64; N]>,
    polak_ribiere: bool,
    config: Config,
    line: LineConfig,
    lifecycle: Lifecycle<Solution<N>>,
}

impl<F, G, const N: usize> Default for ConjugateGradient<F, G, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F, G, const N: usize> ConjugateGradient<F, G, N> {
    /// Creates a Fletcher–Reeves minimizer with no inputs.
    #[must_use]
    pub fn new() -> Self {
        Self {
            objective: None,
            gradient: None,
            start: None,
            initial_direction: None,
            polak_ribiere: false,
            config: Config::default(),
            line: LineConfig::default(),
            lifecycle: Lifecycle::new(),
        }
    }
}

impl<F, G, const N: usize> ConjugateGradient<F, G, N>
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
    /// After a failed run this is the last completed iterate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] if no start point has been set.
    pub fn start(&self) -> Result<&[f64; N], Error> {
        self.start.as_ref().ok_or(Error::NotReady(Missing::StartPoint))
    }

    /// Sets the direction of the first line minimization.
    ///
    /// Ignored in favor of steepest descent if it does not point downhill
    /// at the start point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a non-finite or zero direction,
    /// or [`Error::Locked`] during a minimization.
    pub fn set_initial_direction(&mut self, direction: [f64; N]) -> Result<(), Error> {
        self.lifecycle.ensure_unlocked()?;
        validate_point(&direction)?;
        if direction.iter().all(|&v| v == 0.0) {
            return Err(ConfigError::ZeroDirection.into());
        }
        self.lifecycle.invalidate();
        self.initial_direction = Some(direction);
        Ok(())
    }

    /// Reverts to steepest descent for the first line minimization.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Locked`] during a minimization.
    pub fn clear_initial_direction(&mut self) -> Result<(), Error> {
        self.lifecycle.ensure_unlocked()?;
        self.lifecycle.invalidate();
        self.initial_direction = None;
        Ok(())
    }

    /// Selects Polak–Ribière (`true`) or Fletcher–Reeves (`false`) updates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Locked`] during a minimization.
    pub fn set_polak_ribiere(&mut self, polak_ribiere: bool) -> Result<(), Error> {
        self.lifecycle.ensure_unlocked()?;
        self.lifecycle.invalidate();
        self.polak_ribiere = polak_ribiere;
        Ok(())
    }

    #[must_use]
    pub fn is_polak_ribiere(&self) -> bool {
        self.polak_ribiere
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

    /// Replaces the settings of the line minimizations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Locked`] during a minimization.
    pub fn set_line_config(&mut self, line: LineConfig) -> Result<(), Error> {
        self.lifecycle.ensure_unlocked()?;
        self.lifecycle.invalidate();
        self.line = line;
        Ok(())
    }

    /// Iterates until convergence, reporting each iteration to `observer`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] if an input is missing, an evaluation
    /// error, or a [`Failure`] if a line minimization fails or the iteration
    /// cap is reached. On failure the start point is moved to the last
    /// completed iterate and no result is stored.
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
            initial_direction: self.initial_direction,
            polak_ribiere: self.polak_ribiere,
            config: &self.config,
            line: &self.line,
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
    initial_direction: Option<[f64; N]>,
    polak_ribiere: bool,
    config: &'s Config,
    line: &'s LineConfig,
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
        let mut p = evaluate(self.objective, start)?;
        let mut g = gradient(self.gradient, &p.x)?;
        if dot(&g, &g) <= TINY {
            return Ok(Solution {
                x: p.x,
                objective: p.objective,
                iters: 0,
            });
        }

        let mut d = match self.initial_direction {
            Some(d) if dot(&d, &g) < 0.0 => d,
            _ => neg(&g),
        };
        let mut since_restart = 0;

        for iter in 1..=self.config.max_iters() {
            let found =
                minimize_along_with_derivative(self.objective, self.gradient, &p.x, &d, self.line)?;
            let converged =
                is_fractional_decrease_small(p.objective, found.objective, self.config.tolerance());
            p = Point::new(found.x, found.objective);

            let g_new = gradient(self.gradient, &p.x)?;
            let gg_new = dot(&g_new, &g_new);
            let converged = converged || gg_new <= TINY;

            let gg = dot(&g, &g);
            let beta = if self.polak_ribiere {
                (dot(&g_new, &sub(&g_new, &g)) / gg).max(0.0)
            } else {
                gg_new / gg
            };
            d = axpy(&neg(&g_new), beta, &d);
            g = g_new;

            since_restart += 1;
            let restarted = since_restart >= N || dot(&d, &g) >= 0.0;
            if restarted {
                d = neg(&g);
                since_restart = 0;
            }

            self.last = p.x;
            observer.observe(&Event {
                iter,
                max_iters: self.config.max_iters(),
                point: p,
                state: self.state,
                gradient: &g,
                direction: &d,
                beta,
                restarted,
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
