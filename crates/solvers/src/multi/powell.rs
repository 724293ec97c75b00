//! Powell's direction-set method.
//!
//! # Algorithm
//!
//! Each sweep minimizes along every direction in turn, starting from the
//! coordinate axes. After a sweep the net displacement `p - p_old` is a good
//! candidate for a new conjugate direction. It is adopted, replacing the
//! direction along which the sweep made its largest decrease, unless
//!
//! - the extrapolated point `2p - p_old` is no better than `p_old`, or
//! - the decrease along the best direction accounts for most of the sweep's
//!   total decrease, suggesting the set would lose independence.
//!
//! The direction set persists between runs, so a second run continues with
//! the conjugate directions built by the first. Use
//! [`Powell::reset_directions`] to start over from the axes.
//!
//! # Stopping
//!
//! A run converges once a full sweep lowers the objective by less than the
//! configured fraction of its magnitude.

mod event;


pub use event::Event;

use minima_core::{Objective, Observer};

use crate::{
    Point,
    config::{Config, ConfigError, validate_point},
    error::{Error, Failure, Missing},
    evaluate::{evaluate, value},
    lifecycle::{Lifecycle, State},
    line::{LineConfig, minimize_along},
    vector::{are_independent, axpy, identity, norm, scale, sub},
};

use super::{Solution, is_fractional_decrease_small};

/// Powell minimizer for an objective of `N` variables.
pub struct Powell<F, const N: usize> {
    objective: Option<F>,
    start: Option<[f64; N]>,
    directions: [[f64; N]; N],
    config: Config,
    line: LineConfig,
    lifecycle: Lifecycle<Solution<N>>,
}

impl<F, const N: usize> Default for Powell<F, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F, const N: usize> Powell<F, N> {
    /// Creates a minimizer with the coordinate axes as its direction set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            objective: None,
            start: None,
            directions: identity(),
            config: Config::default(),
            line: LineConfig::default(),
            lifecycle: Lifecycle::new(),
        }
    }
}

impl<F, const N: usize> Powell<F, N>
where
    F: Objective<N>,
{
    #[must_use]
    pub fn state(&self) -> State {
        self.lifecycle
            .state(self.objective.is_some() && self.start.is_some())
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

    /// Returns the current direction set.
    #[must_use]
    pub fn directions(&self) -> &[[f64; N]; N] {
        &self.directions
    }

    /// Replaces the direction set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if any direction is non-finite or
    /// the set is not linearly independent, or [`Error::Locked`] during a
    /// minimization.
    pub fn set_directions(&mut self, directions: [[f64; N]; N]) -> Result<(), Error> {
        self.lifecycle.ensure_unlocked()?;
        for direction in &directions {
            validate_point(direction)?;
        }
        if !are_independent(&directions) {
            return Err(ConfigError::DependentDirections.into());
        }
        self.lifecycle.invalidate();
        self.directions = directions;
        Ok(())
    }

    /// Restores the coordinate axes as the direction set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Locked`] during a minimization.
    pub fn reset_directions(&mut self) -> Result<(), Error> {
        self.set_directions(identity())
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

    /// Runs sweeps until convergence, reporting each to `observer`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] without an objective or start point, an
    /// evaluation error, or a [`Failure`] if a line minimization fails or the
    /// sweep cap is reached. On failure the start point is moved to the last
    /// completed iterate and no result is stored.
    pub fn minimize<O>(&mut self, mut observer: O) -> Result<Solution<N>, Error>
    where
        O: for<'a> Observer<Event<'a, N>>,
    {
        let objective = self
            .objective
            .as_ref()
            .ok_or(Error::NotReady(Missing::Objective))?;
        let start = self.start.ok_or(Error::NotReady(Missing::StartPoint))?;

        let running = self.lifecycle.lock()?;
        let mut run = Run {
            objective,
            directions: &mut self.directions,
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

/// Borrowed inputs of one run.
struct Run<'s, F, const N: usize> {
    objective: &'s F,
    directions: &'s mut [[f64; N]; N],
    config: &'s Config,
    line: &'s LineConfig,
    state: State,
    last: [f64; N],
}

impl<F: Objective<N>, const N: usize> Run<'_, F, N> {
    fn execute<O>(&mut self, start: [f64; N], observer: &mut O) -> Result<Solution<N>, Error>
    where
        O: for<'a> Observer<Event<'a, N>>,
    {
        let objective = self.objective;
        let mut p = evaluate(objective, start)?;

        for iter in 1..=self.config.max_iters() {
            let p_old = p;
            let mut largest_decrease = 0;
            let mut del = 0.0;

            for (i, direction) in self.directions.iter().enumerate() {
                let found = minimize_along(objective, &p.x, direction, self.line)?;
                let decrease = p.objective - found.objective;
                if decrease > del {
                    del = decrease;
                    largest_decrease = i;
                }
                p = Point::new(found.x, found.objective);
            }

            let converged =
                is_fractional_decrease_small(p_old.objective, p.objective, self.config.tolerance());

            let mut replaced = false;
            if !converged {
                let displacement = sub(&p.x, &p_old.x);
                let extrapolated = axpy(&p.x, 1.0, &displacement);
                let fe = value(objective, &extrapolated)?;
                if keeps_displacement(p_old.objective, p.objective, fe, del) {
                    let found = minimize_along(objective, &p.x, &displacement, self.line)?;
                    p = Point::new(found.x, found.objective);
                    let direction = scale(found.step, &displacement);
                    if norm(&direction) > 0.0 {
                        self.directions[largest_decrease] = self.directions[N - 1];
                        self.directions[N - 1] = direction;
                        replaced = true;
                    }
                }
            }

            self.last = p.x;
            observer.observe(&Event {
                iter,
                max_iters: self.config.max_iters(),
                point: p,
                state: self.state,
                directions: &*self.directions,
                largest_decrease,
                replaced,
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

/// Decides whether the sweep's displacement should join the direction set.
///
/// `f_old` and `f` are the values before and after the sweep, `fe` the value
/// at the extrapolated point, and `del` the largest single-direction decrease.
fn keeps_displacement(f_old: f64, f: f64, fe: f64, del: f64) -> bool {
    if fe >= f_old {
        return false;
    }
    let t = 2.0 * (f_old - 2.0 * f + fe) * (f_old - f - del).powi(2) - del * (f_old - fe).powi(2);
    t < 0.0
}
