//! The Nelder–Mead downhill simplex method.
//!
//! # Algorithm
//!
//! The solver evolves a simplex of `N + 1` vertices using only objective
//! values. Each iteration reflects the worst vertex through the centroid of
//! the others and then, depending on how the reflected point ranks,
//!
//! - keeps it ([`Move::Reflect`]),
//! - tries a point twice as far ([`Move::Expand`]),
//! - contracts toward the reflected point or toward the centroid
//!   ([`Move::ContractOutside`], [`Move::ContractInside`]), or
//! - shrinks every vertex halfway toward the best one ([`Move::Shrink`]).
//!
//! The simplex is kept between runs. A run that fails leaves the evolved
//! simplex in place, so a second run continues where the first stopped.
//!
//! # Stopping
//!
//! A run converges once the values at the best and worst vertices agree to
//! within the configured fraction of their magnitudes. That test runs before
//! each move, so a simplex that has already converged finishes in zero
//! iterations.

mod event;
mod simplex;

#[cfg(test)]
mod tests;

pub use event::{Event, Move};
pub use simplex::{Simplex, SimplexError};

use minima_core::{Objective, Observer};

use crate::{
    Point,
    config::Config,
    error::{Error, Failure, Missing},
    evaluate::evaluate,
    lifecycle::{Lifecycle, State},
};

use super::{Solution, TINY};

/// Reflection coefficient.
const ALPHA: f64 = 1.0;

/// Expansion coefficient.
const GAMMA: f64 = 2.0;

/// Contraction coefficient.
const RHO: f64 = 0.5;

/// Shrink coefficient.
const SIGMA: f64 = 0.5;

/// Nelder–Mead minimizer for an objective of `N` variables.
pub struct NelderMead<F, const N: usize> {
    objective: Option<F>,
    simplex: Option<Vec<Point<N>>>,
    config: Config,
    lifecycle: Lifecycle<Solution<N>>,
}

impl<F, const N: usize> Default for NelderMead<F, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F, const N: usize> NelderMead<F, N> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            objective: None,
            simplex: None,
            config: Config::preset(1e-8, 5000),
            lifecycle: Lifecycle::new(),
        }
    }
}

impl<F, const N: usize> NelderMead<F, N>
where
    F: Objective<N>,
{
    #[must_use]
    pub fn state(&self) -> State {
        let ready = self.objective.is_some() && self.simplex.is_some();
        self.lifecycle.state(ready)
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lifecycle.is_locked()
    }

    /// Sets the objective, discarding any simplex.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Locked`] during a minimization.
    pub fn set_objective(&mut self, objective: F) -> Result<(), Error> {
        self.lifecycle.ensure_unlocked()?;
        self.lifecycle.invalidate();
        self.objective = Some(objective);
        self.simplex = None;
        Ok(())
    }

    /// Evaluates the objective at every vertex and stores the simplex.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] without an objective, an evaluation error,
    /// or [`Error::Locked`] during a minimization. The stored simplex is
    /// unchanged on error.
    pub fn set_simplex(&mut self, simplex: &Simplex<N>) -> Result<(), Error> {
        self.lifecycle.ensure_unlocked()?;
        let objective = self
            .objective
            .as_ref()
            .ok_or(Error::NotReady(Missing::Objective))?;
        let evaluated = simplex
            .vertices()
            .iter()
            .map(|&x| evaluate(objective, x))
            .collect::<Result<Vec<_>, _>>()?;

        self.lifecycle.invalidate();
        self.simplex = Some(evaluated);
        Ok(())
    }

    /// Returns the current vertices with their values.
    ///
    /// After a run this is the evolved simplex, ordered best vertex first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] if no simplex has been set.
    pub fn simplex(&self) -> Result<&[Point<N>], Error> {
        self.simplex
            .as_deref()
            .ok_or(Error::NotReady(Missing::Simplex))
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

    /// Moves the simplex until convergence, reporting each move to
    /// `observer`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] without an objective or simplex, an
    /// evaluation error, or [`Failure::MaxIters`] if the iteration cap is
    /// reached. On failure the evolved simplex is kept and no result is
    /// stored.
    pub fn minimize<O>(&mut self, mut observer: O) -> Result<Solution<N>, Error>
    where
        O: for<'a> Observer<Event<'a, N>>,
    {
        let objective = self
            .objective
            .as_ref()
            .ok_or(Error::NotReady(Missing::Objective))?;
        let simplex = self
            .simplex
            .as_mut()
            .ok_or(Error::NotReady(Missing::Simplex))?;

        let running = self.lifecycle.lock()?;
        let run = Run {
            objective,
            config: &self.config,
            state: State::Locked,
        };
        let outcome = run.execute(simplex, &mut observer);
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
struct Run<'s, F> {
    objective: &'s F,
    config: &'s Config,
    state: State,
}

impl<F> Run<'_, F> {
    fn execute<O, const N: usize>(
        &self,
        simplex: &mut [Point<N>],
        observer: &mut O,
    ) -> Result<Solution<N>, Error>
    where
        F: Objective<N>,
        O: for<'a> Observer<Event<'a, N>>,
    {
        let max_iters = self.config.max_iters();

        for iter in 1..=max_iters {
            sort(simplex);
            if let Some(solution) = self.converged(simplex, iter - 1) {
                return Ok(solution);
            }

            // A failed shrink can leave the vertices partly replaced.
            let movement = match self.step(simplex) {
                Ok(movement) => movement,
                Err(err) => {
                    sort(simplex);
                    return Err(err);
                }
            };

            let best = simplex
                .iter()
                .copied()
                .min_by(|a, b| a.objective.total_cmp(&b.objective))
                .unwrap_or(simplex[0]);
            observer.observe(&Event {
                iter,
                max_iters,
                point: best,
                state: self.state,
                movement,
                simplex: &*simplex,
            });
        }

        sort(simplex);
        self.converged(simplex, max_iters)
            .ok_or_else(|| Failure::MaxIters { max_iters }.into())
    }

    /// Checks the spread of a sorted simplex.
    fn converged<const N: usize>(&self, simplex: &[Point<N>], iters: usize) -> Option<Solution<N>> {
        let lo = simplex[0].objective;
        let hi = simplex[N].objective;
        let spread = 2.0 * (hi - lo).abs() / (hi.abs() + lo.abs() + TINY);

        (spread < self.config.tolerance()).then_some(Solution {
            x: simplex[0].x,
            objective: lo,
            iters,
        })
    }

    /// Applies one move to a sorted simplex.
    fn step<const N: usize>(&self, simplex: &mut [Point<N>]) -> Result<Move, Error>
    where
        F: Objective<N>,
    {
        let best = simplex[0];
        let second_worst = simplex[N - 1].objective;
        let worst = simplex[N];

        let centroid: [f64; N] = std::array::from_fn(|i| {
            #[allow(clippy::cast_precision_loss)]
            let n = N as f64;
            simplex[..N].iter().map(|p| p.x[i]).sum::<f64>() / n
        });
        let toward = |from: &[f64; N], t: f64| -> [f64; N] {
            std::array::from_fn(|i| centroid[i] + t * (from[i] - centroid[i]))
        };

        let reflected = evaluate(self.objective, toward(&worst.x, -ALPHA))?;

        if reflected.objective < best.objective {
            let expanded = evaluate(self.objective, toward(&worst.x, -ALPHA * GAMMA))?;
            return Ok(if expanded.objective < reflected.objective {
                simplex[N] = expanded;
                Move::Expand
            } else {
                simplex[N] = reflected;
                Move::Reflect
            });
        }

        if reflected.objective < second_worst {
            simplex[N] = reflected;
            return Ok(Move::Reflect);
        }

        if reflected.objective < worst.objective {
            let contracted = evaluate(self.objective, toward(&reflected.x, RHO))?;
            if contracted.objective <= reflected.objective {
                simplex[N] = contracted;
                return Ok(Move::ContractOutside);
            }
        } else {
            let contracted = evaluate(self.objective, toward(&worst.x, RHO))?;
            if contracted.objective < worst.objective {
                simplex[N] = contracted;
                return Ok(Move::ContractInside);
            }
        }

        for vertex in &mut simplex[1..] {
            let x = std::array::from_fn(|i| best.x[i] + SIGMA * (vertex.x[i] - best.x[i]));
            *vertex = evaluate(self.objective, x)?;
        }
        Ok(Move::Shrink)
    }
}

/// Orders vertices from best to worst.
fn sort<const N: usize>(simplex: &mut [Point<N>]) {
    simplex.sort_by(|a, b| a.objective.total_cmp(&b.objective));
}
