use minima_core::Objective;

use crate::{
    config::Config,
    error::{Error, Missing},
    lifecycle::{Lifecycle, State},
};

use super::{Bracket, BracketConfig, Solution};

/// A single-variable method run by a [`Minimizer`].
///
/// Implemented by [`GoldenSection`](super::GoldenSection),
/// [`BrentParabolic`](super::BrentParabolic) and
/// [`BrentDerivative`](super::BrentDerivative).
pub trait Algorithm {
    /// Settings used until the caller provides others.
    fn default_config() -> Config;

    /// Reports an input the method needs beyond the objective and bracket.
    fn missing(&self) -> Option<Missing> {
        None
    }

    /// Minimizes `objective` within `bracket`.
    ///
    /// # Errors
    ///
    /// Returns an error if an evaluation fails or the method does not
    /// converge within `config.max_iters()` iterations.
    fn run<F: Objective<1>>(
        &self,
        objective: &F,
        bracket: &Bracket,
        config: &Config,
    ) -> Result<Solution, Error>;
}

/// Holds the inputs of a single-variable minimization and its last result.
///
/// Use through the [`Golden`](super::Golden), [`Brent`](super::Brent) and
/// [`DerivativeBrent`](super::DerivativeBrent) aliases. Replacing the
/// objective discards the bracket, and any change to the inputs discards a
/// stored result.
pub struct Minimizer<F, A> {
    objective: Option<F>,
    bracket: Option<Bracket>,
    config: Config,
    bracket_config: BracketConfig,
    algorithm: A,
    lifecycle: Lifecycle<Solution>,
}

impl<F, A> Minimizer<F, A>
where
    A: Algorithm + Default,
{
    /// Creates a minimizer with no objective or bracket and default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            objective: None,
            bracket: None,
            config: A::default_config(),
            bracket_config: BracketConfig::default(),
            algorithm: A::default(),
            lifecycle: Lifecycle::new(),
        }
    }
}

impl<F, A> Default for Minimizer<F, A>
where
    A: Algorithm + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<F, A> Minimizer<F, A>
where
    F: Objective<1>,
    A: Algorithm,
{
    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> State {
        let ready =
            self.objective.is_some() && self.bracket.is_some() && self.algorithm.missing().is_none();
        self.lifecycle.state(ready)
    }

    /// Returns true while a minimization is in progress.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lifecycle.is_locked()
    }

    /// Sets the objective, discarding any bracket found for the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Locked`] during a minimization.
    pub fn set_objective(&mut self, objective: F) -> Result<(), Error> {
        self.lifecycle.ensure_unlocked()?;
        self.lifecycle.invalidate();
        self.bracket = None;
        self.objective = Some(objective);
        Ok(())
    }

    /// Returns the convergence settings.
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

    /// Replaces the settings used by [`Self::search_bracket`].
    ///
    /// Like every setter, this discards a stored result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Locked`] during a minimization.
    pub fn set_bracket_config(&mut self, config: BracketConfig) -> Result<(), Error> {
        self.lifecycle.ensure_unlocked()?;
        self.lifecycle.invalidate();
        self.bracket_config = config;
        Ok(())
    }

    /// Evaluates the objective at `points` and uses them as the bracket.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] without an objective,
    /// [`Error::InvalidBracket`] if the points do not bracket a minimum,
    /// [`Error::Locked`] during a minimization, or any evaluation error.
    pub fn set_bracket(&mut self, points: [f64; 3]) -> Result<(), Error> {
        self.lifecycle.ensure_unlocked()?;
        let objective = self
            .objective
            .as_ref()
            .ok_or(Error::NotReady(Missing::Objective))?;
        let bracket = Bracket::evaluate(objective, points)?;
        self.lifecycle.invalidate();
        self.bracket = Some(bracket);
        Ok(())
    }

    /// Uses an already evaluated bracket.
    ///
    /// The bracket's values are trusted to come from the current objective.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Locked`] during a minimization.
    pub fn set_evaluated_bracket(&mut self, bracket: Bracket) -> Result<(), Error> {
        self.lifecycle.ensure_unlocked()?;
        self.lifecycle.invalidate();
        self.bracket = Some(bracket);
        Ok(())
    }

    /// Searches for a bracket starting from `a` and `b` and stores it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] without an objective, [`Error::Locked`]
    /// during a minimization, or any error from [`Bracket::search`]. The
    /// previous bracket is kept on error.
    pub fn search_bracket(&mut self, a: f64, b: f64) -> Result<&Bracket, Error> {
        self.lifecycle.ensure_unlocked()?;
        let objective = self
            .objective
            .as_ref()
            .ok_or(Error::NotReady(Missing::Objective))?;
        let bracket = Bracket::search(objective, a, b, &self.bracket_config)?;
        self.lifecycle.invalidate();
        Ok(self.bracket.insert(bracket))
    }

    /// Returns the current bracket.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] if no bracket has been set or found.
    pub fn bracket(&self) -> Result<&Bracket, Error> {
        self.bracket.as_ref().ok_or(Error::NotReady(Missing::Bracket))
    }

    /// Runs the method and stores the solution.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] if an input is missing, an evaluation
    /// error, or a [`Failure`](crate::Failure) if the method does not
    /// converge. A failed run leaves no result.
    pub fn minimize(&mut self) -> Result<Solution, Error> {
        let objective = self
            .objective
            .as_ref()
            .ok_or(Error::NotReady(Missing::Objective))?;
        if let Some(missing) = self.algorithm.missing() {
            return Err(Error::NotReady(missing));
        }
        let bracket = self.bracket.as_ref().ok_or(Error::NotReady(Missing::Bracket))?;

        let running = self.lifecycle.lock()?;
        let outcome = self.algorithm.run(objective, bracket, &self.config);
        running.finish(outcome)
    }

    /// Returns the stored solution of the last successful run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] if there is no stored solution.
    pub fn result(&self) -> Result<&Solution, Error> {
        self.lifecycle.result()
    }

    /// Gives access to method-specific inputs as a structural change.
    pub(super) fn update_algorithm(&mut self) -> Result<&mut A, Error> {
        self.lifecycle.ensure_unlocked()?;
        self.lifecycle.invalidate();
        Ok(&mut self.algorithm)
    }

    #[cfg(test)]
    pub(super) fn force_lock(&mut self) {
        self.lifecycle.force_lock();
    }
}
