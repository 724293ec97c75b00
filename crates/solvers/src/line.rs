//! Minimization of a multi-variable function along a line.
//!
//! [`LineFunction`] restricts an objective to `t ↦ f(origin + t·direction)`,
//! and [`LineDerivative`] gives its derivative `∇f(origin + t·direction)·direction`.
//! Both keep the wrapped evaluator's error type, so a failure inside a line
//! minimization surfaces exactly as the caller's objective or gradient
//! reported it.

use minima_core::{Gradient, Objective};

use crate::{
    config::Config,
    error::Error,
    scalar::{Bracket, BracketConfig, Solution, brent, brent_derivative},
    vector::{axpy, dot},
};

/// An objective restricted to a line through `origin` along `direction`.
#[derive(Debug, Clone, Copy)]
pub struct LineFunction<'a, F, const N: usize> {
    objective: &'a F,
    origin: [f64; N],
    direction: [f64; N],
}

impl<'a, F, const N: usize> LineFunction<'a, F, N> {
    #[must_use]
    pub fn new(objective: &'a F, origin: [f64; N], direction: [f64; N]) -> Self {
        Self {
            objective,
            origin,
            direction,
        }
    }

    /// Returns the point at step `t` along the line.
    #[must_use]
    pub fn point(&self, t: f64) -> [f64; N] {
        axpy(&self.origin, t, &self.direction)
    }
}

impl<F, const N: usize> Objective<1> for LineFunction<'_, F, N>
where
    F: Objective<N>,
{
    type Error = F::Error;

    fn value(&self, t: &[f64; 1]) -> Result<f64, Self::Error> {
        self.objective.value(&self.point(t[0]))
    }
}

/// The directional derivative of an objective along a line.
#[derive(Debug, Clone, Copy)]
pub struct LineDerivative<'a, G, const N: usize> {
    gradient: &'a G,
    origin: [f64; N],
    direction: [f64; N],
}

impl<'a, G, const N: usize> LineDerivative<'a, G, N> {
    #[must_use]
    pub fn new(gradient: &'a G, origin: [f64; N], direction: [f64; N]) -> Self {
        Self {
            gradient,
            origin,
            direction,
        }
    }
}

impl<G, const N: usize> Gradient<1> for LineDerivative<'_, G, N>
where
    G: Gradient<N>,
{
    type Error = G::Error;

    fn gradient(&self, t: &[f64; 1], out: &mut [f64; 1]) -> Result<(), Self::Error> {
        let x = axpy(&self.origin, t[0], &self.direction);
        let mut g = [0.0; N];
        self.gradient.gradient(&x, &mut g)?;
        out[0] = dot(&g, &self.direction);
        Ok(())
    }
}

/// Settings for a line minimization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineConfig {
    bracket: BracketConfig,
    minimizer: Config,
}

impl LineConfig {
    #[must_use]
    pub fn new(bracket: BracketConfig, minimizer: Config) -> Self {
        Self { bracket, minimizer }
    }

    /// Returns the settings for bracketing the step.
    #[must_use]
    pub fn bracket(&self) -> &BracketConfig {
        &self.bracket
    }

    /// Returns the settings for minimizing within the bracket.
    #[must_use]
    pub fn minimizer(&self) -> &Config {
        &self.minimizer
    }
}

impl Default for LineConfig {
    /// A loose step tolerance; outer iterations correct small step errors.
    fn default() -> Self {
        Self {
            bracket: BracketConfig::default(),
            minimizer: Config::preset(2e-4, 100),
        }
    }
}

/// The minimum found along a line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineMinimum<const N: usize> {
    /// The step `t` from the origin, in units of the direction.
    pub step: f64,

    /// The point `origin + step·direction`.
    pub x: [f64; N],

    /// Objective value at `x`.
    pub objective: f64,
}

/// Minimizes `objective` along `direction` from `origin` with Brent's method.
///
/// The step is bracketed starting from `t = 0` and `t = 1`.
///
/// # Errors
///
/// Returns an error if no bracket is found, the minimization does not
/// converge, or the objective fails. Objective errors are passed through
/// unchanged as the source of [`Error::Evaluation`].
pub fn minimize_along<F, const N: usize>(
    objective: &F,
    origin: &[f64; N],
    direction: &[f64; N],
    config: &LineConfig,
) -> Result<LineMinimum<N>, Error>
where
    F: Objective<N>,
{
    let line = LineFunction::new(objective, *origin, *direction);
    let bracket = Bracket::search(&line, 0.0, 1.0, config.bracket())?;
    let solution = brent::minimize(&line, &bracket, config.minimizer())?;
    Ok(to_minimum(&line, &solution))
}

/// Minimizes `objective` along `direction` using its directional derivative.
///
/// # Errors
///
/// Returns an error if no bracket is found, the minimization does not
/// converge, or the objective or gradient fails.
pub fn minimize_along_with_derivative<F, G, const N: usize>(
    objective: &F,
    gradient: &G,
    origin: &[f64; N],
    direction: &[f64; N],
    config: &LineConfig,
) -> Result<LineMinimum<N>, Error>
where
    F: Objective<N>,
    G: Gradient<N>,
{
    let line = LineFunction::new(objective, *origin, *direction);
    let slope = LineDerivative::new(gradient, *origin, *direction);
    let bracket = Bracket::search(&line, 0.0, 1.0, config.bracket())?;
    let solution = brent_derivative::minimize(&line, &slope, &bracket, config.minimizer())?;
    Ok(to_minimum(&line, &solution))
}

fn to_minimum<F, const N: usize>(line: &LineFunction<'_, F, N>, solution: &Solution) -> LineMinimum<N> {
    LineMinimum {
        step: solution.x,
        x: line.point(solution.x),
        objective: solution.objective,
    }
}
