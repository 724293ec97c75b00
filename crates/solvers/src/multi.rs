//! Minimization of functions of `N` variables.
//!
//! # Solvers
//!
//! - [`powell`]: direction-set method needing only function values; each
//!   sweep is a series of line minimizations, and the direction of largest
//!   decrease is replaced by the sweep's net displacement
//! - [`conjugate_gradient`]: Fletcher–Reeves or Polak–Ribière conjugate
//!   directions with derivative-aware line minimizations
//! - [`quasi_newton`]: BFGS updates of an inverse-Hessian approximation with
//!   a backtracking line search
//! - [`nelder_mead`]: downhill simplex method needing only function values
//!
//! All four emit one typed event per completed iteration to an
//! [`Observer`](minima_core::Observer). Events are read-only and the run
//! cannot be stopped from inside the observer; the iteration cap in
//! [`Config`](crate::Config) bounds every run.
//!
//! The dimension `N` is part of the solver's type, so start points,
//! directions, and simplex vertices of the wrong length do not compile.

pub mod conjugate_gradient;
pub mod nelder_mead;
pub mod powell;
pub mod quasi_newton;

pub use conjugate_gradient::ConjugateGradient;
pub use nelder_mead::{NelderMead, Simplex};
pub use powell::Powell;
pub use quasi_newton::QuasiNewton;

/// The result of a multi-variable minimization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution<const N: usize> {
    /// Best point found.
    pub x: [f64; N],

    /// Objective value at `x`.
    pub objective: f64,

    /// Iterations performed.
    pub iters: usize,
}

/// Guards fractional tests against a zero objective.
const TINY: f64 = 1e-25;

/// Returns true if the decrease from `before` to `after` is small relative to
/// their magnitudes.
fn is_fractional_decrease_small(before: f64, after: f64, tolerance: f64) -> bool {
    2.0 * (before - after).abs() <= tolerance * (before.abs() + after.abs()) + TINY
}
