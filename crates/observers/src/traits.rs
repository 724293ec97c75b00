//! Capability traits for cross-solver observers.
//!
//! Every multi-variable minimizer reports its own event type. These traits
//! expose what the events have in common, so one observer can follow any
//! solver.
//!
//! # Example
//!
//! ```rust
//! use minima_core::Observer;
//! use minima_observers::traits::HasObjective;
//!
//! /// Counts iterations that improved on the best value seen so far.
//! struct Improvements {
//!     best: f64,
//!     count: usize,
//! }
//!
//! impl<E: HasObjective> Observer<E> for Improvements {
//!     fn observe(&mut self, event: &E) {
//!         if event.objective() < self.best {
//!             self.best = event.objective();
//!             self.count += 1;
//!         }
//!     }
//! }
//! ```

use minima_solvers::multi::{conjugate_gradient, nelder_mead, powell, quasi_newton};

/// An event reported once per completed iteration.
pub trait HasIteration {
    /// Returns the one-based index of the completed iteration.
    fn iteration(&self) -> usize;

    /// Returns the configured iteration cap.
    fn max_iters(&self) -> usize;
}

/// An event that carries the objective at the current point.
pub trait HasObjective {
    /// Returns the objective value at the current point.
    fn objective(&self) -> f64;

    /// Returns the current point.
    fn x(&self) -> &[f64];
}

macro_rules! impl_capabilities {
    ($($solver:ident),+ $(,)?) => {$(
        impl<const N: usize> HasIteration for $solver::Event<'_, N> {
            fn iteration(&self) -> usize {
                self.iter
            }

            fn max_iters(&self) -> usize {
                self.max_iters
            }
        }

        impl<const N: usize> HasObjective for $solver::Event<'_, N> {
            fn objective(&self) -> f64 {
                self.point.objective
            }

            fn x(&self) -> &[f64] {
                &self.point.x
            }
        }
    )+};
}

impl_capabilities!(powell, conjugate_gradient, quasi_newton, nelder_mead);
