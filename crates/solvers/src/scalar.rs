//! Single-variable minimization on a bracketed interval.
//!
//! # Algorithms
//!
//! Every method here starts from a [`Bracket`]: three abscissas `a, b, c`
//! with the middle value at or below both outer values, so at least one local
//! minimum lies between `a` and `c`.
//!
//! - [`Golden`] shrinks the bracket by the golden ratio each step. Slow but
//!   needs nothing beyond unimodality.
//! - [`Brent`] mixes parabolic interpolation with golden-section steps and
//!   converges superlinearly on smooth functions.
//! - [`DerivativeBrent`] uses the sign and secant of the derivative to pick
//!   each step. Needs a derivative through [`Gradient<1>`].
//!
//! A bracket can be supplied directly or found with
//! [`Minimizer::search_bracket`], which walks downhill from two starting
//! abscissas (see [`Bracket::search`]).
//!
//! # Stopping
//!
//! Each method stops once the bracket width is small relative to the size of
//! the abscissas, as set by [`Config::tolerance`](crate::Config::tolerance).
//! A small absolute floor keeps minima at zero from stalling the test.
//!
//! [`Gradient<1>`]: minima_core::Gradient

mod bracket;
pub mod brent;
pub mod brent_derivative;
pub mod golden;
mod minimizer;


pub use bracket::{Bracket, BracketConfig, BracketError};
pub use brent::BrentParabolic;
pub use brent_derivative::BrentDerivative;
pub use golden::GoldenSection;
pub use minimizer::{Algorithm, Minimizer};

/// Golden-section minimizer.
pub type Golden<F> = Minimizer<F, GoldenSection>;

/// Brent's parabolic-interpolation minimizer.
pub type Brent<F> = Minimizer<F, BrentParabolic>;

/// Brent's minimizer guided by the derivative `D`.
pub type DerivativeBrent<F, D> = Minimizer<F, BrentDerivative<D>>;

/// Absolute floor added to relative tolerances so a minimum at zero converges.
const ZEPS: f64 = f64::EPSILON * 1.0e-3;

/// The result of a single-variable minimization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    /// Best abscissa found.
    pub x: f64,

    /// Objective value at `x`.
    pub objective: f64,

    /// Iterations performed.
    pub iters: usize,

    /// Width of the bracket when the method stopped.
    pub width: f64,
}
