//! Local minimizers for the Minima toolkit.
//!
//! Solvers are grouped by the number of variables they handle:
//!
//! - [`scalar`]: bracket search, golden-section search, and Brent's method
//!   (with or without a derivative) for functions of one variable
//! - [`line`]: minimization of an `N`-variable function along a line,
//!   used by the direction-based solvers
//! - [`multi`]: Powell's direction-set method, conjugate gradient,
//!   quasi-Newton (BFGS), and Nelder–Mead for functions of `N` variables
//!
//! Every solver follows the same lifecycle. Inputs are set through validating
//! setters, `minimize` runs to completion and stores the result, and any later
//! change to the inputs discards that result. See [`State`].

mod config;
mod error;
mod evaluate;
mod lifecycle;
mod vector;

pub mod line;
pub mod multi;
pub mod scalar;

pub use config::{Config, ConfigError};
pub use error::{Error, ErrorKind, Failure, Missing};
pub use evaluate::{Point, evaluate};
pub use lifecycle::State;
