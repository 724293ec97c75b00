//! Core traits for the Minima local minimization toolkit.
//!
//! This crate defines the shared abstractions that solvers and observers
//! build on:
//!
//! - [`Objective`]: a scalar function of `N` variables that can be evaluated
//! - [`Gradient`]: the gradient of such a function, for derivative-aware solvers
//! - [`Observer`]: receives solver progress events

mod objective;
mod observer;

pub use objective::{Gradient, Objective};
pub use observer::Observer;
