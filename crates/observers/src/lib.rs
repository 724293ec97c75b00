//! Reusable observers for the Minima toolkit.
//!
//! This crate provides [`Observer`] implementations and capability traits that
//! work across the multi-variable minimizers in `minima-solvers`.
//!
//! # Modules
//!
//! - [`traits`]: capability traits for cross-solver observers
//!   ([`HasIteration`], [`HasObjective`])
//! - [`History`]: records the objective after every iteration
//!
//! [`Observer`]: minima_core::Observer
//! [`HasIteration`]: traits::HasIteration
//! [`HasObjective`]: traits::HasObjective

mod history;
pub mod traits;

pub use history::History;
