use crate::{Point, State};

/// Progress reported after each quasi-Newton iteration.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a, const N: usize> {
    /// One-based iteration index.
    pub iter: usize,

    /// The configured iteration cap.
    pub max_iters: usize,

    /// Point accepted by this iteration's line search.
    pub point: Point<N>,

    /// Lifecycle state of the solver, [`State::Locked`] during a run.
    pub state: State,

    /// Gradient at `point`.
    pub gradient: &'a [f64; N],

    /// Direction the next line search will follow.
    pub direction: &'a [f64; N],

    /// Current inverse-Hessian approximation, stored by rows.
    pub inverse_hessian: &'a [[f64; N]; N],

    /// True if the secant pair passed the curvature test and updated the
    /// inverse Hessian.
    pub updated: bool,

    /// True if the inverse Hessian was reset to the identity.
    pub reset: bool,
}
