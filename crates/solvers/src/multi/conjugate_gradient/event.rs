use crate::{Point, State};

/// Progress reported after each conjugate-gradient iteration.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a, const N: usize> {
    /// One-based iteration index.
    pub iter: usize,

    /// The configured iteration cap.
    pub max_iters: usize,

    /// Point reached by this iteration's line minimization.
    pub point: Point<N>,

    /// Lifecycle state of the solver, [`State::Locked`] during a run.
    pub state: State,

    /// Gradient at `point`.
    pub gradient: &'a [f64; N],

    /// Direction the next line minimization will follow.
    pub direction: &'a [f64; N],

    /// Conjugacy coefficient used to build `direction`.
    pub beta: f64,

    /// True if `direction` was reset to steepest descent.
    pub restarted: bool,
}
