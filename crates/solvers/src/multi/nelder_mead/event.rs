use crate::{Point, State};

/// The transformation a Nelder–Mead iteration applied to the simplex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// The worst vertex was reflected through the centroid of the others.
    Reflect,

    /// The reflected point was pushed twice as far.
    Expand,

    /// The worst vertex moved halfway toward the reflected point.
    ContractOutside,

    /// The worst vertex moved halfway toward the centroid.
    ContractInside,

    /// Every vertex moved halfway toward the best one.
    Shrink,
}

/// Progress reported after each Nelder–Mead iteration.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a, const N: usize> {
    /// One-based iteration index.
    pub iter: usize,

    /// The configured iteration cap.
    pub max_iters: usize,

    /// Best vertex after the move.
    pub point: Point<N>,

    /// Lifecycle state of the solver, [`State::Locked`] during a run.
    pub state: State,

    /// The move this iteration made.
    pub movement: Move,

    /// All `N + 1` vertices after the move, in no particular order.
    pub simplex: &'a [Point<N>],
}
