use crate::{Point, State};

/// Progress reported after each completed Powell sweep.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a, const N: usize> {
    /// One-based index of the completed sweep.
    pub iter: usize,

    /// The configured iteration cap.
    pub max_iters: usize,

    /// Best point after the sweep.
    pub point: Point<N>,

    /// Lifecycle state of the solver, [`State::Locked`] during a run.
    pub state: State,

    /// The direction set the next sweep will use.
    pub directions: &'a [[f64; N]; N],

    /// Index of the direction that gave the largest decrease in this sweep.
    pub largest_decrease: usize,

    /// True if this sweep replaced a direction with its net displacement.
    pub replaced: bool,
}
