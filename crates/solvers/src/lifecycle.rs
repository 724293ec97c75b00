use crate::error::{Error, Missing};

/// The lifecycle state of a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// A required input (objective, gradient, start point, bracket or simplex)
    /// has not been provided.
    NotReady,

    /// All inputs are present and no minimization is running.
    Ready,

    /// A minimization is in progress; structural changes are rejected.
    Locked,

    /// The last minimization succeeded and its result is stored.
    ResultAvailable,
}

/// Locking and result bookkeeping shared by every solver.
///
/// A stored result is cleared by any structural change, so a solver never
/// reports a result that no longer matches its inputs.
#[derive(Debug, Clone)]
pub(crate) struct Lifecycle<R> {
    locked: bool,
    result: Option<R>,
}

impl<R> Lifecycle<R> {
    pub(crate) fn new() -> Self {
        Self {
            locked: false,
            result: None,
        }
    }

    /// Derives the public state given whether all inputs are present.
    pub(crate) fn state(&self, inputs_ready: bool) -> State {
        if self.locked {
            State::Locked
        } else if self.result.is_some() {
            State::ResultAvailable
        } else if inputs_ready {
            State::Ready
        } else {
            State::NotReady
        }
    }

    pub(crate) fn is_locked(&self) -> bool {
        self.locked
    }

    /// Rejects changes while locked.
    ///
    /// Call before validating new input, then [`Self::invalidate`] once the
    /// input is known to be good.
    pub(crate) fn ensure_unlocked(&self) -> Result<(), Error> {
        if self.locked {
            Err(Error::Locked)
        } else {
            Ok(())
        }
    }

    /// Discards the stored result after a structural change.
    pub(crate) fn invalidate(&mut self) {
        self.result = None;
    }

    /// Marks the start of a minimization.
    ///
    /// The returned guard unlocks when dropped, so a panicking observer or
    /// objective does not leave the solver locked.
    pub(crate) fn lock(&mut self) -> Result<Running<'_, R>, Error> {
        self.ensure_unlocked()?;
        self.result = None;
        self.locked = true;
        Ok(Running { lifecycle: self })
    }

    pub(crate) fn result(&self) -> Result<&R, Error> {
        self.result.as_ref().ok_or(Error::NotReady(Missing::Result))
    }

    #[cfg(test)]
    pub(crate) fn force_lock(&mut self) {
        self.locked = true;
    }
}

/// A minimization in progress.
pub(crate) struct Running<'a, R> {
    lifecycle: &'a mut Lifecycle<R>,
}

impl<R: Clone> Running<'_, R> {
    /// Ends the minimization, storing the result on success.
    pub(crate) fn finish(self, outcome: Result<R, Error>) -> Result<R, Error> {
        let result = outcome?;
        self.lifecycle.result = Some(result.clone());
        Ok(result)
    }
}

impl<R> Drop for Running<'_, R> {
    fn drop(&mut self) {
        self.lifecycle.locked = false;
    }
}
