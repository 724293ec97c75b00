/// Receives progress events from a solver.
///
/// Observers let callers monitor a running solver without changing its API,
/// enabling logging, diagnostics, or recording a convergence history.
///
/// Events are passed by shared reference and are invoked synchronously
/// between iterations, so an observer can inspect solver state but never
/// change it.
///
/// Closures automatically implement `Observer`, and a built-in impl for `()`
/// provides a no-op observer.
pub trait Observer<E> {
    /// Observes a solver event.
    fn observe(&mut self, event: &E);
}

/// Blanket implementation for observer closures.
impl<E, F> Observer<E> for F
where
    F: FnMut(&E),
{
    fn observe(&mut self, event: &E) {
        self(event);
    }
}

/// A no-op observer.
impl<E> Observer<E> for () {
    fn observe(&mut self, _event: &E) {}
}
