use minima_core::Observer;

use crate::traits::{HasIteration, HasObjective};

/// Records `(iteration, objective)` after every iteration of a run.
///
/// Pass `&mut history` as the observer so the record outlives the run:
///
/// ```rust
/// use std::convert::Infallible;
///
/// use minima_observers::History;
/// use minima_solvers::multi::Powell;
///
/// let bowl = |x: &[f64; 2]| Ok::<_, Infallible>(x[0] * x[0] + 4.0 * x[1] * x[1]);
///
/// let mut powell = Powell::new();
/// powell.set_objective(bowl)?;
/// powell.set_start([1.0, 1.0])?;
///
/// let mut history = History::new();
/// let solution = powell.minimize(&mut history)?;
///
/// assert_eq!(history.len(), solution.iters);
/// # Ok::<(), minima_solvers::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    entries: Vec<(usize, f64)>,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded `(iteration, objective)` pairs in order.
    #[must_use]
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<(usize, f64)> {
        self.entries.last().copied()
    }

    /// Returns true if no iteration raised the objective.
    #[must_use]
    pub fn is_non_increasing(&self) -> bool {
        self.entries.windows(2).all(|w| w[1].1 <= w[0].1)
    }

    /// Discards all entries, e.g. before reusing the history for another run.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<E> Observer<E> for &mut History
where
    E: HasIteration + HasObjective,
{
    fn observe(&mut self, event: &E) {
        self.entries.push((event.iteration(), event.objective()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use approx::assert_abs_diff_eq;
    use minima_solvers::multi::{ConjugateGradient, NelderMead, QuasiNewton, Simplex};

    fn bowl(x: &[f64; 2]) -> Result<f64, Infallible> {
        Ok((x[0] - 2.0).powi(2) + 3.0 * (x[1] + 1.0).powi(2) + 0.5)
    }

    fn bowl_gradient(x: &[f64; 2], out: &mut [f64; 2]) -> Result<(), Infallible> {
        out[0] = 2.0 * (x[0] - 2.0);
        out[1] = 6.0 * (x[1] + 1.0);
        Ok(())
    }

    #[test]
    fn records_quasi_newton_run() {
        let mut qn = QuasiNewton::new();
        qn.set_objective(bowl).unwrap();
        qn.set_gradient(bowl_gradient).unwrap();
        qn.set_start([0.0, 0.0]).unwrap();

        let mut history = History::new();
        let solution = qn.minimize(&mut history).unwrap();

        assert_eq!(history.len(), solution.iters);
        let iterations: Vec<usize> = history.entries().iter().map(|&(i, _)| i).collect();
        assert_eq!(iterations, (1..=solution.iters).collect::<Vec<_>>());
        let (_, last) = history.last().unwrap();
        assert_abs_diff_eq!(last, solution.objective);
        assert!(history.is_non_increasing());
    }

    #[test]
    fn records_conjugate_gradient_run() {
        let mut cg = ConjugateGradient::new();
        cg.set_objective(bowl).unwrap();
        cg.set_gradient(bowl_gradient).unwrap();
        cg.set_start([0.0, 0.0]).unwrap();

        let mut history = History::new();
        let solution = cg.minimize(&mut history).unwrap();

        assert_eq!(history.len(), solution.iters);
        assert!(history.is_non_increasing());
    }

    #[test]
    fn records_nelder_mead_run() {
        let mut nm = NelderMead::new();
        nm.set_objective(bowl).unwrap();
        nm.set_simplex(&Simplex::from_start([0.0, 0.0], [1.0, 1.0]).unwrap())
            .unwrap();

        let mut history = History::new();
        let solution = nm.minimize(&mut history).unwrap();

        assert_eq!(history.len(), solution.iters);
        assert!(history.is_non_increasing());
        assert_abs_diff_eq!(history.last().unwrap().1, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn clear_empties_the_record() {
        let mut history = History::new();
        assert!(history.is_empty());
        assert!(history.last().is_none());

        history.entries.push((1, 3.0));
        history.entries.push((2, 4.0));
        assert!(!history.is_non_increasing());

        history.clear();
        assert!(history.is_empty());
    }
}
