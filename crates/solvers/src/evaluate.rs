use minima_core::{Gradient, Objective};

use crate::error::{Error, Failure};

/// A point with its evaluated objective value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point<const N: usize> {
    /// The coordinates.
    pub x: [f64; N],

    /// The objective value at `x`.
    pub objective: f64,
}

impl<const N: usize> Point<N> {
    /// Creates a new point.
    #[must_use]
    pub fn new(x: [f64; N], objective: f64) -> Self {
        Self { x, objective }
    }
}

/// Evaluates the objective at `x`.
///
/// # Errors
///
/// Returns [`Error::Evaluation`] wrapping the objective's own error, or
/// [`Failure::NotANumber`] if the objective returns NaN.
pub fn evaluate<F, const N: usize>(objective: &F, x: [f64; N]) -> Result<Point<N>, Error>
where
    F: Objective<N>,
{
    let value = value(objective, &x)?;
    Ok(Point::new(x, value))
}

pub(crate) fn value<F, const N: usize>(objective: &F, x: &[f64; N]) -> Result<f64, Error>
where
    F: Objective<N>,
{
    let value = objective.value(x).map_err(Error::evaluation)?;
    if value.is_nan() {
        return Err(Failure::NotANumber.into());
    }
    Ok(value)
}

/// Evaluates a single-variable objective at `x`.
pub(crate) fn value_at<F>(objective: &F, x: f64) -> Result<f64, Error>
where
    F: Objective<1>,
{
    value(objective, &[x])
}

/// Evaluates the gradient at `x`, rejecting NaN components.
pub(crate) fn gradient<G, const N: usize>(gradient: &G, x: &[f64; N]) -> Result<[f64; N], Error>
where
    G: Gradient<N>,
{
    let mut out = [0.0; N];
    gradient.gradient(x, &mut out).map_err(Error::evaluation)?;
    if out.iter().any(|g| g.is_nan()) {
        return Err(Failure::NotANumber.into());
    }
    Ok(out)
}

/// Evaluates the derivative of a single-variable function at `x`.
pub(crate) fn derivative_at<G>(derivative: &G, x: f64) -> Result<f64, Error>
where
    G: Gradient<1>,
{
    gradient(derivative, &[x]).map(|[d]| d)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::error::Error as StdError;

    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("outside domain at x = {x}")]
    struct Domain {
        x: f64,
    }

    #[test]
    fn evaluate_builds_point() {
        let f = |x: &[f64; 2]| Ok::<_, Domain>(x[0] + x[1]);

        let point = evaluate(&f, [1.0, 2.0]).unwrap();

        assert_eq!(point, Point::new([1.0, 2.0], 3.0));
    }

    #[test]
    fn evaluation_error_is_the_source() {
        let f = |x: &[f64; 1]| {
            if x[0] < 0.0 {
                Err(Domain { x: x[0] })
            } else {
                Ok(x[0].sqrt())
            }
        };

        let err = value_at(&f, -2.0).unwrap_err();

        let source = err.source().and_then(|e| e.downcast_ref::<Domain>());
        assert!(matches!(source, Some(Domain { x }) if *x == -2.0));
    }

    #[test]
    fn nan_is_a_failure() {
        let f = |_: &[f64; 1]| Ok::<_, Domain>(f64::NAN);

        assert!(matches!(
            value_at(&f, 0.0),
            Err(Error::Failed(Failure::NotANumber))
        ));
    }

    #[test]
    fn nan_gradient_is_a_failure() {
        let g = |x: &[f64; 2], out: &mut [f64; 2]| {
            *out = [x[0], f64::NAN];
            Ok::<_, Domain>(())
        };

        assert!(matches!(
            gradient(&g, &[1.0, 1.0]),
            Err(Error::Failed(Failure::NotANumber))
        ));
    }
}
