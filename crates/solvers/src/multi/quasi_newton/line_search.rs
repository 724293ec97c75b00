use minima_core::Objective;

use crate::{
    Point,
    error::{Error, Failure},
    evaluate::value,
    vector::{axpy, dot, norm, scale},
};

/// Sufficient-decrease fraction of the initial slope.
const ALF: f64 = 1e-4;

/// Relative step size below which backtracking gives up.
pub(super) const TOLX: f64 = 4.0 * f64::EPSILON;

/// Outcome of a backtracking line search.
#[derive(Debug, Clone, Copy)]
pub(super) enum Step<const N: usize> {
    /// A point satisfying the sufficient-decrease condition.
    Accepted(Point<N>),

    /// The step shrank below [`TOLX`] without sufficient decrease.
    Exhausted,
}

/// Backtracks along `direction` from `from` until the Armijo condition holds.
///
/// The full step is first capped to length `max_step`. When the full step
/// fails, the step length is chosen by minimizing a quadratic model of the
/// objective along the line, then cubic models on later attempts. Each new
/// step is kept within `[0.1, 0.5]` of the previous one.
///
/// # Errors
///
/// Returns [`Failure::NonDescent`] if `direction` does not point downhill
/// according to `gradient`, or any evaluation error.
#[allow(clippy::float_cmp)]
pub(super) fn backtrack<F, const N: usize>(
    objective: &F,
    from: &Point<N>,
    gradient: &[f64; N],
    direction: &[f64; N],
    max_step: f64,
) -> Result<Step<N>, Error>
where
    F: Objective<N>,
{
    let length = norm(direction);
    let direction = if length > max_step {
        scale(max_step / length, direction)
    } else {
        *direction
    };

    let slope = dot(gradient, &direction);
    if slope.is_nan() || slope >= 0.0 {
        return Err(Failure::NonDescent.into());
    }

    let relative = (0..N)
        .map(|i| direction[i].abs() / from.x[i].abs().max(1.0))
        .fold(0.0, f64::max);
    let min_lambda = TOLX / relative;

    let mut lambda: f64 = 1.0;
    let mut previous: Option<(f64, f64)> = None;

    loop {
        let x = axpy(&from.x, lambda, &direction);
        let f = value(objective, &x)?;

        if lambda < min_lambda {
            return Ok(Step::Exhausted);
        }
        if f <= from.objective + ALF * lambda * slope {
            return Ok(Step::Accepted(Point::new(x, f)));
        }

        let next = match previous {
            None => -slope / (2.0 * (f - from.objective - slope)),
            Some((lambda2, f2)) => {
                let rhs1 = f - from.objective - lambda * slope;
                let rhs2 = f2 - from.objective - lambda2 * slope;
                let a = (rhs1 / (lambda * lambda) - rhs2 / (lambda2 * lambda2)) / (lambda - lambda2);
                let b = (-lambda2 * rhs1 / (lambda * lambda) + lambda * rhs2 / (lambda2 * lambda2))
                    / (lambda - lambda2);
                let candidate = if a == 0.0 {
                    -slope / (2.0 * b)
                } else {
                    let disc = b * b - 3.0 * a * slope;
                    if disc < 0.0 {
                        0.5 * lambda
                    } else if b <= 0.0 {
                        (-b + disc.sqrt()) / (3.0 * a)
                    } else {
                        -slope / (b + disc.sqrt())
                    }
                };
                candidate.min(0.5 * lambda)
            }
        };

        previous = Some((lambda, f));
        lambda = next.max(0.1 * lambda);
    }
}
