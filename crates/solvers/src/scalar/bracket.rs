use minima_core::Objective;
use thiserror::Error;

use crate::{
    config::ConfigError,
    error::{Error, Failure},
    evaluate::value_at,
};

/// Growth factor applied to the last step when extending a bracket.
const GOLD: f64 = 1.618_034;

/// Floor for the parabolic-extrapolation denominator.
const TINY: f64 = 1e-20;

/// Errors that can occur when creating a [`Bracket`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BracketError {
    /// One or more abscissas or values are non-finite.
    #[error("non-finite abscissa or value")]
    NonFinite,

    /// The two starting abscissas of a bracket search are equal.
    #[error("zero width")]
    ZeroWidth,

    /// The abscissas are not strictly monotone.
    #[error("abscissas are not strictly ordered")]
    NotOrdered,

    /// The middle value is above one of the outer values.
    #[error("middle value does not bracket a minimum")]
    NotBracketing,
}

/// Three abscissas that enclose a local minimum, with their values.
///
/// The abscissas `a, b, c` are strictly increasing or strictly decreasing,
/// and `f(b) <= f(a)` and `f(b) <= f(c)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    points: [f64; 3],
    values: [f64; 3],
}

impl Bracket {
    /// Creates a validated bracket from abscissas and their values.
    ///
    /// # Errors
    ///
    /// Returns a [`BracketError`] if any entry is non-finite, the abscissas
    /// are not strictly monotone, or the middle value is not the lowest.
    pub fn new(points: [f64; 3], values: [f64; 3]) -> Result<Self, BracketError> {
        check_points(points)?;
        if values.iter().any(|v| !v.is_finite()) {
            return Err(BracketError::NonFinite);
        }
        let [fa, fb, fc] = values;
        if fb > fa || fb > fc {
            return Err(BracketError::NotBracketing);
        }
        Ok(Self { points, values })
    }

    /// Evaluates `objective` at three abscissas and validates the result.
    ///
    /// The ordering is checked before any evaluation happens.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBracket`] for malformed or non-bracketing
    /// abscissas, or any evaluation error.
    pub fn evaluate<F>(objective: &F, points: [f64; 3]) -> Result<Self, Error>
    where
        F: Objective<1>,
    {
        check_points(points)?;
        let [a, b, c] = points;
        let values = [
            value_at(objective, a)?,
            value_at(objective, b)?,
            value_at(objective, c)?,
        ];
        Ok(Self::new(points, values)?)
    }

    /// Searches downhill from `a` and `b` until a minimum is bracketed.
    ///
    /// Each step first tries parabolic extrapolation through the current
    /// triple, limited to `magnification` times the current step, and falls
    /// back to golden-ratio growth when the parabolic guess is unusable.
    ///
    /// # Errors
    ///
    /// Returns [`Failure::BracketNotFound`] if no bracket is found within the
    /// configured number of steps (for example, on a function that decreases
    /// without bound), [`Error::InvalidBracket`] for equal or non-finite
    /// starting points, or any evaluation error.
    pub fn search<F>(objective: &F, a: f64, b: f64, config: &BracketConfig) -> Result<Self, Error>
    where
        F: Objective<1>,
    {
        if !a.is_finite() || !b.is_finite() {
            return Err(BracketError::NonFinite.into());
        }
        #[allow(clippy::float_cmp)]
        if a == b {
            return Err(BracketError::ZeroWidth.into());
        }

        let (mut a, mut b) = (a, b);
        let mut fa = value_at(objective, a)?;
        let mut fb = value_at(objective, b)?;
        if fb > fa {
            std::mem::swap(&mut a, &mut b);
            std::mem::swap(&mut fa, &mut fb);
        }
        let mut c = b + GOLD * (b - a);
        let mut fc = value_at(objective, c)?;

        let mut steps = 0;
        while fb > fc {
            steps += 1;
            if steps > config.max_iters() {
                return Err(Failure::BracketNotFound {
                    max_iters: config.max_iters(),
                }
                .into());
            }

            let r = (b - a) * (fb - fc);
            let q = (b - c) * (fb - fa);
            let denom = 2.0 * (q - r).abs().max(TINY).copysign(q - r);
            let mut u = b - ((b - c) * q - (b - a) * r) / denom;
            let u_limit = b + config.magnification() * (c - b);
            let mut fu;

            if (b - u) * (u - c) > 0.0 {
                // Parabolic guess lies between b and c.
                fu = value_at(objective, u)?;
                if fu < fc {
                    return finish([b, u, c], [fb, fu, fc], config);
                } else if fu > fb {
                    return finish([a, b, u], [fa, fb, fu], config);
                }
                u = c + GOLD * (c - b);
                fu = value_at(objective, u)?;
            } else if (c - u) * (u - u_limit) > 0.0 {
                // Parabolic guess lies between c and the magnification limit.
                fu = value_at(objective, u)?;
                if fu < fc {
                    b = c;
                    c = u;
                    u = c + GOLD * (c - b);
                    fb = fc;
                    fc = fu;
                    fu = value_at(objective, u)?;
                }
            } else {
                // Guess overshoots the magnification limit or lands behind c.
                u = c + GOLD * (c - b);
                fu = value_at(objective, u)?;
            }

            a = b;
            b = c;
            c = u;
            fa = fb;
            fb = fc;
            fc = fu;
        }

        finish([a, b, c], [fa, fb, fc], config)
    }

    /// Returns the abscissas `[a, b, c]`.
    #[must_use]
    pub fn points(&self) -> [f64; 3] {
        self.points
    }

    /// Returns the values `[f(a), f(b), f(c)]`.
    #[must_use]
    pub fn values(&self) -> [f64; 3] {
        self.values
    }

    /// Returns the middle abscissa and its value, the best point so far.
    #[must_use]
    pub fn best(&self) -> (f64, f64) {
        (self.points[1], self.values[1])
    }

    /// Returns the smaller outer abscissa.
    #[must_use]
    pub fn lower(&self) -> f64 {
        self.points[0].min(self.points[2])
    }

    /// Returns the larger outer abscissa.
    #[must_use]
    pub fn upper(&self) -> f64 {
        self.points[0].max(self.points[2])
    }

    /// Returns the width of the enclosing interval.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.upper() - self.lower()
    }
}

/// Settings for [`Bracket::search`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BracketConfig {
    max_iters: usize,
    magnification: f64,
}

impl BracketConfig {
    /// Creates a validated bracket search config.
    ///
    /// `magnification` bounds how far a single parabolic extrapolation may
    /// reach, as a multiple of the current step.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_iters` is zero or `magnification` is not a
    /// finite value greater than one.
    pub fn new(max_iters: usize, magnification: f64) -> Result<Self, ConfigError> {
        if max_iters == 0 {
            return Err(ConfigError::MaxIters);
        }
        if !magnification.is_finite() || magnification <= 1.0 {
            return Err(ConfigError::Magnification);
        }
        Ok(Self {
            max_iters,
            magnification,
        })
    }

    /// Returns the maximum number of expansion steps.
    #[must_use]
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    /// Returns the parabolic magnification limit.
    #[must_use]
    pub fn magnification(&self) -> f64 {
        self.magnification
    }
}

impl Default for BracketConfig {
    fn default() -> Self {
        Self {
            max_iters: 100,
            magnification: 100.0,
        }
    }
}

fn check_points(points: [f64; 3]) -> Result<(), BracketError> {
    if points.iter().any(|x| !x.is_finite()) {
        return Err(BracketError::NonFinite);
    }
    let [a, b, c] = points;
    if (a < b && b < c) || (a > b && b > c) {
        Ok(())
    } else {
        Err(BracketError::NotOrdered)
    }
}

/// Builds the final bracket, treating overflow during expansion as a failed search.
fn finish(points: [f64; 3], values: [f64; 3], config: &BracketConfig) -> Result<Bracket, Error> {
    Bracket::new(points, values).map_err(|_| {
        Failure::BracketNotFound {
            max_iters: config.max_iters(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{cell::RefCell, convert::Infallible};

    use approx::assert_relative_eq;

    fn parabola(x: &[f64; 1]) -> Result<f64, Infallible> {
        Ok((x[0] - 3.0).powi(2) / 1.5 + 7.0)
    }

    fn assert_brackets(bracket: &Bracket) {
        let [a, b, c] = bracket.points();
        let [fa, fb, fc] = bracket.values();
        assert!((a < b && b < c) || (a > b && b > c), "{bracket:?}");
        assert!(fb <= fa && fb <= fc, "{bracket:?}");
    }

    #[test]
    fn new_accepts_either_orientation() {
        assert!(Bracket::new([0.0, 1.0, 2.0], [3.0, 1.0, 2.0]).is_ok());
        assert!(Bracket::new([2.0, 1.0, 0.0], [3.0, 1.0, 2.0]).is_ok());
    }

    #[test]
    fn new_rejects_degenerate_brackets() {
        assert_eq!(
            Bracket::new([1.0, 1.0, 1.0], [0.0, 0.0, 0.0]),
            Err(BracketError::NotOrdered)
        );
        assert_eq!(
            Bracket::new([0.0, 2.0, 1.0], [3.0, 1.0, 2.0]),
            Err(BracketError::NotOrdered)
        );
        assert_eq!(
            Bracket::new([0.0, 1.0, 2.0], [3.0, 4.0, 2.0]),
            Err(BracketError::NotBracketing)
        );
        assert_eq!(
            Bracket::new([0.0, f64::NAN, 2.0], [3.0, 1.0, 2.0]),
            Err(BracketError::NonFinite)
        );
    }

    #[test]
    fn evaluate_checks_the_middle_value() {
        let ok = Bracket::evaluate(&parabola, [-10.0, 0.0, 10.0]).expect("valid bracket");
        assert_relative_eq!(ok.values()[1], 13.0);

        let err = Bracket::evaluate(&parabola, [4.0, 10.0, 20.0]);
        assert!(matches!(
            err,
            Err(Error::InvalidBracket(BracketError::NotBracketing))
        ));
    }

    #[test]
    fn accessors() {
        let bracket = Bracket::new([4.0, 2.0, 1.0], [5.0, 0.5, 1.0]).unwrap();

        assert_eq!(bracket.lower(), 1.0);
        assert_eq!(bracket.upper(), 4.0);
        assert_eq!(bracket.width(), 3.0);
        assert_eq!(bracket.best(), (2.0, 0.5));
    }

    #[test]
    fn search_finds_bracket_downhill() {
        let bracket =
            Bracket::search(&parabola, 0.0, 1.0, &BracketConfig::default()).expect("brackets");

        assert_brackets(&bracket);
        assert!(bracket.lower() < 3.0 && 3.0 < bracket.upper());
    }

    #[test]
    fn search_swaps_when_started_uphill() {
        let bracket =
            Bracket::search(&parabola, 10.0, 9.0, &BracketConfig::default()).expect("brackets");

        assert_brackets(&bracket);
        assert!(bracket.lower() < 3.0 && 3.0 < bracket.upper());
    }

    #[test]
    fn search_handles_a_flat_function() {
        let flat = |_: &[f64; 1]| Ok::<_, Infallible>(1.0);

        let bracket = Bracket::search(&flat, 0.0, 1.0, &BracketConfig::default()).unwrap();

        assert_brackets(&bracket);
    }

    #[test]
    fn search_fails_on_unbounded_function() {
        let line = |x: &[f64; 1]| Ok::<_, Infallible>(x[0]);
        let config = BracketConfig::new(40, 100.0).unwrap();

        let err = Bracket::search(&line, 0.0, 1.0, &config).unwrap_err();

        assert!(matches!(
            err,
            Error::Failed(Failure::BracketNotFound { max_iters: 40 })
        ));
    }

    #[test]
    fn search_falls_back_to_golden_growth_past_the_limit() {
        let visited = RefCell::new(Vec::new());
        let shallow = |x: &[f64; 1]| {
            visited.borrow_mut().push(x[0]);
            Ok::<_, Infallible>(-x[0] + 1e-6 * x[0] * x[0])
        };

        let bracket = Bracket::search(&shallow, 0.0, 1.0, &BracketConfig::default()).unwrap();

        let visited = visited.into_inner();
        assert_relative_eq!(visited[2], 1.0 + GOLD, epsilon = 1e-9);
        assert_relative_eq!(visited[3], 1.0 + GOLD + GOLD * GOLD, epsilon = 1e-9);
        assert!(visited[4] > visited[3]);
        assert_brackets(&bracket);
        assert!(bracket.lower() < 5e5 && 5e5 < bracket.upper());
    }

    #[test]
    fn search_rejects_equal_start_points() {
        let err = Bracket::search(&parabola, 1.0, 1.0, &BracketConfig::default()).unwrap_err();

        assert!(matches!(
            err,
            Error::InvalidBracket(BracketError::ZeroWidth)
        ));
    }

    #[test]
    fn config_validation() {
        assert_eq!(BracketConfig::new(0, 100.0), Err(ConfigError::MaxIters));
        assert_eq!(BracketConfig::new(10, 1.0), Err(ConfigError::Magnification));
        assert!(BracketConfig::new(10, 50.0).is_ok());
    }
}
