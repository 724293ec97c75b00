use thiserror::Error;

/// Convergence settings shared by every solver.
///
/// The tolerance is a relative threshold. Single-variable solvers compare it
/// against the fractional width of the bracket; multi-variable solvers compare
/// it against the fractional decrease of the objective over one iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    tolerance: f64,
    max_iters: usize,
}

/// Errors that can occur when validating solver settings.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("tolerance must be finite and positive")]
    Tolerance,

    #[error("max_iters must be at least 1")]
    MaxIters,

    #[error("magnification limit must be finite and greater than 1")]
    Magnification,

    #[error("max step must be finite and positive")]
    MaxStep,

    #[error("point has non-finite coordinates")]
    NonFinitePoint,

    #[error("direction set is not linearly independent")]
    DependentDirections,

    #[error("direction has zero length")]
    ZeroDirection,
}

impl Config {
    /// Creates a new config with a validated tolerance and iteration cap.
    ///
    /// # Errors
    ///
    /// Returns an error if the tolerance is not finite and positive, or if
    /// `max_iters` is zero.
    pub fn new(tolerance: f64, max_iters: usize) -> Result<Self, ConfigError> {
        validate_tolerance(tolerance)?;
        if max_iters == 0 {
            return Err(ConfigError::MaxIters);
        }

        Ok(Self {
            tolerance,
            max_iters,
        })
    }

    /// Used for per-solver defaults, which are known to be valid.
    pub(crate) const fn preset(tolerance: f64, max_iters: usize) -> Self {
        Self {
            tolerance,
            max_iters,
        }
    }

    /// Returns the relative convergence tolerance.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Returns the maximum number of iterations.
    #[must_use]
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    /// Returns a copy of this config with a different tolerance.
    ///
    /// # Errors
    ///
    /// Returns an error if the tolerance is not finite and positive.
    pub fn with_tolerance(self, tolerance: f64) -> Result<Self, ConfigError> {
        Self::new(tolerance, self.max_iters)
    }

    /// Returns a copy of this config with a different iteration cap.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_iters` is zero.
    pub fn with_max_iters(self, max_iters: usize) -> Result<Self, ConfigError> {
        Self::new(self.tolerance, max_iters)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::preset(1e-8, 200)
    }
}

fn validate_tolerance(tolerance: f64) -> Result<(), ConfigError> {
    if tolerance.is_finite() && tolerance > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Tolerance)
    }
}

/// Checks that every coordinate of a point is finite.
pub(crate) fn validate_point<const N: usize>(x: &[f64; N]) -> Result<(), ConfigError> {
    if x.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ConfigError::NonFinitePoint)
    }
}
