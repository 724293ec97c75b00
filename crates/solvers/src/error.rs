use std::{error::Error as StdError, fmt};

use thiserror::Error;

use crate::{config::ConfigError, multi::nelder_mead::SimplexError, scalar::BracketError};

/// Errors that can occur while configuring or running a solver.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("invalid bracket: {0}")]
    InvalidBracket(#[from] BracketError),

    #[error("invalid simplex: {0}")]
    InvalidSimplex(#[from] SimplexError),

    #[error("not ready: missing {0}")]
    NotReady(Missing),

    #[error("solver is locked while a minimization is in progress")]
    Locked,

    /// The objective or gradient failed; the original error is the source.
    #[error("evaluation failed")]
    Evaluation(#[source] Box<dyn StdError + Send + Sync>),

    #[error("minimization failed: {0}")]
    Failed(#[from] Failure),
}

/// Numerical failures of an otherwise well-configured run.
///
/// The caller may retry with a different start point, a looser tolerance, or
/// a different solver.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    #[error("no convergence within {max_iters} iterations")]
    MaxIters { max_iters: usize },

    #[error("no minimum bracketed within {max_iters} expansion steps")]
    BracketNotFound { max_iters: usize },

    #[error("line search found no decreasing step along the search direction")]
    NonDescent,

    #[error("objective evaluated to NaN")]
    NotANumber,
}

/// Coarse classification of an [`Error`].
///
/// Callers typically fix their input on `Configuration`, fix their call order
/// on `State`, abort on `Evaluation`, and retry differently on `Numerical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    State,
    Evaluation,
    Numerical,
}

/// The input a solver needs before the requested operation can proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Objective,
    Gradient,
    StartPoint,
    Bracket,
    Simplex,
    Result,
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Objective => "objective",
            Self::Gradient => "gradient",
            Self::StartPoint => "start point",
            Self::Bracket => "bracket",
            Self::Simplex => "simplex",
            Self::Result => "result",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Wraps an evaluator error, keeping it as the source.
    pub(crate) fn evaluation<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Evaluation(Box::new(error))
    }

    /// Returns the coarse classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfig(_) | Self::InvalidBracket(_) | Self::InvalidSimplex(_) => {
                ErrorKind::Configuration
            }
            Self::NotReady(_) | Self::Locked => ErrorKind::State,
            Self::Evaluation(_) => ErrorKind::Evaluation,
            Self::Failed(_) => ErrorKind::Numerical,
        }
    }
}
