//! Golden-section search on a bracket.

use minima_core::Objective;

use crate::{
    config::Config,
    error::{Error, Failure},
    evaluate::value_at,
};

use super::{Algorithm, Bracket, Solution, ZEPS};

/// The golden ratio conjugate, `(sqrt(5) - 1) / 2`.
const R: f64 = 0.618_033_99;

/// The complementary fraction, `1 - R`.
const C: f64 = 1.0 - R;

/// Marker selecting golden-section search in a [`Minimizer`](super::Minimizer).
#[derive(Debug, Clone, Copy, Default)]
pub struct GoldenSection;

impl Algorithm for GoldenSection {
    fn default_config() -> Config {
        Config::preset(3e-8, 200)
    }

    fn run<F: Objective<1>>(
        &self,
        objective: &F,
        bracket: &Bracket,
        config: &Config,
    ) -> Result<Solution, Error> {
        minimize(objective, bracket, config)
    }
}

/// Minimizes `objective` within `bracket` by golden-section search.
///
/// Maintains four abscissas `x0, x1, x2, x3`, with the two interior points
/// placed so the next trial always lands in the larger segment at the golden
/// ratio. Each iteration costs one evaluation and shrinks the interval by a
/// factor of about 0.618.
///
/// # Errors
///
/// Returns [`Failure::MaxIters`] if the interval is not small enough after
/// `config.max_iters()` iterations, or any evaluation error.
pub fn minimize<F>(objective: &F, bracket: &Bracket, config: &Config) -> Result<Solution, Error>
where
    F: Objective<1>,
{
    let mut section = Section::new(objective, bracket)?;

    for iter in 0..config.max_iters() {
        if section.is_converged(config.tolerance()) {
            return Ok(section.into_solution(iter));
        }
        let step = section.next_step();
        let value = value_at(objective, step.x())?;
        section.apply(step, value);
    }

    if section.is_converged(config.tolerance()) {
        return Ok(section.into_solution(config.max_iters()));
    }
    Err(Failure::MaxIters {
        max_iters: config.max_iters(),
    }
    .into())
}

/// Which end of the section to drop and where to evaluate next.
#[derive(Debug, Clone, Copy)]
enum Step {
    /// Drop `x0`; payload is the new upper interior abscissa.
    DropLower(f64),

    /// Drop `x3`; payload is the new lower interior abscissa.
    DropUpper(f64),
}

impl Step {
    fn x(self) -> f64 {
        match self {
            Self::DropLower(x) | Self::DropUpper(x) => x,
        }
    }
}

/// Four abscissas ordered along the bracket, with values at the interior two.
///
/// "Lower" and "upper" follow the bracket's orientation, which may be
/// decreasing in `x`.
#[derive(Debug, Clone, Copy)]
struct Section {
    x0: f64,
    x1: f64,
    x2: f64,
    x3: f64,
    f1: f64,
    f2: f64,
}

impl Section {
    /// Places the new trial point in the larger of the two bracket segments.
    fn new<F: Objective<1>>(objective: &F, bracket: &Bracket) -> Result<Self, Error> {
        let [a, b, c] = bracket.points();
        let fb = bracket.values()[1];

        let section = if (c - b).abs() > (b - a).abs() {
            let x2 = b + C * (c - b);
            Self {
                x0: a,
                x1: b,
                x2,
                x3: c,
                f1: fb,
                f2: value_at(objective, x2)?,
            }
        } else {
            let x1 = b - C * (b - a);
            Self {
                x0: a,
                x1,
                x2: b,
                x3: c,
                f1: value_at(objective, x1)?,
                f2: fb,
            }
        };
        Ok(section)
    }

    fn is_converged(&self, tolerance: f64) -> bool {
        (self.x3 - self.x0).abs() <= tolerance * (self.x1.abs() + self.x2.abs()) + ZEPS
    }

    fn next_step(&self) -> Step {
        if self.f2 < self.f1 {
            Step::DropLower(R * self.x2 + C * self.x3)
        } else {
            Step::DropUpper(R * self.x1 + C * self.x0)
        }
    }

    fn apply(&mut self, step: Step, value: f64) {
        match step {
            Step::DropLower(x) => {
                self.x0 = self.x1;
                self.x1 = self.x2;
                self.x2 = x;
                self.f1 = self.f2;
                self.f2 = value;
            }
            Step::DropUpper(x) => {
                self.x3 = self.x2;
                self.x2 = self.x1;
                self.x1 = x;
                self.f2 = self.f1;
                self.f1 = value;
            }
        }
    }

    fn into_solution(self, iters: usize) -> Solution {
        let (x, objective) = if self.f1 < self.f2 {
            (self.x1, self.f1)
        } else {
            (self.x2, self.f2)
        };
        Solution {
            x,
            objective,
            iters,
            width: (self.x3 - self.x0).abs(),
        }
    }
}
