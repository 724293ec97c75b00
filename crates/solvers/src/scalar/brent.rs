//! Brent's method: parabolic interpolation with a golden-section safeguard.

use minima_core::Objective;

use crate::{
    config::Config,
    error::{Error, Failure},
    evaluate::value_at,
};

use super::{Algorithm, Bracket, Solution, ZEPS};

/// Fraction of a segment taken by a golden-section step, `(3 - sqrt(5)) / 2`.
const CGOLD: f64 = 0.381_966_0;

/// Marker selecting Brent's method in a [`Minimizer`](super::Minimizer).
#[derive(Debug, Clone, Copy, Default)]
pub struct BrentParabolic;

impl Algorithm for BrentParabolic {
    fn default_config() -> Config {
        Config::preset(3e-8, 100)
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

/// Minimizes `objective` within `bracket` using Brent's method.
///
/// Fits a parabola through the three best points seen so far and steps to its
/// vertex when that step falls inside the interval, is less than half the
/// step before last, and is not negligible. Otherwise takes a golden-section
/// step into the larger segment.
///
/// # Errors
///
/// Returns [`Failure::MaxIters`] if the interval is not small enough after
/// `config.max_iters()` iterations, or any evaluation error.
pub fn minimize<F>(objective: &F, bracket: &Bracket, config: &Config) -> Result<Solution, Error>
where
    F: Objective<1>,
{
    let (bx, fb) = bracket.best();
    let mut state = Trial::new(bracket.lower(), bracket.upper(), bx, fb);
    let tol = config.tolerance();

    // Step taken on the last iteration, and the one before.
    let mut d: f64 = 0.0;
    let mut e: f64 = 0.0;

    for iter in 0..config.max_iters() {
        let xm = state.mid();
        let tol1 = tol * state.x.abs() + ZEPS;
        let tol2 = 2.0 * tol1;

        if state.is_converged(tol2) {
            return Ok(state.into_solution(iter));
        }

        let x = state.x;
        let golden = |a: f64, b: f64| if x >= xm { a - x } else { b - x };

        if e.abs() > tol1 {
            let r = (x - state.w) * (state.fx - state.fv);
            let mut q = (x - state.v) * (state.fx - state.fw);
            let mut p = (x - state.v) * q - (x - state.w) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            }
            q = q.abs();
            let e_prev = e;
            e = d;

            if p.abs() >= (0.5 * q * e_prev).abs() || p <= q * (state.a - x) || p >= q * (state.b - x)
            {
                e = golden(state.a, state.b);
                d = CGOLD * e;
            } else {
                d = p / q;
                let u = x + d;
                if u - state.a < tol2 || state.b - u < tol2 {
                    d = tol1.copysign(xm - x);
                }
            }
        } else {
            e = golden(state.a, state.b);
            d = CGOLD * e;
        }

        let u = if d.abs() >= tol1 {
            x + d
        } else {
            x + tol1.copysign(d)
        };
        let fu = value_at(objective, u)?;
        state.record(u, fu);
    }

    Err(Failure::MaxIters {
        max_iters: config.max_iters(),
    }
    .into())
}

/// Interval `[a, b]` plus the best point `x`, the second best `w`, and the
/// previous value of `w` in `v`.
#[derive(Debug, Clone, Copy)]
struct Trial {
    a: f64,
    b: f64,
    x: f64,
    w: f64,
    v: f64,
    fx: f64,
    fw: f64,
    fv: f64,
}

impl Trial {
    fn new(a: f64, b: f64, x: f64, fx: f64) -> Self {
        Self {
            a,
            b,
            x,
            w: x,
            v: x,
            fx,
            fw: fx,
            fv: fx,
        }
    }

    fn mid(&self) -> f64 {
        0.5 * (self.a + self.b)
    }

    fn is_converged(&self, tol2: f64) -> bool {
        (self.x - self.mid()).abs() <= tol2 - 0.5 * (self.b - self.a)
    }

    /// Tightens the interval around the trial `u` and reorders `x, w, v`.
    #[allow(clippy::float_cmp)]
    fn record(&mut self, u: f64, fu: f64) {
        if fu <= self.fx {
            if u >= self.x {
                self.a = self.x;
            } else {
                self.b = self.x;
            }
            self.v = self.w;
            self.fv = self.fw;
            self.w = self.x;
            self.fw = self.fx;
            self.x = u;
            self.fx = fu;
        } else {
            if u < self.x {
                self.a = u;
            } else {
                self.b = u;
            }
            if fu <= self.fw || self.w == self.x {
                self.v = self.w;
                self.fv = self.fw;
                self.w = u;
                self.fw = fu;
            } else if fu <= self.fv || self.v == self.x || self.v == self.w {
                self.v = u;
                self.fv = fu;
            }
        }
    }

    fn into_solution(self, iters: usize) -> Solution {
        Solution {
            x: self.x,
            objective: self.fx,
            iters,
            width: self.b - self.a,
        }
    }
}
