//! Brent's method guided by the first derivative.

use minima_core::{Gradient, Objective};

use crate::{
    config::Config,
    error::{Error, Failure, Missing},
    evaluate::{derivative_at, value_at},
};

use super::{Algorithm, Bracket, Minimizer, Solution, ZEPS};

/// Marker selecting derivative-guided Brent in a [`Minimizer`].
///
/// Holds the derivative, set with [`Minimizer::set_derivative`].
#[derive(Debug, Clone)]
pub struct BrentDerivative<D> {
    derivative: Option<D>,
}

impl<D> Default for BrentDerivative<D> {
    fn default() -> Self {
        Self { derivative: None }
    }
}

impl<D: Gradient<1>> Algorithm for BrentDerivative<D> {
    fn default_config() -> Config {
        Config::preset(3e-8, 100)
    }

    fn missing(&self) -> Option<Missing> {
        self.derivative.is_none().then_some(Missing::Gradient)
    }

    fn run<F: Objective<1>>(
        &self,
        objective: &F,
        bracket: &Bracket,
        config: &Config,
    ) -> Result<Solution, Error> {
        let derivative = self
            .derivative
            .as_ref()
            .ok_or(Error::NotReady(Missing::Gradient))?;
        minimize(objective, derivative, bracket, config)
    }
}

impl<F, D> Minimizer<F, BrentDerivative<D>>
where
    F: Objective<1>,
    D: Gradient<1>,
{
    /// Sets the derivative of the objective.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Locked`] during a minimization.
    pub fn set_derivative(&mut self, derivative: D) -> Result<(), Error> {
        self.update_algorithm()?.derivative = Some(derivative);
        Ok(())
    }
}

/// Minimizes `objective` within `bracket` using the derivative to pick steps.
///
/// Candidate steps come from secant extrapolation of the derivative through
/// the two previous points. A candidate is used only if it moves downhill
/// (opposite in sign to the derivative at the best point) and stays inside
/// the interval. Otherwise the downhill segment is bisected.
///
/// # Errors
///
/// Returns [`Failure::MaxIters`] if the interval is not small enough after
/// `config.max_iters()` iterations, or any evaluation error.
pub fn minimize<F, D>(
    objective: &F,
    derivative: &D,
    bracket: &Bracket,
    config: &Config,
) -> Result<Solution, Error>
where
    F: Objective<1>,
    D: Gradient<1>,
{
    let (bx, fb) = bracket.best();
    let mut s = Trial::new(bracket.lower(), bracket.upper(), bx, fb, derivative_at(derivative, bx)?);
    let tol = config.tolerance();

    let mut d: f64 = 0.0;
    let mut e: f64 = 0.0;

    for iter in 0..config.max_iters() {
        let xm = 0.5 * (s.a + s.b);
        let tol1 = tol * s.x.abs() + ZEPS;
        let tol2 = 2.0 * tol1;

        if (s.x - xm).abs() <= tol2 - 0.5 * (s.b - s.a) {
            return Ok(s.into_solution(iter));
        }

        let downhill = if s.dx >= 0.0 { s.a - s.x } else { s.b - s.x };

        if e.abs() > tol1 {
            let e_prev = e;
            e = d;
            match s.secant_step() {
                Some(step) if step.abs() <= (0.5 * e_prev).abs() => {
                    d = step;
                    let u = s.x + d;
                    if u - s.a < tol2 || s.b - u < tol2 {
                        d = tol1.copysign(xm - s.x);
                    }
                }
                _ => {
                    e = downhill;
                    d = 0.5 * e;
                }
            }
        } else {
            e = downhill;
            d = 0.5 * e;
        }

        let (u, fu) = if d.abs() >= tol1 {
            let u = s.x + d;
            (u, value_at(objective, u)?)
        } else {
            let u = s.x + tol1.copysign(d);
            let fu = value_at(objective, u)?;
            // The smallest meaningful step goes uphill, so x is the minimum.
            if fu > s.fx {
                return Ok(s.into_solution(iter + 1));
            }
            (u, fu)
        };
        let du = derivative_at(derivative, u)?;
        s.record(u, fu, du);
    }

    Err(Failure::MaxIters {
        max_iters: config.max_iters(),
    }
    .into())
}

/// Five-point bookkeeping with derivatives at `x`, `w` and `v`.
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
    dx: f64,
    dw: f64,
    dv: f64,
}

impl Trial {
    fn new(a: f64, b: f64, x: f64, fx: f64, dx: f64) -> Self {
        Self {
            a,
            b,
            x,
            w: x,
            v: x,
            fx,
            fw: fx,
            fv: fx,
            dx,
            dw: dx,
            dv: dx,
        }
    }

    /// Returns the shorter acceptable secant step, if any.
    #[allow(clippy::float_cmp)]
    fn secant_step(&self) -> Option<f64> {
        let fallback = 2.0 * (self.b - self.a);
        let d1 = if self.dw == self.dx {
            fallback
        } else {
            (self.w - self.x) * self.dx / (self.dx - self.dw)
        };
        let d2 = if self.dv == self.dx {
            fallback
        } else {
            (self.v - self.x) * self.dx / (self.dx - self.dv)
        };

        let acceptable = |step: f64| {
            let u = self.x + step;
            (self.a - u) * (u - self.b) > 0.0 && self.dx * step <= 0.0
        };
        match (acceptable(d1), acceptable(d2)) {
            (true, true) => Some(if d1.abs() < d2.abs() { d1 } else { d2 }),
            (true, false) => Some(d1),
            (false, true) => Some(d2),
            (false, false) => None,
        }
    }

    #[allow(clippy::float_cmp)]
    fn record(&mut self, u: f64, fu: f64, du: f64) {
        if fu <= self.fx {
            if u >= self.x {
                self.a = self.x;
            } else {
                self.b = self.x;
            }
            (self.v, self.fv, self.dv) = (self.w, self.fw, self.dw);
            (self.w, self.fw, self.dw) = (self.x, self.fx, self.dx);
            (self.x, self.fx, self.dx) = (u, fu, du);
        } else {
            if u < self.x {
                self.a = u;
            } else {
                self.b = u;
            }
            if fu <= self.fw || self.w == self.x {
                (self.v, self.fv, self.dv) = (self.w, self.fw, self.dw);
                (self.w, self.fw, self.dw) = (u, fu, du);
            } else if fu < self.fv || self.v == self.x || self.v == self.w {
                (self.v, self.fv, self.dv) = (u, fu, du);
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
