/// A scalar function of `N` real variables that a solver minimizes.
///
/// The const generic `N` is the number of variables.
/// For example, `N = 1` represents a function of a single variable.
///
/// Evaluation may fail. Solvers never retry a failed evaluation: the error is
/// propagated to the caller and the run is aborted.
///
/// Closures of the form `Fn(&[f64; N]) -> Result<f64, E>` implement this trait.
pub trait Objective<const N: usize> {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Evaluates the function at `x`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the function cannot be evaluated at `x`.
    fn value(&self, x: &[f64; N]) -> Result<f64, Self::Error>;
}

/// The gradient of a scalar function of `N` real variables.
///
/// Derivative-aware solvers pair an [`Objective`] with a `Gradient` of the
/// same function. For `N = 1` the gradient is the ordinary derivative.
///
/// Closures of the form `Fn(&[f64; N], &mut [f64; N]) -> Result<(), E>`
/// implement this trait.
pub trait Gradient<const N: usize> {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Writes the gradient at `x` into `out`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the gradient cannot be evaluated at `x`.
    fn gradient(&self, x: &[f64; N], out: &mut [f64; N]) -> Result<(), Self::Error>;
}

impl<F, E, const N: usize> Objective<N> for F
where
    F: Fn(&[f64; N]) -> Result<f64, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    fn value(&self, x: &[f64; N]) -> Result<f64, E> {
        self(x)
    }
}

impl<F, E, const N: usize> Gradient<N> for F
where
    F: Fn(&[f64; N], &mut [f64; N]) -> Result<(), E>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    fn gradient(&self, x: &[f64; N], out: &mut [f64; N]) -> Result<(), E> {
        self(x, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    struct Paraboloid;

    impl Objective<2> for Paraboloid {
        type Error = Infallible;

        fn value(&self, x: &[f64; 2]) -> Result<f64, Self::Error> {
            Ok(x[0] * x[0] + 2.0 * x[1] * x[1])
        }
    }

    impl Gradient<2> for Paraboloid {
        type Error = Infallible;

        fn gradient(&self, x: &[f64; 2], out: &mut [f64; 2]) -> Result<(), Self::Error> {
            out[0] = 2.0 * x[0];
            out[1] = 4.0 * x[1];
            Ok(())
        }
    }

    #[test]
    fn struct_implements_both_capabilities() {
        let f = Paraboloid;
        let mut g = [0.0; 2];

        f.gradient(&[1.0, -1.0], &mut g).unwrap();

        assert_eq!(f.value(&[1.0, -1.0]).unwrap(), 3.0);
        assert_eq!(g, [2.0, -4.0]);
    }

    #[test]
    fn closures_are_objectives() {
        let f = |x: &[f64; 1]| Ok::<_, Infallible>((x[0] - 3.0).powi(2));

        assert_eq!(f.value(&[5.0]).unwrap(), 4.0);
    }

    #[test]
    fn closures_are_gradients() {
        let g = |x: &[f64; 1], out: &mut [f64; 1]| {
            out[0] = 2.0 * (x[0] - 3.0);
            Ok::<_, Infallible>(())
        };
        let mut out = [0.0];

        g.gradient(&[5.0], &mut out).unwrap();

        assert_eq!(out, [4.0]);
    }
}
