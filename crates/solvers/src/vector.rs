//! Small fixed-size vector helpers used by the multi-variable solvers.

pub(crate) fn dot<const N: usize>(a: &[f64; N], b: &[f64; N]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub(crate) fn norm<const N: usize>(a: &[f64; N]) -> f64 {
    dot(a, a).sqrt()
}

/// Returns `x + t * d`.
pub(crate) fn axpy<const N: usize>(x: &[f64; N], t: f64, d: &[f64; N]) -> [f64; N] {
    std::array::from_fn(|i| x[i] + t * d[i])
}

/// Returns `a - b`.
pub(crate) fn sub<const N: usize>(a: &[f64; N], b: &[f64; N]) -> [f64; N] {
    std::array::from_fn(|i| a[i] - b[i])
}

pub(crate) fn scale<const N: usize>(t: f64, a: &[f64; N]) -> [f64; N] {
    a.map(|v| t * v)
}

pub(crate) fn neg<const N: usize>(a: &[f64; N]) -> [f64; N] {
    a.map(|v| -v)
}

/// Returns `m * v` for a square matrix stored by rows.
pub(crate) fn mat_vec<const N: usize>(m: &[[f64; N]; N], v: &[f64; N]) -> [f64; N] {
    std::array::from_fn(|i| dot(&m[i], v))
}

pub(crate) fn identity<const N: usize>() -> [[f64; N]; N] {
    std::array::from_fn(|i| std::array::from_fn(|j| if i == j { 1.0 } else { 0.0 }))
}

/// Returns true if the vectors are linearly independent.
///
/// Runs modified Gram-Schmidt and rejects any vector whose residual is tiny
/// relative to its original length.
pub(crate) fn are_independent<const N: usize>(vectors: &[[f64; N]]) -> bool {
    const RELATIVE_FLOOR: f64 = 1e-10;

    if vectors.len() > N {
        return false;
    }

    let mut basis: Vec<[f64; N]> = Vec::with_capacity(vectors.len());
    for v in vectors {
        let length = norm(v);
        if length == 0.0 || !length.is_finite() {
            return false;
        }
        let mut residual = *v;
        for b in &basis {
            let projection = dot(&residual, b);
            residual = axpy(&residual, -projection, b);
        }
        let residual_length = norm(&residual);
        if residual_length <= RELATIVE_FLOOR * length {
            return false;
        }
        basis.push(scale(1.0 / residual_length, &residual));
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn basic_algebra() {
        let a = [1.0, 2.0, 2.0];
        let b = [0.5, -1.0, 4.0];

        assert_relative_eq!(dot(&a, &b), 6.5);
        assert_relative_eq!(norm(&a), 3.0);
        assert_eq!(axpy(&a, 2.0, &b), [2.0, 0.0, 10.0]);
        assert_eq!(sub(&a, &b), [0.5, 3.0, -2.0]);
        assert_eq!(neg(&a), [-1.0, -2.0, -2.0]);
    }

    #[test]
    fn identity_times_vector_is_vector() {
        let v = [3.0, -4.0];
        assert_eq!(mat_vec(&identity::<2>(), &v), v);
    }

    #[test]
    fn independence() {
        assert!(are_independent(&identity::<3>()));
        assert!(are_independent(&[[1.0, 1.0], [1.0, -1.0]]));
        assert!(!are_independent(&[[1.0, 2.0], [2.0, 4.0]]));
        assert!(!are_independent(&[[1.0, 0.0], [0.0, 0.0]]));
        assert!(!are_independent(&[[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]));
    }
}
