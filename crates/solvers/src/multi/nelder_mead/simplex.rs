use thiserror::Error;

use crate::vector::are_independent;

/// Errors that can occur when creating a [`Simplex`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SimplexError {
    /// A simplex in `N` dimensions needs exactly `N + 1` vertices.
    #[error("expected {expected} vertices, found {found}")]
    VertexCount { expected: usize, found: usize },

    /// A vertex or delta has non-finite coordinates.
    #[error("non-finite coordinate")]
    NonFinite,

    /// A per-axis delta is zero.
    #[error("zero delta along axis {axis}")]
    ZeroDelta { axis: usize },

    /// The vertices lie in a lower-dimensional subspace.
    #[error("vertices are not affinely independent")]
    Degenerate,
}

/// The `N + 1` vertices of a starting simplex in `N` dimensions.
///
/// The edges from the first vertex to each of the others are linearly
/// independent, so the simplex spans the whole space.
#[derive(Debug, Clone, PartialEq)]
pub struct Simplex<const N: usize> {
    vertices: Vec<[f64; N]>,
}

impl<const N: usize> Simplex<N> {
    /// Creates a simplex from explicit vertices.
    ///
    /// # Errors
    ///
    /// Returns a [`SimplexError`] if the vertex count is not `N + 1`, a
    /// coordinate is non-finite, or the simplex is degenerate.
    pub fn new(vertices: Vec<[f64; N]>) -> Result<Self, SimplexError> {
        if vertices.len() != N + 1 {
            return Err(SimplexError::VertexCount {
                expected: N + 1,
                found: vertices.len(),
            });
        }
        if vertices.iter().flatten().any(|c| !c.is_finite()) {
            return Err(SimplexError::NonFinite);
        }

        let origin = vertices[0];
        let edges: Vec<[f64; N]> = vertices[1..]
            .iter()
            .map(|v| std::array::from_fn(|i| v[i] - origin[i]))
            .collect();
        if !are_independent(&edges) {
            return Err(SimplexError::Degenerate);
        }

        Ok(Self { vertices })
    }

    /// Creates a simplex with `start` as one vertex and the others displaced
    /// from it by `deltas[i]` along axis `i`.
    ///
    /// # Errors
    ///
    /// Returns a [`SimplexError`] if any coordinate or delta is non-finite,
    /// or a delta is zero.
    pub fn from_start(start: [f64; N], deltas: [f64; N]) -> Result<Self, SimplexError> {
        if start.iter().chain(&deltas).any(|c| !c.is_finite()) {
            return Err(SimplexError::NonFinite);
        }
        if let Some(axis) = deltas.iter().position(|&d| d == 0.0) {
            return Err(SimplexError::ZeroDelta { axis });
        }

        let mut vertices = Vec::with_capacity(N + 1);
        vertices.push(start);
        for (axis, delta) in deltas.iter().enumerate() {
            let mut vertex = start;
            vertex[axis] += delta;
            vertices.push(vertex);
        }

        // Tiny deltas on large coordinates can round away.
        Self::new(vertices)
    }

    #[must_use]
    pub fn vertices(&self) -> &[[f64; N]] {
        &self.vertices
    }
}
