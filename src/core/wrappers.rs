//! Trait implementations for `Vec<S>` and `faer::Mat<f64>`, plus slice kernels.
//!
//! The reductions over `problem_size`-length vectors (dot products, norms)
//! run on rayon when the `rayon` feature is enabled; everything else is
//! sequential.

use crate::core::traits::{InnerProduct, MatVec, Scalar};
use faer::Mat;

/// Implements matrix-vector multiplication for `faer::Mat`.
///
/// Computes `y = A * x` where `A` is a dense matrix, `x` and `y` are vectors.
impl MatVec<Vec<f64>> for Mat<f64> {
    fn matvec(&self, x: &Vec<f64>, y: &mut Vec<f64>) {
        assert_eq!(self.nrows(), y.len(), "Output vector y has incorrect length");
        assert_eq!(self.ncols(), x.len(), "Input vector x has incorrect length");
        for i in 0..self.nrows() {
            y[i] = 0.0;
            for j in 0..self.ncols() {
                y[i] += self[(i, j)] * x[j];
            }
        }
    }
}

/// Implements inner product and norm for vectors, with optional Rayon parallelism.
impl<S: Scalar> InnerProduct<Vec<S>> for () {
    type Scalar = S;
    fn dot(&self, x: &Vec<S>, y: &Vec<S>) -> S {
        dot(x, y)
    }
    fn norm(&self, x: &Vec<S>) -> f64 {
        norm(x)
    }
}

/// Conjugate-free dot product `Σ x_i y_i`.
pub fn dot<S: Scalar>(x: &[S], y: &[S]) -> S {
    assert_eq!(x.len(), y.len(), "Vectors must have the same length");
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        x.par_iter()
            .zip(y.par_iter())
            .map(|(xi, yi)| *xi * *yi)
            .reduce(S::zero, |acc, v| acc + v)
    }
    #[cfg(not(feature = "rayon"))]
    {
        x.iter()
            .zip(y.iter())
            .map(|(xi, yi)| *xi * *yi)
            .fold(S::zero(), |acc, v| acc + v)
    }
}

/// Euclidean norm `sqrt(Σ |x_i|²)`.
pub fn norm<S: Scalar>(x: &[S]) -> f64 {
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        x.par_iter().map(|xi| xi.abs_sqr()).sum::<f64>().sqrt()
    }
    #[cfg(not(feature = "rayon"))]
    {
        x.iter().map(|xi| xi.abs_sqr()).sum::<f64>().sqrt()
    }
}

/// `‖a − b‖₂` without a temporary.
pub fn diff_norm<S: Scalar>(a: &[S], b: &[S]) -> f64 {
    assert_eq!(a.len(), b.len(), "Vectors must have the same length");
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        a.par_iter()
            .zip(b.par_iter())
            .map(|(ai, bi)| (*ai - *bi).abs_sqr())
            .sum::<f64>()
            .sqrt()
    }
    #[cfg(not(feature = "rayon"))]
    {
        a.iter()
            .zip(b.iter())
            .map(|(ai, bi)| (*ai - *bi).abs_sqr())
            .sum::<f64>()
            .sqrt()
    }
}

/// Damped update `x ← x + ω (target − x)`.
pub fn relax<S: Scalar>(x: &mut [S], target: &[S], omega: f64) {
    assert_eq!(x.len(), target.len(), "Vectors must have the same length");
    let w = S::from_real(omega);
    for (xi, ti) in x.iter_mut().zip(target) {
        *xi += w * (*ti - *xi);
    }
}
