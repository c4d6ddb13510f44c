//! Core numeric traits for picard.

use num_complex::Complex;
use num_traits::{One, Zero};
use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Field scalar the iteration runs over: `f64` or `Complex<f64>`.
///
/// Products are plain (conjugate-free); magnitudes go through `abs_sqr`,
/// so a complex norm is `sqrt(Σ|z|²)`.
pub trait Scalar:
    Copy
    + Debug
    + PartialEq
    + Send
    + Sync
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + 'static
{
    /// Embed a real number.
    fn from_real(r: f64) -> Self;
    /// Squared magnitude |z|².
    fn abs_sqr(self) -> f64;
    /// Magnitude |z|.
    fn modulus(self) -> f64 {
        self.abs_sqr().sqrt()
    }
    fn is_finite(self) -> bool;
}

impl Scalar for f64 {
    fn from_real(r: f64) -> Self {
        r
    }
    fn abs_sqr(self) -> f64 {
        self * self
    }
    fn modulus(self) -> f64 {
        self.abs()
    }
    fn is_finite(self) -> bool {
        f64::is_finite(self)
    }
}

impl Scalar for Complex<f64> {
    fn from_real(r: f64) -> Self {
        Complex::new(r, 0.0)
    }
    fn abs_sqr(self) -> f64 {
        self.norm_sqr()
    }
    fn is_finite(self) -> bool {
        self.re.is_finite() && self.im.is_finite()
    }
}

/// Matrix–vector product: y ← A x.
pub trait MatVec<V> {
    /// Compute y = A · x.
    fn matvec(&self, x: &V, y: &mut V);
}

/// Inner products & norms.
pub trait InnerProduct<V> {
    /// Associated scalar type.
    type Scalar: Scalar;
    /// Compute the conjugate-free dot(x, y).
    fn dot(&self, x: &V, y: &V) -> Self::Scalar;
    /// Compute ‖x‖₂.
    fn norm(&self, x: &V) -> f64;
}
