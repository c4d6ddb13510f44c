//! Anderson mixing over the last few iterates.
//!
//! With memory `x_0 … x_{m-1}` (oldest → newest) and successive differences
//! `r_i = x_{i+1} − x_i`, `i = 0 … n` where `n = m − 2`, the mixing weights
//! minimize `‖Σ α_i r_i‖` subject to `Σ α_i = 1`. Eliminating the last
//! weight gives the `n × n` normal equations
//!
//! ```text
//! M_ij = (r_n − r_i) · (r_n − r_j),    b_i = r_n · (r_n − r_i)
//! ```
//!
//! solved by LU with partial pivoting; `α_n = 1 − Σ α_i`. The accelerated
//! iterate is
//!
//! ```text
//! x̂ = Σ_{j=1}^{m-1} α_{j-1} (x_j − (1 − β)(x_j − x_{j-1}))
//! ```
//!
//! # References
//! - Walker & Ni (2011) "Anderson Acceleration for Fixed-Point Iterations"

use crate::core::traits::Scalar;
use crate::core::wrappers::dot;
use crate::error::NlError;
use crate::matrix::{lu_solve, DenseMatrix};
use crate::nonlinear::history::RingBuffer;

/// Mixing weights for a full memory; the result sums to one.
///
/// Requires at least two iterates in `memory`.
pub fn anderson_coefficients<S: Scalar>(memory: &RingBuffer<Vec<S>>) -> Result<Vec<S>, NlError<S>> {
    let m = memory.len();
    if m < 2 {
        return Err(NlError::InvalidOptions(format!(
            "Anderson mixing needs at least 2 iterates, memory holds {m}"
        )));
    }
    let n = m - 2;
    if n == 0 {
        return Ok(vec![S::one()]);
    }

    let residual = |i: usize| -> Vec<S> {
        memory[i + 1]
            .iter()
            .zip(&memory[i])
            .map(|(a, b)| *a - *b)
            .collect()
    };
    let r_n = residual(n);
    // d_i = r_n − r_i
    let diffs: Vec<Vec<S>> = (0..n)
        .map(|i| r_n.iter().zip(residual(i)).map(|(a, b)| *a - b).collect())
        .collect();

    let mat = DenseMatrix::from_fn(n, |i, j| dot(&diffs[i], &diffs[j]));
    let rhs: Vec<S> = diffs.iter().map(|d| dot(&r_n, d)).collect();
    let mut coeffs = lu_solve(mat, &rhs)?;

    let sum = coeffs.iter().fold(S::zero(), |acc, c| acc + *c);
    coeffs.push(S::one() - sum);
    Ok(coeffs)
}

/// Bounded iterate memory plus the mixing step.
#[derive(Clone, Debug)]
pub struct AndersonAccelerator<S> {
    memory: RingBuffer<Vec<S>>,
    beta: f64,
    coeffs: Vec<S>,
}

impl<S: Scalar> AndersonAccelerator<S> {
    /// Memory of `depth` iterates of length `problem_size`.
    pub fn new(depth: usize, beta: f64, problem_size: usize) -> Result<Self, NlError<S>> {
        if depth < 2 {
            return Err(NlError::InvalidOptions(format!(
                "num_last_vectors_used must be at least 2, got {depth}"
            )));
        }
        let mut memory = RingBuffer::<Vec<S>>::with_capacity::<S>(depth)?;
        for _ in 0..depth {
            let mut v: Vec<S> = Vec::new();
            v.try_reserve_exact(problem_size)?;
            memory.push(v);
        }
        memory.clear();
        let mut coeffs = Vec::new();
        coeffs.try_reserve_exact(depth - 1)?;
        Ok(AndersonAccelerator { memory, beta, coeffs })
    }

    pub fn depth(&self) -> usize {
        self.memory.capacity()
    }

    pub fn memory(&self) -> &RingBuffer<Vec<S>> {
        &self.memory
    }

    pub fn is_full(&self) -> bool {
        self.memory.is_full()
    }

    /// Weights of the last mixing step.
    pub fn coefficients(&self) -> &[S] {
        &self.coeffs
    }

    /// Forget all stored iterates.
    pub fn reset(&mut self) {
        self.memory.clear();
        self.coeffs.clear();
    }

    /// Store an iterate, evicting the oldest when full.
    pub fn push(&mut self, x: &[S]) {
        self.memory.push_copy(x);
    }

    /// Write the mixed iterate into `out`; the memory must be full.
    pub fn accelerate(&mut self, out: &mut [S]) -> Result<(), NlError<S>> {
        if !self.is_full() {
            return Err(NlError::InvalidOptions(format!(
                "Anderson memory holds {} of {} iterates",
                self.memory.len(),
                self.depth()
            )));
        }
        let size = self.memory[0].len();
        if out.len() != size {
            return Err(NlError::DimensionMismatch {
                expected: size,
                found: out.len(),
            });
        }
        self.coeffs = anderson_coefficients(&self.memory)?;

        let damp = S::from_real(1.0 - self.beta);
        out.iter_mut().for_each(|v| *v = S::zero());
        for j in 1..self.depth() {
            let a = self.coeffs[j - 1];
            let (cur, prev) = (&self.memory[j], &self.memory[j - 1]);
            for (k, v) in out.iter_mut().enumerate() {
                *v += a * cur[k] - damp * a * (cur[k] - prev[k]);
            }
        }
        Ok(())
    }
}
