//! Direct dense backend using Faer's partial-pivoting LU.
//!
//! Suitable for small assembled systems (tests, demos, 1-D problems). Large
//! sparse PDE systems should plug in their own `LinearSolver`.
//!
//! # References
//! - Faer documentation: https://github.com/sarah-ek/faer-rs

use crate::error::NlError;
use crate::solver::LinearSolver;
use crate::utils::convergence::SolveStats;
use faer::linalg::solvers::{PartialPivLu, SolveCore};
use faer::{Conj, Mat, MatMut};

/// LU solver using partial (row) pivoting from Faer.
///
/// Keeps the last factorization so a reused Jacobian is not refactored.
#[derive(Default)]
pub struct LuSolver {
    factor: Option<PartialPivLu<f64>>,
    /// Shape and entries of the factored matrix.
    factored: Option<Mat<f64>>,
    factorizations: usize,
}

impl LuSolver {
    /// Create a new LU solver (no factorization yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of factorizations computed so far.
    pub fn factorizations(&self) -> usize {
        self.factorizations
    }

    fn is_cached(&self, a: &Mat<f64>) -> bool {
        match &self.factored {
            Some(m) => {
                m.nrows() == a.nrows()
                    && m.ncols() == a.ncols()
                    && (0..a.nrows()).all(|i| (0..a.ncols()).all(|j| m[(i, j)] == a[(i, j)]))
            }
            None => false,
        }
    }
}

impl LinearSolver<Mat<f64>, Vec<f64>> for LuSolver {
    type Error = NlError;

    fn solve(&mut self, a: &Mat<f64>, b: &Vec<f64>, x: &mut Vec<f64>) -> Result<SolveStats<f64>, NlError> {
        if a.nrows() != a.ncols() || a.nrows() != b.len() {
            return Err(NlError::DimensionMismatch {
                expected: a.nrows(),
                found: b.len(),
            });
        }
        if !self.is_cached(a) {
            log::trace!("LuSolver: factoring {}x{} matrix", a.nrows(), a.ncols());
            self.factor = Some(PartialPivLu::new(a.as_ref()));
            self.factored = Some(a.clone());
            self.factorizations += 1;
        }
        let factor = self
            .factor
            .as_ref()
            .ok_or_else(|| NlError::LinearSolve("missing LU factorization".into()))?;
        x.clone_from(b);
        let n = x.len();
        let x_mat = MatMut::from_column_major_slice_mut(x, n, 1);
        factor.solve_in_place_with_conj(Conj::No, x_mat);
        if x.iter().any(|v| !v.is_finite()) {
            return Err(NlError::LinearSolve("singular Jacobian".into()));
        }
        Ok(SolveStats {
            iterations: 1,
            final_residual: 0.0,
            converged: true,
        })
    }
}
