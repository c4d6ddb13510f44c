//! Convergence tracking & tolerance checks for the nonlinear iteration.

use crate::config::ToleranceKind;

/// Stopping criteria.
#[derive(Clone, Copy, Debug)]
pub struct Convergence {
    pub tol: f64,
    pub kind: ToleranceKind,
    pub max_iters: usize,
}

/// Statistics reported by a linear backend for one solve.
#[derive(Clone, Debug)]
pub struct SolveStats<T> {
    pub iterations: usize,
    pub final_residual: T,
    pub converged: bool,
}

impl Convergence {
    /// Quantity compared against `tol` for the configured kind.
    pub fn measure(&self, change_norm: f64, solution_norm: f64, residual_norm: f64) -> f64 {
        match self.kind {
            ToleranceKind::SolutionChangeAbsolute => change_norm,
            ToleranceKind::SolutionChangeRelative => {
                if solution_norm > 0.0 {
                    change_norm / solution_norm
                } else {
                    change_norm
                }
            }
            ToleranceKind::ResidualNorm => residual_norm,
        }
    }

    /// True once the measured quantity is below the tolerance.
    pub fn converged(&self, change_norm: f64, solution_norm: f64, residual_norm: f64) -> bool {
        self.measure(change_norm, solution_norm, residual_norm) < self.tol
    }

    /// True once `iteration` (1-based) reached the iteration budget.
    pub fn exhausted(&self, iteration: usize) -> bool {
        iteration >= self.max_iters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_change_falls_back_to_absolute_at_zero() {
        let c = Convergence {
            tol: 1e-3,
            kind: ToleranceKind::SolutionChangeRelative,
            max_iters: 10,
        };
        assert_eq!(c.measure(2.0, 4.0, 0.0), 0.5);
        assert_eq!(c.measure(2.0, 0.0, 0.0), 2.0);
        assert!(c.converged(0.0, 0.0, 1.0));
    }

    #[test]
    fn residual_kind_ignores_change() {
        let c = Convergence {
            tol: 1e-6,
            kind: ToleranceKind::ResidualNorm,
            max_iters: 3,
        };
        assert!(!c.converged(0.0, 1.0, 1e-3));
        assert!(c.converged(10.0, 1.0, 1e-9));
        assert!(!c.exhausted(2));
        assert!(c.exhausted(3));
    }
}
