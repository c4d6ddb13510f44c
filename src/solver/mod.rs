//! Large-system linear backends.
//!
//! The nonlinear loop never factors the PDE system itself; it hands the
//! assembled Jacobian and residual to a `LinearSolver`.

use crate::utils::convergence::SolveStats;

/// Common interface for any direct or iterative linear backend.
pub trait LinearSolver<M, V> {
    type Error: std::fmt::Display;
    /// Solve A·x = b, writing result into `x`.
    ///
    /// On entry `x` holds the initial guess (the current iterate, or zeros).
    /// Returns iteration stats (including convergence info).
    fn solve(&mut self, a: &M, b: &V, x: &mut V) -> Result<SolveStats<f64>, Self::Error>;
}

pub mod direct_lu;
pub use direct_lu::LuSolver;
