//! The discrete problem seen by the nonlinear loop.

use crate::core::traits::{MatVec, Scalar};
use crate::error::NlError;

/// Output of one assembly at the current iterate.
///
/// The Picard step solves `J(x_k) x_{k+1} = r(x_k)`; `residual` is the
/// right-hand side `r` of that system.
#[derive(Clone, Debug)]
pub struct Assembly<S, J> {
    pub residual: Vec<S>,
    pub jacobian: Option<J>,
}

impl<S, J> Assembly<S, J> {
    pub fn new(residual: Vec<S>, jacobian: Option<J>) -> Self {
        Assembly { residual, jacobian }
    }
}

/// Weak-form assembly of a discretized nonlinear problem.
///
/// Implemented outside this crate by the FE/FV machinery; the loop only
/// asks for the residual (always) and the Jacobian (when it cannot reuse
/// the previous one).
pub trait NonlinearProblem<S: Scalar> {
    type Jacobian: MatVec<Vec<S>>;

    /// Number of unknowns.
    fn problem_size(&self) -> usize;

    /// Assemble at `x`; return a Jacobian iff `with_jacobian`.
    fn assemble(&mut self, x: &[S], with_jacobian: bool) -> Result<Assembly<S, Self::Jacobian>, NlError<S>>;
}
