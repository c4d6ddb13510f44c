use thiserror::Error;

/// Diagnostics attached to a failed nonlinear solve.
///
/// Holds the last iterate together with the per-iteration histories so a
/// caller can decide how to retry (different initial guess, Anderson off,
/// looser tolerance).
#[derive(Clone, Debug)]
pub struct NonConvergence<S> {
    pub iterations: usize,
    pub last_change_norm: f64,
    pub solution: Vec<S>,
    pub damping_factors: Vec<f64>,
    pub change_norms: Vec<f64>,
}

// Unified error type for picard

#[derive(Error, Debug)]
pub enum NlError<S = f64> {
    #[error("allocation failure: {0}")]
    AllocationFailure(String),
    #[error("singular Anderson system (degenerate pivot in column {pivot})")]
    SingularSystem { pivot: usize },
    #[error(
        "damping factor fell below its floor after {} iterations (last change norm {:e})",
        .0.iterations,
        .0.last_change_norm
    )]
    Divergence(Box<NonConvergence<S>>),
    #[error(
        "no convergence within {} iterations (last change norm {:e})",
        .0.iterations,
        .0.last_change_norm
    )]
    MaxIterationsExceeded(Box<NonConvergence<S>>),
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("assembly did not provide a Jacobian although one was requested")]
    MissingJacobian,
    #[error("linear solve error: {0}")]
    LinearSolve(String),
    #[error("assembly error: {0}")]
    Assembly(String),
    #[error("non-finite norm at iteration {iteration}")]
    NonFiniteNorm { iteration: usize },
}

impl<S> NlError<S> {
    /// Diagnostics of a `Divergence` / `MaxIterationsExceeded` failure.
    pub fn non_convergence(&self) -> Option<&NonConvergence<S>> {
        match self {
            NlError::Divergence(nc) | NlError::MaxIterationsExceeded(nc) => Some(nc),
            _ => None,
        }
    }
}

impl<S> From<std::collections::TryReserveError> for NlError<S> {
    fn from(e: std::collections::TryReserveError) -> Self {
        NlError::AllocationFailure(e.to_string())
    }
}
