//! picard: damped Picard iteration with Anderson mixing
//!
//! This crate drives a sequence of linear solves toward the solution of a
//! nonlinear algebraic system `F(x) = 0` from a discretized PDE. Assembly of
//! the Jacobian/residual and the large linear solve are delegated to the
//! caller through `NonlinearProblem` and `LinearSolver`; the crate owns the
//! iteration control: adaptive damping, divergence detection, Jacobian
//! reuse and Anderson extrapolation. Real (`f64`) and complex
//! (`Complex<f64>`) scalars are supported.

pub mod config;
pub mod core;
pub mod error;
pub mod matrix;
pub mod nonlinear;
pub mod solver;
pub mod utils;

// Re-exports for convenience
pub use config::*;
pub use crate::core::*;
pub use error::*;
pub use matrix::*;
pub use nonlinear::*;
pub use solver::*;
pub use utils::*;
