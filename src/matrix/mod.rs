//! Matrix module: small dense matrices for the Anderson least-squares step.

pub mod dense;
pub use dense::{lu_solve, DenseMatrix, LuFactor};
