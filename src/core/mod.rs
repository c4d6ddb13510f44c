//! Numeric abstractions and vector kernels.

pub mod traits;
pub mod wrappers;

pub use traits::{InnerProduct, MatVec, Scalar};
