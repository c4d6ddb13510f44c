//! Solver configuration.

pub mod options;
pub use options::{AndersonOptions, DampingMode, JacobianReuse, PicardOptions, ToleranceKind};
