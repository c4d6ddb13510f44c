//! Convergence checks and logging.

pub mod convergence;
pub mod logging;

pub use convergence::{Convergence, SolveStats};
pub use logging::{LogSink, SolverLogger};
