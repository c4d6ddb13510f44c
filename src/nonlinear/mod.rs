//! The nonlinear iteration: history, damping control, Anderson mixing and
//! the Picard loop that drives them.

pub mod anderson;
pub mod damping;
pub mod history;
pub mod picard;
pub mod problem;

pub use anderson::{anderson_coefficients, AndersonAccelerator};
pub use damping::{Acceptance, DampingController, DampingDecision};
pub use history::{IterationHistory, RingBuffer};
pub use picard::{PicardSolver, SolveState};
pub use problem::{Assembly, NonlinearProblem};
