//! Options for the damped Picard iteration.
//!
//! This module provides the `PicardOptions` struct, which collects every
//! tunable of the nonlinear loop: the stop tolerance and its kind, the
//! damping controller (manual or adaptive), the Jacobian-reuse policy and
//! Anderson mixing. The options are set once per solver instance and reused
//! across solves; `validate` is called at the start of every solve.

use crate::error::NlError;

/// Quantity compared against the tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToleranceKind {
    /// `ω ‖x_candidate − x‖₂ < tol`
    SolutionChangeAbsolute,
    /// `ω ‖x_candidate − x‖₂ / ‖x_new‖₂ < tol`
    SolutionChangeRelative,
    /// `‖J x_k − r(x_k)‖₂ < tol`, measured on the iterate entering the step
    ResidualNorm,
}

/// Damping factor policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DampingMode {
    /// Fixed caller-supplied factor every step; no adaptive control.
    Manual(f64),
    /// Adaptive control starting from `initial_auto_damping_factor`.
    Auto,
}

/// Jacobian reuse policy.
///
/// A previous Jacobian is reused while fewer than `max_steps` consecutive
/// reuses happened and the most recent change-norm ratio
/// `change_k / change_{k-1}` is below `sufficient_improvement_factor`.
/// Only that latest ratio is consulted, not the whole window of
/// `max_steps` steps. `max_steps == 0` always reassembles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JacobianReuse {
    pub sufficient_improvement_factor: f64,
    pub max_steps: usize,
}

impl Default for JacobianReuse {
    fn default() -> Self {
        JacobianReuse {
            sufficient_improvement_factor: 1e-1,
            max_steps: 0,
        }
    }
}

/// Anderson mixing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AndersonOptions {
    pub enabled: bool,
    /// Memory depth, at least 2.
    pub num_last_vectors_used: usize,
    /// Mixing relaxation; 1.0 is plain Anderson mixing.
    pub beta: f64,
}

impl Default for AndersonOptions {
    fn default() -> Self {
        AndersonOptions {
            enabled: false,
            num_last_vectors_used: 3,
            beta: 1.0,
        }
    }
}

/// Picard solver parameters.
#[derive(Debug, Clone)]
pub struct PicardOptions {
    pub tolerance: f64,
    pub tolerance_kind: ToleranceKind,
    pub max_iterations: usize,

    pub damping: DampingMode,
    pub initial_auto_damping_factor: f64,
    /// Growth/shrink multiplier of the adaptive damping factor.
    pub auto_damping_ratio: f64,
    /// Divergence floor.
    pub min_allowed_damping_coeff: f64,
    pub sufficient_improvement_factor: f64,
    pub necessary_successful_steps_to_increase: usize,

    pub jacobian_reuse: JacobianReuse,
    pub anderson: AndersonOptions,

    /// Seed the linear backend's unknown with the current iterate.
    pub use_initial_guess_for_iterative_solvers: bool,
}

impl Default for PicardOptions {
    fn default() -> Self {
        PicardOptions {
            tolerance: 1e-3,
            tolerance_kind: ToleranceKind::SolutionChangeRelative,
            max_iterations: 20,
            damping: DampingMode::Auto,
            initial_auto_damping_factor: 1.0,
            auto_damping_ratio: 2.0,
            min_allowed_damping_coeff: 1e-4,
            sufficient_improvement_factor: 1.05,
            necessary_successful_steps_to_increase: 3,
            jacobian_reuse: JacobianReuse::default(),
            anderson: AndersonOptions::default(),
            use_initial_guess_for_iterative_solvers: true,
        }
    }
}

impl PicardOptions {
    /// Reject parameter combinations the iteration cannot run with.
    pub fn validate<S>(&self) -> Result<(), NlError<S>> {
        fn bad<S>(msg: String) -> Result<(), NlError<S>> {
            Err(NlError::InvalidOptions(msg))
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return bad(format!("tolerance must be positive, got {}", self.tolerance));
        }
        if self.max_iterations == 0 {
            return bad("max_iterations must be at least 1".into());
        }
        if !(self.min_allowed_damping_coeff > 0.0 && self.min_allowed_damping_coeff <= 1.0) {
            return bad(format!(
                "min_allowed_damping_coeff must lie in (0, 1], got {}",
                self.min_allowed_damping_coeff
            ));
        }
        let start = match self.damping {
            DampingMode::Manual(f) => f,
            DampingMode::Auto => self.initial_auto_damping_factor,
        };
        if !(start >= self.min_allowed_damping_coeff && start <= 1.0) {
            return bad(format!(
                "damping factor {} outside [{}, 1]",
                start, self.min_allowed_damping_coeff
            ));
        }
        if !(self.auto_damping_ratio > 1.0) {
            return bad(format!(
                "auto_damping_ratio must exceed 1, got {}",
                self.auto_damping_ratio
            ));
        }
        if !(self.sufficient_improvement_factor > 0.0) {
            return bad(format!(
                "sufficient_improvement_factor must be positive, got {}",
                self.sufficient_improvement_factor
            ));
        }
        if self.necessary_successful_steps_to_increase == 0 {
            return bad("necessary_successful_steps_to_increase must be at least 1".into());
        }
        if !(self.jacobian_reuse.sufficient_improvement_factor > 0.0) {
            return bad("sufficient_improvement_factor_jacobian must be positive".into());
        }
        if self.anderson.num_last_vectors_used < 2 {
            return bad(format!(
                "num_last_vectors_used must be at least 2, got {}",
                self.anderson.num_last_vectors_used
            ));
        }
        if !(self.anderson.beta > 0.0 && self.anderson.beta <= 1.0) {
            return bad(format!("anderson_beta must lie in (0, 1], got {}", self.anderson.beta));
        }
        Ok(())
    }
}
