//! Adaptive damping-factor control.
//!
//! After each step the controller compares the new step against the
//! previous one with an acceptance predicate. Consecutive accepted steps
//! grow the factor by `auto_damping_ratio` (capped at 1), a rejected step
//! shrinks it by the same ratio, and shrinking below
//! `min_allowed_damping_coeff` is reported as divergence.

use std::fmt;

use crate::config::{DampingMode, PicardOptions};
use crate::nonlinear::history::IterationHistory;

/// Outcome of one controller decision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DampingDecision {
    /// Factor grew to the contained value.
    Increase(f64),
    Keep,
    /// Factor shrank to the contained value.
    Decrease(f64),
    /// Shrinking would cross the floor.
    Diverge,
}

/// Predicate deciding whether the latest step counts as successful.
pub enum Acceptance {
    /// `change_k < change_{k-1} · factor`; the default.
    SolutionChange,
    /// `residual_k < residual_{k-1} · factor`.
    ResidualNorm,
    /// Caller-supplied test over the history (at least two steps recorded).
    Custom(Box<dyn Fn(&IterationHistory) -> bool + Send + Sync>),
}

impl Acceptance {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&IterationHistory) -> bool + Send + Sync + 'static,
    {
        Acceptance::Custom(Box::new(f))
    }

    fn accepts(&self, history: &IterationHistory, factor: f64) -> bool {
        match self {
            Acceptance::SolutionChange => history
                .last_change_pair()
                .is_some_and(|(prev, cur)| cur < prev * factor),
            Acceptance::ResidualNorm => history
                .last_residual_pair()
                .is_some_and(|(prev, cur)| cur < prev * factor),
            Acceptance::Custom(f) => f(history),
        }
    }
}

impl Default for Acceptance {
    fn default() -> Self {
        Acceptance::SolutionChange
    }
}

impl fmt::Debug for Acceptance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Acceptance::SolutionChange => f.write_str("SolutionChange"),
            Acceptance::ResidualNorm => f.write_str("ResidualNorm"),
            Acceptance::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Damping state for one solve.
#[derive(Debug)]
pub struct DampingController<'a> {
    manual: bool,
    factor: f64,
    ratio: f64,
    floor: f64,
    improvement: f64,
    steps_to_increase: usize,
    successful_steps: usize,
    acceptance: &'a Acceptance,
}

impl<'a> DampingController<'a> {
    pub fn new(opts: &PicardOptions, acceptance: &'a Acceptance) -> Self {
        let (manual, factor) = match opts.damping {
            DampingMode::Manual(f) => (true, f),
            DampingMode::Auto => (false, opts.initial_auto_damping_factor),
        };
        DampingController {
            manual,
            factor,
            ratio: opts.auto_damping_ratio,
            floor: opts.min_allowed_damping_coeff,
            improvement: opts.sufficient_improvement_factor,
            steps_to_increase: opts.necessary_successful_steps_to_increase,
            successful_steps: 0,
            acceptance,
        }
    }

    /// Factor to apply at the next step.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Consecutive accepted steps since the last change of factor.
    pub fn successful_steps(&self) -> usize {
        self.successful_steps
    }

    /// Inspect the history after a step and adjust the factor.
    pub fn decide(&mut self, history: &IterationHistory) -> DampingDecision {
        if self.manual || history.iterations() < 2 {
            return DampingDecision::Keep;
        }
        if self.acceptance.accepts(history, self.improvement) {
            self.successful_steps += 1;
            if self.successful_steps >= self.steps_to_increase && self.factor < 1.0 {
                self.factor = (self.factor * self.ratio).min(1.0);
                self.successful_steps = 0;
                return DampingDecision::Increase(self.factor);
            }
            DampingDecision::Keep
        } else {
            self.successful_steps = 0;
            let reduced = self.factor / self.ratio;
            if reduced < self.floor {
                return DampingDecision::Diverge;
            }
            self.factor = reduced;
            DampingDecision::Decrease(reduced)
        }
    }
}
