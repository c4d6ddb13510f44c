//! Damped Picard iteration with optional Anderson mixing.
//!
//! Each step assembles `J(x_k) x = r(x_k)` through the problem, hands it to
//! the linear backend, and moves the iterate a damped fraction toward the
//! linear solution:
//!
//! ```text
//! x_{k+1} = x_k + ω_k (x̃ − x_k),     change_k = ω_k ‖x̃ − x_k‖₂
//! ```
//!
//! The residual norm `‖J x_k − r(x_k)‖₂` is measured on the iterate entering
//! the step, with the Jacobian used by that step.
//!
//! The damping factor `ω_k` is adjusted by `DampingController`; with
//! Anderson enabled a full memory replaces `x_{k+1}` by the mixed iterate.
//!
//! States: `Init → Iterating → {Converged, Diverged, MaxStepsExceeded}`.
//! Errors raised by the collaborators or the Anderson solve end the run in
//! `Failed`, as does a linear backend reporting `converged: false`. Nothing
//! is retried internally.

use crate::config::{DampingMode, JacobianReuse, PicardOptions, ToleranceKind};
use crate::core::traits::{MatVec, Scalar};
use crate::core::wrappers::{diff_norm, norm, relax};
use crate::error::{NlError, NonConvergence};
use crate::nonlinear::anderson::AndersonAccelerator;
use crate::nonlinear::damping::{Acceptance, DampingController, DampingDecision};
use crate::nonlinear::history::IterationHistory;
use crate::nonlinear::problem::NonlinearProblem;
use crate::solver::LinearSolver;
use crate::utils::convergence::Convergence;
use crate::utils::logging::SolverLogger;

/// Where the last (or current) solve stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveState {
    Init,
    Iterating,
    Converged,
    Diverged,
    MaxStepsExceeded,
    /// A collaborator, the Anderson solve or an allocation failed.
    Failed,
}

/// Picard solver over a problem `P` and linear backend `L`.
///
/// Options, acceptance predicate and logger live as long as the solver;
/// history and Anderson memory are rebuilt by every `solve` call.
pub struct PicardSolver<S, P, L> {
    problem: P,
    linear: L,
    options: PicardOptions,
    acceptance: Acceptance,
    logger: SolverLogger,
    history: IterationHistory,
    state: SolveState,
    anderson_coefficients: Vec<S>,
}

fn reuse_jacobian(policy: &JacobianReuse, history: &IterationHistory, have_jacobian: bool, reuses: usize) -> bool {
    policy.max_steps > 0
        && have_jacobian
        && reuses < policy.max_steps
        && history
            .last_change_pair()
            .is_some_and(|(prev, cur)| prev > 0.0 && cur / prev < policy.sufficient_improvement_factor)
}

fn zeros<S: Scalar>(n: usize) -> Result<Vec<S>, NlError<S>> {
    let mut v = Vec::new();
    v.try_reserve_exact(n)?;
    v.resize(n, S::zero());
    Ok(v)
}

fn check_len<S>(expected: usize, found: usize) -> Result<(), NlError<S>> {
    if expected == found {
        Ok(())
    } else {
        Err(NlError::DimensionMismatch { expected, found })
    }
}

impl<S, P, L> PicardSolver<S, P, L>
where
    S: Scalar,
    P: NonlinearProblem<S>,
    L: LinearSolver<P::Jacobian, Vec<S>>,
{
    pub fn new(problem: P, linear: L) -> Self {
        PicardSolver {
            problem,
            linear,
            options: PicardOptions::default(),
            acceptance: Acceptance::default(),
            logger: SolverLogger::default(),
            history: IterationHistory::default(),
            state: SolveState::Init,
            anderson_coefficients: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: PicardOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_logger(mut self, logger: SolverLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_acceptance(mut self, acceptance: Acceptance) -> Self {
        self.acceptance = acceptance;
        self
    }

    pub fn options(&self) -> &PicardOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut PicardOptions {
        &mut self.options
    }

    pub fn set_tolerance(&mut self, tolerance: f64, kind: ToleranceKind) -> &mut Self {
        self.options.tolerance = tolerance;
        self.options.tolerance_kind = kind;
        self
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) -> &mut Self {
        self.options.max_iterations = max_iterations;
        self
    }

    /// Fixed damping factor, disables adaptive control.
    pub fn set_manual_damping_factor(&mut self, factor: f64) -> &mut Self {
        self.options.damping = DampingMode::Manual(factor);
        self
    }

    /// Adaptive damping starting from `factor`.
    pub fn set_initial_auto_damping_factor(&mut self, factor: f64) -> &mut Self {
        self.options.damping = DampingMode::Auto;
        self.options.initial_auto_damping_factor = factor;
        self
    }

    pub fn set_auto_damping_ratio(&mut self, ratio: f64) -> &mut Self {
        self.options.auto_damping_ratio = ratio;
        self
    }

    pub fn set_min_allowed_damping_coeff(&mut self, coeff: f64) -> &mut Self {
        self.options.min_allowed_damping_coeff = coeff;
        self
    }

    pub fn set_sufficient_improvement_factor(&mut self, factor: f64) -> &mut Self {
        self.options.sufficient_improvement_factor = factor;
        self
    }

    pub fn set_necessary_successful_steps_to_increase(&mut self, steps: usize) -> &mut Self {
        self.options.necessary_successful_steps_to_increase = steps;
        self
    }

    pub fn set_jacobian_reuse(&mut self, sufficient_improvement_factor: f64, max_steps: usize) -> &mut Self {
        self.options.jacobian_reuse = JacobianReuse {
            sufficient_improvement_factor,
            max_steps,
        };
        self
    }

    pub fn use_anderson_acceleration(&mut self, on: bool) -> &mut Self {
        self.options.anderson.enabled = on;
        self
    }

    pub fn set_num_last_vectors_used(&mut self, num: usize) -> &mut Self {
        self.options.anderson.num_last_vectors_used = num;
        self
    }

    pub fn set_anderson_beta(&mut self, beta: f64) -> &mut Self {
        self.options.anderson.beta = beta;
        self
    }

    /// Replace the step-acceptance predicate of the damping controller.
    pub fn set_acceptance(&mut self, acceptance: Acceptance) -> &mut Self {
        self.acceptance = acceptance;
        self
    }

    pub fn problem(&self) -> &P {
        &self.problem
    }

    pub fn problem_mut(&mut self) -> &mut P {
        &mut self.problem
    }

    pub fn linear_solver_mut(&mut self) -> &mut L {
        &mut self.linear
    }

    pub fn into_parts(self) -> (P, L) {
        (self.problem, self.linear)
    }

    /// Diagnostics of the last solve.
    pub fn history(&self) -> &IterationHistory {
        &self.history
    }

    pub fn damping_factors(&self) -> &[f64] {
        self.history.damping_factors()
    }

    pub fn change_norms(&self) -> &[f64] {
        self.history.change_norms()
    }

    pub fn iterations(&self) -> usize {
        self.history.iterations()
    }

    pub fn state(&self) -> SolveState {
        self.state
    }

    /// Weights of the last Anderson step of the last solve (empty if none).
    pub fn anderson_coefficients(&self) -> &[S] {
        &self.anderson_coefficients
    }

    /// Iterate from `initial_guess` until the tolerance is met.
    ///
    /// Returns the converged solution, or `Divergence` /
    /// `MaxIterationsExceeded` with the last iterate and histories attached.
    pub fn solve(&mut self, initial_guess: &[S]) -> Result<Vec<S>, NlError<S>> {
        self.state = SolveState::Init;
        self.anderson_coefficients.clear();
        let result = self.iterate(initial_guess);
        if let Err(e) = &result {
            if matches!(self.state, SolveState::Init | SolveState::Iterating) {
                self.state = SolveState::Failed;
                self.logger.warn(format_args!("solve aborted: {e}"));
            }
        }
        result
    }

    fn iterate(&mut self, initial_guess: &[S]) -> Result<Vec<S>, NlError<S>> {
        self.options.validate::<S>()?;
        let n = self.problem.problem_size();
        check_len::<S>(n, initial_guess.len())?;

        let opts = self.options.clone();
        self.history = IterationHistory::with_capacity::<S>(opts.max_iterations)?;
        let mut x = zeros::<S>(n)?;
        x.copy_from_slice(initial_guess);
        let mut candidate = zeros::<S>(n)?;
        let mut jx = zeros::<S>(n)?;

        let conv = Convergence {
            tol: opts.tolerance,
            kind: opts.tolerance_kind,
            max_iters: opts.max_iterations,
        };
        let mut damping = DampingController::new(&opts, &self.acceptance);
        let mut anderson = if opts.anderson.enabled {
            let mut acc = AndersonAccelerator::new(opts.anderson.num_last_vectors_used, opts.anderson.beta, n)?;
            acc.push(&x);
            Some(acc)
        } else {
            None
        };
        let mut jacobian: Option<P::Jacobian> = None;
        let mut reuses = 0usize;

        self.state = SolveState::Iterating;
        self.logger.info(format_args!(
            "Picard iteration: {} unknowns, tolerance {:e} ({:?}), damping {:?}, anderson {}",
            n,
            opts.tolerance,
            opts.tolerance_kind,
            opts.damping,
            if opts.anderson.enabled { "on" } else { "off" }
        ));

        for it in 1..=opts.max_iterations {
            let reuse = reuse_jacobian(&opts.jacobian_reuse, &self.history, jacobian.is_some(), reuses);
            let assembly = self.problem.assemble(&x, !reuse)?;
            check_len::<S>(n, assembly.residual.len())?;
            if reuse {
                reuses += 1;
            } else {
                jacobian = Some(assembly.jacobian.ok_or(NlError::MissingJacobian)?);
                reuses = 0;
            }
            let jac = jacobian.as_ref().ok_or(NlError::MissingJacobian)?;
            jac.matvec(&x, &mut jx);
            let residual_norm = diff_norm(&jx, &assembly.residual);

            if opts.use_initial_guess_for_iterative_solvers {
                candidate.copy_from_slice(&x);
            } else {
                candidate.iter_mut().for_each(|c| *c = S::zero());
            }
            let stats = self
                .linear
                .solve(jac, &assembly.residual, &mut candidate)
                .map_err(|e| NlError::LinearSolve(e.to_string()))?;
            if !stats.converged {
                return Err(NlError::LinearSolve(format!(
                    "linear backend did not converge at iteration {it} ({} inner iterations, residual {:e})",
                    stats.iterations, stats.final_residual
                )));
            }
            check_len::<S>(n, candidate.len())?;

            let omega = damping.factor();
            let change = omega * diff_norm(&candidate, &x);
            relax(&mut x, &candidate, omega);
            if !change.is_finite() || !residual_norm.is_finite() {
                return Err(NlError::NonFiniteNorm { iteration: it });
            }
            self.history.record(omega, change, residual_norm, !reuse);
            let solution_norm = norm(&x);
            self.logger.debug(format_args!(
                "iteration {it}: damping {omega}, solution change {change:e}, residual {residual_norm:e}{}",
                if reuse { ", reused Jacobian" } else { "" }
            ));

            if conv.converged(change, solution_norm, residual_norm) {
                self.state = SolveState::Converged;
                self.logger.info(format_args!(
                    "converged after {it} iterations (measure {:e})",
                    conv.measure(change, solution_norm, residual_norm)
                ));
                return Ok(x);
            }

            if let Some(acc) = anderson.as_mut() {
                acc.push(&x);
                if acc.is_full() {
                    acc.accelerate(&mut candidate)?;
                    x.copy_from_slice(&candidate);
                    self.anderson_coefficients.clear();
                    self.anderson_coefficients.extend_from_slice(acc.coefficients());
                }
            }

            if conv.exhausted(it) {
                break;
            }

            match damping.decide(&self.history) {
                DampingDecision::Increase(f) => {
                    self.logger.info(format_args!("iteration {it}: damping factor increased to {f}"))
                }
                DampingDecision::Decrease(f) => {
                    self.logger.info(format_args!("iteration {it}: damping factor decreased to {f}"))
                }
                DampingDecision::Keep => {}
                DampingDecision::Diverge => {
                    self.state = SolveState::Diverged;
                    self.logger.warn(format_args!(
                        "iteration {it}: damping factor would fall below {:e}, giving up",
                        opts.min_allowed_damping_coeff
                    ));
                    return Err(NlError::Divergence(Box::new(self.non_convergence(x))));
                }
            }
        }

        self.state = SolveState::MaxStepsExceeded;
        self.logger.warn(format_args!(
            "no convergence within {} iterations (last change {:e})",
            opts.max_iterations,
            self.history.change_norms().last().copied().unwrap_or(f64::NAN)
        ));
        Err(NlError::MaxIterationsExceeded(Box::new(self.non_convergence(x))))
    }

    fn non_convergence(&self, solution: Vec<S>) -> NonConvergence<S> {
        NonConvergence {
            iterations: self.history.iterations(),
            last_change_norm: self.history.change_norms().last().copied().unwrap_or(f64::NAN),
            solution,
            damping_factors: self.history.damping_factors().to_vec(),
            change_norms: self.history.change_norms().to_vec(),
        }
    }
}
