//! Accelerated projected-gradient solver for the allocation QP.
//!
//! The solver runs FISTA with adaptive gradient restart. Each iterate is
//! projected exactly onto every employee-day block, so the full-allocation,
//! cap and eligibility constraints hold on every returned point.

use tracing::debug;

use crate::config::SolverSettings;
use crate::models::SolverStatus;

use super::problem::AllocationProblem;
use super::projection::project_capped_simplex;

/// What a solve produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    /// Termination status.
    pub status: SolverStatus,
    /// Iterations performed.
    pub iterations: usize,
    /// Final point; empty unless the status is optimal.
    pub solution: Vec<f64>,
    /// Fixed-point residual at termination.
    pub residual: f64,
    /// Unscaled objective at the final point.
    pub objective: f64,
}

impl SolveOutcome {
    fn failed(status: SolverStatus, iterations: usize, residual: f64) -> Self {
        Self {
            status,
            iterations,
            solution: Vec::new(),
            residual,
            objective: f64::NAN,
        }
    }
}

/// Solves the allocation problem.
///
/// Never fails: infeasibility, non-convergence and numerical breakdown are
/// reported through [`SolveOutcome::status`].
pub fn solve(problem: &AllocationProblem, settings: &SolverSettings) -> SolveOutcome {
    let infeasible = problem.infeasible_blocks();
    if !infeasible.is_empty() {
        debug!(blocks = infeasible.len(), "Employee-days cannot be fully allocated");
        return SolveOutcome::failed(SolverStatus::PrimalInfeasible, 0, f64::NAN);
    }

    let n = problem.num_variables();
    let mut x = vec![0.0; n];
    let uniform: Vec<f64> = {
        let mut start = vec![0.0; n];
        for block in &problem.blocks {
            let width = (block.end - block.start) as f64;
            start[block.slots()].fill(block.hours / width);
        }
        start
    };
    project(problem, &uniform, &mut x);

    if n == 0 {
        return SolveOutcome {
            status: SolverStatus::Solved,
            iterations: 0,
            objective: problem.objective_value(&x),
            solution: x,
            residual: 0.0,
        };
    }

    let step = 1.0 / problem.lipschitz();
    let mut y = x.clone();
    let mut x_next = vec![0.0; n];
    let mut grad = vec![0.0; n];
    let mut shifted = vec![0.0; n];
    let mut momentum = 1.0_f64;
    let mut residual = f64::INFINITY;
    let mut restarts = 0usize;

    for iteration in 1..=settings.max_iterations {
        problem.gradient(&y, &mut grad);
        for i in 0..n {
            shifted[i] = y[i] - step * grad[i];
        }
        project(problem, &shifted, &mut x_next);

        if x_next.iter().any(|v| !v.is_finite()) {
            debug!(iteration, "Non-finite iterate");
            return SolveOutcome::failed(SolverStatus::NumericalError, iteration, f64::NAN);
        }

        residual = max_abs_diff(&x_next, &y);
        let scale = max_abs(&x_next).max(max_abs(&y));
        if residual <= settings.eps_abs + settings.eps_rel * scale {
            debug!(iteration, residual, restarts, "Solver converged");
            return SolveOutcome {
                status: SolverStatus::Solved,
                iterations: iteration,
                objective: problem.objective_value(&x_next),
                solution: x_next,
                residual,
            };
        }

        let restart: f64 = (0..n).map(|i| (y[i] - x_next[i]) * (x_next[i] - x[i])).sum();
        if restart > 0.0 {
            momentum = 1.0;
            y.copy_from_slice(&x_next);
            restarts += 1;
        } else {
            let next_momentum = 0.5 * (1.0 + (1.0 + 4.0 * momentum * momentum).sqrt());
            let beta = (momentum - 1.0) / next_momentum;
            for i in 0..n {
                y[i] = x_next[i] + beta * (x_next[i] - x[i]);
            }
            momentum = next_momentum;
        }
        std::mem::swap(&mut x, &mut x_next);
    }

    let tolerance = settings.eps_abs + settings.eps_rel * max_abs(&x);
    let status = if residual <= settings.inaccurate_factor * tolerance {
        SolverStatus::SolvedInaccurate
    } else {
        SolverStatus::MaxIterationsReached
    };
    debug!(?status, residual, restarts, "Iteration cap reached");

    if !status.is_optimal() {
        return SolveOutcome::failed(status, settings.max_iterations, residual);
    }
    SolveOutcome {
        status,
        iterations: settings.max_iterations,
        objective: problem.objective_value(&x),
        solution: x,
        residual,
    }
}

fn project(problem: &AllocationProblem, v: &[f64], out: &mut [f64]) {
    for block in &problem.blocks {
        let range = block.slots();
        project_capped_simplex(
            &v[range.clone()],
            &problem.upper[range.clone()],
            block.hours,
            &mut out[range],
        );
    }
}

fn max_abs(v: &[f64]) -> f64 {
    v.iter().fold(0.0, |acc, x| acc.max(x.abs()))
}

fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .fold(0.0, |acc, (x, y)| acc.max((x - y).abs()))
}
