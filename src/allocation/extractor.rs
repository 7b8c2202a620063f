//! Result extraction.
//!
//! Turns the solver's flat variable vector back into the nested
//! employee → date → project allocation map and computes per-project costs
//! from the extracted hours.

use std::collections::BTreeMap;

use crate::config::ReportSettings;
use crate::models::{
    AllocationResult, DiagnosticsReport, EmployeeAllocations, ProjectCost, SolverStatus,
};

use super::assembler::AssembledInput;
use super::costs::{failed_project_cost, project_cost};
use super::diagnostics::{diagnose, unallocatable_days};
use super::problem::{AllocationProblem, SlotKind};
use super::solver::SolveOutcome;

#[derive(Default)]
struct ProjectTally {
    rnd_hours: f64,
    non_rnd_hours: f64,
    direct_cost: f64,
}

/// Builds the allocation result of a solve.
///
/// Allocations below `zero_threshold` are dropped, and costs are computed
/// from the hours that remain. When the solve did not succeed the result
/// carries no allocations and NaN costs; its diagnostics only name the
/// employee-days that made the model infeasible, if any.
pub fn extract(
    input: &AssembledInput,
    problem: &AllocationProblem,
    outcome: &SolveOutcome,
    settings: &ReportSettings,
) -> AllocationResult {
    if !outcome.status.is_optimal() {
        return failed_result(input, problem, outcome);
    }

    let mut allocations: BTreeMap<String, EmployeeAllocations> = input
        .employee_ids
        .iter()
        .map(|id| (id.clone(), EmployeeAllocations::new()))
        .collect();
    let mut tallies: Vec<ProjectTally> = input.projects.iter().map(|_| ProjectTally::default()).collect();

    for block in &problem.blocks {
        let employee = &input.employee_ids[block.employee];
        let date = input.dates[block.date];

        for i in block.slots() {
            let hours = outcome.solution[i];
            if hours < settings.zero_threshold {
                continue;
            }
            let p = problem.kinds[i].project();
            let project_name = &input.projects[p].name;

            let entry = allocations
                .entry(employee.clone())
                .or_default()
                .entry(date)
                .or_default()
                .entry(project_name.clone())
                .or_default();

            let tally = &mut tallies[p];
            tally.direct_cost += hours * block.salary;
            match problem.kinds[i] {
                SlotKind::Research { topic, .. } => {
                    *entry.topics.entry(input.topics[topic].clone()).or_insert(0.0) += hours;
                    tally.rnd_hours += hours;
                }
                SlotKind::NonResearch { .. } => {
                    entry.non_rnd_hours += hours;
                    tally.non_rnd_hours += hours;
                }
            }
        }
    }

    let project_costs: Vec<ProjectCost> = input
        .projects
        .iter()
        .zip(&tallies)
        .map(|(params, tally)| {
            project_cost(params, tally.rnd_hours, tally.non_rnd_hours, tally.direct_cost)
        })
        .collect();
    let final_costs = project_costs
        .iter()
        .map(|c| (c.project.clone(), c.total_cost))
        .collect();

    let diagnostics = diagnose(input, &allocations, settings);

    AllocationResult {
        status: outcome.status,
        iterations: outcome.iterations,
        objective: outcome.objective,
        allocations,
        final_costs,
        project_costs,
        diagnostics,
        warnings: input.warnings.clone(),
    }
}

fn failed_result(
    input: &AssembledInput,
    problem: &AllocationProblem,
    outcome: &SolveOutcome,
) -> AllocationResult {
    let diagnostics = match outcome.status {
        SolverStatus::PrimalInfeasible => DiagnosticsReport {
            findings: unallocatable_days(input, problem),
            ..DiagnosticsReport::default()
        },
        _ => DiagnosticsReport::default(),
    };
    let project_costs: Vec<ProjectCost> = input.projects.iter().map(failed_project_cost).collect();
    AllocationResult {
        status: outcome.status,
        iterations: outcome.iterations,
        objective: f64::NAN,
        allocations: BTreeMap::new(),
        final_costs: input
            .projects
            .iter()
            .map(|p| (p.name.clone(), f64::NAN))
            .collect(),
        project_costs,
        diagnostics,
        warnings: input.warnings.clone(),
    }
}
