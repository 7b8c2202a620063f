//! Allocation run entry points.
//!
//! A run is a single synchronous pass: assemble the inputs, issue one solve,
//! extract the result. Nothing is kept between runs.

use std::time::Instant;

use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::models::{
    AllocationInput, AllocationResult, DateRange, EmployeeDailyRecord, ProjectSpec, TopicCatalog,
};

use super::assembler::assemble;
use super::extractor::extract;
use super::problem::AllocationProblem;
use super::solver::solve;

/// Runs one allocation.
///
/// Input errors abort the run before any solve is attempted. A solve that
/// does not reach an optimum is not an error: the result carries the status,
/// NaN costs and no allocations.
///
/// # Example
///
/// ```
/// use allocation_engine::allocation::run_allocation;
/// use allocation_engine::config::EngineConfig;
/// use allocation_engine::models::*;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let day = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
/// let mut alice = EmployeeDailyRecord::new("alice");
/// alice.add_research_hours(day, 8.0).set_salary_rate(day, Decimal::new(100, 0));
///
/// let catalog = TopicCatalog::new(["Reasoning / Planning"]).unwrap();
/// let project = ProjectSpec::new("Horizon", Decimal::ZERO).with_topics(["Reasoning / Planning"]);
/// let input = AllocationInput::new(catalog, vec![alice], vec![project], DateRange::new(day, day).unwrap());
///
/// let result = run_allocation(&input, &EngineConfig::default()).unwrap();
/// assert!(result.status.is_optimal());
/// assert!((result.final_costs["Horizon"] - 800.0).abs() < 1e-6);
/// ```
pub fn run_allocation(
    input: &AllocationInput,
    config: &EngineConfig,
) -> EngineResult<AllocationResult> {
    let started = Instant::now();
    info!(
        employees = input.employees.len(),
        projects = input.projects.len(),
        topics = input.topics.len(),
        start_date = %input.range.start_date,
        end_date = %input.range.end_date,
        "Starting allocation run"
    );

    let assembled = assemble(input, &config.assembly)?;
    let problem = AllocationProblem::build(&assembled, &config.solver);
    let outcome = solve(&problem, &config.solver);
    let result = extract(&assembled, &problem, &outcome, &config.report);

    let duration_us = started.elapsed().as_micros() as u64;
    if result.status.is_optimal() {
        info!(
            status = ?result.status,
            iterations = result.iterations,
            variables = problem.num_variables(),
            warnings = result.warnings.len(),
            findings = result.diagnostics.findings.len(),
            duration_us,
            "Allocation run complete"
        );
    } else {
        warn!(
            status = ?result.status,
            iterations = result.iterations,
            variables = problem.num_variables(),
            duration_us,
            "Allocation did not reach an optimum"
        );
    }

    Ok(result)
}

/// Runs one allocation from loose records and `YYYY-MM-DD` date strings.
///
/// # Errors
///
/// Returns `InvalidDate` for malformed dates and `InvalidRange` when the
/// start is after the end, plus every error of [`run_allocation`].
pub fn allocate(
    employees: Vec<EmployeeDailyRecord>,
    projects: Vec<ProjectSpec>,
    catalog: TopicCatalog,
    start_date: &str,
    end_date: &str,
    config: &EngineConfig,
) -> EngineResult<AllocationResult> {
    let range = DateRange::parse(start_date, end_date)?;
    let input = AllocationInput::new(catalog, employees, projects, range);
    run_allocation(&input, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::models::SolverStatus;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn alice() -> EmployeeDailyRecord {
        let mut record = EmployeeDailyRecord::new("alice");
        record
            .add_research_hours(date(3), 8.0)
            .set_salary_rate(date(3), Decimal::new(100, 0));
        record
    }

    fn catalog() -> TopicCatalog {
        TopicCatalog::new(["T1", "T2"]).unwrap()
    }

    #[test]
    fn test_allocate_parses_dates() {
        let result = allocate(
            vec![alice()],
            vec![ProjectSpec::new("A", Decimal::ZERO).with_topics(["T1"])],
            catalog(),
            "2025-03-03",
            "2025-03-03",
            &EngineConfig::default(),
        )
        .unwrap();

        assert_eq!(result.status, SolverStatus::Solved);
        assert!((result.allocated_hours("alice", date(3)) - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_allocate_rejects_bad_date_format() {
        let result = allocate(
            vec![alice()],
            vec![],
            catalog(),
            "03/03/2025",
            "2025-03-03",
            &EngineConfig::default(),
        );
        assert!(matches!(result, Err(EngineError::InvalidDate { .. })));
    }

    #[test]
    fn test_allocate_rejects_inverted_range() {
        let result = allocate(
            vec![alice()],
            vec![],
            catalog(),
            "2025-03-05",
            "2025-03-03",
            &EngineConfig::default(),
        );
        assert!(matches!(result, Err(EngineError::InvalidRange { .. })));
    }

    #[test]
    fn test_no_projects_with_hours_is_infeasible() {
        let result = allocate(
            vec![alice()],
            vec![],
            catalog(),
            "2025-03-03",
            "2025-03-03",
            &EngineConfig::default(),
        )
        .unwrap();

        assert_eq!(result.status, SolverStatus::PrimalInfeasible);
        assert!(result.final_costs.is_empty());
    }
}
