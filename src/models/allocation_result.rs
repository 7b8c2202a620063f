//! Allocation result models.
//!
//! This module contains the [`AllocationResult`] type and its associated
//! structures that capture all outputs of an allocation run: the nested
//! per-employee/date/project allocation, per-project costs, solver status,
//! assembly warnings and the diagnostics report.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::DiagnosticsReport;

/// Termination status of the allocation solver.
///
/// # Example
///
/// ```
/// use allocation_engine::models::SolverStatus;
///
/// assert!(SolverStatus::SolvedInaccurate.is_optimal());
/// assert!(!SolverStatus::PrimalInfeasible.is_optimal());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverStatus {
    /// Converged to the requested tolerance.
    Solved,
    /// Hit the iteration cap within a relaxed tolerance.
    SolvedInaccurate,
    /// Hit the iteration cap without reaching the relaxed tolerance.
    MaxIterationsReached,
    /// Some employee-day cannot be fully allocated under the constraints.
    PrimalInfeasible,
    /// The iteration produced non-finite values.
    NumericalError,
}

impl SolverStatus {
    /// Returns true if the status is optimal or optimal within tolerance.
    pub fn is_optimal(self) -> bool {
        matches!(self, SolverStatus::Solved | SolverStatus::SolvedInaccurate)
    }
}

/// Hours one employee bills to one project on one day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectAllocation {
    /// Research hours per topic name.
    pub topics: BTreeMap<String, f64>,
    /// Non-research hours.
    pub non_rnd_hours: f64,
}

impl ProjectAllocation {
    /// Sum of research hours over all topics.
    pub fn rnd_hours(&self) -> f64 {
        self.topics.values().sum()
    }

    /// Research plus non-research hours.
    pub fn total_hours(&self) -> f64 {
        self.rnd_hours() + self.non_rnd_hours
    }
}

/// Allocations of one employee: date → project name → allocation.
pub type EmployeeAllocations = BTreeMap<NaiveDate, BTreeMap<String, ProjectAllocation>>;

/// Realised cost breakdown for one project.
///
/// When the solve did not succeed, every realised figure is NaN while the
/// target-derived figures are still filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectCost {
    /// Project name.
    pub project: String,
    /// Research hours billed.
    pub rnd_hours: f64,
    /// Non-research hours billed.
    pub non_rnd_hours: f64,
    /// Salary-weighted cost of the billed hours.
    pub direct_cost: f64,
    /// Overhead surcharge on the direct cost.
    pub overhead_cost: f64,
    /// Direct plus overhead cost.
    pub total_cost: f64,
    /// Contractual target.
    pub target_cost: f64,
    /// Matching fund threshold, if defined.
    pub matching_fund_threshold: Option<f64>,
    /// `total_cost / target_cost - 1`, if the target is positive.
    pub relative_deviation: Option<f64>,
    /// Whether the total cost lies within the grant bounds, if any are given.
    pub within_grant_bounds: Option<bool>,
}

/// Category of a non-fatal assembly warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// No entry for an employee on a day in range; treated as zero hours.
    MissingDay,
    /// Hours were logged without a salary rate; treated as a zero rate.
    MissingSalary,
    /// A topic is not in the catalog and was ignored.
    UnknownTopic,
    /// A project's funding window does not overlap the date range.
    ProjectOutsideRange,
    /// Hours were logged on a day no project is funded.
    UnfundedDay,
}

/// A data-completeness warning raised while assembling the inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyWarning {
    /// The warning category.
    pub kind: WarningKind,
    /// The employee or project the warning concerns.
    pub subject: String,
    /// The affected day, if the warning is day-specific.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// A human-readable description.
    pub message: String,
}

/// The complete result of an allocation run.
///
/// # Example
///
/// ```
/// use allocation_engine::models::{AllocationResult, SolverStatus};
///
/// let result = AllocationResult::empty(SolverStatus::PrimalInfeasible);
/// assert!(result.allocations.is_empty());
/// assert!(!result.status.is_optimal());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    /// Solver termination status.
    pub status: SolverStatus,
    /// Solver iterations performed.
    pub iterations: usize,
    /// Objective value at the returned point (NaN if unavailable).
    pub objective: f64,
    /// Employee id → date → project → allocation, non-negligible entries only.
    pub allocations: BTreeMap<String, EmployeeAllocations>,
    /// Project name → total cost (NaN when the solve failed).
    pub final_costs: BTreeMap<String, f64>,
    /// Per-project cost breakdown in project input order.
    pub project_costs: Vec<ProjectCost>,
    /// Hour-conservation and cap diagnostics.
    pub diagnostics: DiagnosticsReport,
    /// Data-completeness warnings from assembly.
    pub warnings: Vec<AssemblyWarning>,
}

impl AllocationResult {
    /// A result with the given status and nothing allocated.
    pub fn empty(status: SolverStatus) -> Self {
        Self {
            status,
            iterations: 0,
            objective: f64::NAN,
            allocations: BTreeMap::new(),
            final_costs: BTreeMap::new(),
            project_costs: Vec::new(),
            diagnostics: DiagnosticsReport::default(),
            warnings: Vec::new(),
        }
    }

    /// Allocation of `employee` to `project` on `date`, if any.
    pub fn allocation(
        &self,
        employee: &str,
        date: NaiveDate,
        project: &str,
    ) -> Option<&ProjectAllocation> {
        self.allocations.get(employee)?.get(&date)?.get(project)
    }

    /// Total hours allocated to `employee` on `date` across all projects.
    pub fn allocated_hours(&self, employee: &str, date: NaiveDate) -> f64 {
        self.allocations
            .get(employee)
            .and_then(|days| days.get(&date))
            .map(|projects| projects.values().map(ProjectAllocation::total_hours).sum())
            .unwrap_or(0.0)
    }

    /// Total hours allocated to `project` over all employees and days.
    pub fn project_hours(&self, project: &str) -> f64 {
        self.allocations
            .values()
            .flat_map(|days| days.values())
            .filter_map(|projects| projects.get(project))
            .map(ProjectAllocation::total_hours)
            .sum()
    }

    /// Cost breakdown for `project`.
    pub fn project_cost(&self, project: &str) -> Option<&ProjectCost> {
        self.project_costs.iter().find(|c| c.project == project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn sample_result() -> AllocationResult {
        let mut result = AllocationResult::empty(SolverStatus::Solved);
        let mut projects = BTreeMap::new();
        projects.insert(
            "Horizon".to_string(),
            ProjectAllocation {
                topics: BTreeMap::from([("A".to_string(), 3.0), ("B".to_string(), 2.5)]),
                non_rnd_hours: 1.0,
            },
        );
        projects.insert(
            "Atlas".to_string(),
            ProjectAllocation {
                topics: BTreeMap::from([("C".to_string(), 1.5)]),
                non_rnd_hours: 0.0,
            },
        );
        result
            .allocations
            .insert("alice".to_string(), BTreeMap::from([(date(2), projects)]));
        result
    }

    #[test]
    fn test_solver_status_serialization() {
        assert_eq!(
            serde_json::to_string(&SolverStatus::MaxIterationsReached).unwrap(),
            "\"max_iterations_reached\""
        );
        assert_eq!(
            serde_json::to_string(&SolverStatus::SolvedInaccurate).unwrap(),
            "\"solved_inaccurate\""
        );
    }

    #[test]
    fn test_only_solved_statuses_are_optimal() {
        assert!(SolverStatus::Solved.is_optimal());
        assert!(SolverStatus::SolvedInaccurate.is_optimal());
        assert!(!SolverStatus::MaxIterationsReached.is_optimal());
        assert!(!SolverStatus::PrimalInfeasible.is_optimal());
        assert!(!SolverStatus::NumericalError.is_optimal());
    }

    #[test]
    fn test_project_allocation_totals() {
        let allocation = ProjectAllocation {
            topics: BTreeMap::from([("A".to_string(), 3.0), ("B".to_string(), 2.5)]),
            non_rnd_hours: 1.0,
        };
        assert_eq!(allocation.rnd_hours(), 5.5);
        assert_eq!(allocation.total_hours(), 6.5);
    }

    #[test]
    fn test_allocated_hours_sums_projects() {
        let result = sample_result();
        assert_eq!(result.allocated_hours("alice", date(2)), 8.0);
        assert_eq!(result.allocated_hours("alice", date(3)), 0.0);
        assert_eq!(result.allocated_hours("bob", date(2)), 0.0);
    }

    #[test]
    fn test_project_hours_and_lookup() {
        let result = sample_result();
        assert_eq!(result.project_hours("Atlas"), 1.5);
        assert!(result.allocation("alice", date(2), "Horizon").is_some());
        assert!(result.allocation("alice", date(2), "Unknown").is_none());
    }

    #[test]
    fn test_warning_serialization_skips_missing_date() {
        let warning = AssemblyWarning {
            kind: WarningKind::ProjectOutsideRange,
            subject: "Horizon".to_string(),
            date: None,
            message: "funding window misses the range".to_string(),
        };
        let json = serde_json::to_string(&warning).unwrap();
        assert!(json.contains("\"kind\":\"project_outside_range\""));
        assert!(!json.contains("date"));
    }

    #[test]
    fn test_empty_result_serializes_nan_objective_as_null() {
        let result = AllocationResult::empty(SolverStatus::NumericalError);
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["objective"].is_null());
        assert_eq!(json["status"], "numerical_error");
    }
}
