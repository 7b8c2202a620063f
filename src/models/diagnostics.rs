//! Diagnostics report models.
//!
//! Structured findings produced after a solve: hour-conservation checks per
//! employee-day, non-research cap checks, and aggregated totals. These are
//! advisory data for the caller to display or log, not errors.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What a diagnostic finding reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// More hours allocated than were available.
    OverAllocated,
    /// Fewer hours allocated than were available.
    UnderAllocated,
    /// Non-research hours for one project exceed its cap.
    NonRndCapExceeded,
    /// No project may take all of the day's hours, so the model has no
    /// feasible allocation.
    Unallocatable,
}

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Numerical slack within the defect tolerance.
    Advisory,
    /// Beyond the defect tolerance; should be investigated.
    Defect,
}

/// A single diagnostic finding for one employee-day.
///
/// For cap findings `allocated` is the non-research hours billed and
/// `available` is the cap; `project` names the project. For unallocatable
/// days `allocated` is the most the day's eligible slots could absorb.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticFinding {
    /// Employee identifier.
    pub employee: String,
    /// Day of the finding.
    pub date: NaiveDate,
    /// Hours allocated.
    pub allocated: f64,
    /// Hours available (or the cap).
    pub available: f64,
    /// Finding category.
    pub kind: FindingKind,
    /// Finding severity.
    pub severity: Severity,
    /// Project concerned, for per-project findings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

/// Available versus allocated hours for one employee over the range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeTotals {
    /// Employee identifier.
    pub employee: String,
    /// Research hours available over the range.
    pub available: f64,
    /// Hours allocated over the range.
    pub allocated: f64,
    /// Rounded allocated total exceeds rounded available total.
    pub over_allocated: bool,
}

/// The diagnostics report of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    /// Per employee-day findings, in employee then date order.
    pub findings: Vec<DiagnosticFinding>,
    /// Per-employee totals, in employee input order.
    pub employee_totals: Vec<EmployeeTotals>,
    /// Research hours available over all employees.
    pub total_available: f64,
    /// Hours allocated over all employees.
    pub total_allocated: f64,
    /// Rounded overall allocated total exceeds rounded available total.
    pub overall_over_allocated: bool,
    /// Largest absolute allocated-minus-available gap on any employee-day.
    pub max_abs_deviation: f64,
}

impl DiagnosticsReport {
    /// Returns true if there are no findings and no over-allocation.
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty() && !self.overall_over_allocated
    }

    /// Findings of the given severity.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &DiagnosticFinding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }

    /// Returns true if any finding is a defect.
    pub fn has_defects(&self) -> bool {
        self.with_severity(Severity::Defect).next().is_some()
    }
}
