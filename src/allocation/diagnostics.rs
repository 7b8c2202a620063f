//! Post-solve diagnostics.
//!
//! Checks every employee-day of the range for hour conservation and every
//! billed project for its non-research cap, then aggregates totals per
//! employee and overall. Findings are data for the caller; the run itself
//! is never failed by them.

use std::collections::BTreeMap;

use tracing::warn;

use crate::config::ReportSettings;
use crate::models::{
    DiagnosticFinding, DiagnosticsReport, EmployeeAllocations, EmployeeTotals, FindingKind,
    ProjectAllocation, Severity,
};

use super::assembler::AssembledInput;
use super::problem::AllocationProblem;

/// Compares extracted allocations with the available hours.
///
/// An employee-day is flagged when its allocated and available hours differ
/// after rounding to whole hours. The finding is a defect when the gap
/// exceeds `defect_tolerance_hours` and advisory otherwise. Non-research
/// hours above a project's cap by more than `cap_tolerance_hours` are always
/// defects.
pub fn diagnose(
    input: &AssembledInput,
    allocations: &BTreeMap<String, EmployeeAllocations>,
    settings: &ReportSettings,
) -> DiagnosticsReport {
    let mut report = DiagnosticsReport::default();

    for (e, employee) in input.employee_ids.iter().enumerate() {
        let days = allocations.get(employee);
        let mut totals = EmployeeTotals {
            employee: employee.clone(),
            available: 0.0,
            allocated: 0.0,
            over_allocated: false,
        };

        for (d, date) in input.dates.iter().enumerate() {
            let projects = days.and_then(|days| days.get(date));
            let available = input.research_hours[e][d];
            let allocated: f64 = projects
                .map(|p| p.values().map(ProjectAllocation::total_hours).sum())
                .unwrap_or(0.0);

            totals.available += available;
            totals.allocated += allocated;

            let gap = allocated - available;
            report.max_abs_deviation = report.max_abs_deviation.max(gap.abs());

            if allocated.round() != available.round() {
                let severity = if gap.abs() > settings.defect_tolerance_hours {
                    Severity::Defect
                } else {
                    Severity::Advisory
                };
                report.findings.push(DiagnosticFinding {
                    employee: employee.clone(),
                    date: *date,
                    allocated,
                    available,
                    kind: if gap > 0.0 {
                        FindingKind::OverAllocated
                    } else {
                        FindingKind::UnderAllocated
                    },
                    severity,
                    project: None,
                });
            }

            let Some(projects) = projects else {
                continue;
            };
            for (p, params) in input.projects.iter().enumerate() {
                let Some(allocation) = projects.get(&params.name) else {
                    continue;
                };
                let cap = input.non_rnd_cap(e, d, p);
                if allocation.non_rnd_hours > cap + settings.cap_tolerance_hours {
                    report.findings.push(DiagnosticFinding {
                        employee: employee.clone(),
                        date: *date,
                        allocated: allocation.non_rnd_hours,
                        available: cap,
                        kind: FindingKind::NonRndCapExceeded,
                        severity: Severity::Defect,
                        project: Some(params.name.clone()),
                    });
                }
            }
        }

        totals.over_allocated = totals.allocated.round() > totals.available.round();
        report.total_available += totals.available;
        report.total_allocated += totals.allocated;
        report.employee_totals.push(totals);
    }

    report.overall_over_allocated = report.total_allocated.round() > report.total_available.round();

    for finding in report.with_severity(Severity::Defect) {
        warn!(
            employee = %finding.employee,
            date = %finding.date,
            kind = ?finding.kind,
            project = ?finding.project,
            allocated = finding.allocated,
            available = finding.available,
            "Allocation defect"
        );
    }

    report
}

/// Names every employee-day whose hours no combination of eligible slots
/// can absorb.
///
/// Each finding carries the day's hours as `available` and the slots'
/// combined capacity as `allocated`.
pub fn unallocatable_days(
    input: &AssembledInput,
    problem: &AllocationProblem,
) -> Vec<DiagnosticFinding> {
    problem
        .infeasible_blocks()
        .into_iter()
        .map(|block| {
            let finding = DiagnosticFinding {
                employee: input.employee_ids[block.employee].clone(),
                date: input.dates[block.date],
                allocated: problem.block_capacity(block),
                available: block.hours,
                kind: FindingKind::Unallocatable,
                severity: Severity::Defect,
                project: None,
            };
            warn!(
                employee = %finding.employee,
                date = %finding.date,
                available = finding.available,
                capacity = finding.allocated,
                "Hours cannot be allocated to any project"
            );
            finding
        })
        .collect()
}
