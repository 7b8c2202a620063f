//! Core data models for the allocation engine.
//!
//! This module contains the typed input records, the inclusive date range,
//! and the allocation result with its diagnostics.

mod allocation_result;
mod date_range;
mod diagnostics;
mod employee;
mod input;
mod project;
mod topic;

pub use allocation_result::{
    AllocationResult, AssemblyWarning, EmployeeAllocations, ProjectAllocation, ProjectCost,
    SolverStatus, WarningKind,
};
pub use date_range::{DATE_FORMAT, DateRange, iso_date, iso_date_keys, iso_date_opt, parse_date};
pub use diagnostics::{DiagnosticFinding, DiagnosticsReport, EmployeeTotals, FindingKind, Severity};
pub use employee::{DailyEntry, EmployeeDailyRecord, SalaryLevel};
pub use input::AllocationInput;
pub use project::{DEFAULT_MAX_NON_RND_FRACTION, MatchingFund, ProjectSpec};
pub use topic::TopicCatalog;
