//! Allocation logic for the engine.
//!
//! This module contains the input assembler, the allocation quadratic
//! program and its solver, the result extractor with per-project costs, and
//! the post-solve diagnostics, wired together by [`run_allocation`].

mod assembler;
mod costs;
mod diagnostics;
mod engine;
mod extractor;
mod problem;
mod projection;
mod solver;

pub use assembler::{AssembledInput, ProjectParameters, assemble};
pub use costs::{failed_project_cost, matching_fund_threshold, project_cost};
pub use diagnostics::{diagnose, unallocatable_days};
pub use engine::{allocate, run_allocation};
pub use extractor::extract;
pub use problem::{AllocationProblem, DayBlock, SlotKind};
pub use projection::{capacity, project_capped_simplex};
pub use solver::{SolveOutcome, solve};
