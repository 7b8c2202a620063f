//! Allocation input bundle.

use serde::{Deserialize, Serialize};

use super::{DateRange, EmployeeDailyRecord, ProjectSpec, TopicCatalog};

/// Everything one allocation run consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationInput {
    /// The shared topic catalog.
    #[serde(default)]
    pub topics: TopicCatalog,
    /// Employees with their daily records.
    pub employees: Vec<EmployeeDailyRecord>,
    /// Funded projects.
    pub projects: Vec<ProjectSpec>,
    /// The inclusive date range to allocate.
    pub range: DateRange,
}

impl AllocationInput {
    /// Bundles the inputs of a run.
    pub fn new(
        topics: TopicCatalog,
        employees: Vec<EmployeeDailyRecord>,
        projects: Vec<ProjectSpec>,
        range: DateRange,
    ) -> Self {
        Self {
            topics,
            employees,
            projects,
            range,
        }
    }
}
