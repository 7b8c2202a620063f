//! Request types for the allocation API.
//!
//! This module defines the JSON request structures for the `/allocate` endpoint.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::models::{
    AllocationInput, DATE_FORMAT, DailyEntry, DateRange, EmployeeDailyRecord, ProjectSpec,
    SalaryLevel, TopicCatalog, parse_date,
};

/// Request body for the `/allocate` endpoint.
///
/// Dates are `YYYY-MM-DD` strings and are validated when the request is
/// converted into an [`AllocationInput`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRequest {
    /// Topic catalog; the built-in research catalog when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<TopicCatalog>,
    /// Projects to allocate to.
    pub projects: Vec<ProjectSpec>,
    /// Employees with their logged days.
    pub employees: Vec<EmployeeRequest>,
    /// First day of the range (inclusive).
    pub start_date: String,
    /// Last day of the range (inclusive).
    pub end_date: String,
}

/// Employee information in an allocation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeRequest {
    /// Unique identifier for the employee.
    pub id: String,
    /// Logged data keyed by `YYYY-MM-DD` day.
    #[serde(default)]
    pub days: BTreeMap<String, DailyEntry>,
    /// Salary levels setting the hourly rate over date ranges. They take
    /// precedence over per-day rates, later levels over earlier ones.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub salary_levels: Vec<SalaryLevel>,
}

impl EmployeeRequest {
    /// Builds the employee record, parsing day keys and applying salary
    /// levels.
    ///
    /// A day key outside `YYYY-MM-DD` fails with `InvalidDate`.
    pub fn into_record(self) -> EngineResult<EmployeeDailyRecord> {
        let mut record = EmployeeDailyRecord::new(self.id);
        for (key, entry) in self.days {
            record.days.insert(parse_date(&key)?, entry);
        }
        for level in &self.salary_levels {
            record.apply_salary_level(level)?;
        }
        Ok(record)
    }
}

impl From<EmployeeDailyRecord> for EmployeeRequest {
    fn from(record: EmployeeDailyRecord) -> Self {
        Self {
            id: record.id,
            days: record
                .days
                .into_iter()
                .map(|(date, entry)| (date.format(DATE_FORMAT).to_string(), entry))
                .collect(),
            salary_levels: record.salary_levels,
        }
    }
}

impl AllocationRequest {
    /// Converts the request into a validated-range allocation input.
    pub fn into_input(self) -> EngineResult<AllocationInput> {
        let range = DateRange::parse(&self.start_date, &self.end_date)?;
        let employees = self
            .employees
            .into_iter()
            .map(EmployeeRequest::into_record)
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(AllocationInput::new(
            self.topics.unwrap_or_default(),
            employees,
            self.projects,
            range,
        ))
    }
}
