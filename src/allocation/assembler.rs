//! Input assembly.
//!
//! This module converts the typed input records into the dense matrices and
//! masks the solver consumes. Every record is validated first; hard input
//! errors abort the run, while gaps in the data (missing days, missing
//! salaries, unknown topics) are defaulted and reported as warnings.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::warn;

use crate::config::{AssemblySettings, NonRndCapPolicy};
use crate::error::{EngineError, EngineResult};
use crate::models::{AllocationInput, AssemblyWarning, WarningKind};

use super::costs::matching_fund_threshold;

/// Per-project parameters in solver units.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectParameters {
    /// Project name.
    pub name: String,
    /// Contractual target cost.
    pub target: f64,
    /// Overhead surcharge rate.
    pub overhead_rate: f64,
    /// Non-research cap as a fraction of research hours.
    pub max_non_rnd_fraction: f64,
    /// Matching fund threshold, if defined.
    pub matching_threshold: Option<f64>,
    /// Lower grant bound, if given.
    pub grant_min: Option<f64>,
    /// Upper grant bound, if given.
    pub grant_max: Option<f64>,
}

impl ProjectParameters {
    /// Multiplier from direct cost to total cost.
    pub fn cost_weight(&self) -> f64 {
        1.0 + self.overhead_rate
    }
}

/// Dense, validated inputs of one allocation run.
///
/// Matrices are indexed `[employee][date]`, masks `[project][topic]` and
/// `[project][date]`, in input order of employees, catalog and projects.
#[derive(Debug, Clone)]
pub struct AssembledInput {
    /// Every day of the range, in order.
    pub dates: Vec<NaiveDate>,
    /// Employee identifiers.
    pub employee_ids: Vec<String>,
    /// Catalog topic names.
    pub topics: Vec<String>,
    /// Project parameters.
    pub projects: Vec<ProjectParameters>,
    /// Hourly salary rate.
    pub salary: Vec<Vec<f64>>,
    /// Research hours available for allocation.
    pub research_hours: Vec<Vec<f64>>,
    /// Non-research hours pool.
    pub non_rnd_hours: Vec<Vec<f64>>,
    /// Catalog topics logged on an employee-day, when the logged-topic gate
    /// applies to it.
    pub logged_topics: Vec<Vec<Option<Vec<bool>>>>,
    /// Whether a project covers a topic.
    pub eligibility: Vec<Vec<bool>>,
    /// Whether a project may be billed on a date.
    pub funded: Vec<Vec<bool>>,
    /// The non-research cap policy in force.
    pub non_rnd_policy: NonRndCapPolicy,
    /// Whether non-research hours need an eligible topic on the same day.
    pub non_rnd_requires_topic: bool,
    /// Data-completeness warnings.
    pub warnings: Vec<AssemblyWarning>,
}

impl AssembledInput {
    /// Returns true if employee `e` may bill topic `t` to project `p` on
    /// date `d`.
    pub fn topic_allowed(&self, e: usize, d: usize, p: usize, t: usize) -> bool {
        if !self.funded[p][d] || !self.eligibility[p][t] {
            return false;
        }
        match &self.logged_topics[e][d] {
            Some(mask) => mask[t],
            None => true,
        }
    }

    /// Returns true if project `p` has at least one eligible topic for
    /// employee `e` on date `d`.
    pub fn has_eligible_topic(&self, e: usize, d: usize, p: usize) -> bool {
        (0..self.topics.len()).any(|t| self.topic_allowed(e, d, p, t))
    }

    /// Upper bound on non-research hours employee `e` may bill to project
    /// `p` on date `d`.
    pub fn non_rnd_cap(&self, e: usize, d: usize, p: usize) -> f64 {
        if !self.funded[p][d] {
            return 0.0;
        }
        if self.non_rnd_requires_topic && !self.has_eligible_topic(e, d, p) {
            return 0.0;
        }
        let fraction_cap = self.projects[p].max_non_rnd_fraction * self.research_hours[e][d];
        match self.non_rnd_policy {
            NonRndCapPolicy::ResearchFraction => fraction_cap,
            NonRndCapPolicy::TrackedPool => fraction_cap.min(self.non_rnd_hours[e][d]),
        }
    }

    /// Total research hours over every employee and date.
    pub fn total_research_hours(&self) -> f64 {
        self.research_hours.iter().flatten().sum()
    }
}

/// Validates the input and builds the dense representation.
///
/// # Errors
///
/// Returns an error if:
/// - the date range is inverted (`InvalidRange`)
/// - the topic catalog is empty or has duplicates (`InvalidTopicCatalog`)
/// - two employees share an id (`InvalidEmployee`) or two projects share a
///   name (`DuplicateProject`)
/// - any employee or project record fails validation
/// - a money amount cannot be represented as a float (`CalculationError`)
///
/// # Example
///
/// ```
/// use allocation_engine::allocation::assemble;
/// use allocation_engine::config::AssemblySettings;
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
/// let assembled = assemble(&input, &AssemblySettings::default()).unwrap();
/// assert_eq!(assembled.research_hours[0][0], 8.0);
/// assert_eq!(assembled.non_rnd_cap(0, 0, 0), 2.0);
/// ```
pub fn assemble(
    input: &AllocationInput,
    settings: &AssemblySettings,
) -> EngineResult<AssembledInput> {
    input.range.validate()?;
    input.topics.validate()?;

    let mut seen_employees = HashSet::new();
    for employee in &input.employees {
        employee.validate()?;
        if !seen_employees.insert(employee.id.as_str()) {
            return Err(EngineError::InvalidEmployee {
                employee_id: employee.id.clone(),
                field: "id".to_string(),
                message: "duplicate employee id".to_string(),
            });
        }
    }

    let mut seen_projects = HashSet::new();
    for project in &input.projects {
        project.validate()?;
        if !seen_projects.insert(project.name.as_str()) {
            return Err(EngineError::DuplicateProject {
                name: project.name.clone(),
            });
        }
    }

    let mut warnings = Vec::new();
    let dates: Vec<NaiveDate> = input.range.days().collect();
    let topics: Vec<String> = input.topics.iter().map(str::to_string).collect();

    let mut projects = Vec::with_capacity(input.projects.len());
    let mut eligibility = Vec::with_capacity(input.projects.len());
    let mut funded = Vec::with_capacity(input.projects.len());

    for project in &input.projects {
        let mut mask = vec![false; topics.len()];
        for topic in &project.allowed_topics {
            match input.topics.index_of(topic) {
                Some(t) => mask[t] = true,
                None => warnings.push(AssemblyWarning {
                    kind: WarningKind::UnknownTopic,
                    subject: project.name.clone(),
                    date: None,
                    message: format!("allowed topic '{}' is not in the catalog", topic),
                }),
            }
        }
        eligibility.push(mask);

        let window: Vec<bool> = dates.iter().map(|d| project.is_funded_on(*d)).collect();
        if !window.iter().any(|f| *f) {
            warnings.push(AssemblyWarning {
                kind: WarningKind::ProjectOutsideRange,
                subject: project.name.clone(),
                date: None,
                message: "funding window does not overlap the date range".to_string(),
            });
        }
        funded.push(window);

        projects.push(ProjectParameters {
            name: project.name.clone(),
            target: to_f64(project.target_cost, &project.name, "target_cost")?,
            overhead_rate: project.overhead_rate,
            max_non_rnd_fraction: project.max_non_rnd_fraction,
            matching_threshold: matching_fund_threshold(project.target_cost, project.matching_fund),
            grant_min: project
                .grant_min
                .map(|v| to_f64(v, &project.name, "grant_min"))
                .transpose()?,
            grant_max: project
                .grant_max
                .map(|v| to_f64(v, &project.name, "grant_max"))
                .transpose()?,
        });
    }

    let funded_any: Vec<bool> = (0..dates.len())
        .map(|d| funded.iter().any(|window| window[d]))
        .collect();

    let mut salary = Vec::with_capacity(input.employees.len());
    let mut research_hours = Vec::with_capacity(input.employees.len());
    let mut non_rnd_hours = Vec::with_capacity(input.employees.len());
    let mut logged_topics = Vec::with_capacity(input.employees.len());

    for employee in &input.employees {
        let mut salary_row = vec![0.0; dates.len()];
        let mut hours_row = vec![0.0; dates.len()];
        let mut non_rnd_row = vec![0.0; dates.len()];
        let mut logged_row = vec![None; dates.len()];

        for (d, date) in dates.iter().enumerate() {
            let Some(entry) = employee.entry(*date) else {
                warnings.push(AssemblyWarning {
                    kind: WarningKind::MissingDay,
                    subject: employee.id.clone(),
                    date: Some(*date),
                    message: "no entry logged; treated as zero hours".to_string(),
                });
                continue;
            };

            hours_row[d] = entry.research_hours;
            non_rnd_row[d] = entry
                .non_rnd_hours
                .unwrap_or(settings.default_non_rnd_fraction * entry.research_hours);

            if entry.research_hours > 0.0 && !funded_any[d] {
                warnings.push(AssemblyWarning {
                    kind: WarningKind::UnfundedDay,
                    subject: employee.id.clone(),
                    date: Some(*date),
                    message: format!(
                        "{} hours logged on a day no project is funded",
                        entry.research_hours
                    ),
                });
            }

            match employee.salary_rate(*date) {
                Some(rate) => salary_row[d] = to_f64(rate, &employee.id, "salary_rate")?,
                None if entry.research_hours > 0.0 => warnings.push(AssemblyWarning {
                    kind: WarningKind::MissingSalary,
                    subject: employee.id.clone(),
                    date: Some(*date),
                    message: "hours logged without a salary rate; treated as zero cost"
                        .to_string(),
                }),
                None => {}
            }

            if let Some(logged) = &entry.topics_logged {
                let mut mask = vec![false; topics.len()];
                for topic in logged {
                    match input.topics.index_of(topic) {
                        Some(t) => mask[t] = true,
                        None => warnings.push(AssemblyWarning {
                            kind: WarningKind::UnknownTopic,
                            subject: employee.id.clone(),
                            date: Some(*date),
                            message: format!("logged topic '{}' is not in the catalog", topic),
                        }),
                    }
                }
                if settings.gate_on_logged_topics && mask.iter().any(|m| *m) {
                    logged_row[d] = Some(mask);
                }
            }
        }

        salary.push(salary_row);
        research_hours.push(hours_row);
        non_rnd_hours.push(non_rnd_row);
        logged_topics.push(logged_row);
    }

    for warning in &warnings {
        warn!(
            kind = ?warning.kind,
            subject = %warning.subject,
            date = ?warning.date,
            "{}",
            warning.message
        );
    }

    Ok(AssembledInput {
        dates,
        employee_ids: input.employees.iter().map(|e| e.id.clone()).collect(),
        topics,
        projects,
        salary,
        research_hours,
        non_rnd_hours,
        logged_topics,
        eligibility,
        funded,
        non_rnd_policy: settings.non_rnd_policy,
        non_rnd_requires_topic: settings.non_rnd_requires_topic,
        warnings,
    })
}

fn to_f64(value: Decimal, subject: &str, field: &str) -> EngineResult<f64> {
    value.to_f64().ok_or_else(|| EngineError::CalculationError {
        message: format!("{} of '{}' cannot be represented as a float: {}", field, subject, value),
    })
}
