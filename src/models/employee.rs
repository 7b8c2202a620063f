//! Employee daily record model and related types.
//!
//! This module defines the per-day hour and salary data an allocation run
//! consumes for each employee, and the salary levels that set the hourly rate
//! over a range of days. Levels are kept apart from the logged days so that a
//! level never makes an unlogged day look logged.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{DateRange, iso_date, iso_date_keys};
use crate::error::{EngineError, EngineResult};

/// Hours, salary and topics logged by one employee on one day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    /// Hours available to allocate to projects that day.
    #[serde(default)]
    pub research_hours: f64,
    /// Separately tracked non-research hours, if the timesheet records them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_rnd_hours: Option<f64>,
    /// Cost per hour that day. `None` means the rate is missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_rate: Option<Decimal>,
    /// Topics actually worked that day, if tracked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics_logged: Option<BTreeSet<String>>,
}

/// A salary level applied to every day of an inclusive date range.
///
/// # Example
///
/// ```
/// use allocation_engine::models::{EmployeeDailyRecord, SalaryLevel};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let mut employee = EmployeeDailyRecord::new("alice");
/// let level = SalaryLevel {
///     label: "Senior".to_string(),
///     amount: Decimal::new(12000, 2),
///     start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
///     end_date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
/// };
/// employee.apply_salary_level(&level).unwrap();
///
/// let day = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
/// assert_eq!(employee.salary_rate(day), Some(Decimal::new(12000, 2)));
/// assert!(employee.days.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryLevel {
    /// Label of the level (e.g. "Senior").
    pub label: String,
    /// Hourly amount for the level.
    pub amount: Decimal,
    /// First day the level applies (inclusive).
    #[serde(with = "iso_date")]
    pub start_date: NaiveDate,
    /// Last day the level applies (inclusive).
    #[serde(with = "iso_date")]
    pub end_date: NaiveDate,
}

impl SalaryLevel {
    /// Returns true if the level applies on `date`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// Daily hour and salary data for one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeDailyRecord {
    /// Unique identifier for the employee.
    pub id: String,
    /// Logged data keyed by day.
    #[serde(default, with = "iso_date_keys")]
    pub days: BTreeMap<NaiveDate, DailyEntry>,
    /// Salary levels, in the order they were applied.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub salary_levels: Vec<SalaryLevel>,
}

impl EmployeeDailyRecord {
    /// Creates an employee with no logged days.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            days: BTreeMap::new(),
            salary_levels: Vec::new(),
        }
    }

    /// Returns the entry for `date`, if one was logged.
    pub fn entry(&self, date: NaiveDate) -> Option<&DailyEntry> {
        self.days.get(&date)
    }

    fn entry_mut(&mut self, date: NaiveDate) -> &mut DailyEntry {
        self.days.entry(date).or_default()
    }

    /// Adds research hours to a day, accumulating with earlier entries.
    pub fn add_research_hours(&mut self, date: NaiveDate, hours: f64) -> &mut Self {
        self.entry_mut(date).research_hours += hours;
        self
    }

    /// Adds separately tracked non-research hours to a day.
    pub fn add_non_rnd_hours(&mut self, date: NaiveDate, hours: f64) -> &mut Self {
        let entry = self.entry_mut(date);
        entry.non_rnd_hours = Some(entry.non_rnd_hours.unwrap_or(0.0) + hours);
        self
    }

    /// Records that a topic was worked on a day.
    pub fn log_topic(&mut self, date: NaiveDate, topic: impl Into<String>) -> &mut Self {
        self.entry_mut(date)
            .topics_logged
            .get_or_insert_with(BTreeSet::new)
            .insert(topic.into());
        self
    }

    /// Sets the hourly rate for a single day.
    pub fn set_salary_rate(&mut self, date: NaiveDate, rate: Decimal) -> &mut Self {
        self.entry_mut(date).salary_rate = Some(rate);
        self
    }

    /// Adds a salary level.
    ///
    /// Levels take precedence over per-day rates, and later levels over
    /// earlier ones on overlapping days. Fails with
    /// [`EngineError::InvalidRange`] when the level's start is after its end.
    pub fn apply_salary_level(&mut self, level: &SalaryLevel) -> EngineResult<()> {
        self.validate_level(level)?;
        self.salary_levels.push(level.clone());
        Ok(())
    }

    /// Hourly rate on `date`: the latest level covering the day, else the
    /// day's own rate.
    pub fn salary_rate(&self, date: NaiveDate) -> Option<Decimal> {
        self.salary_levels
            .iter()
            .rev()
            .find(|level| level.covers(date))
            .map(|level| level.amount)
            .or_else(|| self.entry(date).and_then(|entry| entry.salary_rate))
    }

    /// Total research hours logged within `range`.
    pub fn total_research_hours(&self, range: &DateRange) -> f64 {
        self.days
            .range(range.start_date..=range.end_date)
            .map(|(_, entry)| entry.research_hours)
            .sum()
    }

    /// Checks that every logged value is usable.
    ///
    /// Hours must be finite and non-negative; salary rates must be
    /// non-negative.
    pub fn validate(&self) -> EngineResult<()> {
        if self.id.trim().is_empty() {
            return Err(self.invalid("id", "must not be empty".to_string()));
        }
        for level in &self.salary_levels {
            self.validate_level(level)?;
        }
        for (date, entry) in &self.days {
            if !entry.research_hours.is_finite() || entry.research_hours < 0.0 {
                return Err(self.invalid(
                    "research_hours",
                    format!("{} on {} must be a non-negative number", entry.research_hours, date),
                ));
            }
            if let Some(non_rnd) = entry.non_rnd_hours {
                if !non_rnd.is_finite() || non_rnd < 0.0 {
                    return Err(self.invalid(
                        "non_rnd_hours",
                        format!("{} on {} must be a non-negative number", non_rnd, date),
                    ));
                }
            }
            if let Some(rate) = entry.salary_rate {
                if rate < Decimal::ZERO {
                    return Err(self.invalid(
                        "salary_rate",
                        format!("{} on {} must not be negative", rate, date),
                    ));
                }
            }
        }
        Ok(())
    }

    fn validate_level(&self, level: &SalaryLevel) -> EngineResult<()> {
        DateRange::new(level.start_date, level.end_date)?;
        if level.amount < Decimal::ZERO {
            return Err(self.invalid(
                "salary_rate",
                format!("salary level '{}' has a negative amount", level.label),
            ));
        }
        Ok(())
    }

    fn invalid(&self, field: &str, message: String) -> EngineError {
        EngineError::InvalidEmployee {
            employee_id: self.id.clone(),
            field: field.to_string(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_deserialize_employee_with_days() {
        let json = r#"{
            "id": "alice",
            "days": {
                "2025-01-02": {
                    "research_hours": 7.5,
                    "salary_rate": "120.00",
                    "topics_logged": ["Reasoning / Planning"]
                },
                "2025-01-03": {
                    "research_hours": 4.0,
                    "non_rnd_hours": 1.5
                }
            }
        }"#;

        let employee: EmployeeDailyRecord = serde_json::from_str(json).unwrap();
        assert_eq!(employee.id, "alice");
        assert_eq!(employee.days.len(), 2);

        let first = employee.entry(date(2)).unwrap();
        assert_eq!(first.research_hours, 7.5);
        assert_eq!(first.salary_rate, Some(dec("120.00")));
        assert!(first.topics_logged.as_ref().unwrap().contains("Reasoning / Planning"));

        let second = employee.entry(date(3)).unwrap();
        assert_eq!(second.non_rnd_hours, Some(1.5));
        assert_eq!(second.salary_rate, None);
    }

    #[test]
    fn test_deserialize_rejects_non_numeric_salary() {
        let json = r#"{
            "id": "alice",
            "days": { "2025-01-02": { "research_hours": 8.0, "salary_rate": "lots" } }
        }"#;
        assert!(serde_json::from_str::<EmployeeDailyRecord>(json).is_err());
    }

    #[test]
    fn test_deserialize_rejects_non_iso_date_key() {
        let json = r#"{
            "id": "alice",
            "days": { "01/02/2025": { "research_hours": 8.0 } }
        }"#;
        assert!(serde_json::from_str::<EmployeeDailyRecord>(json).is_err());
    }

    #[test]
    fn test_add_research_hours_accumulates() {
        let mut employee = EmployeeDailyRecord::new("bob");
        employee
            .add_research_hours(date(6), 3.0)
            .add_research_hours(date(6), 2.5);
        assert_eq!(employee.entry(date(6)).unwrap().research_hours, 5.5);
    }

    #[test]
    fn test_add_non_rnd_hours_starts_from_zero() {
        let mut employee = EmployeeDailyRecord::new("bob");
        employee.add_non_rnd_hours(date(6), 1.0).add_non_rnd_hours(date(6), 0.5);
        assert_eq!(employee.entry(date(6)).unwrap().non_rnd_hours, Some(1.5));
    }

    #[test]
    fn test_log_topic_deduplicates() {
        let mut employee = EmployeeDailyRecord::new("bob");
        employee
            .log_topic(date(6), "Visualization / UX")
            .log_topic(date(6), "Visualization / UX");
        assert_eq!(employee.entry(date(6)).unwrap().topics_logged.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_deserialize_rejects_unpadded_date_key() {
        let json = r#"{
            "id": "alice",
            "days": { "2025-1-2": { "research_hours": 8.0 } }
        }"#;
        let error = serde_json::from_str::<EmployeeDailyRecord>(json).unwrap_err();
        assert!(error.to_string().contains("Invalid date '2025-1-2'"));
    }

    #[test]
    fn test_apply_salary_level_covers_every_day() {
        let mut employee = EmployeeDailyRecord::new("carol");
        let level = SalaryLevel {
            label: "Level 1".to_string(),
            amount: dec("95.50"),
            start_date: date(1),
            end_date: date(5),
        };
        employee.apply_salary_level(&level).unwrap();

        assert!((1..=5).all(|d| employee.salary_rate(date(d)) == Some(dec("95.50"))));
        assert_eq!(employee.salary_rate(date(6)), None);
    }

    #[test]
    fn test_salary_level_does_not_create_days() {
        let mut employee = EmployeeDailyRecord::new("carol");
        employee.add_research_hours(date(2), 8.0);
        employee
            .apply_salary_level(&SalaryLevel {
                label: "Level 1".to_string(),
                amount: dec("90"),
                start_date: date(1),
                end_date: date(31),
            })
            .unwrap();

        assert_eq!(employee.days.len(), 1);
        assert!(employee.entry(date(3)).is_none());
    }

    #[test]
    fn test_salary_level_overrides_day_rate() {
        let mut employee = EmployeeDailyRecord::new("carol");
        employee.set_salary_rate(date(2), dec("80")).set_salary_rate(date(9), dec("80"));
        employee
            .apply_salary_level(&SalaryLevel {
                label: "Level 1".to_string(),
                amount: dec("90"),
                start_date: date(1),
                end_date: date(5),
            })
            .unwrap();

        assert_eq!(employee.salary_rate(date(2)), Some(dec("90")));
        assert_eq!(employee.salary_rate(date(9)), Some(dec("80")));
    }

    #[test]
    fn test_salary_levels_deserialize_with_record() {
        let json = r#"{
            "id": "alice",
            "days": { "2025-01-02": { "research_hours": 8.0 } },
            "salary_levels": [
                { "label": "Senior", "amount": "120", "start_date": "2025-01-01", "end_date": "2025-01-31" }
            ]
        }"#;
        let employee: EmployeeDailyRecord = serde_json::from_str(json).unwrap();
        assert_eq!(employee.salary_rate(date(2)), Some(dec("120")));
        assert!(employee.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_deserialized_inverted_level() {
        let json = r#"{
            "id": "alice",
            "salary_levels": [
                { "label": "Senior", "amount": "120", "start_date": "2025-01-31", "end_date": "2025-01-01" }
            ]
        }"#;
        let employee: EmployeeDailyRecord = serde_json::from_str(json).unwrap();
        assert!(matches!(employee.validate(), Err(EngineError::InvalidRange { .. })));
    }

    #[test]
    fn test_later_salary_level_overwrites_overlap() {
        let mut employee = EmployeeDailyRecord::new("carol");
        employee
            .apply_salary_level(&SalaryLevel {
                label: "Level 1".to_string(),
                amount: dec("90"),
                start_date: date(1),
                end_date: date(10),
            })
            .unwrap();
        employee
            .apply_salary_level(&SalaryLevel {
                label: "Level 2".to_string(),
                amount: dec("110"),
                start_date: date(6),
                end_date: date(10),
            })
            .unwrap();

        assert_eq!(employee.salary_rate(date(5)), Some(dec("90")));
        assert_eq!(employee.salary_rate(date(6)), Some(dec("110")));
    }

    #[test]
    fn test_apply_salary_level_rejects_inverted_range() {
        let mut employee = EmployeeDailyRecord::new("carol");
        let result = employee.apply_salary_level(&SalaryLevel {
            label: "Level 1".to_string(),
            amount: dec("90"),
            start_date: date(10),
            end_date: date(1),
        });
        assert!(matches!(result, Err(EngineError::InvalidRange { .. })));
        assert!(employee.salary_levels.is_empty());
    }

    #[test]
    fn test_total_research_hours_respects_range() {
        let mut employee = EmployeeDailyRecord::new("dave");
        employee
            .add_research_hours(date(1), 8.0)
            .add_research_hours(date(2), 6.0)
            .add_research_hours(date(9), 4.0);
        let range = DateRange::new(date(1), date(5)).unwrap();
        assert_eq!(employee.total_research_hours(&range), 14.0);
    }

    #[test]
    fn test_validate_rejects_negative_hours() {
        let mut employee = EmployeeDailyRecord::new("erin");
        employee.add_research_hours(date(2), -1.0);
        match employee.validate() {
            Err(EngineError::InvalidEmployee { field, .. }) => assert_eq!(field, "research_hours"),
            _ => panic!("Expected InvalidEmployee error"),
        }
    }

    #[test]
    fn test_validate_rejects_nan_hours() {
        let mut employee = EmployeeDailyRecord::new("erin");
        employee.add_research_hours(date(2), f64::NAN);
        assert!(employee.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_salary() {
        let mut employee = EmployeeDailyRecord::new("erin");
        employee.set_salary_rate(date(2), dec("-5"));
        match employee.validate() {
            Err(EngineError::InvalidEmployee { field, .. }) => assert_eq!(field, "salary_rate"),
            _ => panic!("Expected InvalidEmployee error"),
        }
    }

    #[test]
    fn test_validate_rejects_empty_id() {
        let employee = EmployeeDailyRecord::new("  ");
        assert!(employee.validate().is_err());
    }
}
