//! Project specification model.
//!
//! This module defines [`ProjectSpec`], the funding and eligibility
//! constraints of a grant-funded project, and [`MatchingFund`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::iso_date_opt;
use crate::error::{EngineError, EngineResult};

/// Default cap on non-research billing per employee-day, as a fraction of
/// the research hours logged that day.
pub const DEFAULT_MAX_NON_RND_FRACTION: f64 = 0.25;

fn default_max_non_rnd_fraction() -> f64 {
    DEFAULT_MAX_NON_RND_FRACTION
}

/// How a project's matching fund is specified.
///
/// # Example
///
/// ```
/// use allocation_engine::models::MatchingFund;
///
/// let fund: MatchingFund = serde_json::from_str(r#"{"type": "percentage", "percent": 20.0}"#).unwrap();
/// assert_eq!(fund, MatchingFund::Percentage { percent: 20.0 });
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchingFund {
    /// No matching fund.
    #[default]
    None,
    /// The grant covers `100 - percent` percent of the project cost.
    Percentage {
        /// Matching share of the total cost, in percent.
        percent: f64,
    },
    /// A fixed amount on top of the grant.
    Absolute {
        /// The supplementary amount.
        amount: Decimal,
    },
}

/// A funded project and its billing constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSpec {
    /// Unique project name.
    pub name: String,
    /// Contractual grant amount the realised cost should approach.
    pub target_cost: Decimal,
    /// Topics this project may be billed for.
    #[serde(default)]
    pub allowed_topics: Vec<String>,
    /// Overhead surcharge applied to direct cost (0.2 = 20%).
    #[serde(default)]
    pub overhead_rate: f64,
    /// Matching fund parameters.
    #[serde(default)]
    pub matching_fund: MatchingFund,
    /// Cap on non-research hours per employee-day, as a fraction of that
    /// day's research hours.
    #[serde(default = "default_max_non_rnd_fraction")]
    pub max_non_rnd_fraction: f64,
    /// First day the project may be billed, if limited.
    #[serde(default, with = "iso_date_opt", skip_serializing_if = "Option::is_none")]
    pub funding_start: Option<NaiveDate>,
    /// Last day the project may be billed, if limited.
    #[serde(default, with = "iso_date_opt", skip_serializing_if = "Option::is_none")]
    pub funding_end: Option<NaiveDate>,
    /// Lower bound of the grant, reported against the realised cost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_min: Option<Decimal>,
    /// Upper bound of the grant, reported against the realised cost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_max: Option<Decimal>,
}

impl ProjectSpec {
    /// Creates a project with default overhead, matching fund and cap.
    ///
    /// # Example
    ///
    /// ```
    /// use allocation_engine::models::ProjectSpec;
    /// use rust_decimal::Decimal;
    ///
    /// let project = ProjectSpec::new("Horizon", Decimal::new(50_000, 0))
    ///     .with_topics(["Reasoning / Planning", "Multi-Agent Systems"])
    ///     .with_overhead_rate(0.2);
    /// assert_eq!(project.max_non_rnd_fraction, 0.25);
    /// assert!(project.covers_topic("Multi-Agent Systems"));
    /// ```
    pub fn new(name: impl Into<String>, target_cost: Decimal) -> Self {
        Self {
            name: name.into(),
            target_cost,
            allowed_topics: Vec::new(),
            overhead_rate: 0.0,
            matching_fund: MatchingFund::None,
            max_non_rnd_fraction: DEFAULT_MAX_NON_RND_FRACTION,
            funding_start: None,
            funding_end: None,
            grant_min: None,
            grant_max: None,
        }
    }

    /// Adds topics to the allowed list, skipping ones already present.
    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for topic in topics {
            let topic = topic.into();
            if !self.allowed_topics.contains(&topic) {
                self.allowed_topics.push(topic);
            }
        }
        self
    }

    /// Sets the overhead rate.
    pub fn with_overhead_rate(mut self, rate: f64) -> Self {
        self.overhead_rate = rate;
        self
    }

    /// Sets the matching fund.
    pub fn with_matching_fund(mut self, fund: MatchingFund) -> Self {
        self.matching_fund = fund;
        self
    }

    /// Sets the non-research cap fraction.
    pub fn with_max_non_rnd_fraction(mut self, fraction: f64) -> Self {
        self.max_non_rnd_fraction = fraction;
        self
    }

    /// Restricts billing to days inside `[start, end]`.
    pub fn with_funding_window(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.funding_start = Some(start);
        self.funding_end = Some(end);
        self
    }

    /// Sets the grant bounds.
    pub fn with_grant_bounds(mut self, min: Decimal, max: Decimal) -> Self {
        self.grant_min = Some(min);
        self.grant_max = Some(max);
        self
    }

    /// Returns true if the project lists `topic`.
    pub fn covers_topic(&self, topic: &str) -> bool {
        self.allowed_topics.iter().any(|t| t == topic)
    }

    /// Returns true if the project may be billed on `date`.
    pub fn is_funded_on(&self, date: NaiveDate) -> bool {
        self.funding_start.is_none_or(|start| date >= start)
            && self.funding_end.is_none_or(|end| date <= end)
    }

    /// Checks every field for usable values.
    pub fn validate(&self) -> EngineResult<()> {
        if self.name.trim().is_empty() {
            return Err(self.invalid("name", "must not be empty"));
        }
        if self.target_cost < Decimal::ZERO {
            return Err(self.invalid("target_cost", "must not be negative"));
        }
        if !self.overhead_rate.is_finite() || self.overhead_rate < 0.0 {
            return Err(self.invalid("overhead_rate", "must be a non-negative number"));
        }
        if !(0.0..=1.0).contains(&self.max_non_rnd_fraction) {
            return Err(self.invalid("max_non_rnd_fraction", "must lie in [0, 1]"));
        }
        match self.matching_fund {
            MatchingFund::Percentage { percent } if !percent.is_finite() || percent < 0.0 => {
                return Err(self.invalid("matching_fund", "percentage must be a non-negative number"));
            }
            MatchingFund::Absolute { amount } if amount < Decimal::ZERO => {
                return Err(self.invalid("matching_fund", "amount must not be negative"));
            }
            _ => {}
        }
        if let (Some(start), Some(end)) = (self.funding_start, self.funding_end) {
            if start > end {
                return Err(self.invalid("funding_start", "must not be after funding_end"));
            }
        }
        if let (Some(min), Some(max)) = (self.grant_min, self.grant_max) {
            if min > max {
                return Err(self.invalid("grant_min", "must not exceed grant_max"));
            }
        }
        Ok(())
    }

    fn invalid(&self, field: &str, message: &str) -> EngineError {
        EngineError::InvalidProject {
            project: self.name.clone(),
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}
