//! Project cost figures.
//!
//! Matching fund thresholds and the per-project cost breakdown reported with
//! every result.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::models::{MatchingFund, ProjectCost};

use super::assembler::ProjectParameters;

/// Computes the matching fund threshold of a project.
///
/// For a percentage fund the grant covers `100 - percent` percent of the
/// total, so the threshold is `target / (1 - percent / 100)`; it is undefined
/// when the fraction reaches one. For an absolute fund the threshold is
/// `target + amount`.
///
/// # Example
///
/// ```
/// use allocation_engine::allocation::matching_fund_threshold;
/// use allocation_engine::models::MatchingFund;
/// use rust_decimal::Decimal;
///
/// let target = Decimal::new(8000, 0);
/// let threshold = matching_fund_threshold(target, MatchingFund::Percentage { percent: 20.0 });
/// assert!((threshold.unwrap() - 10000.0).abs() < 1e-9);
///
/// let threshold = matching_fund_threshold(target, MatchingFund::Absolute { amount: Decimal::new(500, 0) });
/// assert_eq!(threshold, Some(8500.0));
///
/// assert_eq!(matching_fund_threshold(target, MatchingFund::Percentage { percent: 100.0 }), None);
/// ```
pub fn matching_fund_threshold(target: Decimal, fund: MatchingFund) -> Option<f64> {
    match fund {
        MatchingFund::None => None,
        MatchingFund::Percentage { percent } => {
            let fraction = percent / 100.0;
            if fraction < 1.0 {
                Some(target.to_f64()? / (1.0 - fraction))
            } else {
                None
            }
        }
        MatchingFund::Absolute { amount } => (target + amount).to_f64(),
    }
}

/// Builds the cost row of a project from its billed hours and direct cost.
pub fn project_cost(
    params: &ProjectParameters,
    rnd_hours: f64,
    non_rnd_hours: f64,
    direct_cost: f64,
) -> ProjectCost {
    let overhead_cost = direct_cost * params.overhead_rate;
    let total_cost = direct_cost + overhead_cost;

    let relative_deviation = if params.target > 0.0 {
        Some(total_cost / params.target - 1.0)
    } else {
        None
    };

    let within_grant_bounds = if params.grant_min.is_some() || params.grant_max.is_some() {
        Some(
            params.grant_min.is_none_or(|min| total_cost >= min)
                && params.grant_max.is_none_or(|max| total_cost <= max),
        )
    } else {
        None
    };

    ProjectCost {
        project: params.name.clone(),
        rnd_hours,
        non_rnd_hours,
        direct_cost,
        overhead_cost,
        total_cost,
        target_cost: params.target,
        matching_fund_threshold: params.matching_threshold,
        relative_deviation,
        within_grant_bounds,
    }
}

/// The cost row reported when the solve did not succeed: realised figures
/// are NaN, target-derived figures are kept.
pub fn failed_project_cost(params: &ProjectParameters) -> ProjectCost {
    ProjectCost {
        project: params.name.clone(),
        rnd_hours: f64::NAN,
        non_rnd_hours: f64::NAN,
        direct_cost: f64::NAN,
        overhead_cost: f64::NAN,
        total_cost: f64::NAN,
        target_cost: params.target,
        matching_fund_threshold: params.matching_threshold,
        relative_deviation: None,
        within_grant_bounds: None,
    }
}
