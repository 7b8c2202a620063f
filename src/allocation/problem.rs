//! The allocation quadratic program.
//!
//! Variables are laid out as one flat vector grouped into employee-day
//! blocks. Only eligible variables are materialised: research slots for
//! topics a project may be billed for, and non-research slots with a
//! positive cap. Ineligible variables are fixed at zero by omission.
//!
//! The objective couples variables only through per-project costs
//! `c_p = w_p Σ_{i∈p} s_i z_i` (with `w_p = 1 + overhead_rate`), so its
//! Hessian is block diagonal per project with rank-one blocks. That gives an
//! exact Lipschitz constant for the gradient.

use crate::config::{ObjectiveKind, SolverSettings};

use super::assembler::AssembledInput;
use super::projection::capacity;

/// Relative slack when checking that a block's slots can hold its hours.
const FEASIBILITY_SLACK: f64 = 1e-9;

/// What a slot of the variable vector stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// Research hours on a catalog topic.
    Research {
        /// Project index.
        project: usize,
        /// Topic index.
        topic: usize,
    },
    /// Non-research hours.
    NonResearch {
        /// Project index.
        project: usize,
    },
}

impl SlotKind {
    /// The project the slot bills.
    pub fn project(self) -> usize {
        match self {
            SlotKind::Research { project, .. } | SlotKind::NonResearch { project } => project,
        }
    }
}

/// The variables of one employee-day and its full-allocation constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBlock {
    /// Employee index.
    pub employee: usize,
    /// Date index.
    pub date: usize,
    /// Hours that must be allocated.
    pub hours: f64,
    /// Hourly salary rate.
    pub salary: f64,
    /// First slot of the block.
    pub start: usize,
    /// One past the last slot of the block.
    pub end: usize,
}

impl DayBlock {
    /// Slot range of the block.
    pub fn slots(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// The assembled QP.
#[derive(Debug, Clone)]
pub struct AllocationProblem {
    /// Employee-day blocks with positive hours.
    pub blocks: Vec<DayBlock>,
    /// Meaning of each slot.
    pub kinds: Vec<SlotKind>,
    /// Upper bound of each slot.
    pub upper: Vec<f64>,
    /// Salary rate of each slot.
    pub salary: Vec<f64>,
    /// Project targets.
    pub targets: Vec<f64>,
    /// Project cost weights `1 + overhead_rate`.
    pub weights: Vec<f64>,
    /// Objective in use.
    pub objective: ObjectiveKind,
    /// Regularisation weight `λ`.
    pub regularization: f64,
    /// Cost scale of the symmetric objective.
    pub scale: f64,
}

impl AllocationProblem {
    /// Lays out the variables for an assembled input.
    pub fn build(input: &AssembledInput, settings: &SolverSettings) -> Self {
        let mut blocks = Vec::new();
        let mut kinds = Vec::new();
        let mut upper = Vec::new();
        let mut salary = Vec::new();

        for e in 0..input.employee_ids.len() {
            for d in 0..input.dates.len() {
                let hours = input.research_hours[e][d];
                if hours <= 0.0 {
                    continue;
                }
                let rate = input.salary[e][d];
                let start = kinds.len();

                for p in 0..input.projects.len() {
                    for t in 0..input.topics.len() {
                        if input.topic_allowed(e, d, p, t) {
                            kinds.push(SlotKind::Research { project: p, topic: t });
                            upper.push(f64::INFINITY);
                            salary.push(rate);
                        }
                    }
                    let cap = input.non_rnd_cap(e, d, p);
                    if cap > 0.0 {
                        kinds.push(SlotKind::NonResearch { project: p });
                        upper.push(cap);
                        salary.push(rate);
                    }
                }

                blocks.push(DayBlock {
                    employee: e,
                    date: d,
                    hours,
                    salary: rate,
                    start,
                    end: kinds.len(),
                });
            }
        }

        let targets: Vec<f64> = input.projects.iter().map(|p| p.target).collect();
        let weights: Vec<f64> = input.projects.iter().map(|p| p.cost_weight()).collect();

        let max_weight = weights.iter().copied().fold(1.0, f64::max);
        let max_target = targets.iter().copied().fold(0.0, f64::max);
        let max_spend: f64 = blocks.iter().map(|b| b.hours * b.salary * max_weight).sum();
        let scale = max_target.max(max_spend).max(1.0);

        Self {
            blocks,
            kinds,
            upper,
            salary,
            targets,
            weights,
            objective: settings.objective,
            regularization: settings.regularization,
            scale,
        }
    }

    /// Number of materialised variables.
    pub fn num_variables(&self) -> usize {
        self.kinds.len()
    }

    /// Hours the slots of `block` can absorb in total.
    pub fn block_capacity(&self, block: &DayBlock) -> f64 {
        capacity(&self.upper[block.slots()])
    }

    /// Blocks whose capacity cannot absorb their hours.
    ///
    /// The comparison allows a slack relative to the block's hours.
    pub fn infeasible_blocks(&self) -> Vec<&DayBlock> {
        self.blocks
            .iter()
            .filter(|b| self.block_capacity(b) + FEASIBILITY_SLACK * b.hours.max(1.0) < b.hours)
            .collect()
    }

    /// Direct (pre-overhead) cost per project.
    pub fn direct_costs(&self, z: &[f64]) -> Vec<f64> {
        let mut costs = vec![0.0; self.targets.len()];
        for (i, kind) in self.kinds.iter().enumerate() {
            costs[kind.project()] += self.salary[i] * z[i];
        }
        costs
    }

    /// Total (post-overhead) cost per project.
    pub fn total_costs(&self, z: &[f64]) -> Vec<f64> {
        self.direct_costs(z)
            .into_iter()
            .zip(&self.weights)
            .map(|(c, w)| c * w)
            .collect()
    }

    /// Objective in its reported, unscaled form.
    pub fn objective_value(&self, z: &[f64]) -> f64 {
        let norm_sq: f64 = z.iter().map(|x| x * x).sum();
        let costs = self.total_costs(z);
        let deviation: f64 = match self.objective {
            ObjectiveKind::SymmetricDeviation => costs
                .iter()
                .zip(&self.targets)
                .map(|(c, t)| (c - t).powi(2))
                .sum(),
            ObjectiveKind::ShortfallOnly => costs
                .iter()
                .zip(&self.targets)
                .filter(|(_, t)| **t > 0.0)
                .map(|(c, t)| (1.0 - c / t).max(0.0).powi(2))
                .sum(),
        };
        deviation + self.regularization * norm_sq
    }

    /// Weight of the regularisation term in the scaled objective.
    fn scaled_regularization(&self) -> f64 {
        match self.objective {
            ObjectiveKind::SymmetricDeviation => self.regularization / self.scale.powi(2),
            ObjectiveKind::ShortfallOnly => self.regularization,
        }
    }

    /// Derivative of the scaled objective with respect to each project cost.
    fn cost_derivatives(&self, z: &[f64]) -> Vec<f64> {
        let costs = self.total_costs(z);
        match self.objective {
            ObjectiveKind::SymmetricDeviation => {
                let s2 = self.scale.powi(2);
                costs
                    .iter()
                    .zip(&self.targets)
                    .map(|(c, t)| 2.0 * (c - t) / s2)
                    .collect()
            }
            ObjectiveKind::ShortfallOnly => costs
                .iter()
                .zip(&self.targets)
                .map(|(c, t)| {
                    if *t > 0.0 {
                        -2.0 * (1.0 - c / t).max(0.0) / t
                    } else {
                        0.0
                    }
                })
                .collect(),
        }
    }

    /// Gradient of the scaled objective, written to `out`.
    pub fn gradient(&self, z: &[f64], out: &mut [f64]) {
        let derivatives = self.cost_derivatives(z);
        let rho = self.scaled_regularization();
        for (i, kind) in self.kinds.iter().enumerate() {
            let p = kind.project();
            out[i] = derivatives[p] * self.weights[p] * self.salary[i] + 2.0 * rho * z[i];
        }
    }

    /// Lipschitz constant of the scaled gradient.
    pub fn lipschitz(&self) -> f64 {
        let mut salary_sq = vec![0.0; self.targets.len()];
        for (i, kind) in self.kinds.iter().enumerate() {
            salary_sq[kind.project()] += self.salary[i].powi(2);
        }

        let curvature = salary_sq
            .iter()
            .enumerate()
            .map(|(p, s2)| {
                let w2 = self.weights[p].powi(2);
                match self.objective {
                    ObjectiveKind::SymmetricDeviation => 2.0 * w2 * s2 / self.scale.powi(2),
                    ObjectiveKind::ShortfallOnly if self.targets[p] > 0.0 => {
                        2.0 * w2 * s2 / self.targets[p].powi(2)
                    }
                    ObjectiveKind::ShortfallOnly => 0.0,
                }
            })
            .fold(0.0, f64::max);

        let lipschitz = curvature + 2.0 * self.scaled_regularization();
        if lipschitz > 0.0 { lipschitz } else { 1.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::assemble;
    use crate::config::AssemblySettings;
    use crate::models::{AllocationInput, DateRange, EmployeeDailyRecord, ProjectSpec, TopicCatalog};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn problem(projects: Vec<ProjectSpec>, objective: ObjectiveKind) -> AllocationProblem {
        let mut alice = EmployeeDailyRecord::new("alice");
        alice
            .add_research_hours(date(3), 8.0)
            .set_salary_rate(date(3), Decimal::new(100, 0));
        let mut bob = EmployeeDailyRecord::new("bob");
        bob.add_research_hours(date(3), 0.0);

        let input = AllocationInput::new(
            TopicCatalog::new(["T1", "T2"]).unwrap(),
            vec![alice, bob],
            projects,
            DateRange::new(date(3), date(3)).unwrap(),
        );
        let assembled = assemble(&input, &AssemblySettings::default()).unwrap();
        let settings = SolverSettings {
            objective,
            ..SolverSettings::default()
        };
        AllocationProblem::build(&assembled, &settings)
    }

    #[test]
    fn test_build_materialises_eligible_slots_only() {
        let p = problem(
            vec![
                ProjectSpec::new("A", Decimal::ZERO).with_topics(["T1", "T2"]),
                ProjectSpec::new("B", Decimal::ZERO)
                    .with_topics(["T2"])
                    .with_max_non_rnd_fraction(0.0),
            ],
            ObjectiveKind::SymmetricDeviation,
        );

        assert_eq!(p.blocks.len(), 1);
        assert_eq!(p.blocks[0].slots(), 0..4);
        assert_eq!(
            p.kinds,
            vec![
                SlotKind::Research { project: 0, topic: 0 },
                SlotKind::Research { project: 0, topic: 1 },
                SlotKind::NonResearch { project: 0 },
                SlotKind::Research { project: 1, topic: 1 },
            ]
        );
        assert_eq!(p.upper[2], 2.0);
        assert!(p.infeasible_blocks().is_empty());
    }

    #[test]
    fn test_block_without_slots_is_infeasible() {
        let p = problem(
            vec![ProjectSpec::new("A", Decimal::ZERO)],
            ObjectiveKind::SymmetricDeviation,
        );
        assert_eq!(p.num_variables(), 0);
        assert_eq!(p.infeasible_blocks().len(), 1);
    }

    #[test]
    fn test_feasibility_slack_scales_with_hours() {
        let mut p = problem(
            vec![ProjectSpec::new("A", Decimal::ZERO).with_topics(["T1"])],
            ObjectiveKind::SymmetricDeviation,
        );
        p.upper = vec![0.0, 1e7];

        p.blocks[0].hours = 1e7 + 1e-4;
        assert_eq!(p.block_capacity(&p.blocks[0]), 1e7);
        assert!(p.infeasible_blocks().is_empty());

        p.blocks[0].hours = 1e7 * 1.001;
        assert_eq!(p.infeasible_blocks().len(), 1);
    }

    #[test]
    fn test_costs_apply_overhead() {
        let p = problem(
            vec![ProjectSpec::new("A", Decimal::ZERO)
                .with_topics(["T1"])
                .with_overhead_rate(0.5)],
            ObjectiveKind::SymmetricDeviation,
        );
        let z = vec![6.0, 2.0];
        assert_eq!(p.direct_costs(&z), vec![800.0]);
        assert_eq!(p.total_costs(&z), vec![1200.0]);
    }

    #[test]
    fn test_gradient_matches_finite_differences() {
        let p = problem(
            vec![
                ProjectSpec::new("A", Decimal::new(500, 0)).with_topics(["T1"]),
                ProjectSpec::new("B", Decimal::new(300, 0))
                    .with_topics(["T2"])
                    .with_overhead_rate(0.2),
            ],
            ObjectiveKind::SymmetricDeviation,
        );
        let z = vec![3.0, 1.0, 2.5, 1.5];
        let mut grad = vec![0.0; z.len()];
        p.gradient(&z, &mut grad);

        let scaled = |z: &[f64]| p.objective_value(z) / p.scale.powi(2);
        let h = 1e-4;
        for i in 0..z.len() {
            let mut plus = z.clone();
            let mut minus = z.clone();
            plus[i] += h;
            minus[i] -= h;
            let numeric = (scaled(&plus) - scaled(&minus)) / (2.0 * h);
            assert!((numeric - grad[i]).abs() < 1e-8, "slot {}: {} vs {}", i, numeric, grad[i]);
        }
    }

    #[test]
    fn test_shortfall_gradient_vanishes_above_target() {
        let p = problem(
            vec![ProjectSpec::new("A", Decimal::new(100, 0)).with_topics(["T1"])],
            ObjectiveKind::ShortfallOnly,
        );
        let z = vec![6.0, 2.0];
        let mut grad = vec![0.0; 2];
        p.gradient(&z, &mut grad);

        assert_eq!(p.objective_value(&z), p.regularization * 40.0);
        assert!((grad[0] - 2.0 * p.regularization * 6.0).abs() < 1e-15);
    }

    #[test]
    fn test_lipschitz_is_exact_for_single_project() {
        let p = problem(
            vec![ProjectSpec::new("A", Decimal::ZERO).with_topics(["T1", "T2"])],
            ObjectiveKind::SymmetricDeviation,
        );
        let expected = 2.0 * 3.0 * 100.0_f64.powi(2) / p.scale.powi(2)
            + 2.0 * p.regularization / p.scale.powi(2);
        assert!((p.lipschitz() - expected).abs() < 1e-15);
    }

    #[test]
    fn test_scale_covers_maximum_spend() {
        let p = problem(
            vec![ProjectSpec::new("A", Decimal::new(100, 0)).with_topics(["T1"])],
            ObjectiveKind::SymmetricDeviation,
        );
        assert_eq!(p.scale, 800.0);
    }
}
