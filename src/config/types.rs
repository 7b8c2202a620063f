//! Configuration types for the allocation engine.
//!
//! This module contains the strongly-typed settings that are deserialized
//! from `engine.yaml`. Every field has a default, so an empty file (or no
//! file at all, via [`EngineConfig::default`]) is a valid configuration.

use serde::{Deserialize, Serialize};

/// Which deviation from the funding target the solver penalises.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    /// `Σ (total_cost − target)²`: overspending and underspending are
    /// penalised alike.
    #[default]
    SymmetricDeviation,
    /// `Σ max(1 − total_cost / target, 0)²`: only shortfall below the target
    /// is penalised. Projects with a zero target contribute nothing.
    ShortfallOnly,
}

/// How the per-project non-research cap is derived for an employee-day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonRndCapPolicy {
    /// `max_non_rnd_fraction × research_hours`.
    #[default]
    ResearchFraction,
    /// `min(max_non_rnd_fraction × research_hours, non_rnd_hours)`.
    TrackedPool,
}

/// Settings of the allocation solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Absolute tolerance on the fixed-point residual, in hours.
    pub eps_abs: f64,
    /// Relative tolerance on the fixed-point residual.
    pub eps_rel: f64,
    /// Iteration cap.
    pub max_iterations: usize,
    /// Weight `λ` of the `‖X‖² + ‖Y‖²` conditioning term.
    pub regularization: f64,
    /// At the iteration cap, a residual within this multiple of the
    /// tolerance is reported as solved-inaccurate.
    pub inaccurate_factor: f64,
    /// The objective to minimise.
    pub objective: ObjectiveKind,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            eps_abs: 1e-7,
            eps_rel: 1e-7,
            max_iterations: 20_000,
            regularization: 1e-6,
            inaccurate_factor: 1e3,
            objective: ObjectiveKind::SymmetricDeviation,
        }
    }
}

/// Settings of the input assembler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblySettings {
    /// Restrict an employee-day to the catalog topics logged that day, when
    /// any were logged.
    pub gate_on_logged_topics: bool,
    /// Only allow non-research hours for a project on employee-days where it
    /// has at least one eligible research topic.
    pub non_rnd_requires_topic: bool,
    /// How the non-research cap is derived.
    pub non_rnd_policy: NonRndCapPolicy,
    /// Non-research hours assumed when a day does not track them, as a
    /// fraction of research hours.
    pub default_non_rnd_fraction: f64,
}

impl Default for AssemblySettings {
    fn default() -> Self {
        Self {
            gate_on_logged_topics: true,
            non_rnd_requires_topic: true,
            non_rnd_policy: NonRndCapPolicy::ResearchFraction,
            default_non_rnd_fraction: 0.25,
        }
    }
}

/// Settings of the result extractor and diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Allocations below this many hours are omitted from the result.
    pub zero_threshold: f64,
    /// Allocation gaps larger than this many hours are defects.
    pub defect_tolerance_hours: f64,
    /// Tolerance for the non-research cap check, in hours.
    pub cap_tolerance_hours: f64,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            zero_threshold: 1e-10,
            defect_tolerance_hours: 1.0,
            cap_tolerance_hours: 1e-6,
        }
    }
}

/// The complete engine configuration.
///
/// # Example
///
/// ```
/// use allocation_engine::config::{EngineConfig, ObjectiveKind};
///
/// let yaml = "solver:\n  objective: shortfall_only\n  max_iterations: 5000\n";
/// let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
/// assert_eq!(config.solver.objective, ObjectiveKind::ShortfallOnly);
/// assert_eq!(config.solver.max_iterations, 5000);
/// assert_eq!(config.solver.eps_abs, 1e-7);
/// assert!(config.assembly.gate_on_logged_topics);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Solver settings.
    pub solver: SolverSettings,
    /// Assembler settings.
    pub assembly: AssemblySettings,
    /// Extractor and diagnostics settings.
    pub report: ReportSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_solver_settings() {
        let settings = SolverSettings::default();
        assert_eq!(settings.eps_abs, 1e-7);
        assert_eq!(settings.eps_rel, 1e-7);
        assert_eq!(settings.max_iterations, 20_000);
        assert_eq!(settings.regularization, 1e-6);
        assert_eq!(settings.objective, ObjectiveKind::SymmetricDeviation);
    }

    #[test]
    fn test_empty_yaml_yields_defaults() {
        let config: EngineConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let yaml = "assembly:\n  non_rnd_policy: tracked_pool\n";
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.assembly.non_rnd_policy, NonRndCapPolicy::TrackedPool);
        assert!(config.assembly.non_rnd_requires_topic);
        assert_eq!(config.assembly.default_non_rnd_fraction, 0.25);
        assert_eq!(config.report, ReportSettings::default());
    }

    #[test]
    fn test_unknown_objective_is_rejected() {
        let yaml = "solver:\n  objective: gradient_heuristic\n";
        assert!(serde_yaml::from_str::<EngineConfig>(yaml).is_err());
    }

    #[test]
    fn test_objective_serialization() {
        assert_eq!(
            serde_json::to_string(&ObjectiveKind::ShortfallOnly).unwrap(),
            "\"shortfall_only\""
        );
        assert_eq!(
            serde_json::to_string(&NonRndCapPolicy::ResearchFraction).unwrap(),
            "\"research_fraction\""
        );
    }
}
