//! Configuration and input loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine settings
//! and complete allocation inputs from YAML files.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::models::{AllocationInput, DateRange, EmployeeDailyRecord, ProjectSpec, TopicCatalog};

use super::types::EngineConfig;

/// `period.yaml`: the date range as `YYYY-MM-DD` strings.
#[derive(Debug, Deserialize)]
struct PeriodFile {
    start_date: String,
    end_date: String,
}

/// `projects.yaml`.
#[derive(Debug, Deserialize)]
struct ProjectsFile {
    projects: Vec<ProjectSpec>,
}

/// `employees.yaml`.
#[derive(Debug, Deserialize)]
struct EmployeesFile {
    employees: Vec<EmployeeDailyRecord>,
}

/// `topics.yaml`.
#[derive(Debug, Deserialize)]
struct TopicsFile {
    topics: TopicCatalog,
}

/// Loads and provides access to the engine configuration.
///
/// # Directory Structure
///
/// A configuration directory holds a single `engine.yaml`. An input
/// directory read by [`ConfigLoader::load_input`] holds:
/// ```text
/// config/demo/
/// ├── topics.yaml     # Topic catalog (optional, defaults to the built-in one)
/// ├── projects.yaml   # Project specifications
/// ├── employees.yaml  # Employee daily records
/// └── period.yaml     # start_date / end_date
/// ```
///
/// # Example
///
/// ```no_run
/// use allocation_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// let input = ConfigLoader::load_input("./config/demo").unwrap();
/// println!("{} employees, tolerance {}", input.employees.len(), loader.config().solver.eps_abs);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads `engine.yaml` from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` on success, or an error if:
    /// - `engine.yaml` is missing (`ConfigNotFound`)
    /// - it contains invalid YAML or unknown values (`ConfigParseError`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let config = Self::load_yaml::<EngineConfig>(&path.as_ref().join("engine.yaml"))?;
        Ok(Self { config })
    }

    /// Wraps an already built configuration.
    pub fn from_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Loads a complete allocation input from a directory.
    ///
    /// `topics.yaml` is optional; the other three files are required. The
    /// period must use `YYYY-MM-DD` dates with start not after end.
    pub fn load_input<P: AsRef<Path>>(path: P) -> EngineResult<AllocationInput> {
        let path = path.as_ref();

        let topics_path = path.join("topics.yaml");
        let topics = if topics_path.exists() {
            Self::load_yaml::<TopicsFile>(&topics_path)?.topics
        } else {
            TopicCatalog::research_topics()
        };
        topics.validate()?;

        let projects = Self::load_yaml::<ProjectsFile>(&path.join("projects.yaml"))?.projects;
        let employees = Self::load_yaml::<EmployeesFile>(&path.join("employees.yaml"))?.employees;

        let period = Self::load_yaml::<PeriodFile>(&path.join("period.yaml"))?;
        let range = DateRange::parse(&period.start_date, &period.end_date)?;

        Ok(AllocationInput::new(topics, employees, projects, range))
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObjectiveKind;
    use chrono::NaiveDate;

    fn config_path() -> &'static str {
        "./config/default"
    }

    fn demo_path() -> &'static str {
        "./config/demo"
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.config().solver.max_iterations, 20_000);
        assert_eq!(loader.config().solver.objective, ObjectiveKind::SymmetricDeviation);
        assert_eq!(loader.config().report.defect_tolerance_hours, 1.0);
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = ConfigLoader::load("/nonexistent/path");
        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("engine.yaml"));
            }
            _ => panic!("Expected ConfigNotFound error"),
        }
    }

    #[test]
    fn test_load_demo_input() {
        let input = ConfigLoader::load_input(demo_path()).unwrap();

        assert_eq!(input.topics.len(), 4);
        assert_eq!(input.projects.len(), 2);
        assert_eq!(input.employees.len(), 2);
        assert_eq!(
            input.range.start_date,
            NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
        );
        assert_eq!(input.range.num_days(), 5);

        let bob = &input.employees[1];
        assert_eq!(bob.salary_levels.len(), 1);
        assert_eq!(
            bob.salary_rate(NaiveDate::from_ymd_opt(2025, 3, 5).unwrap()),
            Some(rust_decimal::Decimal::new(7000, 2))
        );
    }

    #[test]
    fn test_load_input_missing_projects_returns_error() {
        let result = ConfigLoader::load_input("/nonexistent/input");
        match result {
            Err(EngineError::ConfigNotFound { path }) => assert!(path.contains("projects.yaml")),
            _ => panic!("Expected ConfigNotFound error"),
        }
    }

    #[test]
    fn test_from_config_keeps_settings() {
        let mut config = EngineConfig::default();
        config.solver.max_iterations = 10;
        let loader = ConfigLoader::from_config(config);
        assert_eq!(loader.config().solver.max_iterations, 10);
    }
}
