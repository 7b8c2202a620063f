//! Configuration loading and management for the allocation engine.
//!
//! This module provides the engine settings (solver tolerances, objective,
//! assembly policies, report thresholds) and loaders for settings and
//! complete allocation inputs stored as YAML files.
//!
//! # Example
//!
//! ```no_run
//! use allocation_engine::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load("./config/default").unwrap();
//! println!("Iteration cap: {}", loader.config().solver.max_iterations);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AssemblySettings, EngineConfig, NonRndCapPolicy, ObjectiveKind, ReportSettings,
    SolverSettings,
};
