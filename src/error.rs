//! Error types for the allocation engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every input or configuration problem that aborts a run before the
//! solver is invoked. Solver non-convergence is not an error: it is reported
//! through [`crate::models::SolverStatus`].

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for the allocation engine.
///
/// # Example
///
/// ```
/// use allocation_engine::error::EngineError;
/// use chrono::NaiveDate;
///
/// let error = EngineError::InvalidRange {
///     start: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
///     end: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
/// };
/// assert_eq!(
///     error.to_string(),
///     "Invalid date range: start 2025-02-01 is after end 2025-01-01"
/// );
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// The start of a date range lies after its end.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange {
        /// The requested first day.
        start: NaiveDate,
        /// The requested last day.
        end: NaiveDate,
    },

    /// A date string was not in `YYYY-MM-DD` format.
    #[error("Invalid date '{value}': {message}")]
    InvalidDate {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        message: String,
    },

    /// An employee record contained invalid data.
    #[error("Invalid employee '{employee_id}' field '{field}': {message}")]
    InvalidEmployee {
        /// The employee identifier.
        employee_id: String,
        /// The offending field.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// A project specification contained invalid data.
    #[error("Invalid project '{project}' field '{field}': {message}")]
    InvalidProject {
        /// The project name.
        project: String,
        /// The offending field.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// Two projects share the same name.
    #[error("Duplicate project name: {name}")]
    DuplicateProject {
        /// The repeated name.
        name: String,
    },

    /// The topic catalog is empty or contains duplicates.
    #[error("Invalid topic catalog: {message}")]
    InvalidTopicCatalog {
        /// A description of the problem.
        message: String,
    },

    /// Configuration or input file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration or input file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
