//! Research Expenditure Allocation Engine
//!
//! This crate allocates employees' daily logged hours across funded projects and
//! research topics so that each project's salary-weighted cost tracks its
//! contractual funding target, without ever allocating more or fewer hours than
//! were logged, exceeding non-research caps, or billing ineligible topics.

#![warn(missing_docs)]

pub mod allocation;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
