//! HTTP API module for the allocation engine.
//!
//! This module provides the REST endpoint that runs an allocation over
//! typed JSON records.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{AllocationRequest, EmployeeRequest};
pub use response::{AllocationResponse, ApiError, ApiErrorResponse};
pub use state::AppState;
