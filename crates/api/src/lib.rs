//! HTTP API layer for toolyard.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: Authentication, inventory, reports, admin
//! - **Extractors**: Authentication
//! - **Middleware**: Session resolution
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
