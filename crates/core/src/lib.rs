//! Core business logic for toolyard.

pub mod services;

pub use services::*;
