//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod allocations;
pub mod audit;
pub mod auth;
pub mod bottlenecks;
pub mod capacity;
pub mod employees;
pub mod projects;

// Re-export all handlers for use in router
pub use allocations::*;
pub use audit::*;
pub use auth::*;
pub use bottlenecks::*;
pub use capacity::*;
pub use employees::*;
pub use projects::*;
