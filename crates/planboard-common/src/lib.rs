//! Shared domain types for Planboard.
//!
//! `models` holds the records the API hands out (workspaces, members,
//! projects, tasks) together with the task-status enum and its Kanban display
//! metadata. `schemas` holds the request payloads and the validation rules
//! that turn them into checked values before anything touches storage.

pub mod models;
pub mod schemas;

pub use models::*;
pub use schemas::ValidationError;
