//! Typed error hierarchy for Planboard.
//!
//! `BoardError` carries every domain failure the HTTP edge needs to tell
//! apart. Storage code returns `anyhow::Result` and wraps a `BoardError`
//! when the failure is a domain one; `board::api::ApiError` downcasts it back
//! to pick the status code.

use planboard_common::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Workspace {id} not found")]
    WorkspaceNotFound { id: i64 },

    #[error("Project {id} not found")]
    ProjectNotFound { id: i64 },

    #[error("Task {id} not found")]
    TaskNotFound { id: i64 },

    #[error("Member {id} not found")]
    MemberNotFound { id: i64 },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Forbidden")]
    Forbidden,

    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("Invalid invite code")]
    InvalidInviteCode,

    #[error("Already a member of this workspace")]
    AlreadyMember,

    #[error("Email already registered")]
    EmailTaken,

    #[error("A workspace must keep at least one member")]
    LastMember,

    #[error("A workspace must keep at least one admin")]
    LastAdmin,

    #[error("Database error: {0}")]
    Database(#[source] anyhow::Error),

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ValidationError> for BoardError {
    fn from(err: ValidationError) -> Self {
        BoardError::Validation {
            field: err.field,
            message: err.message,
        }
    }
}

impl BoardError {
    /// Shorthand for a single-field validation failure raised by storage
    /// code (e.g. a task's project living in another workspace).
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        BoardError::Validation {
            field,
            message: message.into(),
        }
    }
}
