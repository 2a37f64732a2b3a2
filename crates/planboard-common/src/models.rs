use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a stored or submitted string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

// ── Task status ───────────────────────────────────────────────────────

/// Workflow stage of a task. Declaration order is the Kanban column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Backlog,
    Todo,
    InProgress,
    InReview,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        Self::Backlog,
        Self::Todo,
        Self::InProgress,
        Self::InReview,
        Self::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backlog => "BACKLOG",
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::InReview => "IN_REVIEW",
            Self::Done => "DONE",
        }
    }

    /// Human label, e.g. `In Progress`.
    pub fn label(&self) -> String {
        snake_case_to_title_case(self.as_str())
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Backlog => "pink",
            Self::Todo => "slate",
            Self::InProgress => "yellow",
            Self::InReview => "indigo",
            Self::Done => "emerald",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Backlog => "circle-dashed",
            Self::Todo => "circle",
            Self::InProgress => "circle-dot-dashed",
            Self::InReview => "circle-dot",
            Self::Done => "circle-check",
        }
    }

    pub fn display(&self) -> StatusDisplay {
        StatusDisplay {
            status: *self,
            label: self.label(),
            color: self.color(),
            icon: self.icon(),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BACKLOG" => Ok(Self::Backlog),
            "TODO" => Ok(Self::Todo),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "IN_REVIEW" => Ok(Self::InReview),
            "DONE" => Ok(Self::Done),
            _ => Err(ParseEnumError {
                kind: "task status",
                value: s.to_string(),
            }),
        }
    }
}

/// Display metadata for a Kanban column header or a status badge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusDisplay {
    pub status: TaskStatus,
    pub label: String,
    pub color: &'static str,
    pub icon: &'static str,
}

/// `IN_PROGRESS` → `In Progress`.
pub fn snake_case_to_title_case(s: &str) -> String {
    s.to_lowercase()
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Member role ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Admin,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Member => "MEMBER",
        }
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Self::Admin),
            "MEMBER" => Ok(Self::Member),
            _ => Err(ParseEnumError {
                kind: "member role",
                value: s.to_string(),
            }),
        }
    }
}

// ── Records ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub invite_code: String,
    /// The user who created the workspace.
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The public face of a workspace, shown on the join screen before the
/// visitor is a member. Never carries the invite code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceInfo {
    pub id: i64,
    pub name: String,
    pub image_url: Option<String>,
}

impl From<&Workspace> for WorkspaceInfo {
    fn from(workspace: &Workspace) -> Self {
        Self {
            id: workspace.id,
            name: workspace.name.clone(),
            image_url: workspace.image_url.clone(),
        }
    }
}

/// A membership joined with the member's user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub workspace_id: i64,
    pub user_id: i64,
    pub role: MemberRole,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub workspace_id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub workspace_id: i64,
    pub project_id: i64,
    /// Cleared when the assigned member leaves the workspace.
    pub assignee_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub status: TaskStatus,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A paged-style list response: the documents returned plus the full count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing<T> {
    pub documents: Vec<T>,
    pub total: usize,
}

impl<T> Listing<T> {
    pub fn all(documents: Vec<T>) -> Self {
        let total = documents.len();
        Self { documents, total }
    }

    /// Keep the first `limit` documents but report the full total.
    pub fn preview(mut documents: Vec<T>, limit: usize) -> Self {
        let total = documents.len();
        documents.truncate(limit);
        Self { documents, total }
    }
}

/// Month-over-month task counters for a workspace or project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analytics {
    pub task_count: i64,
    pub task_difference: i64,
    pub assigned_task_count: i64,
    pub assigned_task_difference: i64,
    pub completed_task_count: i64,
    pub completed_task_difference: i64,
    pub incomplete_task_count: i64,
    pub incomplete_task_difference: i64,
    pub overdue_task_count: i64,
    pub overdue_task_difference: i64,
}
