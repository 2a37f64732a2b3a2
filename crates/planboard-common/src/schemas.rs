//! Request payloads and their validation rules.
//!
//! Every payload deserializes leniently (all fields optional) so that a
//! missing field surfaces as a per-field `"Required"` message rather than a
//! generic deserialization failure. `validate()` turns a payload into a
//! checked value that storage code can trust.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{MemberRole, TaskStatus};

pub const NAME_MAX_LEN: usize = 256;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const POSITION_MIN: i64 = 1000;
pub const POSITION_MAX: i64 = 1_000_000;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

// ── Field rules ───────────────────────────────────────────────────────

fn required(field: &'static str, value: Option<&str>) -> Result<String, ValidationError> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(ValidationError::new(field, "Required"));
    }
    if value.chars().count() > NAME_MAX_LEN {
        return Err(ValidationError::new(
            field,
            format!("Must be at most {} characters", NAME_MAX_LEN),
        ));
    }
    Ok(value.to_string())
}

fn required_id(field: &'static str, value: Option<i64>) -> Result<i64, ValidationError> {
    value.ok_or_else(|| ValidationError::new(field, "Required"))
}

fn email(value: Option<&str>) -> Result<String, ValidationError> {
    let value = required("email", value)?;
    if !EMAIL_RE.is_match(&value) {
        return Err(ValidationError::new("email", "Invalid email address"));
    }
    Ok(value.to_lowercase())
}

/// Empty means "no image". Images are referenced by URL or inline data URL.
fn image_url(value: Option<&str>) -> Result<Option<String>, ValidationError> {
    let value = match value.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(v) => v,
    };
    if value.starts_with("https://")
        || value.starts_with("http://")
        || value.starts_with("data:image/")
    {
        Ok(Some(value.to_string()))
    } else {
        Err(ValidationError::new(
            "image_url",
            "Must be an http(s) URL or an image data URL",
        ))
    }
}

fn status(value: Option<&str>) -> Result<TaskStatus, ValidationError> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(ValidationError::new("status", "Required"));
    }
    value
        .parse()
        .map_err(|_| ValidationError::new("status", "Invalid task status"))
}

/// Accepts a full RFC 3339 timestamp or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_due_date(value: &str) -> Result<DateTime<Utc>, ValidationError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ValidationError::new("due_date", "Invalid date"))
}

fn due_date(value: Option<&str>) -> Result<DateTime<Utc>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Err(ValidationError::new("due_date", "Required")),
        Some(v) => parse_due_date(v),
    }
}

fn description(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// ── Auth ──────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<NewUser, ValidationError> {
        let name = required("name", self.name.as_deref())?;
        let email = email(self.email.as_deref())?;
        let password = self.password.clone().unwrap_or_default();
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(ValidationError::new(
                "password",
                format!("Minimum {} characters required", PASSWORD_MIN_LEN),
            ));
        }
        Ok(NewUser {
            name,
            email,
            password,
        })
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<Credentials, ValidationError> {
        let email = email(self.email.as_deref())?;
        let password = self.password.clone().unwrap_or_default();
        if password.is_empty() {
            return Err(ValidationError::new("password", "Required"));
        }
        Ok(Credentials { email, password })
    }
}

// ── Workspaces ────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateWorkspaceRequest {
    pub name: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkspace {
    pub name: String,
    pub image_url: Option<String>,
}

impl CreateWorkspaceRequest {
    pub fn validate(&self) -> Result<NewWorkspace, ValidationError> {
        Ok(NewWorkspace {
            name: required("name", self.name.as_deref())?,
            image_url: image_url(self.image_url.as_deref())?,
        })
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateWorkspaceRequest {
    pub name: Option<String>,
    /// Present-but-empty clears the image.
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkspacePatch {
    pub name: Option<String>,
    pub image_url: Option<Option<String>>,
}

impl UpdateWorkspaceRequest {
    pub fn validate(&self) -> Result<WorkspacePatch, ValidationError> {
        let name = match &self.name {
            Some(name) => Some(required("name", Some(name))?),
            None => None,
        };
        let image_url = match &self.image_url {
            Some(url) => Some(image_url(Some(url))?),
            None => None,
        };
        Ok(WorkspacePatch { name, image_url })
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct JoinWorkspaceRequest {
    pub code: Option<String>,
}

impl JoinWorkspaceRequest {
    pub fn validate(&self) -> Result<String, ValidationError> {
        let code = self.code.as_deref().map(str::trim).unwrap_or_default();
        if code.is_empty() {
            return Err(ValidationError::new("code", "Required"));
        }
        Ok(code.to_string())
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateMemberRequest {
    pub role: Option<String>,
}

impl UpdateMemberRequest {
    pub fn validate(&self) -> Result<MemberRole, ValidationError> {
        match self.role.as_deref().map(str::trim) {
            None | Some("") => Err(ValidationError::new("role", "Required")),
            Some(role) => role
                .parse()
                .map_err(|_| ValidationError::new("role", "Invalid member role")),
        }
    }
}

// ── Projects ──────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    pub workspace_id: Option<i64>,
    pub name: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub workspace_id: i64,
    pub name: String,
    pub image_url: Option<String>,
}

impl CreateProjectRequest {
    pub fn validate(&self) -> Result<NewProject, ValidationError> {
        Ok(NewProject {
            workspace_id: required_id("workspace_id", self.workspace_id)?,
            name: required("name", self.name.as_deref())?,
            image_url: image_url(self.image_url.as_deref())?,
        })
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub image_url: Option<Option<String>>,
}

impl UpdateProjectRequest {
    pub fn validate(&self) -> Result<ProjectPatch, ValidationError> {
        let name = match &self.name {
            Some(name) => Some(required("name", Some(name))?),
            None => None,
        };
        let image_url = match &self.image_url {
            Some(url) => Some(image_url(Some(url))?),
            None => None,
        };
        Ok(ProjectPatch { name, image_url })
    }
}

// ── Tasks ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub workspace_id: Option<i64>,
    pub project_id: Option<i64>,
    pub assignee_id: Option<i64>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub workspace_id: i64,
    pub project_id: i64,
    pub assignee_id: i64,
    pub name: String,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    pub description: Option<String>,
}

impl CreateTaskRequest {
    pub fn validate(&self) -> Result<NewTask, ValidationError> {
        Ok(NewTask {
            workspace_id: required_id("workspace_id", self.workspace_id)?,
            name: required("name", self.name.as_deref())?,
            status: status(self.status.as_deref())?,
            project_id: required_id("project_id", self.project_id)?,
            due_date: due_date(self.due_date.as_deref())?,
            assignee_id: required_id("assignee_id", self.assignee_id)?,
            description: description(self.description.as_deref()),
        })
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    pub project_id: Option<i64>,
    pub assignee_id: Option<i64>,
    pub name: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<String>,
    /// Present-but-empty clears the description.
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub project_id: Option<i64>,
    pub assignee_id: Option<i64>,
    pub name: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<DateTime<Utc>>,
    pub description: Option<Option<String>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }
}

impl UpdateTaskRequest {
    pub fn validate(&self) -> Result<TaskPatch, ValidationError> {
        let name = match &self.name {
            Some(name) => Some(required("name", Some(name))?),
            None => None,
        };
        let status = match &self.status {
            Some(s) => Some(status(Some(s))?),
            None => None,
        };
        let due_date = match &self.due_date {
            Some(d) => Some(due_date(Some(d))?),
            None => None,
        };
        Ok(TaskPatch {
            project_id: self.project_id,
            assignee_id: self.assignee_id,
            name,
            status,
            due_date,
            description: self.description.as_deref().map(|d| description(Some(d))),
        })
    }
}

/// One card's new place on the Kanban board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkTaskUpdate {
    pub id: i64,
    pub status: TaskStatus,
    pub position: i64,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BulkUpdateTasksRequest {
    #[serde(default)]
    pub tasks: Vec<BulkTaskUpdate>,
}

impl BulkUpdateTasksRequest {
    pub fn validate(&self) -> Result<Vec<BulkTaskUpdate>, ValidationError> {
        if self.tasks.is_empty() {
            return Err(ValidationError::new("tasks", "Required"));
        }
        if let Some(bad) = self
            .tasks
            .iter()
            .find(|t| !(POSITION_MIN..=POSITION_MAX).contains(&t.position))
        {
            return Err(ValidationError::new(
                "position",
                format!(
                    "Position {} of task {} must be between {} and {}",
                    bad.position, bad.id, POSITION_MIN, POSITION_MAX
                ),
            ));
        }
        Ok(self.tasks.clone())
    }
}

/// Query string of the task list.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ListTasksQuery {
    pub workspace_id: Option<i64>,
    pub project_id: Option<i64>,
    pub assignee_id: Option<i64>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub due_date: Option<String>,
}

/// Checked task-list filters. Everything but the workspace is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFilters {
    pub workspace_id: i64,
    pub project_id: Option<i64>,
    pub assignee_id: Option<i64>,
    pub status: Option<TaskStatus>,
    pub search: Option<String>,
    /// Matches tasks due on this calendar day (UTC).
    pub due_date: Option<NaiveDate>,
}

impl TaskFilters {
    pub fn workspace(workspace_id: i64) -> Self {
        Self {
            workspace_id,
            project_id: None,
            assignee_id: None,
            status: None,
            search: None,
            due_date: None,
        }
    }
}

impl ListTasksQuery {
    pub fn validate(&self) -> Result<TaskFilters, ValidationError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => Some(status(Some(s))?),
        };
        let due_date = match self.due_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(d) => Some(parse_due_date(d)?.date_naive()),
        };
        Ok(TaskFilters {
            workspace_id: required_id("workspace_id", self.workspace_id)?,
            project_id: self.project_id,
            assignee_id: self.assignee_id,
            status,
            search: description(self.search.as_deref()),
            due_date,
        })
    }
}
