//! Composite views assembled by the board service on top of the shared
//! records in `planboard_common`.

use serde::Serialize;

pub use planboard_common::models::*;
pub use planboard_common::schemas::TaskFilters;

/// The slice of a project shown next to a task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub id: i64,
    pub name: String,
    pub image_url: Option<String>,
}

/// The slice of a member shown as a task's assignee.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssigneeSummary {
    /// Member id, the value stored in `Task::assignee_id`.
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
}

/// A task populated with its project and assignee.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub project: ProjectSummary,
    pub assignee: Option<AssigneeSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardColumn {
    #[serde(flatten)]
    pub display: StatusDisplay,
    pub count: usize,
    pub tasks: Vec<TaskDetail>,
}

/// Kanban board: one column per status, in workflow order.
#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    pub workspace_id: i64,
    pub project_id: Option<i64>,
    pub columns: Vec<BoardColumn>,
}

impl BoardView {
    /// Group tasks into the five status columns, each ordered by position.
    pub fn from_tasks(workspace_id: i64, project_id: Option<i64>, tasks: Vec<TaskDetail>) -> Self {
        let columns = TaskStatus::ALL
            .iter()
            .map(|status| {
                let mut col_tasks: Vec<TaskDetail> = tasks
                    .iter()
                    .filter(|t| t.task.status == *status)
                    .cloned()
                    .collect();
                col_tasks.sort_by_key(|t| (t.task.position, t.task.id));
                BoardColumn {
                    display: status.display(),
                    count: col_tasks.len(),
                    tasks: col_tasks,
                }
            })
            .collect();
        Self {
            workspace_id,
            project_id,
            columns,
        }
    }
}

/// Everything the workspace home page renders.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub workspace: Workspace,
    pub analytics: Analytics,
    pub tasks: Listing<TaskDetail>,
    pub projects: Listing<Project>,
    pub members: Listing<Member>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceSettingsView {
    pub workspace: Workspace,
    pub invite_link: String,
}

/// Data for the join-confirmation screen.
#[derive(Debug, Clone, Serialize)]
pub struct JoinView {
    pub workspace: WorkspaceInfo,
    pub invite_code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectSettingsView {
    pub workspace: WorkspaceInfo,
    pub project: Project,
}
