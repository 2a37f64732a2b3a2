//! Page routes. Each one checks the session (redirecting to `/sign-in`
//! without one) and answers with the data its screen renders.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use chrono::Utc;

use super::analytics;
use super::api::{ApiError, SharedState};
use super::auth::PageUser;
use super::invite::invite_link;
use super::models::*;
use crate::errors::BoardError;

/// Tasks shown in the dashboard's upcoming list.
const DASHBOARD_TASK_PREVIEW: usize = 4;

pub fn page_router() -> Router<SharedState> {
    Router::new()
        .route("/workspaces/{id}", get(dashboard))
        .route("/workspaces/{id}/join/{code}", get(join_page))
        .route("/workspaces/{id}/settings", get(workspace_settings))
        .route(
            "/workspaces/{id}/projects/{project_id}/settings",
            get(project_settings),
        )
        .route("/sign-in", get(sign_in))
        .route("/sign-up", get(sign_up))
}

async fn dashboard(
    State(state): State<SharedState>,
    PageUser(user): PageUser,
    Path(id): Path<i64>,
) -> Result<Json<DashboardView>, ApiError> {
    let view = state
        .db
        .call(move |db| {
            let member = db.require_member(id, user.id)?;
            let workspace = db.require_workspace(id)?;
            let scope = db.list_scope_tasks(id, None)?;
            let analytics = analytics::compute(&scope, Some(member.id), Utc::now());
            let tasks = db.list_tasks(&TaskFilters::workspace(id))?;
            Ok(DashboardView {
                workspace,
                analytics,
                tasks: Listing::preview(tasks, DASHBOARD_TASK_PREVIEW),
                projects: Listing::all(db.list_projects(id)?),
                members: Listing::all(db.list_members(id)?),
            })
        })
        .await?;
    Ok(Json(view))
}

/// Join confirmation. Members already in the workspace go straight to it.
async fn join_page(
    State(state): State<SharedState>,
    PageUser(user): PageUser,
    Path((id, code)): Path<(i64, String)>,
) -> Result<Response, ApiError> {
    let (workspace, already_member) = state
        .db
        .call(move |db| {
            let workspace = db.require_workspace(id)?;
            let member = db.get_member(id, user.id)?;
            Ok((workspace, member.is_some()))
        })
        .await?;
    if already_member {
        return Ok(Redirect::to(&format!("/workspaces/{}", id)).into_response());
    }
    Ok(Json(JoinView {
        workspace: WorkspaceInfo::from(&workspace),
        invite_code: code,
    })
    .into_response())
}

async fn workspace_settings(
    State(state): State<SharedState>,
    PageUser(user): PageUser,
    Path(id): Path<i64>,
) -> Result<Json<WorkspaceSettingsView>, ApiError> {
    let workspace = state
        .db
        .call(move |db| {
            db.require_member(id, user.id)?;
            db.require_workspace(id)
        })
        .await?;
    let invite_link = invite_link(&state.settings.public_url, workspace.id, &workspace.invite_code);
    Ok(Json(WorkspaceSettingsView {
        workspace,
        invite_link,
    }))
}

async fn project_settings(
    State(state): State<SharedState>,
    PageUser(user): PageUser,
    Path((id, project_id)): Path<(i64, i64)>,
) -> Result<Json<ProjectSettingsView>, ApiError> {
    let view = state
        .db
        .call(move |db| {
            db.require_member(id, user.id)?;
            let workspace = db.require_workspace(id)?;
            let project = db.require_project(project_id)?;
            if project.workspace_id != id {
                return Err(BoardError::ProjectNotFound { id: project_id }.into());
            }
            Ok(ProjectSettingsView {
                workspace: WorkspaceInfo::from(&workspace),
                project,
            })
        })
        .await?;
    Ok(Json(view))
}

async fn sign_in() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "page": "sign-in",
        "login": "/api/auth/login",
        "sign_up": "/sign-up",
    }))
}

async fn sign_up() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "page": "sign-up",
        "register": "/api/auth/register",
        "sign_in": "/sign-in",
    }))
}
