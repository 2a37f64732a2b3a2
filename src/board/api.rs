use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use tokio::sync::broadcast;

use planboard_common::ValidationError;
use planboard_common::schemas::{
    BulkUpdateTasksRequest, CreateProjectRequest, CreateTaskRequest, CreateWorkspaceRequest,
    JoinWorkspaceRequest, ListTasksQuery, UpdateMemberRequest, UpdateProjectRequest,
    UpdateTaskRequest, UpdateWorkspaceRequest,
};

use super::analytics;
use super::auth::{self, AuthSettings, CurrentUser};
use super::db::DbHandle;
#[cfg(test)]
use super::db::BoardDb;
use super::invite::generate_invite_code;
use super::models::*;
use super::ws::{self, WsEvent, WsMessage, broadcast_message};
use crate::config::PlanboardToml;
use crate::errors::BoardError;

// ── Shared application state ──────────────────────────────────────────

/// Runtime settings derived from the configuration.
#[derive(Debug, Clone)]
pub struct BoardSettings {
    /// Base URL for invite links, without a trailing slash.
    pub public_url: String,
    pub invite_code_length: usize,
    pub auth: AuthSettings,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            public_url: "http://127.0.0.1:3141".to_string(),
            invite_code_length: 10,
            auth: AuthSettings::default(),
        }
    }
}

impl BoardSettings {
    pub fn from_config(toml: &PlanboardToml) -> Self {
        Self {
            public_url: toml.public_url(),
            invite_code_length: toml.invite.code_length,
            auth: AuthSettings {
                cookie_name: toml.auth.cookie_name.clone(),
                session_ttl: chrono::Duration::hours(i64::from(toml.auth.session_ttl_hours)),
                secure_cookie: toml.auth.secure_cookie,
            },
        }
    }
}

pub struct AppState {
    pub db: DbHandle,
    pub ws_tx: broadcast::Sender<WsEvent>,
    pub settings: BoardSettings,
}

pub type SharedState = Arc<AppState>;

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Validation { field: &'static str, message: String },
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({"error": msg}))
            }
            ApiError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({"error": message, "field": field}),
            ),
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, serde_json::json!({"error": msg}))
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, serde_json::json!({"error": msg})),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, serde_json::json!({"error": msg})),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, serde_json::json!({"error": msg})),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({"error": msg}),
            ),
        };
        (status, Json(body)).into_response()
    }
}

impl From<BoardError> for ApiError {
    fn from(err: BoardError) -> Self {
        let msg = err.to_string();
        match err {
            BoardError::WorkspaceNotFound { .. }
            | BoardError::ProjectNotFound { .. }
            | BoardError::TaskNotFound { .. }
            | BoardError::MemberNotFound { .. } => ApiError::NotFound(msg),
            BoardError::Unauthorized | BoardError::InvalidCredentials => {
                ApiError::Unauthorized(msg)
            }
            BoardError::Forbidden => ApiError::Forbidden(msg),
            BoardError::Validation { field, message } => ApiError::Validation { field, message },
            BoardError::InvalidInviteCode => ApiError::BadRequest(msg),
            BoardError::AlreadyMember
            | BoardError::EmailTaken
            | BoardError::LastMember
            | BoardError::LastAdmin => ApiError::Conflict(msg),
            BoardError::Database(_) | BoardError::LockPoisoned | BoardError::Other(_) => {
                tracing::error!(error = ?err, "Request failed");
                ApiError::Internal("Internal server error".to_string())
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<BoardError>() {
            Ok(board_err) => board_err.into(),
            Err(other) => {
                tracing::error!(error = ?other, "Request failed");
                ApiError::Internal("Internal server error".to_string())
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation {
            field: err.field,
            message: err.message,
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .merge(auth::auth_router())
        .route("/api/workspaces", get(list_workspaces).post(create_workspace))
        .route(
            "/api/workspaces/{id}",
            get(get_workspace)
                .patch(update_workspace)
                .delete(delete_workspace),
        )
        .route("/api/workspaces/{id}/info", get(get_workspace_info))
        .route(
            "/api/workspaces/{id}/reset-invite-code",
            post(reset_invite_code),
        )
        .route("/api/workspaces/{id}/join", post(join_workspace))
        .route("/api/workspaces/{id}/members", get(list_members))
        .route("/api/workspaces/{id}/projects", get(list_projects))
        .route("/api/workspaces/{id}/analytics", get(workspace_analytics))
        .route("/api/workspaces/{id}/board", get(get_board))
        .route("/api/workspaces/{id}/ws", get(ws::ws_handler))
        .route(
            "/api/members/{id}",
            axum::routing::patch(update_member).delete(delete_member),
        )
        .route("/api/projects", post(create_project))
        .route(
            "/api/projects/{id}",
            get(get_project).patch(update_project).delete(delete_project),
        )
        .route("/api/projects/{id}/analytics", get(project_analytics))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/bulk-update", post(bulk_update_tasks))
        .route(
            "/api/tasks/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route("/api/task-statuses", get(task_statuses))
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

// Workspaces

async fn list_workspaces(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let workspaces = state
        .db
        .call(move |db| db.list_workspaces_for_user(user.id))
        .await?;
    Ok(Json(Listing::all(workspaces)))
}

async fn create_workspace(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateWorkspaceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new = req.validate()?;
    let code = generate_invite_code(state.settings.invite_code_length);
    let workspace = state
        .db
        .call(move |db| db.create_workspace(user.id, &new, &code))
        .await?;
    tracing::info!(workspace_id = workspace.id, user_id = user.id, "Workspace created");
    Ok((StatusCode::CREATED, Json(workspace)))
}

async fn get_workspace(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let workspace = state
        .db
        .call(move |db| {
            db.require_member(id, user.id)?;
            db.require_workspace(id)
        })
        .await?;
    Ok(Json(workspace))
}

/// Public face of a workspace for the join screen; any signed-in user.
async fn get_workspace_info(
    State(state): State<SharedState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let workspace = state.db.call(move |db| db.require_workspace(id)).await?;
    Ok(Json(WorkspaceInfo::from(&workspace)))
}

async fn update_workspace(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateWorkspaceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let patch = req.validate()?;
    let workspace = state
        .db
        .call(move |db| {
            db.require_admin(id, user.id)?;
            db.update_workspace(id, &patch)
        })
        .await?;
    broadcast_message(
        &state.ws_tx,
        id,
        &WsMessage::WorkspaceUpdated {
            workspace: WorkspaceInfo::from(&workspace),
        },
    );
    Ok(Json(workspace))
}

async fn delete_workspace(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .call(move |db| {
            db.require_admin(id, user.id)?;
            db.delete_workspace(id)
        })
        .await?;
    tracing::info!(workspace_id = id, user_id = user.id, "Workspace deleted");
    broadcast_message(&state.ws_tx, id, &WsMessage::WorkspaceDeleted { workspace_id: id });
    Ok(StatusCode::NO_CONTENT)
}

async fn reset_invite_code(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let code = generate_invite_code(state.settings.invite_code_length);
    let workspace = state
        .db
        .call(move |db| {
            db.require_admin(id, user.id)?;
            db.reset_invite_code(id, &code)
        })
        .await?;
    tracing::info!(workspace_id = id, "Invite code reset");
    broadcast_message(&state.ws_tx, id, &WsMessage::InviteCodeReset { workspace_id: id });
    Ok(Json(workspace))
}

async fn join_workspace(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<JoinWorkspaceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let code = req.validate()?;
    let member = state
        .db
        .call(move |db| db.join_workspace(id, user.id, &code))
        .await?;
    tracing::info!(workspace_id = id, user_id = member.user_id, "Member joined");
    broadcast_message(
        &state.ws_tx,
        id,
        &WsMessage::MemberJoined {
            member: member.clone(),
        },
    );
    Ok((StatusCode::CREATED, Json(member)))
}

// Members

async fn list_members(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let members = state
        .db
        .call(move |db| {
            db.require_member(id, user.id)?;
            db.list_members(id)
        })
        .await?;
    Ok(Json(Listing::all(members)))
}

async fn update_member(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let role = req.validate()?;
    let member = state
        .db
        .call(move |db| {
            let target = db
                .get_member_by_id(id)?
                .ok_or(BoardError::MemberNotFound { id })?;
            db.require_admin(target.workspace_id, user.id)?;
            db.update_member_role(id, role)
        })
        .await?;
    broadcast_message(
        &state.ws_tx,
        member.workspace_id,
        &WsMessage::MemberUpdated {
            member: member.clone(),
        },
    );
    Ok(Json(member))
}

/// Admins remove anyone; everyone else may only remove themselves.
async fn delete_member(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = state
        .db
        .call(move |db| {
            let target = db
                .get_member_by_id(id)?
                .ok_or(BoardError::MemberNotFound { id })?;
            let caller = db.require_member(target.workspace_id, user.id)?;
            if caller.id != target.id && caller.role != MemberRole::Admin {
                return Err(BoardError::Forbidden.into());
            }
            db.delete_member(id)
        })
        .await?;
    broadcast_message(
        &state.ws_tx,
        removed.workspace_id,
        &WsMessage::MemberRemoved { member_id: removed.id },
    );
    Ok(StatusCode::NO_CONTENT)
}

// Projects

async fn list_projects(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let projects = state
        .db
        .call(move |db| {
            db.require_member(id, user.id)?;
            db.list_projects(id)
        })
        .await?;
    Ok(Json(Listing::all(projects)))
}

async fn create_project(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new = req.validate()?;
    let project = state
        .db
        .call(move |db| {
            db.require_member(new.workspace_id, user.id)?;
            db.create_project(&new)
        })
        .await?;
    broadcast_message(
        &state.ws_tx,
        project.workspace_id,
        &WsMessage::ProjectCreated {
            project: project.clone(),
        },
    );
    Ok((StatusCode::CREATED, Json(project)))
}

async fn get_project(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let project = state
        .db
        .call(move |db| {
            let project = db.require_project(id)?;
            db.require_member(project.workspace_id, user.id)?;
            Ok(project)
        })
        .await?;
    Ok(Json(project))
}

async fn update_project(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let patch = req.validate()?;
    let project = state
        .db
        .call(move |db| {
            let project = db.require_project(id)?;
            db.require_member(project.workspace_id, user.id)?;
            db.update_project(id, &patch)
        })
        .await?;
    broadcast_message(
        &state.ws_tx,
        project.workspace_id,
        &WsMessage::ProjectUpdated {
            project: project.clone(),
        },
    );
    Ok(Json(project))
}

async fn delete_project(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let workspace_id = state
        .db
        .call(move |db| {
            let project = db.require_project(id)?;
            db.require_member(project.workspace_id, user.id)?;
            db.delete_project(id)?;
            Ok(project.workspace_id)
        })
        .await?;
    broadcast_message(
        &state.ws_tx,
        workspace_id,
        &WsMessage::ProjectDeleted { project_id: id },
    );
    Ok(StatusCode::NO_CONTENT)
}

// Analytics

async fn workspace_analytics(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let analytics = state
        .db
        .call(move |db| {
            let member = db.require_member(id, user.id)?;
            let tasks = db.list_scope_tasks(id, None)?;
            Ok(analytics::compute(&tasks, Some(member.id), Utc::now()))
        })
        .await?;
    Ok(Json(analytics))
}

async fn project_analytics(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let analytics = state
        .db
        .call(move |db| {
            let project = db.require_project(id)?;
            let member = db.require_member(project.workspace_id, user.id)?;
            let tasks = db.list_scope_tasks(project.workspace_id, Some(id))?;
            Ok(analytics::compute(&tasks, Some(member.id), Utc::now()))
        })
        .await?;
    Ok(Json(analytics))
}

// Tasks

async fn list_tasks(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListTasksQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filters = query.validate()?;
    let tasks = state
        .db
        .call(move |db| {
            db.require_member(filters.workspace_id, user.id)?;
            db.list_tasks(&filters)
        })
        .await?;
    Ok(Json(Listing::all(tasks)))
}

async fn create_task(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new = req.validate()?;
    let task = state
        .db
        .call(move |db| {
            db.require_member(new.workspace_id, user.id)?;
            db.create_task(&new)
        })
        .await?;
    broadcast_message(
        &state.ws_tx,
        task.workspace_id,
        &WsMessage::TaskCreated { task: task.clone() },
    );
    Ok((StatusCode::CREATED, Json(task)))
}

async fn get_task(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state
        .db
        .call(move |db| {
            let detail = db
                .get_task_detail(id)?
                .ok_or(BoardError::TaskNotFound { id })?;
            db.require_member(detail.task.workspace_id, user.id)?;
            Ok(detail)
        })
        .await?;
    Ok(Json(detail))
}

async fn update_task(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let patch = req.validate()?;
    let task = state
        .db
        .call(move |db| {
            let task = db.require_task(id)?;
            db.require_member(task.workspace_id, user.id)?;
            db.update_task(id, &patch)
        })
        .await?;
    broadcast_message(
        &state.ws_tx,
        task.workspace_id,
        &WsMessage::TaskUpdated { task: task.clone() },
    );
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let workspace_id = state
        .db
        .call(move |db| {
            let task = db.require_task(id)?;
            db.require_member(task.workspace_id, user.id)?;
            db.delete_task(id)?;
            Ok(task.workspace_id)
        })
        .await?;
    broadcast_message(&state.ws_tx, workspace_id, &WsMessage::TaskDeleted { task_id: id });
    Ok(StatusCode::NO_CONTENT)
}

async fn bulk_update_tasks(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<BulkUpdateTasksRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let updates = req.validate()?;
    let (workspace_id, tasks) = state
        .db
        .call(move |db| {
            let ids: Vec<i64> = updates.iter().map(|u| u.id).collect();
            let workspace_id = db.workspace_of_tasks(&ids)?;
            db.require_member(workspace_id, user.id)?;
            Ok((workspace_id, db.bulk_update_tasks(&updates)?))
        })
        .await?;
    broadcast_message(
        &state.ws_tx,
        workspace_id,
        &WsMessage::TasksReordered {
            tasks: tasks.clone(),
        },
    );
    Ok(Json(Listing::all(tasks)))
}

#[derive(Debug, Default, Deserialize)]
struct BoardQuery {
    project_id: Option<i64>,
}

async fn get_board(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Query(query): Query<BoardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let board = state
        .db
        .call(move |db| {
            db.require_member(id, user.id)?;
            let mut filters = TaskFilters::workspace(id);
            if let Some(project_id) = query.project_id {
                let project = db.require_project(project_id)?;
                if project.workspace_id != id {
                    return Err(BoardError::ProjectNotFound { id: project_id }.into());
                }
                filters.project_id = Some(project_id);
            }
            let tasks = db.list_tasks(&filters)?;
            Ok(BoardView::from_tasks(id, query.project_id, tasks))
        })
        .await?;
    Ok(Json(board))
}

async fn task_statuses() -> Json<Vec<StatusDisplay>> {
    Json(TaskStatus::ALL.iter().map(TaskStatus::display).collect())
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    pub(crate) fn test_state() -> SharedState {
        let db = BoardDb::new_in_memory().unwrap();
        let (ws_tx, _) = broadcast::channel(16);
        Arc::new(AppState {
            db: DbHandle::new(db),
            ws_tx,
            settings: BoardSettings::default(),
        })
    }

    fn test_app() -> (Router, SharedState) {
        let state = test_state();
        let app = api_router().with_state(state.clone());
        (app, state)
    }

    pub(crate) async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn request(
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    /// Register a user and return the `name=value` session cookie.
    pub(crate) async fn sign_up(app: &Router, name: &str, email: &str) -> String {
        let resp = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/auth/register",
                None,
                Some(serde_json::json!({"name": name, "email": email, "password": "password123"})),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let set_cookie = resp
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        cookie: &str,
        body: Option<serde_json::Value>,
    ) -> Response {
        app.clone()
            .oneshot(request(method, uri, Some(cookie), body))
            .await
            .unwrap()
    }

    async fn create_workspace_as(app: &Router, cookie: &str, name: &str) -> serde_json::Value {
        let body = Some(serde_json::json!({"name": name}));
        let resp = send(app, "POST", "/api/workspaces", cookie, body).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await
    }

    /// Workspace + project + own member id, ready for task tests.
    async fn task_fixture(app: &Router, cookie: &str) -> (i64, i64, i64) {
        let ws = create_workspace_as(app, cookie, "Acme").await;
        let ws_id = ws["id"].as_i64().unwrap();
        let resp = send(
            app,
            "POST",
            "/api/projects",
            cookie,
            Some(serde_json::json!({"workspace_id": ws_id, "name": "Core"})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let project_id = body_json(resp).await["id"].as_i64().unwrap();
        let members_uri = format!("/api/workspaces/{}/members", ws_id);
        let members = body_json(send(app, "GET", &members_uri, cookie, None).await).await;
        let member_id = members["documents"][0]["id"].as_i64().unwrap();
        (ws_id, project_id, member_id)
    }

    fn task_body(
        ws: i64,
        project: i64,
        member: i64,
        name: &str,
        status: &str,
    ) -> serde_json::Value {
        serde_json::json!({
            "workspace_id": ws,
            "project_id": project,
            "assignee_id": member,
            "name": name,
            "status": status,
            "due_date": "2030-01-15",
        })
    }

    #[tokio::test]
    async fn test_health_check() {
        let (app, _) = test_app();
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_api_requires_session() {
        let (app, _) = test_app();
        let resp = app
            .oneshot(request("GET", "/api/workspaces", None, None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_register_login_logout_flow() {
        let (app, _) = test_app();
        let cookie = sign_up(&app, "Ada", "ada@example.com").await;

        let resp = send(&app, "GET", "/api/auth/current", &cookie, None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["email"], "ada@example.com");

        let resp = send(&app, "POST", "/api/auth/logout", &cookie, None).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let resp = send(&app, "GET", "/api/auth/current", &cookie, None).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/auth/login",
                None,
                Some(serde_json::json!({"email": "ADA@example.com", "password": "password123"})),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get(header::SET_COOKIE).is_some());
    }

    #[tokio::test]
    async fn test_login_rejects_bad_password_and_unknown_email_alike() {
        let (app, _) = test_app();
        sign_up(&app, "Ada", "ada@example.com").await;

        for body in [
            serde_json::json!({"email": "ada@example.com", "password": "wrongpass1"}),
            serde_json::json!({"email": "nobody@example.com", "password": "password123"}),
        ] {
            let resp = app
                .clone()
                .oneshot(request("POST", "/api/auth/login", None, Some(body)))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(body_json(resp).await["error"], "Invalid email or password");
        }
    }

    #[tokio::test]
    async fn test_register_validation_and_duplicates() {
        let (app, _) = test_app();
        let resp = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/auth/register",
                None,
                Some(serde_json::json!({
                    "name": "Ada",
                    "email": "ada@example.com",
                    "password": "short",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["field"], "password");
        assert_eq!(body["error"], "Minimum 8 characters required");

        sign_up(&app, "Ada", "ada@example.com").await;
        let resp = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/auth/register",
                None,
                Some(serde_json::json!({
                    "name": "Ada",
                    "email": "ada@example.com",
                    "password": "password123",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_create_workspace_requires_name() {
        let (app, _) = test_app();
        let cookie = sign_up(&app, "Ada", "ada@example.com").await;
        let body = Some(serde_json::json!({"name": "  "}));
        let resp = send(&app, "POST", "/api/workspaces", &cookie, body).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "Required");
        assert_eq!(body["field"], "name");
    }

    #[tokio::test]
    async fn test_invite_reset_and_join_flow() {
        let (app, _) = test_app();
        let admin = sign_up(&app, "Ada", "ada@example.com").await;
        let joiner = sign_up(&app, "Bob", "bob@example.com").await;

        let ws = create_workspace_as(&app, &admin, "Acme").await;
        let ws_id = ws["id"].as_i64().unwrap();
        let old_code = ws["invite_code"].as_str().unwrap().to_string();
        assert_eq!(old_code.len(), 10);

        // Only admins may reset.
        let reset_uri = format!("/api/workspaces/{}/reset-invite-code", ws_id);
        let resp = send(&app, "POST", &reset_uri, &joiner, None).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = send(&app, "POST", &reset_uri, &admin, None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let new_code = body_json(resp).await["invite_code"].as_str().unwrap().to_string();
        assert_ne!(new_code, old_code);

        let join_uri = format!("/api/workspaces/{}/join", ws_id);
        let old = Some(serde_json::json!({"code": old_code}));
        let resp = send(&app, "POST", &join_uri, &joiner, old).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "Invalid invite code");

        let new = serde_json::json!({"code": new_code});
        let resp = send(&app, "POST", &join_uri, &joiner, Some(new.clone())).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(body_json(resp).await["role"], "MEMBER");

        let resp = send(&app, "POST", &join_uri, &joiner, Some(new.clone())).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = send(&app, "POST", "/api/workspaces/999/join", &joiner, Some(new)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_workspace_info_open_to_non_members() {
        let (app, _) = test_app();
        let admin = sign_up(&app, "Ada", "ada@example.com").await;
        let outsider = sign_up(&app, "Eve", "eve@example.com").await;
        let ws_id = create_workspace_as(&app, &admin, "Acme").await["id"].as_i64().unwrap();

        let resp = send(&app, "GET", &format!("/api/workspaces/{}", ws_id), &outsider, None).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let info_uri = format!("/api/workspaces/{}/info", ws_id);
        let resp = send(&app, "GET", &info_uri, &outsider, None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let info = body_json(resp).await;
        assert_eq!(info["name"], "Acme");
        assert!(info.get("invite_code").is_none());
    }

    #[tokio::test]
    async fn test_non_admin_cannot_update_or_delete_workspace() {
        let (app, _) = test_app();
        let admin = sign_up(&app, "Ada", "ada@example.com").await;
        let bob = sign_up(&app, "Bob", "bob@example.com").await;
        let ws = create_workspace_as(&app, &admin, "Acme").await;
        let ws_id = ws["id"].as_i64().unwrap();
        let join_uri = format!("/api/workspaces/{}/join", ws_id);
        let code = Some(serde_json::json!({"code": ws["invite_code"]}));
        send(&app, "POST", &join_uri, &bob, code).await;

        let uri = format!("/api/workspaces/{}", ws_id);
        let rename = Some(serde_json::json!({"name": "Hijacked"}));
        let resp = send(&app, "PATCH", &uri, &bob, rename).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let resp = send(&app, "DELETE", &uri, &bob, None).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let rename = Some(serde_json::json!({"name": "Acme Corp", "image_url": ""}));
        let resp = send(&app, "PATCH", &uri, &admin, rename).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["name"], "Acme Corp");
        assert!(body["image_url"].is_null());

        let resp = send(&app, "DELETE", &uri, &admin, None).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let resp = send(&app, "GET", &uri, &admin, None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_member_management() {
        let (app, _) = test_app();
        let admin = sign_up(&app, "Ada", "ada@example.com").await;
        let bob = sign_up(&app, "Bob", "bob@example.com").await;
        let ws = create_workspace_as(&app, &admin, "Acme").await;
        let ws_id = ws["id"].as_i64().unwrap();

        let members_uri = format!("/api/workspaces/{}/members", ws_id);
        let members = body_json(send(&app, "GET", &members_uri, &admin, None).await).await;
        let admin_member = members["documents"][0]["id"].as_i64().unwrap();

        let admin_uri = format!("/api/members/{}", admin_member);
        let demote = serde_json::json!({"role": "MEMBER"});
        let promote = serde_json::json!({"role": "ADMIN"});

        // The only member can neither leave nor be downgraded.
        let resp = send(&app, "DELETE", &admin_uri, &admin, None).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let resp = send(&app, "PATCH", &admin_uri, &admin, Some(demote)).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let join_uri = format!("/api/workspaces/{}/join", ws_id);
        let code = Some(serde_json::json!({"code": ws["invite_code"]}));
        let joined = body_json(send(&app, "POST", &join_uri, &bob, code).await).await;
        let bob_member = joined["id"].as_i64().unwrap();
        let bob_uri = format!("/api/members/{}", bob_member);

        // A plain member cannot promote themselves or remove others.
        let resp = send(&app, "PATCH", &bob_uri, &bob, Some(promote.clone())).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let resp = send(&app, "DELETE", &admin_uri, &bob, None).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = send(&app, "PATCH", &bob_uri, &admin, Some(promote)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["role"], "ADMIN");

        // Members may leave.
        let resp = send(&app, "DELETE", &bob_uri, &bob, None).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let members = body_json(send(&app, "GET", &members_uri, &admin, None).await).await;
        assert_eq!(members["total"], 1);
    }

    #[tokio::test]
    async fn test_last_admin_cannot_leave_while_members_remain() {
        let (app, _) = test_app();
        let admin = sign_up(&app, "Ada", "ada@example.com").await;
        let bob = sign_up(&app, "Bob", "bob@example.com").await;
        let ws = create_workspace_as(&app, &admin, "Acme").await;
        let ws_id = ws["id"].as_i64().unwrap();

        let join_uri = format!("/api/workspaces/{}/join", ws_id);
        let code = Some(serde_json::json!({"code": ws["invite_code"]}));
        let joined = body_json(send(&app, "POST", &join_uri, &bob, code).await).await;
        let bob_member = joined["id"].as_i64().unwrap();

        let members_uri = format!("/api/workspaces/{}/members", ws_id);
        let members = body_json(send(&app, "GET", &members_uri, &admin, None).await).await;
        let admin_member = members["documents"]
            .as_array()
            .unwrap()
            .iter()
            .find(|m| m["role"] == "ADMIN")
            .and_then(|m| m["id"].as_i64())
            .unwrap();
        let admin_uri = format!("/api/members/{}", admin_member);

        let resp = send(&app, "DELETE", &admin_uri, &admin, None).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let demote = Some(serde_json::json!({"role": "MEMBER"}));
        let resp = send(&app, "PATCH", &admin_uri, &admin, demote).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        // The workspace stays administrable.
        let promote = Some(serde_json::json!({"role": "ADMIN"}));
        let bob_uri = format!("/api/members/{}", bob_member);
        let resp = send(&app, "PATCH", &bob_uri, &admin, promote).await;
        assert_eq!(resp.status(), StatusCode::OK);

        // Once another admin exists the first one may leave.
        let resp = send(&app, "DELETE", &admin_uri, &admin, None).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let members = body_json(send(&app, "GET", &members_uri, &bob, None).await).await;
        assert_eq!(members["total"], 1);
        assert_eq!(members["documents"][0]["role"], "ADMIN");
    }

    #[tokio::test]
    async fn test_project_crud_and_listing() {
        let (app, _) = test_app();
        let cookie = sign_up(&app, "Ada", "ada@example.com").await;
        let (ws_id, project_id, _) = task_fixture(&app, &cookie).await;

        let uri = format!("/api/projects/{}", project_id);
        let rename = Some(serde_json::json!({"name": "Core 2"}));
        let resp = send(&app, "PATCH", &uri, &cookie, rename).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["name"], "Core 2");

        let list_uri = format!("/api/workspaces/{}/projects", ws_id);
        let list = body_json(send(&app, "GET", &list_uri, &cookie, None).await).await;
        assert_eq!(list["total"], 1);
        assert_eq!(list["documents"][0]["name"], "Core 2");

        let resp = send(&app, "DELETE", &uri, &cookie, None).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let resp = send(&app, "GET", &uri, &cookie, None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_outsider_cannot_touch_projects() {
        let (app, _) = test_app();
        let cookie = sign_up(&app, "Ada", "ada@example.com").await;
        let outsider = sign_up(&app, "Eve", "eve@example.com").await;
        let (ws_id, project_id, _) = task_fixture(&app, &cookie).await;

        let uri = format!("/api/projects/{}", project_id);
        let resp = send(&app, "GET", &uri, &outsider, None).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body = Some(serde_json::json!({"workspace_id": ws_id, "name": "Mine"}));
        let resp = send(&app, "POST", "/api/projects", &outsider, body).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_create_task_validation() {
        let (app, _) = test_app();
        let cookie = sign_up(&app, "Ada", "ada@example.com").await;
        let (ws_id, project_id, _) = task_fixture(&app, &cookie).await;

        let resp = send(
            &app,
            "POST",
            "/api/tasks",
            &cookie,
            Some(serde_json::json!({
                "workspace_id": ws_id,
                "project_id": project_id,
                "name": "x",
                "status": "TODO",
                "due_date": "2030-01-01",
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["field"], "assignee_id");
        assert_eq!(body["error"], "Required");
    }

    #[tokio::test]
    async fn test_task_positions_listing_and_board() {
        let (app, _) = test_app();
        let cookie = sign_up(&app, "Ada", "ada@example.com").await;
        let (ws_id, project_id, member_id) = task_fixture(&app, &cookie).await;

        let mut ids = Vec::new();
        for (name, status) in [("First", "TODO"), ("Second", "TODO"), ("Shipped", "DONE")] {
            let body = task_body(ws_id, project_id, member_id, name, status);
            let resp = send(&app, "POST", "/api/tasks", &cookie, Some(body)).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
            let task = body_json(resp).await;
            ids.push((task["id"].as_i64().unwrap(), task["position"].as_i64().unwrap()));
        }
        assert_eq!(ids[0].1, 1000);
        assert_eq!(ids[1].1, 2000);
        assert_eq!(ids[2].1, 1000);

        let todo_uri = format!("/api/tasks?workspace_id={}&status=TODO", ws_id);
        let list = body_json(send(&app, "GET", &todo_uri, &cookie, None).await).await;
        assert_eq!(list["total"], 2);
        assert_eq!(list["documents"][0]["name"], "Second");
        assert_eq!(list["documents"][0]["project"]["name"], "Core");
        assert_eq!(list["documents"][0]["assignee"]["name"], "Ada");

        let search_uri = format!("/api/tasks?workspace_id={}&search=ship", ws_id);
        let search = body_json(send(&app, "GET", &search_uri, &cookie, None).await).await;
        assert_eq!(search["total"], 1);

        let board_uri = format!("/api/workspaces/{}/board", ws_id);
        let board = body_json(send(&app, "GET", &board_uri, &cookie, None).await).await;
        let columns = board["columns"].as_array().unwrap();
        assert_eq!(columns.len(), 5);
        assert_eq!(columns[1]["status"], "TODO");
        assert_eq!(columns[1]["count"], 2);
        assert_eq!(columns[1]["tasks"][0]["name"], "First");
        assert_eq!(columns[4]["label"], "Done");
    }

    #[tokio::test]
    async fn test_board_rejects_project_from_other_workspace() {
        let (app, _) = test_app();
        let cookie = sign_up(&app, "Ada", "ada@example.com").await;
        let (ws_id, _, _) = task_fixture(&app, &cookie).await;
        let (_, other_project, _) = task_fixture(&app, &cookie).await;

        let resp = send(
            &app,
            "GET",
            &format!("/api/workspaces/{}/board?project_id={}", ws_id, other_project),
            &cookie,
            None,
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bulk_update_rules() {
        let (app, _) = test_app();
        let cookie = sign_up(&app, "Ada", "ada@example.com").await;
        let (ws_id, project_id, member_id) = task_fixture(&app, &cookie).await;
        let body = task_body(ws_id, project_id, member_id, "Move me", "TODO");
        let task = body_json(send(&app, "POST", "/api/tasks", &cookie, Some(body)).await).await;
        let task_id = task["id"].as_i64().unwrap();

        let resp = send(
            &app,
            "POST",
            "/api/tasks/bulk-update",
            &cookie,
            Some(serde_json::json!({
                "tasks": [{"id": task_id, "status": "DONE", "position": 2_000_000}],
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = send(
            &app,
            "POST",
            "/api/tasks/bulk-update",
            &cookie,
            Some(serde_json::json!({
                "tasks": [{"id": task_id, "status": "IN_REVIEW", "position": 3000}],
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["documents"][0]["status"], "IN_REVIEW");
        assert_eq!(body["documents"][0]["position"], 3000);

        // Another user's workspace cannot be reordered.
        let outsider = sign_up(&app, "Eve", "eve@example.com").await;
        let resp = send(
            &app,
            "POST",
            "/api/tasks/bulk-update",
            &outsider,
            Some(serde_json::json!({
                "tasks": [{"id": task_id, "status": "DONE", "position": 1000}],
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_task_get_update_delete() {
        let (app, _) = test_app();
        let cookie = sign_up(&app, "Ada", "ada@example.com").await;
        let (ws_id, project_id, member_id) = task_fixture(&app, &cookie).await;
        let body = task_body(ws_id, project_id, member_id, "Draft", "BACKLOG");
        let task = body_json(send(&app, "POST", "/api/tasks", &cookie, Some(body)).await).await;
        let uri = format!("/api/tasks/{}", task["id"]);

        let detail = body_json(send(&app, "GET", &uri, &cookie, None).await).await;
        assert_eq!(detail["project"]["id"], project_id);

        let patch = Some(serde_json::json!({"status": "IN_PROGRESS", "description": "notes"}));
        let resp = send(&app, "PATCH", &uri, &cookie, patch).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let updated = body_json(resp).await;
        assert_eq!(updated["status"], "IN_PROGRESS");
        assert_eq!(updated["position"], task["position"]);

        let resp = send(&app, "DELETE", &uri, &cookie, None).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let resp = send(&app, "GET", &uri, &cookie, None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_analytics_endpoints() {
        let (app, _) = test_app();
        let cookie = sign_up(&app, "Ada", "ada@example.com").await;
        let (ws_id, project_id, member_id) = task_fixture(&app, &cookie).await;
        for (name, status) in [("One", "DONE"), ("Two", "TODO")] {
            let body = task_body(ws_id, project_id, member_id, name, status);
            send(&app, "POST", "/api/tasks", &cookie, Some(body)).await;
        }

        let ws_uri = format!("/api/workspaces/{}/analytics", ws_id);
        let ws_analytics = body_json(send(&app, "GET", &ws_uri, &cookie, None).await).await;
        assert_eq!(ws_analytics["task_count"], 2);
        assert_eq!(ws_analytics["assigned_task_count"], 2);
        assert_eq!(ws_analytics["completed_task_count"], 1);
        assert_eq!(ws_analytics["incomplete_task_count"], 1);
        assert_eq!(ws_analytics["overdue_task_count"], 0);

        let project_uri = format!("/api/projects/{}/analytics", project_id);
        let project_analytics =
            body_json(send(&app, "GET", &project_uri, &cookie, None).await).await;
        assert_eq!(project_analytics["task_count"], 2);
    }

    #[tokio::test]
    async fn test_task_statuses_metadata() {
        let (app, _) = test_app();
        let resp = app
            .oneshot(request("GET", "/api/task-statuses", None, None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body[0]["status"], "BACKLOG");
        assert_eq!(body[0]["color"], "pink");
        assert_eq!(body[2]["label"], "In Progress");
        assert_eq!(body[4]["icon"], "circle-check");
    }

    #[tokio::test]
    async fn test_mutations_are_broadcast_to_workspace() {
        let (app, state) = test_app();
        let cookie = sign_up(&app, "Ada", "ada@example.com").await;
        let (ws_id, project_id, member_id) = task_fixture(&app, &cookie).await;
        let mut rx = state.ws_tx.subscribe();

        let body = task_body(ws_id, project_id, member_id, "Live", "TODO");
        send(&app, "POST", "/api/tasks", &cookie, Some(body)).await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.workspace_id, ws_id);
        let msg: serde_json::Value = serde_json::from_str(&event.payload).unwrap();
        assert_eq!(msg["type"], "TaskCreated");
        assert_eq!(msg["data"]["task"]["name"], "Live");
    }

    #[test]
    fn test_api_error_mapping() {
        let cases = [
            (BoardError::TaskNotFound { id: 1 }, StatusCode::NOT_FOUND),
            (BoardError::Unauthorized, StatusCode::UNAUTHORIZED),
            (BoardError::Forbidden, StatusCode::FORBIDDEN),
            (BoardError::InvalidInviteCode, StatusCode::BAD_REQUEST),
            (BoardError::AlreadyMember, StatusCode::CONFLICT),
            (BoardError::LastMember, StatusCode::CONFLICT),
            (BoardError::LastAdmin, StatusCode::CONFLICT),
            (BoardError::LockPoisoned, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            let resp = ApiError::from(anyhow::Error::from(err)).into_response();
            assert_eq!(resp.status(), status);
        }
    }

    #[test]
    fn test_board_settings_from_config() {
        let mut toml = PlanboardToml::default();
        toml.server.public_url = Some("https://board.example.com/".to_string());
        toml.auth.session_ttl_hours = 2;
        let settings = BoardSettings::from_config(&toml);
        assert_eq!(settings.public_url, "https://board.example.com");
        assert_eq!(settings.auth.session_ttl, chrono::Duration::hours(2));
        assert_eq!(settings.invite_code_length, 10);
    }
}
