use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter, types::Value};

use planboard_common::schemas::{
    BulkTaskUpdate, NewProject, NewTask, NewWorkspace, ProjectPatch, TaskPatch, WorkspacePatch,
};

use super::models::*;
use crate::errors::BoardError;

/// Async-safe handle to the board database.
///
/// Wraps `BoardDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`, so synchronous SQLite I/O never
/// ties up async worker threads. One `call` holds the lock for its whole
/// closure, so several reads and writes inside it see a consistent store.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<BoardDb>>,
}

impl DbHandle {
    pub fn new(db: BoardDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&BoardDb) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db.lock().map_err(|_| BoardError::LockPoisoned)?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }
}

/// Fixed-width UTC timestamp as stored in every `*_at` column. Fixed width
/// keeps string comparison in SQL equal to time comparison.
pub fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid timestamp in database: {}", s))
}

fn opt_text(value: &Option<String>) -> Value {
    match value {
        Some(v) => Value::Text(v.clone()),
        None => Value::Null,
    }
}

/// Escape `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'`.
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

const USER_COLUMNS: &str = "u.id, u.name, u.email, u.created_at";
const WORKSPACE_COLUMNS: &str =
    "w.id, w.name, w.image_url, w.invite_code, w.user_id, w.created_at, w.updated_at";
const MEMBER_SELECT: &str = "SELECT m.id, m.workspace_id, m.user_id, m.role, u.name, u.email, m.created_at
     FROM members m JOIN users u ON u.id = m.user_id";
const PROJECT_COLUMNS: &str = "p.id, p.workspace_id, p.name, p.image_url, p.created_at, p.updated_at";
const TASK_COLUMNS: &str = "t.id, t.workspace_id, t.project_id, t.assignee_id, t.name, t.description, t.due_date, t.status, t.position, t.created_at, t.updated_at";
const TASK_DETAIL_SELECT: &str = "SELECT t.id, t.workspace_id, t.project_id, t.assignee_id, t.name, t.description, t.due_date, t.status, t.position, t.created_at, t.updated_at,
            p.id, p.name, p.image_url,
            m.id, m.user_id, u.name, u.email
     FROM tasks t
     JOIN projects p ON p.id = t.project_id
     LEFT JOIN members m ON m.id = t.assignee_id
     LEFT JOIN users u ON u.id = m.user_id";

pub struct BoardDb {
    conn: Connection,
}

impl BoardDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| {
            BoardError::Database(anyhow::Error::new(e).context(format!(
                "Failed to open SQLite database at {}",
                path.display()
            )))
        })?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| BoardError::Database(anyhow::Error::new(e)))?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        self.run_migrations().context("Failed to run migrations")?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                    password_hash TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS sessions (
                    token_hash TEXT PRIMARY KEY,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    created_at TEXT NOT NULL,
                    expires_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS workspaces (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    image_url TEXT,
                    invite_code TEXT NOT NULL,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS members (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    workspace_id INTEGER NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    role TEXT NOT NULL DEFAULT 'MEMBER',
                    created_at TEXT NOT NULL,
                    UNIQUE(workspace_id, user_id)
                );

                CREATE TABLE IF NOT EXISTS projects (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    workspace_id INTEGER NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    image_url TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS tasks (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    workspace_id INTEGER NOT NULL REFERENCES workspaces(id) ON DELETE CASCADE,
                    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                    assignee_id INTEGER REFERENCES members(id) ON DELETE SET NULL,
                    name TEXT NOT NULL,
                    description TEXT,
                    due_date TEXT NOT NULL,
                    status TEXT NOT NULL DEFAULT 'BACKLOG',
                    position INTEGER NOT NULL DEFAULT 1000,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
                CREATE INDEX IF NOT EXISTS idx_members_user ON members(user_id);
                CREATE INDEX IF NOT EXISTS idx_projects_workspace ON projects(workspace_id);
                CREATE INDEX IF NOT EXISTS idx_tasks_column ON tasks(workspace_id, status, position);
                CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id);
                CREATE INDEX IF NOT EXISTS idx_tasks_assignee ON tasks(assignee_id);
                ",
            )
            .context("Failed to create tables")?;
        Ok(())
    }

    // ── Users & sessions ──────────────────────────────────────────────

    pub fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        let taken: bool = self
            .conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM users WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .context("Failed to check email")?;
        if taken {
            return Err(BoardError::EmailTaken.into());
        }
        self.conn
            .execute(
                "INSERT INTO users (name, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![name, email, password_hash, timestamp(Utc::now())],
            )
            .context("Failed to insert user")?;
        let id = self.conn.last_insert_rowid();
        self.get_user(id)?.context("User not found after insert")
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM users u WHERE u.id = ?1", USER_COLUMNS),
                params![id],
                UserRow::from_row,
            )
            .optional()
            .context("Failed to query user")?;
        row.map(UserRow::into_user).transpose()
    }

    /// The user registered under `email` together with their password hash.
    pub fn find_user_credentials(&self, email: &str) -> Result<Option<(User, String)>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {}, u.password_hash FROM users u WHERE u.email = ?1",
                    USER_COLUMNS
                ),
                params![email],
                |row| Ok((UserRow::from_row(row)?, row.get::<_, String>(4)?)),
            )
            .optional()
            .context("Failed to query user credentials")?;
        match row {
            Some((user, hash)) => Ok(Some((user.into_user()?, hash))),
            None => Ok(None),
        }
    }

    pub fn create_session(
        &self,
        token_hash: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO sessions (token_hash, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
                params![token_hash, user_id, timestamp(Utc::now()), timestamp(expires_at)],
            )
            .context("Failed to insert session")?;
        Ok(())
    }

    /// Resolve a session to its user. An expired session is deleted and
    /// reported as absent.
    pub fn get_session_user(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<User>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {}, s.expires_at FROM sessions s JOIN users u ON u.id = s.user_id
                     WHERE s.token_hash = ?1",
                    USER_COLUMNS
                ),
                params![token_hash],
                |row| Ok((UserRow::from_row(row)?, row.get::<_, String>(4)?)),
            )
            .optional()
            .context("Failed to query session")?;
        let Some((user, expires_at)) = row else {
            return Ok(None);
        };
        if parse_timestamp(&expires_at)? <= now {
            self.delete_session(token_hash)?;
            return Ok(None);
        }
        Ok(Some(user.into_user()?))
    }

    pub fn delete_session(&self, token_hash: &str) -> Result<bool> {
        let count = self
            .conn
            .execute("DELETE FROM sessions WHERE token_hash = ?1", params![token_hash])
            .context("Failed to delete session")?;
        Ok(count > 0)
    }

    pub fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        self.conn
            .execute(
                "DELETE FROM sessions WHERE expires_at <= ?1",
                params![timestamp(now)],
            )
            .context("Failed to purge expired sessions")
    }

    // ── Workspaces ────────────────────────────────────────────────────

    /// Create a workspace and make its creator the first admin.
    pub fn create_workspace(
        &self,
        user_id: i64,
        new: &NewWorkspace,
        invite_code: &str,
    ) -> Result<Workspace> {
        // Safety: DbHandle's Mutex already guarantees single-threaded access.
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        let now = timestamp(Utc::now());
        tx.execute(
            "INSERT INTO workspaces (name, image_url, invite_code, user_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![new.name, new.image_url, invite_code, user_id, now],
        )
        .context("Failed to insert workspace")?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO members (workspace_id, user_id, role, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![id, user_id, MemberRole::Admin.as_str(), now],
        )
        .context("Failed to insert creator membership")?;
        tx.commit().context("Failed to commit workspace creation")?;
        self.get_workspace(id)?
            .context("Workspace not found after insert")
    }

    /// Workspaces `user_id` belongs to, newest first.
    pub fn list_workspaces_for_user(&self, user_id: i64) -> Result<Vec<Workspace>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM workspaces w JOIN members m ON m.workspace_id = w.id
                 WHERE m.user_id = ?1 ORDER BY w.created_at DESC, w.id DESC",
                WORKSPACE_COLUMNS
            ))
            .context("Failed to prepare list_workspaces_for_user")?;
        let rows = stmt
            .query_map(params![user_id], WorkspaceRow::from_row)
            .context("Failed to query workspaces")?;
        let mut workspaces = Vec::new();
        for row in rows {
            let r = row.context("Failed to read workspace row")?;
            workspaces.push(r.into_workspace()?);
        }
        Ok(workspaces)
    }

    pub fn get_workspace(&self, id: i64) -> Result<Option<Workspace>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM workspaces w WHERE w.id = ?1", WORKSPACE_COLUMNS),
                params![id],
                WorkspaceRow::from_row,
            )
            .optional()
            .context("Failed to query workspace")?;
        row.map(WorkspaceRow::into_workspace).transpose()
    }

    pub fn require_workspace(&self, id: i64) -> Result<Workspace> {
        self.get_workspace(id)?
            .ok_or_else(|| BoardError::WorkspaceNotFound { id }.into())
    }

    pub fn update_workspace(&self, id: i64, patch: &WorkspacePatch) -> Result<Workspace> {
        let mut sets = vec!["updated_at = ?"];
        let mut args = vec![Value::Text(timestamp(Utc::now()))];
        if let Some(ref name) = patch.name {
            sets.push("name = ?");
            args.push(Value::Text(name.clone()));
        }
        if let Some(ref image_url) = patch.image_url {
            sets.push("image_url = ?");
            args.push(opt_text(image_url));
        }
        args.push(Value::Integer(id));
        let count = self
            .conn
            .execute(
                &format!("UPDATE workspaces SET {} WHERE id = ?", sets.join(", ")),
                params_from_iter(args),
            )
            .context("Failed to update workspace")?;
        if count == 0 {
            return Err(BoardError::WorkspaceNotFound { id }.into());
        }
        self.require_workspace(id)
    }

    /// Delete a workspace; members, projects and tasks go with it.
    pub fn delete_workspace(&self, id: i64) -> Result<bool> {
        let count = self
            .conn
            .execute("DELETE FROM workspaces WHERE id = ?1", params![id])
            .context("Failed to delete workspace")?;
        Ok(count > 0)
    }

    /// Replace the invite code. Links carrying the old code stop working.
    pub fn reset_invite_code(&self, id: i64, invite_code: &str) -> Result<Workspace> {
        let count = self
            .conn
            .execute(
                "UPDATE workspaces SET invite_code = ?1, updated_at = ?2 WHERE id = ?3",
                params![invite_code, timestamp(Utc::now()), id],
            )
            .context("Failed to reset invite code")?;
        if count == 0 {
            return Err(BoardError::WorkspaceNotFound { id }.into());
        }
        self.require_workspace(id)
    }

    /// Add `user_id` as a plain member if `code` is the current invite code.
    pub fn join_workspace(&self, workspace_id: i64, user_id: i64, code: &str) -> Result<Member> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        let workspace = self.require_workspace(workspace_id)?;
        if self.get_member(workspace_id, user_id)?.is_some() {
            return Err(BoardError::AlreadyMember.into());
        }
        if workspace.invite_code != code {
            return Err(BoardError::InvalidInviteCode.into());
        }
        tx.execute(
            "INSERT INTO members (workspace_id, user_id, role, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![workspace_id, user_id, MemberRole::Member.as_str(), timestamp(Utc::now())],
        )
        .context("Failed to insert membership")?;
        let id = tx.last_insert_rowid();
        tx.commit().context("Failed to commit join")?;
        self.get_member_by_id(id)?
            .context("Member not found after join")
    }

    // ── Members ───────────────────────────────────────────────────────

    pub fn get_member(&self, workspace_id: i64, user_id: i64) -> Result<Option<Member>> {
        let row = self
            .conn
            .query_row(
                &format!("{} WHERE m.workspace_id = ?1 AND m.user_id = ?2", MEMBER_SELECT),
                params![workspace_id, user_id],
                MemberRow::from_row,
            )
            .optional()
            .context("Failed to query member")?;
        row.map(MemberRow::into_member).transpose()
    }

    pub fn get_member_by_id(&self, id: i64) -> Result<Option<Member>> {
        let row = self
            .conn
            .query_row(
                &format!("{} WHERE m.id = ?1", MEMBER_SELECT),
                params![id],
                MemberRow::from_row,
            )
            .optional()
            .context("Failed to query member")?;
        row.map(MemberRow::into_member).transpose()
    }

    /// Members of a workspace, oldest membership first.
    pub fn list_members(&self, workspace_id: i64) -> Result<Vec<Member>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "{} WHERE m.workspace_id = ?1 ORDER BY m.created_at, m.id",
                MEMBER_SELECT
            ))
            .context("Failed to prepare list_members")?;
        let rows = stmt
            .query_map(params![workspace_id], MemberRow::from_row)
            .context("Failed to query members")?;
        let mut members = Vec::new();
        for row in rows {
            let r = row.context("Failed to read member row")?;
            members.push(r.into_member()?);
        }
        Ok(members)
    }

    /// The caller's membership, or `WorkspaceNotFound` / `Forbidden`.
    pub fn require_member(&self, workspace_id: i64, user_id: i64) -> Result<Member> {
        self.require_workspace(workspace_id)?;
        self.get_member(workspace_id, user_id)?
            .ok_or_else(|| BoardError::Forbidden.into())
    }

    pub fn require_admin(&self, workspace_id: i64, user_id: i64) -> Result<Member> {
        let member = self.require_member(workspace_id, user_id)?;
        if member.role != MemberRole::Admin {
            return Err(BoardError::Forbidden.into());
        }
        Ok(member)
    }

    pub fn count_members(&self, workspace_id: i64) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM members WHERE workspace_id = ?1",
                params![workspace_id],
                |row| row.get(0),
            )
            .context("Failed to count members")
    }

    pub fn count_admins(&self, workspace_id: i64) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM members WHERE workspace_id = ?1 AND role = ?2",
                params![workspace_id, MemberRole::Admin.as_str()],
                |row| row.get(0),
            )
            .context("Failed to count admins")
    }

    /// Fail when removing `member`'s admin rights would leave its workspace
    /// with no member, or with no admin.
    fn check_keeps_admin(&self, member: &Member) -> Result<()> {
        if self.count_members(member.workspace_id)? <= 1 {
            return Err(BoardError::LastMember.into());
        }
        if member.role == MemberRole::Admin && self.count_admins(member.workspace_id)? <= 1 {
            return Err(BoardError::LastAdmin.into());
        }
        Ok(())
    }

    pub fn update_member_role(&self, id: i64, role: MemberRole) -> Result<Member> {
        let member = self
            .get_member_by_id(id)?
            .ok_or(BoardError::MemberNotFound { id })?;
        if role == MemberRole::Member {
            self.check_keeps_admin(&member)?;
        }
        self.conn
            .execute(
                "UPDATE members SET role = ?1 WHERE id = ?2",
                params![role.as_str(), id],
            )
            .context("Failed to update member role")?;
        self.get_member_by_id(id)?
            .context("Member not found after update")
    }

    /// Remove a membership. Tasks assigned to it become unassigned.
    pub fn delete_member(&self, id: i64) -> Result<Member> {
        let member = self
            .get_member_by_id(id)?
            .ok_or(BoardError::MemberNotFound { id })?;
        self.check_keeps_admin(&member)?;
        self.conn
            .execute("DELETE FROM members WHERE id = ?1", params![id])
            .context("Failed to delete member")?;
        Ok(member)
    }

    // ── Projects ──────────────────────────────────────────────────────

    pub fn create_project(&self, new: &NewProject) -> Result<Project> {
        let now = timestamp(Utc::now());
        self.conn
            .execute(
                "INSERT INTO projects (workspace_id, name, image_url, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![new.workspace_id, new.name, new.image_url, now],
            )
            .context("Failed to insert project")?;
        let id = self.conn.last_insert_rowid();
        self.get_project(id)?.context("Project not found after insert")
    }

    /// Projects of a workspace, newest first.
    pub fn list_projects(&self, workspace_id: i64) -> Result<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM projects p WHERE p.workspace_id = ?1
                 ORDER BY p.created_at DESC, p.id DESC",
                PROJECT_COLUMNS
            ))
            .context("Failed to prepare list_projects")?;
        let rows = stmt
            .query_map(params![workspace_id], ProjectRow::from_row)
            .context("Failed to query projects")?;
        let mut projects = Vec::new();
        for row in rows {
            let r = row.context("Failed to read project row")?;
            projects.push(r.into_project()?);
        }
        Ok(projects)
    }

    pub fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM projects p WHERE p.id = ?1", PROJECT_COLUMNS),
                params![id],
                ProjectRow::from_row,
            )
            .optional()
            .context("Failed to query project")?;
        row.map(ProjectRow::into_project).transpose()
    }

    pub fn require_project(&self, id: i64) -> Result<Project> {
        self.get_project(id)?
            .ok_or_else(|| BoardError::ProjectNotFound { id }.into())
    }

    pub fn update_project(&self, id: i64, patch: &ProjectPatch) -> Result<Project> {
        let mut sets = vec!["updated_at = ?"];
        let mut args = vec![Value::Text(timestamp(Utc::now()))];
        if let Some(ref name) = patch.name {
            sets.push("name = ?");
            args.push(Value::Text(name.clone()));
        }
        if let Some(ref image_url) = patch.image_url {
            sets.push("image_url = ?");
            args.push(opt_text(image_url));
        }
        args.push(Value::Integer(id));
        let count = self
            .conn
            .execute(
                &format!("UPDATE projects SET {} WHERE id = ?", sets.join(", ")),
                params_from_iter(args),
            )
            .context("Failed to update project")?;
        if count == 0 {
            return Err(BoardError::ProjectNotFound { id }.into());
        }
        self.require_project(id)
    }

    /// Delete a project and its tasks.
    pub fn delete_project(&self, id: i64) -> Result<bool> {
        let count = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1", params![id])
            .context("Failed to delete project")?;
        Ok(count > 0)
    }

    // ── Tasks ─────────────────────────────────────────────────────────

    fn check_project_in_workspace(&self, project_id: i64, workspace_id: i64) -> Result<()> {
        let owner: Option<i64> = self
            .conn
            .query_row(
                "SELECT workspace_id FROM projects WHERE id = ?1",
                params![project_id],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query project workspace")?;
        if owner != Some(workspace_id) {
            return Err(
                BoardError::invalid("project_id", "Project does not belong to this workspace")
                    .into(),
            );
        }
        Ok(())
    }

    fn check_assignee_in_workspace(&self, member_id: i64, workspace_id: i64) -> Result<()> {
        let owner: Option<i64> = self
            .conn
            .query_row(
                "SELECT workspace_id FROM members WHERE id = ?1",
                params![member_id],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to query assignee workspace")?;
        if owner != Some(workspace_id) {
            return Err(BoardError::invalid(
                "assignee_id",
                "Assignee is not a member of this workspace",
            )
            .into());
        }
        Ok(())
    }

    /// Create a task at the bottom of its status column.
    pub fn create_task(&self, new: &NewTask) -> Result<Task> {
        self.check_project_in_workspace(new.project_id, new.workspace_id)?;
        self.check_assignee_in_workspace(new.assignee_id, new.workspace_id)?;

        let position: i64 = self
            .conn
            .query_row(
                "SELECT COALESCE(MAX(position), 0) + 1000 FROM tasks WHERE workspace_id = ?1 AND status = ?2",
                params![new.workspace_id, new.status.as_str()],
                |row| row.get(0),
            )
            .context("Failed to get max position")?;

        let now = timestamp(Utc::now());
        self.conn
            .execute(
                "INSERT INTO tasks (workspace_id, project_id, assignee_id, name, description, due_date, status, position, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                params![
                    new.workspace_id,
                    new.project_id,
                    new.assignee_id,
                    new.name,
                    new.description,
                    timestamp(new.due_date),
                    new.status.as_str(),
                    position,
                    now
                ],
            )
            .context("Failed to insert task")?;
        let id = self.conn.last_insert_rowid();
        self.get_task(id)?.context("Task not found after insert")
    }

    pub fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM tasks t WHERE t.id = ?1", TASK_COLUMNS),
                params![id],
                TaskRow::from_row,
            )
            .optional()
            .context("Failed to query task")?;
        row.map(TaskRow::into_task).transpose()
    }

    pub fn require_task(&self, id: i64) -> Result<Task> {
        self.get_task(id)?
            .ok_or_else(|| BoardError::TaskNotFound { id }.into())
    }

    pub fn get_task_detail(&self, id: i64) -> Result<Option<TaskDetail>> {
        let row = self
            .conn
            .query_row(
                &format!("{} WHERE t.id = ?1", TASK_DETAIL_SELECT),
                params![id],
                TaskDetailRow::from_row,
            )
            .optional()
            .context("Failed to query task detail")?;
        row.map(TaskDetailRow::into_detail).transpose()
    }

    /// Tasks matching `filters`, newest first, populated with project and
    /// assignee.
    pub fn list_tasks(&self, filters: &TaskFilters) -> Result<Vec<TaskDetail>> {
        let mut sql = format!("{} WHERE t.workspace_id = ?", TASK_DETAIL_SELECT);
        let mut args = vec![Value::Integer(filters.workspace_id)];
        if let Some(project_id) = filters.project_id {
            sql.push_str(" AND t.project_id = ?");
            args.push(Value::Integer(project_id));
        }
        if let Some(assignee_id) = filters.assignee_id {
            sql.push_str(" AND t.assignee_id = ?");
            args.push(Value::Integer(assignee_id));
        }
        if let Some(status) = filters.status {
            sql.push_str(" AND t.status = ?");
            args.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(ref search) = filters.search {
            sql.push_str(" AND t.name LIKE ? ESCAPE '\\'");
            args.push(Value::Text(like_pattern(search)));
        }
        if let Some(due_date) = filters.due_date {
            sql.push_str(" AND date(t.due_date) = ?");
            args.push(Value::Text(due_date.format("%Y-%m-%d").to_string()));
        }
        sql.push_str(" ORDER BY t.created_at DESC, t.id DESC");

        let mut stmt = self.conn.prepare(&sql).context("Failed to prepare list_tasks")?;
        let rows = stmt
            .query_map(params_from_iter(args), TaskDetailRow::from_row)
            .context("Failed to query tasks")?;
        let mut tasks = Vec::new();
        for row in rows {
            let r = row.context("Failed to read task row")?;
            tasks.push(r.into_detail()?);
        }
        Ok(tasks)
    }

    /// Plain tasks of a workspace, optionally narrowed to one project.
    pub fn list_scope_tasks(
        &self,
        workspace_id: i64,
        project_id: Option<i64>,
    ) -> Result<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM tasks t WHERE t.workspace_id = ?1
                 AND (?2 IS NULL OR t.project_id = ?2) ORDER BY t.id",
                TASK_COLUMNS
            ))
            .context("Failed to prepare list_scope_tasks")?;
        let rows = stmt
            .query_map(params![workspace_id, project_id], TaskRow::from_row)
            .context("Failed to query tasks")?;
        let mut tasks = Vec::new();
        for row in rows {
            let r = row.context("Failed to read task row")?;
            tasks.push(r.into_task()?);
        }
        Ok(tasks)
    }

    /// Apply a partial update. Changing the status keeps the position as is.
    pub fn update_task(&self, id: i64, patch: &TaskPatch) -> Result<Task> {
        let task = self.require_task(id)?;
        if let Some(project_id) = patch.project_id {
            self.check_project_in_workspace(project_id, task.workspace_id)?;
        }
        if let Some(assignee_id) = patch.assignee_id {
            self.check_assignee_in_workspace(assignee_id, task.workspace_id)?;
        }

        let mut sets = vec!["updated_at = ?"];
        let mut args = vec![Value::Text(timestamp(Utc::now()))];
        if let Some(ref name) = patch.name {
            sets.push("name = ?");
            args.push(Value::Text(name.clone()));
        }
        if let Some(status) = patch.status {
            sets.push("status = ?");
            args.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(due_date) = patch.due_date {
            sets.push("due_date = ?");
            args.push(Value::Text(timestamp(due_date)));
        }
        if let Some(project_id) = patch.project_id {
            sets.push("project_id = ?");
            args.push(Value::Integer(project_id));
        }
        if let Some(assignee_id) = patch.assignee_id {
            sets.push("assignee_id = ?");
            args.push(Value::Integer(assignee_id));
        }
        if let Some(ref description) = patch.description {
            sets.push("description = ?");
            args.push(opt_text(description));
        }
        args.push(Value::Integer(id));
        self.conn
            .execute(
                &format!("UPDATE tasks SET {} WHERE id = ?", sets.join(", ")),
                params_from_iter(args),
            )
            .context("Failed to update task")?;
        self.require_task(id)
    }

    pub fn delete_task(&self, id: i64) -> Result<bool> {
        let count = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])
            .context("Failed to delete task")?;
        Ok(count > 0)
    }

    /// The one workspace every task in `ids` belongs to.
    pub fn workspace_of_tasks(&self, ids: &[i64]) -> Result<i64> {
        let mut workspace_id = None;
        for &id in ids {
            let owner: i64 = self
                .conn
                .query_row(
                    "SELECT workspace_id FROM tasks WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()
                .context("Failed to query task workspace")?
                .ok_or(BoardError::TaskNotFound { id })?;
            match workspace_id {
                None => workspace_id = Some(owner),
                Some(current) if current != owner => {
                    return Err(BoardError::invalid(
                        "tasks",
                        "All tasks must belong to the same workspace",
                    )
                    .into());
                }
                Some(_) => {}
            }
        }
        workspace_id.ok_or_else(|| BoardError::invalid("tasks", "Required").into())
    }

    /// Move many tasks at once (Kanban drag and drop). All or nothing.
    pub fn bulk_update_tasks(&self, updates: &[BulkTaskUpdate]) -> Result<Vec<Task>> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        let now = timestamp(Utc::now());
        for update in updates {
            let count = tx
                .execute(
                    "UPDATE tasks SET status = ?1, position = ?2, updated_at = ?3 WHERE id = ?4",
                    params![update.status.as_str(), update.position, now, update.id],
                )
                .context("Failed to move task")?;
            if count == 0 {
                return Err(BoardError::TaskNotFound { id: update.id }.into());
            }
        }
        tx.commit().context("Failed to commit bulk update")?;

        let mut tasks = Vec::with_capacity(updates.len());
        for update in updates {
            tasks.push(self.require_task(update.id)?);
        }
        Ok(tasks)
    }
}

// ── Row conversion ────────────────────────────────────────────────────

/// Intermediate row structs hold timestamps and enums as stored strings
/// until they are parsed into typed values.
struct UserRow {
    id: i64,
    name: String,
    email: String,
    created_at: String,
}

impl UserRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    fn into_user(self) -> Result<User> {
        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

struct WorkspaceRow {
    id: i64,
    name: String,
    image_url: Option<String>,
    invite_code: String,
    user_id: i64,
    created_at: String,
    updated_at: String,
}

impl WorkspaceRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            image_url: row.get(2)?,
            invite_code: row.get(3)?,
            user_id: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn into_workspace(self) -> Result<Workspace> {
        Ok(Workspace {
            id: self.id,
            name: self.name,
            image_url: self.image_url,
            invite_code: self.invite_code,
            user_id: self.user_id,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

struct MemberRow {
    id: i64,
    workspace_id: i64,
    user_id: i64,
    role: String,
    name: String,
    email: String,
    created_at: String,
}

impl MemberRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            workspace_id: row.get(1)?,
            user_id: row.get(2)?,
            role: row.get(3)?,
            name: row.get(4)?,
            email: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_member(self) -> Result<Member> {
        let role = MemberRole::from_str(&self.role)
            .map_err(|e| anyhow::anyhow!(e))
            .context("Failed to parse member role")?;
        Ok(Member {
            id: self.id,
            workspace_id: self.workspace_id,
            user_id: self.user_id,
            role,
            name: self.name,
            email: self.email,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

struct ProjectRow {
    id: i64,
    workspace_id: i64,
    name: String,
    image_url: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ProjectRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            workspace_id: row.get(1)?,
            name: row.get(2)?,
            image_url: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_project(self) -> Result<Project> {
        Ok(Project {
            id: self.id,
            workspace_id: self.workspace_id,
            name: self.name,
            image_url: self.image_url,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

struct TaskRow {
    id: i64,
    workspace_id: i64,
    project_id: i64,
    assignee_id: Option<i64>,
    name: String,
    description: Option<String>,
    due_date: String,
    status: String,
    position: i64,
    created_at: String,
    updated_at: String,
}

impl TaskRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            workspace_id: row.get(1)?,
            project_id: row.get(2)?,
            assignee_id: row.get(3)?,
            name: row.get(4)?,
            description: row.get(5)?,
            due_date: row.get(6)?,
            status: row.get(7)?,
            position: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }

    fn into_task(self) -> Result<Task> {
        let status = TaskStatus::from_str(&self.status)
            .map_err(|e| anyhow::anyhow!(e))
            .context("Failed to parse task status")?;
        Ok(Task {
            id: self.id,
            workspace_id: self.workspace_id,
            project_id: self.project_id,
            assignee_id: self.assignee_id,
            name: self.name,
            description: self.description,
            due_date: parse_timestamp(&self.due_date)?,
            status,
            position: self.position,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

/// A task row followed by its project columns and optional assignee columns.
struct TaskDetailRow {
    task: TaskRow,
    project: ProjectSummary,
    assignee_id: Option<i64>,
    assignee_user_id: Option<i64>,
    assignee_name: Option<String>,
    assignee_email: Option<String>,
}

impl TaskDetailRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            task: TaskRow::from_row(row)?,
            project: ProjectSummary {
                id: row.get(11)?,
                name: row.get(12)?,
                image_url: row.get(13)?,
            },
            assignee_id: row.get(14)?,
            assignee_user_id: row.get(15)?,
            assignee_name: row.get(16)?,
            assignee_email: row.get(17)?,
        })
    }

    fn into_detail(self) -> Result<TaskDetail> {
        let assignee = match (
            self.assignee_id,
            self.assignee_user_id,
            self.assignee_name,
            self.assignee_email,
        ) {
            (Some(id), Some(user_id), Some(name), Some(email)) => Some(AssigneeSummary {
                id,
                user_id,
                name,
                email,
            }),
            _ => None,
        };
        Ok(TaskDetail {
            task: self.task.into_task()?,
            project: self.project,
            assignee,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────
