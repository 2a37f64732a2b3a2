//! Planboard: workspace, project and task tracking back-end.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐   HTTP   ┌──────────────────────────────────────────────────┐
//! │  Client  │ ───────> │  server.rs  (axum Router, ServerConfig)          │
//! │          │ <─────── │    ├─ auth.rs   (sessions, CurrentUser/PageUser) │
//! └──────────┘ WebSocket│    ├─ api.rs    (JSON handlers, AppState)        │
//!                       │    ├─ pages.rs  (guarded page data routes)       │
//!                       │    └─ ws.rs     (per-workspace live updates)     │
//!                       │         │                                        │
//!                       │         │ DbHandle::call()                       │
//!                       │         v                                        │
//!                       │  db.rs  (BoardDb, SQLite on the blocking pool)   │
//!                       └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Supporting Modules
//!
//! | Module      | Responsibility                                          |
//! |-------------|---------------------------------------------------------|
//! | `models`    | Composite views: `TaskDetail`, `BoardView`, dashboards  |
//! | `analytics` | Month-over-month task counters                          |
//! | `invite`    | Invite code generation and join links                   |
//!
//! ## Typical Request Flow (join by invite link)
//!
//! 1. `GET /workspaces/{id}/join/{code}` → `PageUser` redirects to
//!    `/sign-in` without a session, else `pages::join_page()` returns the
//!    workspace's public info.
//! 2. `POST /api/workspaces/{id}/join` → `BoardDb::join_workspace()` checks
//!    the code against the workspace's single current code and inserts a
//!    `MEMBER` row.
//! 3. `MemberJoined` is broadcast to the workspace's WebSocket subscribers.

pub mod analytics;
pub mod api;
pub mod auth;
pub mod db;
pub mod invite;
pub mod models;
pub mod pages;
pub mod server;
pub mod ws;
