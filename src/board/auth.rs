//! Password hashing, session cookies and the session guard.
//!
//! A session is an opaque random token handed to the browser in an HttpOnly
//! cookie. Only its SHA-256 digest is stored, so a leaked database does not
//! leak live sessions.

use anyhow::{Context, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Json, Router,
    extract::{FromRequestParts, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use sha2::{Digest, Sha256};

use planboard_common::schemas::{LoginRequest, RegisterRequest};

use super::api::{ApiError, SharedState};
use super::models::User;
use crate::errors::BoardError;

/// Where page routes send visitors without a session.
pub const SIGN_IN_PATH: &str = "/sign-in";

/// Session cookie settings.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub cookie_name: String,
    pub session_ttl: chrono::Duration,
    pub secure_cookie: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            cookie_name: "planboard-session".to_string(),
            session_ttl: chrono::Duration::hours(24 * 30),
            secure_cookie: false,
        }
    }
}

// ── Passwords & tokens ────────────────────────────────────────────────

/// Hash a password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
}

/// Check a password against a stored hash. A malformed hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            false
        }
    }
}

pub fn new_session_token() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

/// The form a session token is stored in.
pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

// ── Cookies ───────────────────────────────────────────────────────────

pub fn session_cookie(settings: &AuthSettings, token: String) -> Cookie<'static> {
    Cookie::build((settings.cookie_name.clone(), token))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .secure(settings.secure_cookie)
        .max_age(time::Duration::seconds(settings.session_ttl.num_seconds()))
        .build()
}

/// A cookie matching the session cookie's name and path, for removal.
pub fn removal_cookie(settings: &AuthSettings) -> Cookie<'static> {
    Cookie::build((settings.cookie_name.clone(), ""))
        .path("/")
        .build()
}

fn session_token(parts: &Parts, settings: &AuthSettings) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(&settings.cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

async fn resolve_session(state: &SharedState, token: String) -> Result<Option<User>> {
    let token_hash = hash_token(&token);
    state
        .db
        .call(move |db| db.get_session_user(&token_hash, Utc::now()))
        .await
}

/// Create a session for `user_id` and return the cookie that carries it.
async fn start_session(state: &SharedState, user_id: i64) -> Result<Cookie<'static>> {
    let token = new_session_token();
    let token_hash = hash_token(&token);
    let expires_at = Utc::now() + state.settings.auth.session_ttl;
    state
        .db
        .call(move |db| db.create_session(&token_hash, user_id, expires_at))
        .await?;
    Ok(session_cookie(&state.settings.auth, token))
}

// ── Extractors ────────────────────────────────────────────────────────

/// The signed-in user of an API request. Rejects with `401` otherwise.
pub struct CurrentUser(pub User);

impl FromRequestParts<SharedState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(parts, &state.settings.auth).ok_or(BoardError::Unauthorized)?;
        let user = resolve_session(state, token)
            .await?
            .ok_or(BoardError::Unauthorized)?;
        Ok(CurrentUser(user))
    }
}

/// The signed-in user of a page request. Redirects to the sign-in page
/// otherwise.
pub struct PageUser(pub User);

impl FromRequestParts<SharedState> for PageUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(parts, &state.settings.auth) else {
            return Err(Redirect::to(SIGN_IN_PATH).into_response());
        };
        match resolve_session(state, token).await {
            Ok(Some(user)) => Ok(PageUser(user)),
            Ok(None) => Err(Redirect::to(SIGN_IN_PATH).into_response()),
            Err(e) => Err(ApiError::from(e).into_response()),
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────────

pub fn auth_router() -> Router<SharedState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/current", get(current))
}

async fn register(
    State(state): State<SharedState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new_user = req.validate()?;
    let password = new_user.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("Password hashing task panicked")??;

    let user = state
        .db
        .call(move |db| db.create_user(&new_user.name, &new_user.email, &password_hash))
        .await?;
    let cookie = start_session(&state, user.id).await?;
    tracing::info!(user_id = user.id, "User registered");
    Ok((StatusCode::CREATED, jar.add(cookie), Json(user)))
}

async fn login(
    State(state): State<SharedState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let credentials = req.validate()?;
    let email = credentials.email.clone();
    let found = state
        .db
        .call(move |db| db.find_user_credentials(&email))
        .await?;
    let Some((user, password_hash)) = found else {
        return Err(BoardError::InvalidCredentials.into());
    };

    let password = credentials.password;
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .context("Password verification task panicked")?;
    if !valid {
        return Err(BoardError::InvalidCredentials.into());
    }

    let cookie = start_session(&state, user.id).await?;
    tracing::info!(user_id = user.id, "User signed in");
    Ok((jar.add(cookie), Json(user)))
}

async fn logout(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(cookie) = jar.get(&state.settings.auth.cookie_name) {
        let token_hash = hash_token(cookie.value());
        state
            .db
            .call(move |db| db.delete_session(&token_hash))
            .await?;
    }
    let jar = jar.remove(removal_cookie(&state.settings.auth));
    Ok((StatusCode::NO_CONTENT, jar))
}

async fn current(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
