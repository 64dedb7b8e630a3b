//! Authentication route handlers for admin.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{AdminSession, RequireAdminAuth, clear_current_admin, set_current_admin};
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Placeholder password shared by every admin account.
// TODO: replace with per-user password hashes once the admin_users table carries them.
const DEMO_PASSWORD: &str = "admin123";

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    pub admin: Option<CurrentAdmin>,
}

/// Whether this browser is signed in.
///
/// GET /auth/login
pub async fn status(session: Session) -> Json<SessionStatus> {
    let state = AdminSession::load(&session).await;
    Json(SessionStatus {
        authenticated: state.admin().is_some(),
        admin: state.admin().cloned(),
    })
}

/// Sign in with username and password.
///
/// POST /auth/login
#[instrument(skip(state, session))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<Json<CurrentAdmin>> {
    let invalid = || AppError::Unauthorized("Invalid credentials".to_owned());

    let user = state
        .backend()
        .admin_users()
        .find_active_by_username(request.username.trim())
        .await?
        .ok_or_else(invalid)?;
    if request.password != DEMO_PASSWORD {
        tracing::warn!(username = %user.username, "Admin login rejected");
        return Err(invalid());
    }

    let user = match state
        .backend()
        .admin_users()
        .record_login(&user.id, Utc::now())
        .await
    {
        Ok(updated) => updated,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to record admin login time");
            user
        }
    };

    let admin = CurrentAdmin::from(&user);
    set_current_admin(&session, &admin).await?;
    set_sentry_user(admin.id.as_str(), &admin.username);
    tracing::info!(admin_id = %admin.id, "Admin signed in");

    Ok(Json(admin))
}

/// Sign out and delete the session record.
///
/// POST /auth/logout
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Json<SessionStatus>> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    Ok(Json(SessionStatus {
        authenticated: false,
        admin: None,
    }))
}

/// The signed-in admin.
///
/// GET /auth/me
pub async fn me(RequireAdminAuth(admin): RequireAdminAuth) -> Json<CurrentAdmin> {
    Json(admin)
}
