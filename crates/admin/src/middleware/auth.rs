//! Admin session guard.
//!
//! An admin browser is either [`AdminSession::Authenticated`] or
//! [`AdminSession::Unauthenticated`]. Every request except the login route
//! needs an authenticated session: page requests are redirected to the
//! login route, `/api/` requests get 401. Login stores the admin identity in
//! the session record; logout deletes the record. Sessions do not expire
//! on their own beyond the store's inactivity window.

use axum::{
    Json,
    extract::{FromRequestParts, Request},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::models::{CurrentAdmin, session_keys};

/// Path of the login route.
pub const LOGIN_PATH: &str = "/auth/login";

/// Whether the current browser has signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminSession {
    Authenticated(CurrentAdmin),
    Unauthenticated,
}

/// What the guard does with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectToLogin,
}

impl AdminSession {
    /// Resolve the state from the session record.
    ///
    /// An unreadable record counts as signed out.
    pub async fn load(session: &Session) -> Self {
        match session.get::<CurrentAdmin>(session_keys::CURRENT_ADMIN).await {
            Ok(Some(admin)) => Self::Authenticated(admin),
            Ok(None) => Self::Unauthenticated,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read admin session");
                Self::Unauthenticated
            }
        }
    }

    #[must_use]
    pub fn guard(&self, path: &str) -> GuardDecision {
        match self {
            Self::Authenticated(_) => GuardDecision::Allow,
            Self::Unauthenticated if path == LOGIN_PATH => GuardDecision::Allow,
            Self::Unauthenticated => GuardDecision::RedirectToLogin,
        }
    }

    #[must_use]
    pub const fn admin(&self) -> Option<&CurrentAdmin> {
        match self {
            Self::Authenticated(admin) => Some(admin),
            Self::Unauthenticated => None,
        }
    }
}

/// Response for a request the guard turned away.
pub enum AdminAuthRejection {
    /// Redirect to the login page (page requests).
    RedirectToLogin,
    /// 401 with a JSON body (API requests).
    Unauthorized,
    /// The session layer is not installed.
    MissingSession,
}

impl AdminAuthRejection {
    fn for_path(path: &str) -> Self {
        if path.starts_with("/api/") {
            Self::Unauthorized
        } else {
            Self::RedirectToLogin
        }
    }
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Authentication required" })),
            )
                .into_response(),
            Self::MissingSession => {
                tracing::error!("Session layer missing");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Apply the guard to every request passing through.
pub async fn admin_guard_middleware(request: Request, next: Next) -> Response {
    let Some(session) = request.extensions().get::<Session>().cloned() else {
        return AdminAuthRejection::MissingSession.into_response();
    };

    let path = request.uri().path().to_owned();
    match AdminSession::load(&session).await.guard(&path) {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::RedirectToLogin => AdminAuthRejection::for_path(&path).into_response(),
    }
}

/// Extractor for handlers that need the signed-in admin.
pub struct RequireAdminAuth(pub CurrentAdmin);

impl<S> FromRequestParts<S> for RequireAdminAuth
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminAuthRejection::MissingSession)?;

        match AdminSession::load(session).await {
            AdminSession::Authenticated(admin) => Ok(Self(admin)),
            AdminSession::Unauthenticated => Err(AdminAuthRejection::for_path(parts.uri.path())),
        }
    }
}

/// Store the signed-in admin under a fresh session id.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Delete the session record (logout).
///
/// # Errors
///
/// Returns an error if the record cannot be deleted.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;
    use yousuf_rice_core::{AdminRole, AdminUserId};

    use super::*;

    fn admin() -> CurrentAdmin {
        CurrentAdmin {
            id: AdminUserId::new("a-1"),
            username: "admin".to_owned(),
            email: "admin@yousufrice.com".to_owned(),
            role: AdminRole::Admin,
        }
    }

    #[test]
    fn test_guard_decisions() {
        let signed_out = AdminSession::Unauthenticated;
        assert_eq!(signed_out.guard(LOGIN_PATH), GuardDecision::Allow);
        assert_eq!(signed_out.guard("/"), GuardDecision::RedirectToLogin);
        assert_eq!(
            signed_out.guard("/api/orders"),
            GuardDecision::RedirectToLogin
        );

        let signed_in = AdminSession::Authenticated(admin());
        assert_eq!(signed_in.guard("/api/orders"), GuardDecision::Allow);
        assert_eq!(signed_in.admin(), Some(&admin()));
    }

    #[tokio::test]
    async fn test_login_then_logout() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        assert_eq!(
            AdminSession::load(&session).await,
            AdminSession::Unauthenticated
        );

        set_current_admin(&session, &admin()).await.unwrap();
        assert_eq!(
            AdminSession::load(&session).await,
            AdminSession::Authenticated(admin())
        );

        clear_current_admin(&session).await.unwrap();
        assert_eq!(
            AdminSession::load(&session).await,
            AdminSession::Unauthenticated
        );
    }

    #[test]
    fn test_api_paths_get_401() {
        let response = AdminAuthRejection::for_path("/api/dashboard").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AdminAuthRejection::for_path("/").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}
