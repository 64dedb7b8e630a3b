//! Analytics visitor identity.
//!
//! Every browser session gets one visitor id (UUID v4) the first time it is
//! seen. The id is stored in the session and reused for every later event.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, header::USER_AGENT, request::Parts},
};
use tower_sessions::Session;
use uuid::Uuid;
use yousuf_rice_core::VisitorId;

use crate::models::session_keys;

/// The current visitor, as seen by the analytics tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visitor {
    pub id: VisitorId,
    pub user_agent: Option<String>,
}

impl Visitor {
    /// Read the visitor id from the session, creating one if absent.
    ///
    /// A session store failure yields a fresh, unsaved id so tracking never
    /// blocks a request.
    pub async fn from_session(session: &Session, user_agent: Option<String>) -> Self {
        let id = match session.get::<VisitorId>(session_keys::VISITOR_ID).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                let id = VisitorId::new(Uuid::new_v4().to_string());
                if let Err(e) = session.insert(session_keys::VISITOR_ID, &id).await {
                    tracing::warn!(error = %e, "Failed to store visitor id");
                }
                id
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read visitor id");
                VisitorId::new(Uuid::new_v4().to_string())
            }
        };

        Self { id, user_agent }
    }
}

impl<S> FromRequestParts<S> for Visitor
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts.extensions.get::<Session>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Session layer missing",
        ))?;

        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        Ok(Self::from_session(&session, user_agent).await)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_visitor_id_is_stable_per_session() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        let first = Visitor::from_session(&session, None).await;
        let second = Visitor::from_session(&session, Some("agent".to_owned())).await;
        assert_eq!(first.id, second.id);
        assert_eq!(second.user_agent.as_deref(), Some("agent"));

        let other = Session::new(None, Arc::new(MemoryStore::default()), None);
        assert_ne!(Visitor::from_session(&other, None).await.id, first.id);
    }
}
