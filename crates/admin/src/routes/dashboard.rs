//! Dashboard route handler.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::services::{Dashboard, dashboard};
use crate::state::AppState;

/// GET /api/dashboard
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Json<Dashboard> {
    Json(dashboard::load(state.backend()).await)
}
