//! Analytics beacons sent by the front end.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;
use yousuf_rice_core::analytics::EventPayload;

use crate::error::{AppError, Result};
use crate::middleware::Visitor;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PageViewRequest {
    pub page_url: String,
}

/// Record a page view. Accepted before the write happens.
#[instrument(skip(state, visitor))]
pub async fn page_view(
    State(state): State<AppState>,
    visitor: Visitor,
    Json(request): Json<PageViewRequest>,
) -> Result<StatusCode> {
    let page_url = request.page_url.trim();
    if page_url.is_empty() {
        return Err(AppError::BadRequest("page_url is required".to_owned()));
    }

    state.tracker().track(
        &visitor,
        EventPayload::PageView {
            page_url: page_url.to_owned(),
        },
    );
    Ok(StatusCode::ACCEPTED)
}
