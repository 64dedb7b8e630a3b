//! Analytics route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use yousuf_rice_core::analytics::AnalyticsEvent;

use crate::error::{AppError, Result};
use crate::services::analytics::{DEFAULT_RECENT_LIMIT, DateRange, SummaryReport};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl RangeQuery {
    fn range(&self) -> Result<DateRange> {
        DateRange::from_dates(self.start, self.end, Utc::now())
            .ok_or_else(|| AppError::BadRequest("start must not be after end".to_owned()))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsOverview {
    pub summary: SummaryReport,
    pub recent_events: Vec<AnalyticsEvent>,
}

/// GET /api/analytics/summary
#[instrument(skip(state))]
pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<SummaryReport>> {
    Ok(Json(state.analytics().summary(query.range()?).await))
}

/// GET /api/analytics/events/recent
#[instrument(skip(state))]
pub async fn recent(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Json<Vec<AnalyticsEvent>> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    Json(state.analytics().recent(limit).await)
}

/// Summary and recent events, fetched together.
///
/// GET /api/analytics
#[instrument(skip(state))]
pub async fn overview(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<AnalyticsOverview>> {
    let range = query.range()?;
    let reader = state.analytics();
    let (summary, recent_events) =
        tokio::join!(reader.summary(range), reader.recent(DEFAULT_RECENT_LIMIT));

    Ok(Json(AnalyticsOverview {
        summary,
        recent_events,
    }))
}
