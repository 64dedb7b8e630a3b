//! Analytics events and visitor sessions.
//!
//! Events are append-only. Reads skip documents whose schema version or
//! event type this build does not understand, logging each one, so a
//! partially migrated table still produces a summary.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{instrument, warn};
use yousuf_rice_core::analytics::{AnalyticsEvent, EventKind};
use yousuf_rice_core::models::VisitorSession;
use yousuf_rice_core::{OrderId, Price, ProductId, VisitorId, VisitorSessionId};

use super::to_attributes;
use crate::error::Result;
use crate::store::{Collection, Document, DocumentStore, ListQuery};

/// Upper bound on events pulled for one summary window.
pub const MAX_SUMMARY_EVENTS: u32 = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EventRecord {
    // Rows written before versioning have no column and read as 0.
    #[serde(default)]
    schema_version: u32,
    event_type: String,
    session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    search_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    order_id: Option<String>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    order_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_agent: Option<String>,
    timestamp: DateTime<Utc>,
}

impl From<&AnalyticsEvent> for EventRecord {
    fn from(event: &AnalyticsEvent) -> Self {
        Self {
            schema_version: event.schema_version,
            event_type: event.kind.as_str().to_owned(),
            session_id: event.visitor_id.as_str().to_owned(),
            page_url: event.page_url.clone(),
            product_id: event.product_id.as_ref().map(|id| id.as_str().to_owned()),
            product_name: event.product_name.clone(),
            category: event.category.clone(),
            search_query: event.search_query.clone(),
            order_id: event.order_id.as_ref().map(|id| id.as_str().to_owned()),
            order_amount: event.order_amount.map(|p| p.amount()),
            user_agent: event.user_agent.clone(),
            timestamp: event.timestamp,
        }
    }
}

/// Decode one stored event, or `None` if it should be skipped.
fn to_event(doc: &Document) -> Option<AnalyticsEvent> {
    let record: EventRecord = match doc.decode(Collection::AnalyticsEvents) {
        Ok(record) => record,
        Err(e) => {
            warn!(event_id = %doc.id, error = %e, "Skipping malformed analytics event");
            return None;
        }
    };
    if let Err(e) = AnalyticsEvent::check_version(record.schema_version) {
        warn!(event_id = %doc.id, error = %e, "Skipping analytics event");
        return None;
    }
    let kind = match record.event_type.parse::<EventKind>() {
        Ok(kind) => kind,
        Err(e) => {
            warn!(event_id = %doc.id, error = %e, "Skipping analytics event");
            return None;
        }
    };

    Some(AnalyticsEvent {
        schema_version: record.schema_version,
        kind,
        visitor_id: VisitorId::new(record.session_id),
        page_url: record.page_url,
        product_id: record.product_id.map(ProductId::new),
        product_name: record.product_name,
        category: record.category,
        search_query: record.search_query,
        order_id: record.order_id.map(OrderId::new),
        order_amount: record.order_amount.map(Price::new),
        user_agent: record.user_agent,
        timestamp: record.timestamp,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionRecord {
    session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_agent: Option<String>,
    first_visit: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    page_count: u32,
    is_active: bool,
}

fn to_session(doc: &Document) -> Result<VisitorSession> {
    let record: SessionRecord = doc.decode(Collection::Sessions)?;
    Ok(VisitorSession {
        id: VisitorSessionId::new(doc.id.clone()),
        visitor_id: VisitorId::new(record.session_id),
        user_agent: record.user_agent,
        first_visit: record.first_visit,
        last_activity: record.last_activity,
        page_count: record.page_count,
        is_active: record.is_active,
    })
}

#[derive(Clone)]
pub struct AnalyticsRepository {
    store: Arc<dyn DocumentStore>,
}

impl AnalyticsRepository {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Append one event.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the write fails.
    #[instrument(skip(self, event), fields(kind = %event.kind))]
    pub async fn record(&self, event: &AnalyticsEvent) -> Result<()> {
        let collection = Collection::AnalyticsEvents;
        self.store
            .create(collection, to_attributes(collection, &EventRecord::from(event))?)
            .await?;
        Ok(())
    }

    /// Events with `start <= timestamp <= end`, newest first, capped at
    /// [`MAX_SUMMARY_EVENTS`].
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the read fails. Undecodable events are
    /// skipped, not reported.
    #[instrument(skip(self))]
    pub async fn events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AnalyticsEvent>> {
        let query = ListQuery::new()
            .greater_than_equal("timestamp", start.to_rfc3339())
            .less_than_equal("timestamp", end.to_rfc3339())
            .order_desc("timestamp")
            .limit(MAX_SUMMARY_EVENTS);
        let docs = self.store.list(Collection::AnalyticsEvents, &query).await?;
        Ok(docs.iter().filter_map(to_event).collect())
    }

    /// The most recent events, newest first.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the read fails.
    #[instrument(skip(self))]
    pub async fn recent(&self, limit: u32) -> Result<Vec<AnalyticsEvent>> {
        let query = ListQuery::new().order_desc("timestamp").limit(limit);
        let docs = self.store.list(Collection::AnalyticsEvents, &query).await?;
        Ok(docs.iter().filter_map(to_event).collect())
    }

    /// # Errors
    ///
    /// Returns `BackendError` if the read fails.
    #[instrument(skip(self), fields(visitor_id = %visitor_id))]
    pub async fn find_session(&self, visitor_id: &VisitorId) -> Result<Option<VisitorSession>> {
        let docs = self
            .store
            .list(
                Collection::Sessions,
                &ListQuery::new()
                    .equal("session_id", visitor_id.as_str())
                    .limit(1),
            )
            .await?;
        docs.first().map(to_session).transpose()
    }

    /// Start a session with one page counted.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the write fails.
    #[instrument(skip(self, user_agent), fields(visitor_id = %visitor_id))]
    pub async fn create_session(
        &self,
        visitor_id: &VisitorId,
        user_agent: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<VisitorSession> {
        let record = SessionRecord {
            session_id: visitor_id.as_str().to_owned(),
            user_agent,
            first_visit: now,
            last_activity: now,
            page_count: 1,
            is_active: true,
        };
        let collection = Collection::Sessions;
        let doc = self
            .store
            .create(collection, to_attributes(collection, &record)?)
            .await?;
        to_session(&doc)
    }

    /// Count another page and bump the activity time.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the write fails or the session is missing.
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub async fn touch_session(
        &self,
        session: &VisitorSession,
        now: DateTime<Utc>,
    ) -> Result<VisitorSession> {
        let mut data = Map::new();
        data.insert(
            "page_count".to_owned(),
            Value::from(session.page_count.saturating_add(1)),
        );
        data.insert("last_activity".to_owned(), Value::String(now.to_rfc3339()));
        let doc = self
            .store
            .update(Collection::Sessions, session.id.as_str(), data)
            .await?;
        to_session(&doc)
    }
}
