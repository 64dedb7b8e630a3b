//! Analytics write side.
//!
//! Tracking never blocks or fails a shopper's request: each event is written
//! on a spawned task and any backend error is logged and dropped.
//!
//! The visitor session record is a read-then-write, so writes for one
//! visitor take a per-visitor lock. Without it two events fired by the same
//! request could both miss the record and create it twice.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use moka::future::Cache;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::instrument;
use yousuf_rice_backend::{AnalyticsRepository, Result};
use yousuf_rice_core::VisitorId;
use yousuf_rice_core::analytics::{AnalyticsEvent, EventPayload};

use crate::middleware::Visitor;

/// Idle time after which a visitor's lock is dropped.
const VISITOR_LOCK_IDLE: Duration = Duration::from_secs(30 * 60);

/// Records shopper interactions.
#[derive(Clone)]
pub struct AnalyticsTracker {
    repo: AnalyticsRepository,
    visitor_locks: Cache<VisitorId, Arc<Mutex<()>>>,
}

impl AnalyticsTracker {
    #[must_use]
    pub fn new(repo: AnalyticsRepository) -> Self {
        Self {
            repo,
            visitor_locks: Cache::builder()
                .max_capacity(100_000)
                .time_to_idle(VISITOR_LOCK_IDLE)
                .build(),
        }
    }

    /// Record an event in the background.
    ///
    /// The returned handle may be dropped; tests await it to observe the
    /// write.
    pub fn track(&self, visitor: &Visitor, payload: EventPayload) -> JoinHandle<()> {
        let tracker = self.clone();
        let visitor = visitor.clone();
        tokio::spawn(async move {
            let kind = payload.kind();
            if let Err(e) = tracker.record(&visitor, payload).await {
                tracing::warn!(
                    error = %e,
                    kind = %kind,
                    visitor_id = %visitor.id,
                    "Failed to record analytics event"
                );
            }
        })
    }

    /// Write one event and update the visitor's session record.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if either write fails.
    #[instrument(skip(self, visitor, payload), fields(visitor_id = %visitor.id))]
    pub async fn record(&self, visitor: &Visitor, payload: EventPayload) -> Result<()> {
        let now = Utc::now();
        let event = AnalyticsEvent::new(
            visitor.id.clone(),
            payload,
            visitor.user_agent.clone(),
            now,
        );
        self.repo.record(&event).await?;

        let lock = self
            .visitor_locks
            .get_with(visitor.id.clone(), async { Arc::new(Mutex::new(())) })
            .await;
        let _guard = lock.lock().await;

        match self.repo.find_session(&visitor.id).await? {
            Some(session) => {
                self.repo.touch_session(&session, now).await?;
            }
            None => {
                self.repo
                    .create_session(&visitor.id, visitor.user_agent.clone(), now)
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use yousuf_rice_backend::{Backend, Collection, MemoryStore};
    use yousuf_rice_core::VisitorId;
    use yousuf_rice_core::analytics::EventKind;

    use super::*;

    fn visitor() -> Visitor {
        Visitor {
            id: VisitorId::new("v-1"),
            user_agent: Some("Mozilla/5.0".to_owned()),
        }
    }

    fn page_view() -> EventPayload {
        EventPayload::PageView {
            page_url: "/".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_track_writes_event_and_session() {
        let backend = Backend::in_memory(MemoryStore::new());
        let tracker = AnalyticsTracker::new(backend.analytics());

        tracker.track(&visitor(), page_view()).await.unwrap();
        tracker
            .track(
                &visitor(),
                EventPayload::Search {
                    query: "sella".to_owned(),
                },
            )
            .await
            .unwrap();

        let events = backend.analytics().recent(10).await.unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().any(|e| e.kind == EventKind::Search));

        let session = backend
            .analytics()
            .find_session(&visitor().id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.page_count, 2);
        assert_eq!(session.user_agent.as_deref(), Some("Mozilla/5.0"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_events_share_one_session() {
        let store = MemoryStore::new();
        let backend = Backend::in_memory(store.clone());
        let tracker = AnalyticsTracker::new(backend.analytics());

        let handles: Vec<_> = (0..8)
            .map(|_| tracker.track(&visitor(), page_view()))
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.count(Collection::Sessions).await, 1);
        let session = backend
            .analytics()
            .find_session(&visitor().id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.page_count, 8);
    }

    #[tokio::test]
    async fn test_track_swallows_backend_failure() {
        let store = MemoryStore::new();
        store.fail_creates_after(Collection::AnalyticsEvents, 0).await;
        let tracker = AnalyticsTracker::new(Backend::in_memory(store.clone()).analytics());

        // The task completes without panicking
        tracker.track(&visitor(), page_view()).await.unwrap();
        assert_eq!(store.count(Collection::AnalyticsEvents).await, 0);
        assert_eq!(store.count(Collection::Sessions).await, 0);
    }
}
