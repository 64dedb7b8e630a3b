//! Analytics read side.
//!
//! Both reads degrade: a backend failure is logged and an empty summary or
//! list is returned, so the panel shows zeros instead of an error.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use tracing::instrument;
use yousuf_rice_backend::AnalyticsRepository;
use yousuf_rice_core::analytics::{AnalyticsEvent, AnalyticsSummary};

/// Default window for summaries.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Default number of events in the recent list.
pub const DEFAULT_RECENT_LIMIT: u32 = 50;

/// Upper bound on the recent list.
pub const MAX_RECENT_LIMIT: u32 = 500;

/// Inclusive time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// The `days` days up to `now`.
    #[must_use]
    pub fn last_days(days: i64, now: DateTime<Utc>) -> Self {
        Self {
            start: now - Duration::days(days),
            end: now,
        }
    }

    /// Window from optional calendar dates. `end` covers its whole day.
    ///
    /// A missing `end` is `now`; a missing `start` is the default window
    /// before `end`. Returns `None` when `start` is after `end` or a bound
    /// falls outside the representable calendar.
    #[must_use]
    pub fn from_dates(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let end = match end {
            Some(d) => d
                .checked_add_signed(Duration::days(1))?
                .and_time(NaiveTime::MIN)
                .and_utc()
                .checked_sub_signed(Duration::milliseconds(1))?,
            None => now,
        };
        let start = match start {
            Some(d) => d.and_time(NaiveTime::MIN).and_utc(),
            None => end.checked_sub_signed(Duration::days(DEFAULT_WINDOW_DAYS))?,
        };
        (start <= end).then_some(Self { start, end })
    }
}

/// Summary plus the window it covers.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub range: DateRange,
    #[serde(flatten)]
    pub summary: AnalyticsSummary,
}

/// Reads analytics for the dashboard.
#[derive(Clone)]
pub struct AnalyticsReader {
    repo: AnalyticsRepository,
}

impl AnalyticsReader {
    #[must_use]
    pub const fn new(repo: AnalyticsRepository) -> Self {
        Self { repo }
    }

    /// Reduce the events in `range`.
    #[instrument(skip(self))]
    pub async fn summary(&self, range: DateRange) -> SummaryReport {
        let summary = match self.repo.events_between(range.start, range.end).await {
            Ok(events) => AnalyticsSummary::from_events(&events),
            Err(e) => {
                tracing::error!(error = %e, "Failed to load analytics events");
                AnalyticsSummary::default()
            }
        };
        SummaryReport { range, summary }
    }

    /// The newest `limit` events.
    #[instrument(skip(self))]
    pub async fn recent(&self, limit: u32) -> Vec<AnalyticsEvent> {
        match self.repo.recent(limit.clamp(1, MAX_RECENT_LIMIT)).await {
            Ok(events) => events,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load recent analytics events");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use yousuf_rice_backend::{Backend, Collection, MemoryStore};
    use yousuf_rice_core::analytics::EventPayload;
    use yousuf_rice_core::{OrderId, Price, ProductId, VisitorId};

    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_range_from_dates() {
        let now = at("2025-03-31T12:00:00Z");
        let range = DateRange::from_dates(
            NaiveDate::from_ymd_opt(2025, 3, 1),
            NaiveDate::from_ymd_opt(2025, 3, 2),
            now,
        )
        .unwrap();
        assert_eq!(range.start, at("2025-03-01T00:00:00Z"));
        assert_eq!(range.end, at("2025-03-02T23:59:59.999Z"));

        let default = DateRange::from_dates(None, None, now).unwrap();
        assert_eq!(default, DateRange::last_days(DEFAULT_WINDOW_DAYS, now));

        assert!(
            DateRange::from_dates(
                NaiveDate::from_ymd_opt(2025, 3, 5),
                NaiveDate::from_ymd_opt(2025, 3, 1),
                now,
            )
            .is_none()
        );
    }

    #[test]
    fn test_range_at_calendar_edges_is_rejected() {
        let now = at("2025-03-31T12:00:00Z");
        assert!(DateRange::from_dates(None, Some(NaiveDate::MAX), now).is_none());
        assert!(DateRange::from_dates(None, Some(NaiveDate::MIN), now).is_none());
        assert!(
            DateRange::from_dates(Some(NaiveDate::MIN), Some(NaiveDate::MIN), now).is_some()
        );
    }

    #[tokio::test]
    async fn test_summary_over_window() {
        let backend = Backend::in_memory(MemoryStore::new());
        let repo = backend.analytics();
        let now = Utc::now();

        let events = [
            ("v1", EventPayload::PageView { page_url: "/".into() }),
            (
                "v1",
                EventPayload::ProductView {
                    product_id: ProductId::new("p1"),
                    product_name: "Super Kernel".into(),
                },
            ),
            (
                "v2",
                EventPayload::OrderPlaced {
                    order_id: OrderId::new("o1"),
                    order_amount: Price::from_rupees(1850),
                },
            ),
        ];
        for (visitor, payload) in events {
            repo.record(&AnalyticsEvent::new(
                VisitorId::new(visitor),
                payload,
                None,
                now,
            ))
            .await
            .unwrap();
        }
        // Outside the window
        repo.record(&AnalyticsEvent::new(
            VisitorId::new("v3"),
            EventPayload::PageView { page_url: "/".into() },
            None,
            now - Duration::days(90),
        ))
        .await
        .unwrap();

        let reader = AnalyticsReader::new(repo);
        let report = reader.summary(DateRange::last_days(30, now)).await;
        assert_eq!(report.summary.unique_visitors, 2);
        assert_eq!(report.summary.total_page_views, 1);
        assert_eq!(report.summary.total_orders, 1);
        assert_eq!(report.summary.total_revenue, Price::from_rupees(1850));
        assert_eq!(report.summary.top_products[0].name, "Super Kernel");

        assert_eq!(reader.recent(2).await.len(), 2);
    }

    #[tokio::test]
    async fn test_read_failure_degrades_to_empty() {
        let store = MemoryStore::new();
        store.fail_reads(Collection::AnalyticsEvents).await;
        let reader = AnalyticsReader::new(Backend::in_memory(store).analytics());

        let report = reader.summary(DateRange::last_days(30, Utc::now())).await;
        assert_eq!(report.summary, AnalyticsSummary::default());
        assert!(reader.recent(50).await.is_empty());
    }
}
