//! Analytics event schema and the summary reduction.
//!
//! Events are append-only. Each carries a `schema_version`; readers accept
//! only [`SCHEMA_VERSION`] and skip anything else instead of guessing at
//! fields.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{OrderId, Price, ProductId, VisitorId};

/// Current event schema version. Bump when fields change meaning.
pub const SCHEMA_VERSION: u32 = 1;

/// How many entries the top-N lists keep.
pub const TOP_N: usize = 5;

/// Reasons a stored event is not accepted by readers.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EventSchemaError {
    #[error("unsupported analytics schema version {0} (expected {SCHEMA_VERSION})")]
    UnsupportedVersion(u32),
    #[error("unknown analytics event kind: {0}")]
    UnknownKind(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PageView,
    ProductView,
    AddToCart,
    OrderPlaced,
    Search,
    CategoryFilter,
}

impl EventKind {
    pub const ALL: [Self; 6] = [
        Self::PageView,
        Self::ProductView,
        Self::AddToCart,
        Self::OrderPlaced,
        Self::Search,
        Self::CategoryFilter,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PageView => "page_view",
            Self::ProductView => "product_view",
            Self::AddToCart => "add_to_cart",
            Self::OrderPlaced => "order_placed",
            Self::Search => "search",
            Self::CategoryFilter => "category_filter",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = EventSchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| EventSchemaError::UnknownKind(s.to_owned()))
    }
}

/// What happened, with the fields that belong to that kind of event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    PageView { page_url: String },
    ProductView { product_id: ProductId, product_name: String },
    AddToCart { product_id: ProductId, product_name: String },
    OrderPlaced { order_id: OrderId, order_amount: Price },
    Search { query: String },
    CategoryFilter { category: String },
}

impl EventPayload {
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::PageView { .. } => EventKind::PageView,
            Self::ProductView { .. } => EventKind::ProductView,
            Self::AddToCart { .. } => EventKind::AddToCart,
            Self::OrderPlaced { .. } => EventKind::OrderPlaced,
            Self::Search { .. } => EventKind::Search,
            Self::CategoryFilter { .. } => EventKind::CategoryFilter,
        }
    }
}

/// One analytics event in the current schema.
///
/// Kind-specific fields are flattened to optional columns so the events
/// table has one fixed shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub schema_version: u32,
    pub kind: EventKind,
    pub visitor_id: VisitorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_amount: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AnalyticsEvent {
    /// Build an event in the current schema.
    #[must_use]
    pub fn new(
        visitor_id: VisitorId,
        payload: EventPayload,
        user_agent: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut event = Self {
            schema_version: SCHEMA_VERSION,
            kind: payload.kind(),
            visitor_id,
            page_url: None,
            product_id: None,
            product_name: None,
            category: None,
            search_query: None,
            order_id: None,
            order_amount: None,
            user_agent,
            timestamp,
        };

        match payload {
            EventPayload::PageView { page_url } => event.page_url = Some(page_url),
            EventPayload::ProductView {
                product_id,
                product_name,
            }
            | EventPayload::AddToCart {
                product_id,
                product_name,
            } => {
                event.product_id = Some(product_id);
                event.product_name = Some(product_name);
            }
            EventPayload::OrderPlaced {
                order_id,
                order_amount,
            } => {
                event.order_id = Some(order_id);
                event.order_amount = Some(order_amount);
            }
            EventPayload::Search { query } => event.search_query = Some(query),
            EventPayload::CategoryFilter { category } => event.category = Some(category),
        }

        event
    }

    /// Check a stored version number against the current schema.
    ///
    /// # Errors
    ///
    /// Returns [`EventSchemaError::UnsupportedVersion`] for any other version.
    pub const fn check_version(version: u32) -> Result<(), EventSchemaError> {
        if version == SCHEMA_VERSION {
            Ok(())
        } else {
            Err(EventSchemaError::UnsupportedVersion(version))
        }
    }
}

/// A label and how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub name: String,
    pub count: u64,
}

/// Aggregate view of a window of events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_page_views: u64,
    pub unique_visitors: u64,
    pub total_product_views: u64,
    pub total_cart_additions: u64,
    pub total_orders: u64,
    pub total_revenue: Price,
    pub top_products: Vec<RankedEntry>,
    pub top_categories: Vec<RankedEntry>,
}

impl AnalyticsSummary {
    /// Reduce a batch of events.
    ///
    /// Top products count product views by name, top categories count
    /// category filters. Both are sorted by count descending with ties in
    /// first-seen order and cut to [`TOP_N`].
    #[must_use]
    pub fn from_events<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a AnalyticsEvent>,
    {
        let mut summary = Self::default();
        let mut visitors = HashSet::new();
        let mut products = Vec::new();
        let mut categories = Vec::new();

        for event in events {
            visitors.insert(event.visitor_id.as_str());
            match event.kind {
                EventKind::PageView => summary.total_page_views += 1,
                EventKind::ProductView => {
                    summary.total_product_views += 1;
                    if let Some(name) = event.product_name.as_deref() {
                        products.push(name);
                    }
                }
                EventKind::AddToCart => summary.total_cart_additions += 1,
                EventKind::OrderPlaced => {
                    summary.total_orders += 1;
                    if let Some(amount) = event.order_amount {
                        summary.total_revenue = summary.total_revenue + amount;
                    }
                }
                EventKind::CategoryFilter => {
                    if let Some(category) = event.category.as_deref() {
                        categories.push(category);
                    }
                }
                EventKind::Search => {}
            }
        }

        summary.unique_visitors = visitors.len() as u64;
        summary.top_products = top_n(products, TOP_N);
        summary.top_categories = top_n(categories, TOP_N);
        summary
    }
}

/// Count occurrences and keep the `n` most frequent.
///
/// Ties keep the order in which labels were first seen.
#[must_use]
pub fn top_n<'a, I>(labels: I, n: usize) -> Vec<RankedEntry>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<RankedEntry> = Vec::new();

    for label in labels {
        if let Some(entry) = index.get(label).and_then(|&i| counts.get_mut(i)) {
            entry.count += 1;
        } else {
            index.insert(label, counts.len());
            counts.push(RankedEntry {
                name: label.to_owned(),
                count: 1,
            });
        }
    }

    // sort_by is stable
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(n);
    counts
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at(visitor: &str, payload: EventPayload) -> AnalyticsEvent {
        AnalyticsEvent::new(VisitorId::new(visitor), payload, None, Utc::now())
    }

    fn page(visitor: &str) -> AnalyticsEvent {
        at(
            visitor,
            EventPayload::PageView {
                page_url: "/".to_owned(),
            },
        )
    }

    fn product_view(visitor: &str, name: &str) -> AnalyticsEvent {
        at(
            visitor,
            EventPayload::ProductView {
                product_id: ProductId::new(name),
                product_name: name.to_owned(),
            },
        )
    }

    #[test]
    fn test_summary_counts() {
        let events = vec![
            page("a"),
            page("a"),
            page("b"),
            product_view("a", "Basmati"),
            product_view("b", "Sella"),
            at(
                "a",
                EventPayload::AddToCart {
                    product_id: ProductId::new("basmati"),
                    product_name: "Basmati".to_owned(),
                },
            ),
            at(
                "b",
                EventPayload::OrderPlaced {
                    order_id: OrderId::new("o1"),
                    order_amount: Price::from_rupees(500),
                },
            ),
        ];

        let summary = AnalyticsSummary::from_events(&events);
        assert_eq!(summary.total_page_views, 3);
        assert_eq!(summary.unique_visitors, 2);
        assert_eq!(summary.total_product_views, 2);
        assert_eq!(summary.total_cart_additions, 1);
        assert_eq!(summary.total_orders, 1);
        assert_eq!(summary.total_revenue, Price::from_rupees(500));
    }

    #[test]
    fn test_empty_summary() {
        let summary = AnalyticsSummary::from_events(&Vec::<AnalyticsEvent>::new());
        assert_eq!(summary, AnalyticsSummary::default());
        assert_eq!(summary.total_revenue, Price::ZERO);
    }

    #[test]
    fn test_top_products_stable_on_ties() {
        let events = vec![
            product_view("a", "Sella"),
            product_view("a", "Basmati"),
            product_view("a", "Brown"),
            product_view("a", "Basmati"),
            product_view("a", "Brown"),
        ];
        let summary = AnalyticsSummary::from_events(&events);
        let names: Vec<_> = summary.top_products.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Basmati", "Brown", "Sella"]);
        assert_eq!(summary.top_products[0].count, 2);
    }

    #[test]
    fn test_top_n_truncates() {
        let labels = ["a", "b", "c", "d", "e", "f", "g", "a"];
        let top = top_n(labels, 5);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].name, "a");
        assert_eq!(top[4].name, "e");
    }

    #[test]
    fn test_top_categories_only_count_filters() {
        let events = vec![
            at(
                "a",
                EventPayload::CategoryFilter {
                    category: "Basmati".to_owned(),
                },
            ),
            at(
                "a",
                EventPayload::Search {
                    query: "Basmati".to_owned(),
                },
            ),
        ];
        let summary = AnalyticsSummary::from_events(&events);
        assert_eq!(summary.top_categories.len(), 1);
        assert_eq!(summary.top_categories[0].count, 1);
        assert_eq!(summary.unique_visitors, 1);
    }

    #[test]
    fn test_event_carries_schema_version() {
        let event = page("a");
        assert_eq!(event.schema_version, SCHEMA_VERSION);
        assert!(AnalyticsEvent::check_version(event.schema_version).is_ok());
        assert_eq!(
            AnalyticsEvent::check_version(0),
            Err(EventSchemaError::UnsupportedVersion(0))
        );
    }

    #[test]
    fn test_event_kind_parsing() {
        assert_eq!("order_placed".parse::<EventKind>().unwrap(), EventKind::OrderPlaced);
        assert!(matches!(
            "checkout_started".parse::<EventKind>(),
            Err(EventSchemaError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_order_placed_fields() {
        let event = at(
            "v",
            EventPayload::OrderPlaced {
                order_id: OrderId::new("o9"),
                order_amount: Price::from_rupees(2150),
            },
        );
        assert_eq!(event.kind, EventKind::OrderPlaced);
        assert_eq!(event.order_id, Some(OrderId::new("o9")));
        assert!(event.product_id.is_none());
    }
}
