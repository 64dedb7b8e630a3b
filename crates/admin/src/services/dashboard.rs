//! Dashboard figures.

use serde::Serialize;
use tracing::instrument;
use yousuf_rice_backend::{Backend, Result};
use yousuf_rice_core::models::Order;
use yousuf_rice_core::{OrderStatus, Price};

/// Number of orders listed on the dashboard.
pub const RECENT_ORDERS: usize = 10;

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_orders: u64,
    pub pending_orders: u64,
    /// Sum of delivered orders only.
    pub total_revenue: Price,
    pub active_products: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub recent_orders: Vec<Order>,
}

impl DashboardStats {
    #[must_use]
    pub fn compute(orders: &[Order], active_products: u64) -> Self {
        Self {
            total_orders: orders.len() as u64,
            pending_orders: orders
                .iter()
                .filter(|o| o.status == OrderStatus::Pending)
                .count() as u64,
            total_revenue: orders
                .iter()
                .filter(|o| o.status == OrderStatus::Delivered)
                .map(|o| o.total_amount)
                .sum(),
            active_products,
        }
    }
}

/// Load the dashboard. Any read failure yields zeros and no orders.
#[instrument(skip(backend))]
pub async fn load(backend: &Backend) -> Dashboard {
    match try_load(backend).await {
        Ok(dashboard) => dashboard,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load dashboard");
            Dashboard::default()
        }
    }
}

async fn try_load(backend: &Backend) -> Result<Dashboard> {
    let orders = backend.orders();
    let products = backend.products();
    let (orders, products) = tokio::join!(orders.list_recent(None), products.list_active());
    let orders = orders?;
    let active_products = products?.len() as u64;

    Ok(Dashboard {
        stats: DashboardStats::compute(&orders, active_products),
        recent_orders: orders.into_iter().take(RECENT_ORDERS).collect(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use yousuf_rice_backend::{Collection, MemoryStore};
    use yousuf_rice_core::CustomerId;
    use yousuf_rice_core::checkout::OrderNumber;
    use yousuf_rice_core::models::NewOrder;
    use yousuf_rice_core::PaymentMethod;

    use super::*;

    fn order(total: i64) -> NewOrder {
        NewOrder {
            order_number: OrderNumber::generate(1_700_000_123_456, 7),
            customer_id: CustomerId::new("c-1"),
            customer_name: "Ali Raza".to_owned(),
            customer_phone: "+923001234567".to_owned(),
            customer_address: "Block 5".to_owned(),
            customer_area: "Clifton".to_owned(),
            subtotal: Price::from_rupees(total),
            delivery_fee: Price::ZERO,
            total_amount: Price::from_rupees(total),
            payment_method: PaymentMethod::CashOnDelivery,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_stats_count_delivered_revenue_only() {
        let backend = Backend::in_memory(MemoryStore::new());
        let orders = backend.orders();
        let first = orders.create(&order(2500)).await.unwrap();
        orders.create(&order(900)).await.unwrap();
        orders
            .update_status(&first.id, OrderStatus::Delivered)
            .await
            .unwrap();

        let dashboard = load(&backend).await;
        assert_eq!(dashboard.stats.total_orders, 2);
        assert_eq!(dashboard.stats.pending_orders, 1);
        assert_eq!(dashboard.stats.total_revenue, Price::from_rupees(2500));
        assert_eq!(dashboard.recent_orders.len(), 2);
    }

    #[tokio::test]
    async fn test_failure_yields_zeros() {
        let store = MemoryStore::new();
        store.fail_reads(Collection::Orders).await;
        let dashboard = load(&Backend::in_memory(store)).await;
        assert_eq!(dashboard.stats, DashboardStats::default());
        assert!(dashboard.recent_orders.is_empty());
    }
}
