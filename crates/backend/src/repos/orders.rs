//! Orders and order items tables.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;
use yousuf_rice_core::checkout::OrderNumber;
use yousuf_rice_core::models::{NewOrder, NewOrderItem, Order, OrderItem};
use yousuf_rice_core::pricing::WeightTier;
use yousuf_rice_core::{
    CustomerId, OrderId, OrderItemId, OrderStatus, PaymentMethod, Price, ProductId,
};

use super::to_attributes;
use crate::error::Result;
use crate::store::{Collection, Document, DocumentStore, ListQuery};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OrderRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    order_number: Option<OrderNumber>,
    customer_id: String,
    customer_name: String,
    customer_phone: String,
    customer_address: String,
    customer_area: String,
    // Older orders only stored the grand total.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    subtotal: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    delivery_fee: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    total_amount: Decimal,
    status: OrderStatus,
    #[serde(default)]
    payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OrderItemRecord {
    order_id: String,
    product_id: String,
    product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    weight_tier: Option<WeightTier>,
    quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    total_price: Decimal,
}

fn to_order(doc: &Document) -> Result<Order> {
    let record: OrderRecord = doc.decode(Collection::Orders)?;
    let total = Price::new(record.total_amount);
    let delivery_fee = record.delivery_fee.map_or(Price::ZERO, Price::new);
    Ok(Order {
        id: OrderId::new(doc.id.clone()),
        order_number: record.order_number,
        customer_id: CustomerId::new(record.customer_id),
        customer_name: record.customer_name,
        customer_phone: record.customer_phone,
        customer_address: record.customer_address,
        customer_area: record.customer_area,
        subtotal: record.subtotal.map_or(total, Price::new),
        delivery_fee,
        total_amount: total,
        status: record.status,
        payment_method: record.payment_method,
        notes: record.notes,
        created_at: doc.created_at,
        updated_at: doc.updated_at,
    })
}

fn to_item(doc: &Document) -> Result<OrderItem> {
    let record: OrderItemRecord = doc.decode(Collection::OrderItems)?;
    Ok(OrderItem {
        id: OrderItemId::new(doc.id.clone()),
        order_id: OrderId::new(record.order_id),
        product_id: ProductId::new(record.product_id),
        product_name: record.product_name,
        weight_tier: record.weight_tier,
        quantity: record.quantity,
        unit_price: Price::new(record.unit_price),
        total_price: Price::new(record.total_price),
    })
}

#[derive(Clone)]
pub struct OrderRepository {
    store: Arc<dyn DocumentStore>,
}

impl OrderRepository {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create an order in `pending` status.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the write fails.
    #[instrument(skip(self, order), fields(order_number = %order.order_number))]
    pub async fn create(&self, order: &NewOrder) -> Result<Order> {
        let record = OrderRecord {
            order_number: Some(order.order_number.clone()),
            customer_id: order.customer_id.as_str().to_owned(),
            customer_name: order.customer_name.clone(),
            customer_phone: order.customer_phone.clone(),
            customer_address: order.customer_address.clone(),
            customer_area: order.customer_area.clone(),
            subtotal: Some(order.subtotal.amount()),
            delivery_fee: Some(order.delivery_fee.amount()),
            total_amount: order.total_amount.amount(),
            status: OrderStatus::Pending,
            payment_method: order.payment_method,
            notes: order.notes.clone(),
        };
        let doc = self
            .store
            .create(Collection::Orders, to_attributes(Collection::Orders, &record)?)
            .await?;
        to_order(&doc)
    }

    /// # Errors
    ///
    /// Returns `BackendError` if the read fails for any reason other than a
    /// missing document.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get(&self, id: &OrderId) -> Result<Option<Order>> {
        match self.store.get(Collection::Orders, id.as_str()).await {
            Ok(doc) => to_order(&doc).map(Some),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Orders newest first, optionally capped.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the read fails or a document is malformed.
    #[instrument(skip(self))]
    pub async fn list_recent(&self, limit: Option<u32>) -> Result<Vec<Order>> {
        let mut query = ListQuery::new().order_desc("$createdAt");
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        let docs = self.store.list(Collection::Orders, &query).await?;
        docs.iter().map(to_order).collect()
    }

    /// Store a new status. Transition rules are checked by the caller.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the write fails or the order is missing.
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn update_status(&self, id: &OrderId, status: OrderStatus) -> Result<Order> {
        let mut data = Map::new();
        data.insert("status".to_owned(), Value::String(status.as_str().to_owned()));
        let doc = self
            .store
            .update(Collection::Orders, id.as_str(), data)
            .await?;
        to_order(&doc)
    }

    /// # Errors
    ///
    /// Returns `BackendError` if the delete fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn delete(&self, id: &OrderId) -> Result<()> {
        self.store.delete(Collection::Orders, id.as_str()).await
    }

    /// # Errors
    ///
    /// Returns `BackendError` if the write fails.
    #[instrument(skip(self, item), fields(order_id = %item.order_id, product_id = %item.product_id))]
    pub async fn create_item(&self, item: &NewOrderItem) -> Result<OrderItem> {
        let record = OrderItemRecord {
            order_id: item.order_id.as_str().to_owned(),
            product_id: item.product_id.as_str().to_owned(),
            product_name: item.product_name.clone(),
            weight_tier: Some(item.weight_tier),
            quantity: item.quantity,
            unit_price: item.unit_price.amount(),
            total_price: item.total_price.amount(),
        };
        let doc = self
            .store
            .create(
                Collection::OrderItems,
                to_attributes(Collection::OrderItems, &record)?,
            )
            .await?;
        to_item(&doc)
    }

    /// Items belonging to one order, in creation order.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the read fails or a document is malformed.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn items_for(&self, order_id: &OrderId) -> Result<Vec<OrderItem>> {
        let docs = self
            .store
            .list(
                Collection::OrderItems,
                &ListQuery::new()
                    .equal("order_id", order_id.as_str())
                    .order_asc("$createdAt"),
            )
            .await?;
        docs.iter().map(to_item).collect()
    }

    /// # Errors
    ///
    /// Returns `BackendError` if the delete fails.
    #[instrument(skip(self), fields(item_id = %id))]
    pub async fn delete_item(&self, id: &OrderItemId) -> Result<()> {
        self.store.delete(Collection::OrderItems, id.as_str()).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::memory::MemoryStore;

    fn new_order() -> NewOrder {
        NewOrder {
            order_number: OrderNumber::generate(1_700_000_123_456, 42),
            customer_id: CustomerId::new("c1"),
            customer_name: "Bilal".to_owned(),
            customer_phone: "+923001234567".to_owned(),
            customer_address: "Street 4".to_owned(),
            customer_area: "Malir".to_owned(),
            subtotal: Price::from_rupees(1200),
            delivery_fee: Price::from_rupees(150),
            total_amount: Price::from_rupees(1350),
            payment_method: PaymentMethod::CashOnDelivery,
            notes: Some("Call before delivery".to_owned()),
        }
    }

    #[tokio::test]
    async fn test_create_order_is_pending() {
        let repo = OrderRepository::new(Arc::new(MemoryStore::new()));
        let order = repo.create(&new_order()).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, Price::from_rupees(1350));
        assert_eq!(order.order_number.unwrap().as_str(), "YR123456042");
    }

    #[tokio::test]
    async fn test_items_for_filters_by_order() {
        let repo = OrderRepository::new(Arc::new(MemoryStore::new()));
        let a = repo.create(&new_order()).await.unwrap();
        let b = repo.create(&new_order()).await.unwrap();

        for (order, name) in [(&a, "Basmati"), (&b, "Sella"), (&a, "Brown")] {
            repo.create_item(&NewOrderItem {
                order_id: order.id.clone(),
                product_id: ProductId::new(name.to_lowercase()),
                product_name: name.to_owned(),
                weight_tier: WeightTier::OneKg,
                quantity: 2,
                unit_price: Price::from_rupees(300),
                total_price: Price::from_rupees(600),
            })
            .await
            .unwrap();
        }

        let items = repo.items_for(&a.id).await.unwrap();
        let names: Vec<_> = items.iter().map(|i| i.product_name.as_str()).collect();
        assert_eq!(names, ["Basmati", "Brown"]);
        assert_eq!(items[0].weight_tier, Some(WeightTier::OneKg));
    }

    #[tokio::test]
    async fn test_update_status() {
        let repo = OrderRepository::new(Arc::new(MemoryStore::new()));
        let order = repo.create(&new_order()).await.unwrap();
        let updated = repo
            .update_status(&order.id, OrderStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Confirmed);
        assert_eq!(updated.customer_name, "Bilal");
    }

    #[tokio::test]
    async fn test_legacy_order_without_breakdown() {
        let store = Arc::new(MemoryStore::new());
        let data = json!({
            "customer_id": "c9",
            "customer_name": "Old",
            "customer_phone": "+923001112222",
            "customer_address": "x",
            "customer_area": "Saddar",
            "total_amount": 900.0,
            "status": "delivered",
            "payment_method": "cod"
        });
        let Value::Object(map) = data else { unreachable!() };
        let doc = store.create(Collection::Orders, map).await.unwrap();

        let repo = OrderRepository::new(store);
        let order = repo.get(&OrderId::new(doc.id)).await.unwrap().unwrap();
        assert_eq!(order.subtotal, Price::from_rupees(900));
        assert_eq!(order.delivery_fee, Price::ZERO);
        assert!(order.order_number.is_none());
    }
}
