//! Order composer.
//!
//! Turns a cart and a checkout form into a customer, an order and its
//! items. Validation and totals are computed before anything is written.
//! If an item write fails, the items already written and the order are
//! deleted again before the error is returned, so a failed checkout does
//! not leave a partial order behind.

use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use tracing::instrument;
use yousuf_rice_backend::{Backend, BackendError};
use yousuf_rice_core::analytics::EventPayload;
use yousuf_rice_core::cart::Cart;
use yousuf_rice_core::checkout::{
    CheckoutForm, DeliveryPolicy, OrderDraft, OrderNumber, ServiceArea, ValidatedCheckout,
};
use yousuf_rice_core::models::{Customer, NewCustomer, NewOrder, NewOrderItem, Order, OrderItem};
use yousuf_rice_core::{OrderId, PaymentMethod, Price};

use crate::error::{AppError, Result};
use crate::middleware::Visitor;
use crate::services::analytics::AnalyticsTracker;

/// What the shopper sees after a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub subtotal: Price,
    pub delivery_fee: Price,
    pub total: Price,
}

/// Places cash-on-delivery orders.
#[derive(Clone)]
pub struct OrderComposer {
    backend: Backend,
    service_area: ServiceArea,
    delivery: DeliveryPolicy,
    tracker: AnalyticsTracker,
}

impl OrderComposer {
    #[must_use]
    pub const fn new(
        backend: Backend,
        service_area: ServiceArea,
        delivery: DeliveryPolicy,
        tracker: AnalyticsTracker,
    ) -> Self {
        Self {
            backend,
            service_area,
            delivery,
            tracker,
        }
    }

    #[must_use]
    pub const fn service_area(&self) -> &ServiceArea {
        &self.service_area
    }

    #[must_use]
    pub const fn delivery(&self) -> &DeliveryPolicy {
        &self.delivery
    }

    /// Place an order for everything in `cart` and empty it.
    ///
    /// The cart is only cleared on success.
    ///
    /// # Errors
    ///
    /// - [`AppError::Checkout`] for an invalid form or an empty cart, before
    ///   any backend call.
    /// - [`AppError::OrderFailed`] if a customer, order or item write fails.
    #[instrument(skip_all, fields(lines = cart.lines().len()))]
    pub async fn place_order(
        &self,
        cart: &mut Cart,
        form: &CheckoutForm,
        visitor: &Visitor,
    ) -> Result<PlacedOrder> {
        let checkout = form.validate(&self.service_area)?;
        let draft = OrderDraft::compose(cart, &self.delivery)?;

        let customer = self
            .resolve_customer(&checkout)
            .await
            .map_err(AppError::OrderFailed)?;

        let order_number = OrderNumber::generate(
            Utc::now().timestamp_millis(),
            rand::rng().random_range(0..1000),
        );
        let order = self
            .backend
            .orders()
            .create(&NewOrder {
                order_number: order_number.clone(),
                customer_id: customer.id.clone(),
                customer_name: checkout.name.clone(),
                customer_phone: checkout.phone.as_str().to_owned(),
                customer_address: checkout.address.clone(),
                customer_area: checkout.area.clone(),
                subtotal: draft.totals.subtotal,
                delivery_fee: draft.totals.delivery_fee,
                total_amount: draft.totals.total,
                payment_method: PaymentMethod::CashOnDelivery,
                notes: checkout.notes.clone(),
            })
            .await
            .map_err(AppError::OrderFailed)?;

        self.write_items(&order, &draft)
            .await
            .map_err(AppError::OrderFailed)?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order_number,
            total = %draft.totals.total,
            "Order placed"
        );
        self.tracker.track(
            visitor,
            EventPayload::OrderPlaced {
                order_id: order.id.clone(),
                order_amount: draft.totals.total,
            },
        );

        cart.clear();

        Ok(PlacedOrder {
            order_id: order.id,
            order_number,
            subtotal: draft.totals.subtotal,
            delivery_fee: draft.totals.delivery_fee,
            total: draft.totals.total,
        })
    }

    async fn resolve_customer(
        &self,
        checkout: &ValidatedCheckout,
    ) -> std::result::Result<Customer, BackendError> {
        let customers = self.backend.customers();
        if let Some(existing) = customers.find_by_phone(&checkout.phone).await? {
            return Ok(existing);
        }
        customers
            .create(&NewCustomer {
                name: checkout.name.clone(),
                phone: checkout.phone.clone(),
                email: checkout.email.clone(),
                address: checkout.address.clone(),
                area: checkout.area.clone(),
                city: checkout.city.clone(),
            })
            .await
    }

    async fn write_items(
        &self,
        order: &Order,
        draft: &OrderDraft,
    ) -> std::result::Result<Vec<OrderItem>, BackendError> {
        let orders = self.backend.orders();
        let mut written: Vec<OrderItem> = Vec::with_capacity(draft.items.len());

        for item in &draft.items {
            let result = orders
                .create_item(&NewOrderItem {
                    order_id: order.id.clone(),
                    product_id: item.product_id.clone(),
                    product_name: item.product_name.clone(),
                    weight_tier: item.tier,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    total_price: item.line_total,
                })
                .await;

            match result {
                Ok(created) => written.push(created),
                Err(e) => {
                    self.roll_back(order, &written).await;
                    return Err(e);
                }
            }
        }

        Ok(written)
    }

    /// Best-effort removal of a partially written order.
    async fn roll_back(&self, order: &Order, written: &[OrderItem]) {
        let orders = self.backend.orders();
        tracing::warn!(
            order_id = %order.id,
            items = written.len(),
            "Rolling back partially written order"
        );

        for item in written {
            if let Err(e) = orders.delete_item(&item.id).await {
                tracing::error!(error = %e, item_id = %item.id, "Failed to delete order item");
            }
        }
        if let Err(e) = orders.delete(&order.id).await {
            tracing::error!(error = %e, order_id = %order.id, "Failed to delete order");
        }
    }
}
