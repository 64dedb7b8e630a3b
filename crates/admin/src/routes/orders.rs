//! Order management route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use yousuf_rice_core::models::{Order, OrderItem};
use yousuf_rice_core::{OrderId, OrderStatus};

use crate::error::{AppError, Result};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub q: Option<String>,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// Orders newest first, filtered by search text and status.
///
/// GET /api/orders
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<Vec<Order>>> {
    let orders = state.backend().orders().list_recent(None).await?;
    let search = query.q.unwrap_or_default();

    Ok(Json(
        orders
            .into_iter()
            .filter(|o| query.status.is_none_or(|s| o.status == s))
            .filter(|o| o.matches_query(&search))
            .collect(),
    ))
}

/// One order with its items.
///
/// GET /api/orders/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderDetail>> {
    let id = OrderId::new(id);
    let orders = state.backend().orders();
    let order = orders
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_owned()))?;
    let items = orders.items_for(&id).await?;

    Ok(Json(OrderDetail { order, items }))
}

/// Move an order along the status table.
///
/// POST /api/orders/{id}/status
#[instrument(skip(state), fields(to = %request.status))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<StatusUpdate>,
) -> Result<Json<Order>> {
    let id = OrderId::new(id);
    let orders = state.backend().orders();
    let order = orders
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_owned()))?;

    let next = order.status.transition_to(request.status)?;
    let updated = orders.update_status(&id, next).await?;
    tracing::info!(order_id = %id, from = %order.status, to = %next, "Order status changed");

    Ok(Json(updated))
}
