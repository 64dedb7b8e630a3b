//! Checkout route handlers.

use axum::{Json, extract::State, http::StatusCode};
use tower_sessions::Session;
use tracing::instrument;
use yousuf_rice_core::checkout::{CheckoutForm, OrderTotals};

use crate::error::{Result, add_breadcrumb};
use crate::middleware::Visitor;
use crate::services::{CartStore, PlacedOrder};
use crate::state::AppState;

/// Subtotal, delivery fee and total for the current cart.
#[instrument(skip(state, session))]
pub async fn summary(State(state): State<AppState>, session: Session) -> Json<OrderTotals> {
    let cart = CartStore::new(session).load().await;
    Json(OrderTotals::for_cart(&cart, &state.settings().delivery))
}

/// Place a cash-on-delivery order for the current cart.
///
/// The order is already written when the emptied cart is saved, so a
/// failure to save it is logged rather than reported.
#[instrument(skip(state, session, visitor, form))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    visitor: Visitor,
    Json(form): Json<CheckoutForm>,
) -> Result<(StatusCode, Json<PlacedOrder>)> {
    let store = CartStore::new(session);
    let mut cart = store.load().await;

    let placed = state
        .composer()
        .place_order(&mut cart, &form, &visitor)
        .await?;

    if let Err(e) = store.save(&cart).await {
        tracing::error!(error = %e, order_id = %placed.order_id, "Failed to clear cart after order");
    }

    add_breadcrumb(
        "checkout",
        "Order placed",
        &[("order_number", placed.order_number.as_str())],
    );
    Ok((StatusCode::CREATED, Json(placed)))
}
