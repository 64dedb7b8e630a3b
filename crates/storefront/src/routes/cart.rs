//! Cart route handlers.
//!
//! The cart lives in the session. Every mutation loads it, applies the
//! change through the [`Cart`] aggregate and saves it back before responding.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;
use yousuf_rice_core::analytics::EventPayload;
use yousuf_rice_core::cart::{Cart, CartError, LineId, ProductSnapshot};
use yousuf_rice_core::pricing::WeightTier;
use yousuf_rice_core::{Price, ProductId};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::Visitor;
use crate::services::CartStore;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CartLineView {
    pub id: LineId,
    pub product: ProductSnapshot,
    pub tier: WeightTier,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
}

/// The cart as returned to clients, with totals computed from the lines.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: u64,
    pub total: Price,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart
                .lines()
                .iter()
                .map(|line| CartLineView {
                    id: line.id.clone(),
                    product: line.product.clone(),
                    tier: line.tier,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    line_total: line.line_total(),
                })
                .collect(),
            item_count: cart.item_count(),
            total: cart.total(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u64,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub tier: WeightTier,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// Show the cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Json<CartView> {
    let cart = CartStore::new(session).load().await;
    Json(CartView::from(&cart))
}

/// Item count badge.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Json<CartCount> {
    let cart = CartStore::new(session).load().await;
    Json(CartCount {
        count: cart.item_count(),
    })
}

/// Add an active product to the cart at a weight tier.
#[instrument(skip(state, session, visitor), fields(product_id = %request.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    visitor: Visitor,
    Json(request): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartView>)> {
    if request.quantity == 0 {
        return Err(CartError::ZeroQuantity.into());
    }

    let product = state
        .catalog()
        .product(&ProductId::new(request.product_id))
        .await?
        .ok_or_else(|| AppError::NotFound("product".to_owned()))?;

    let store = CartStore::new(session);
    let mut cart = store.load().await;
    cart.add_item(
        &product.snapshot(),
        product.base_price,
        request.tier,
        request.quantity,
    )?;
    store.save(&cart).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        &[
            ("product_id", product.id.as_str()),
            ("tier", request.tier.as_str()),
        ],
    );
    state.tracker().track(
        &visitor,
        EventPayload::AddToCart {
            product_id: product.id,
            product_name: product.name,
        },
    );

    Ok((StatusCode::CREATED, Json(CartView::from(&cart))))
}

/// Set a line's quantity; zero or less removes it.
#[instrument(skip(session))]
pub async fn update(
    session: Session,
    Path(line_id): Path<String>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<CartView>> {
    let store = CartStore::new(session);
    let mut cart = store.load().await;
    cart.update_quantity(&LineId::new(line_id), request.quantity)?;
    store.save(&cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Remove one line.
#[instrument(skip(session))]
pub async fn remove(session: Session, Path(line_id): Path<String>) -> Result<Json<CartView>> {
    let store = CartStore::new(session);
    let mut cart = store.load().await;
    let line_id = LineId::new(line_id);
    if !cart.remove_item(&line_id) {
        return Err(CartError::LineNotFound(line_id).into());
    }
    store.save(&cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartView>> {
    let store = CartStore::new(session);
    let mut cart = store.load().await;
    cart.clear();
    store.save(&cart).await?;
    Ok(Json(CartView::from(&cart)))
}
