//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use yousuf_rice_core::ProductId;
use yousuf_rice_core::analytics::EventPayload;
use yousuf_rice_core::models::Product;
use yousuf_rice_core::pricing::TierPrice;

use crate::error::{AppError, Result};
use crate::middleware::Visitor;
use crate::services::CatalogFilter;
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub q: Option<String>,
}

/// A product with its price per kilogram at each weight tier.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub tier_prices: [TierPrice; 4],
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// List active products, optionally filtered by category and search text.
///
/// Searches and category filters are tracked.
#[instrument(skip(state, visitor))]
pub async fn index(
    State(state): State<AppState>,
    visitor: Visitor,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Product>>> {
    let category = non_blank(query.category.as_deref());
    let search = non_blank(query.q.as_deref());

    let products = state
        .catalog()
        .search(&CatalogFilter {
            category,
            query: search,
        })
        .await?;

    if let Some(category) = category {
        state.tracker().track(
            &visitor,
            EventPayload::CategoryFilter {
                category: category.to_owned(),
            },
        );
    }
    if let Some(search) = search {
        state.tracker().track(
            &visitor,
            EventPayload::Search {
                query: search.to_owned(),
            },
        );
    }

    Ok(Json(products))
}

/// Distinct categories of active products.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    Ok(Json(state.catalog().categories().await?))
}

/// One active product with its tier prices.
#[instrument(skip(state, visitor))]
pub async fn show(
    State(state): State<AppState>,
    visitor: Visitor,
    Path(id): Path<String>,
) -> Result<Json<ProductDetail>> {
    let product = state
        .catalog()
        .product(&ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("product".to_owned()))?;

    state.tracker().track(
        &visitor,
        EventPayload::ProductView {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
        },
    );

    Ok(Json(ProductDetail {
        tier_prices: product.price_table(),
        product,
    }))
}
