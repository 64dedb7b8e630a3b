//! Product management route handlers.
//!
//! Create and update take `multipart/form-data`: text fields `name`,
//! `description`, `category`, `base_price`, `stock_quantity`, `is_active`
//! and an optional `image` file.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State, multipart::Field},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;
use yousuf_rice_backend::Upload;
use yousuf_rice_core::ProductId;
use yousuf_rice_core::models::Product;

use crate::error::{AppError, Result};
use crate::services::ProductForm;
use crate::state::AppState;

/// Largest accepted request body for product forms.
pub const MAX_FORM_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    pub q: Option<String>,
}

/// GET /api/products
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.products().list(query.q.as_deref()).await?))
}

/// POST /api/products
#[instrument(skip(state, multipart))]
pub async fn create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Product>)> {
    let (form, image) = read_form(multipart).await?;
    let product = state.products().create(&form, image).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/products/{id}
#[instrument(skip(state, multipart))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Product>> {
    let (form, image) = read_form(multipart).await?;
    let product = state
        .products()
        .update(&ProductId::new(id), &form, image)
        .await?;
    Ok(Json(product))
}

/// DELETE /api/products/{id}
#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    state.products().delete(&ProductId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn read_form(mut multipart: Multipart) -> Result<(ProductForm, Option<Upload>)> {
    let mut form = ProductForm::default();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match name.as_str() {
            "image" => image = read_image(field).await?,
            "name" => form.name = text(field).await?,
            "description" => form.description = text(field).await?,
            "category" => form.category = text(field).await?,
            "base_price" => {
                let value = text(field).await?;
                form.base_price = value
                    .trim()
                    .parse::<Decimal>()
                    .map_err(|_| AppError::BadRequest(format!("Invalid base_price: {value}")))?;
            }
            "stock_quantity" => {
                let value = text(field).await?;
                form.stock_quantity = value.trim().parse().map_err(|_| {
                    AppError::BadRequest(format!("Invalid stock_quantity: {value}"))
                })?;
            }
            "is_active" => {
                form.is_active = matches!(text(field).await?.trim(), "true" | "on" | "1");
            }
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok((form, image))
}

async fn text(field: Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Read error: {e}")))
}

/// An empty file part means "no new image".
async fn read_image(field: Field<'_>) -> Result<Option<Upload>> {
    let file_name = field.file_name().unwrap_or("image").to_owned();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_owned();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(format!("Read error: {e}")))?;

    Ok((!bytes.is_empty()).then(|| Upload {
        file_name,
        content_type,
        bytes: bytes.to_vec(),
    }))
}
