//! Product management with image storage.
//!
//! Images live in the storage bucket; the product row keeps the file id and
//! its public view URL. A replaced image is uploaded before the row changes
//! and the old file is removed afterwards, so a failed write never leaves a
//! product pointing at a deleted file.

use rust_decimal::Decimal;
use tracing::instrument;
use yousuf_rice_backend::{Backend, Upload};
use yousuf_rice_core::models::{NewProduct, Product};
use yousuf_rice_core::pricing::BasePrice;
use yousuf_rice_core::{FileId, ProductId};

use crate::error::{AppError, Result};

/// Editable product fields as submitted by the panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub category: String,
    pub base_price: Decimal,
    pub stock_quantity: u32,
    pub is_active: bool,
}

impl ProductForm {
    /// Trim text fields and check the price.
    ///
    /// # Errors
    ///
    /// [`AppError::BadRequest`] for a blank name or category,
    /// [`AppError::Pricing`] for a non-positive price.
    pub fn validate(&self) -> Result<(BasePrice, Self)> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Product name is required".to_owned()));
        }
        let category = self.category.trim();
        if category.is_empty() {
            return Err(AppError::BadRequest("Category is required".to_owned()));
        }
        let price = BasePrice::new(self.base_price)?;
        Ok((
            price,
            Self {
                name: name.to_owned(),
                description: self.description.trim().to_owned(),
                category: category.to_owned(),
                ..self.clone()
            },
        ))
    }

    fn into_new_product(self, price: BasePrice, image: Option<StoredImage>) -> NewProduct {
        let (image_file_id, image_url) = image.map_or((None, None), |i| (Some(i.id), Some(i.url)));
        NewProduct {
            name: self.name,
            description: self.description,
            category: self.category,
            image_file_id,
            image_url,
            base_price: price.price(),
            stock_quantity: self.stock_quantity,
            is_active: self.is_active,
        }
    }
}

#[derive(Debug, Clone)]
struct StoredImage {
    id: FileId,
    url: String,
}

/// Catalog writes for the admin panel.
#[derive(Clone)]
pub struct ProductManager {
    backend: Backend,
}

impl ProductManager {
    #[must_use]
    pub const fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Every product, active or not, filtered by name or category.
    ///
    /// # Errors
    ///
    /// Returns an error if the product list cannot be read.
    #[instrument(skip(self))]
    pub async fn list(&self, query: Option<&str>) -> Result<Vec<Product>> {
        let products = self.backend.products().list_all().await?;
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        Ok(match query {
            Some(q) => {
                let q = q.to_lowercase();
                products
                    .into_iter()
                    .filter(|p| {
                        p.name.to_lowercase().contains(&q) || p.category.to_lowercase().contains(&q)
                    })
                    .collect()
            }
            None => products,
        })
    }

    /// Create a product, uploading its image first when one is given.
    ///
    /// # Errors
    ///
    /// Validation errors before any write; backend errors otherwise. An
    /// uploaded image is removed again if the row cannot be created.
    #[instrument(skip(self, form, image), fields(name = %form.name))]
    pub async fn create(&self, form: &ProductForm, image: Option<Upload>) -> Result<Product> {
        let (price, form) = form.validate()?;
        let stored = match image {
            Some(upload) => Some(self.store_image(upload).await?),
            None => None,
        };
        let stored_id = stored.as_ref().map(|s| s.id.clone());

        match self
            .backend
            .products()
            .create(&form.into_new_product(price, stored))
            .await
        {
            Ok(product) => {
                tracing::info!(product_id = %product.id, "Product created");
                Ok(product)
            }
            Err(e) => {
                if let Some(id) = stored_id {
                    self.discard_image(&id).await;
                }
                Err(e.into())
            }
        }
    }

    /// Replace a product's fields. A new image replaces the old one, which
    /// is deleted after the row is updated.
    ///
    /// # Errors
    ///
    /// [`AppError::NotFound`] for an unknown product, validation errors
    /// before any write, backend errors otherwise.
    #[instrument(skip(self, form, image), fields(product_id = %id))]
    pub async fn update(
        &self,
        id: &ProductId,
        form: &ProductForm,
        image: Option<Upload>,
    ) -> Result<Product> {
        let (price, form) = form.validate()?;
        let existing = self
            .backend
            .products()
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("product".to_owned()))?;

        let (stored, replaced, uploaded) = match image {
            Some(upload) => {
                let stored = self.store_image(upload).await?;
                let uploaded = stored.id.clone();
                (Some(stored), existing.image_file_id, Some(uploaded))
            }
            None => (
                existing
                    .image_file_id
                    .zip(existing.image_url)
                    .map(|(id, url)| StoredImage { id, url }),
                None,
                None,
            ),
        };

        let product = match self
            .backend
            .products()
            .update(id, &form.into_new_product(price, stored))
            .await
        {
            Ok(product) => product,
            Err(e) => {
                if let Some(uploaded) = uploaded {
                    self.discard_image(&uploaded).await;
                }
                return Err(e.into());
            }
        };

        if let Some(old) = replaced {
            self.discard_image(&old).await;
        }
        tracing::info!(product_id = %product.id, "Product updated");
        Ok(product)
    }

    /// Delete a product and its image.
    ///
    /// # Errors
    ///
    /// [`AppError::NotFound`] for an unknown product; backend errors
    /// otherwise. Image deletion failures are logged only.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<()> {
        let product = self
            .backend
            .products()
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("product".to_owned()))?;

        if let Some(file_id) = &product.image_file_id {
            self.discard_image(file_id).await;
        }
        self.backend.products().delete(id).await?;
        tracing::info!("Product deleted");
        Ok(())
    }

    async fn store_image(&self, upload: Upload) -> Result<StoredImage> {
        if upload.bytes.is_empty() {
            return Err(AppError::BadRequest("Image file is empty".to_owned()));
        }
        if !upload.content_type.starts_with("image/") {
            return Err(AppError::BadRequest(format!(
                "Unsupported image type: {}",
                upload.content_type
            )));
        }
        let files = self.backend.files();
        let id = files.upload(upload).await?;
        let url = files.view_url(&id);
        Ok(StoredImage { id, url })
    }

    async fn discard_image(&self, id: &FileId) {
        if let Err(e) = self.backend.files().delete(id).await {
            tracing::warn!(file_id = %id, error = %e, "Failed to delete product image");
        }
    }
}
