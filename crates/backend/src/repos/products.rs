//! Products table.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use yousuf_rice_core::models::{NewProduct, Product};
use yousuf_rice_core::{FileId, Price, ProductId};

use super::to_attributes;
use crate::error::Result;
use crate::store::{Collection, Document, DocumentStore, ListQuery};

const COLLECTION: Collection = Collection::Products;

/// Stored shape of a product. Prices are float columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProductRecord {
    name: String,
    #[serde(default)]
    description: String,
    category: String,
    #[serde(default)]
    image_file_id: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    base_price: Decimal,
    #[serde(default)]
    stock_quantity: u32,
    is_active: bool,
}

impl From<&NewProduct> for ProductRecord {
    fn from(p: &NewProduct) -> Self {
        Self {
            name: p.name.clone(),
            description: p.description.clone(),
            category: p.category.clone(),
            image_file_id: p.image_file_id.as_ref().map(|id| id.as_str().to_owned()),
            image_url: p.image_url.clone(),
            base_price: p.base_price.amount(),
            stock_quantity: p.stock_quantity,
            is_active: p.is_active,
        }
    }
}

fn to_product(doc: &Document) -> Result<Product> {
    let record: ProductRecord = doc.decode(COLLECTION)?;
    Ok(Product {
        id: ProductId::new(doc.id.clone()),
        name: record.name,
        description: record.description,
        category: record.category,
        image_file_id: record.image_file_id.map(FileId::new),
        image_url: record.image_url,
        base_price: Price::new(record.base_price),
        stock_quantity: record.stock_quantity,
        is_active: record.is_active,
        created_at: doc.created_at,
        updated_at: doc.updated_at,
    })
}

#[derive(Clone)]
pub struct ProductRepository {
    store: Arc<dyn DocumentStore>,
}

impl ProductRepository {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Every product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the read fails or a document is malformed.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Product>> {
        let docs = self
            .store
            .list(COLLECTION, &ListQuery::new().order_desc("$createdAt"))
            .await?;
        docs.iter().map(to_product).collect()
    }

    /// Products visible in the shop, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the read fails or a document is malformed.
    #[instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Vec<Product>> {
        let docs = self
            .store
            .list(
                COLLECTION,
                &ListQuery::new().equal("is_active", true).order_asc("name"),
            )
            .await?;
        docs.iter().map(to_product).collect()
    }

    /// # Errors
    ///
    /// Returns `BackendError` if the read fails for any reason other than a
    /// missing document.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>> {
        match self.store.get(COLLECTION, id.as_str()).await {
            Ok(doc) => to_product(&doc).map(Some),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// # Errors
    ///
    /// Returns `BackendError` if the write fails.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create(&self, product: &NewProduct) -> Result<Product> {
        let data = to_attributes(COLLECTION, &ProductRecord::from(product))?;
        let doc = self.store.create(COLLECTION, data).await?;
        to_product(&doc)
    }

    /// Replace every editable field of a product.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the write fails or the product is missing.
    #[instrument(skip(self, product), fields(product_id = %id))]
    pub async fn update(&self, id: &ProductId, product: &NewProduct) -> Result<Product> {
        let data = to_attributes(COLLECTION, &ProductRecord::from(product))?;
        let doc = self.store.update(COLLECTION, id.as_str(), data).await?;
        to_product(&doc)
    }

    /// # Errors
    ///
    /// Returns `BackendError` if the delete fails or the product is missing.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<()> {
        self.store.delete(COLLECTION, id.as_str()).await
    }
}
