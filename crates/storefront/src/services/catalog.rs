//! Read-only product catalog with a short-lived cache.
//!
//! The active product list is read from the backend at most once per TTL.
//! Admin edits made in another process show up once the entry expires.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};
use yousuf_rice_backend::{ProductRepository, Result};
use yousuf_rice_core::ProductId;
use yousuf_rice_core::models::Product;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
enum CacheKey {
    ActiveProducts,
}

/// Filters accepted by the product listing.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter<'a> {
    pub category: Option<&'a str>,
    pub query: Option<&'a str>,
}

/// Cached view of the active products.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    products: ProductRepository,
    cache: Cache<CacheKey, Arc<Vec<Product>>>,
}

impl Catalog {
    #[must_use]
    pub fn new(products: ProductRepository, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self {
            inner: Arc::new(CatalogInner { products, cache }),
        }
    }

    /// All active products, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the cache is cold and the read fails.
    #[instrument(skip(self))]
    pub async fn active_products(&self) -> Result<Arc<Vec<Product>>> {
        if let Some(products) = self.inner.cache.get(&CacheKey::ActiveProducts).await {
            debug!("Cache hit for active products");
            return Ok(products);
        }

        let products = Arc::new(self.inner.products.list_active().await?);
        self.inner
            .cache
            .insert(CacheKey::ActiveProducts, Arc::clone(&products))
            .await;
        Ok(products)
    }

    /// Active products matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the product list cannot be read.
    pub async fn search(&self, filter: &CatalogFilter<'_>) -> Result<Vec<Product>> {
        let products = self.active_products().await?;
        Ok(products
            .iter()
            .filter(|p| {
                filter
                    .category
                    .is_none_or(|c| p.category.eq_ignore_ascii_case(c.trim()))
            })
            .filter(|p| filter.query.is_none_or(|q| p.matches_query(q)))
            .cloned()
            .collect())
    }

    /// Distinct categories of active products, in first-seen order.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the product list cannot be read.
    pub async fn categories(&self) -> Result<Vec<String>> {
        let products = self.active_products().await?;
        let mut categories: Vec<String> = Vec::new();
        for product in products.iter() {
            if !categories.contains(&product.category) {
                categories.push(product.category.clone());
            }
        }
        Ok(categories)
    }

    /// One active product.
    ///
    /// Falls back to a direct read for products created after the cache was
    /// filled. Inactive products are reported as missing.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the product cannot be read.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Option<Product>> {
        let products = self.active_products().await?;
        if let Some(product) = products.iter().find(|p| &p.id == id) {
            return Ok(Some(product.clone()));
        }
        Ok(self
            .inner
            .products
            .get(id)
            .await?
            .filter(|p| p.is_active))
    }

    /// Drop the cached list.
    pub async fn invalidate(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use yousuf_rice_backend::{Backend, MemoryStore};
    use yousuf_rice_core::Price;
    use yousuf_rice_core::models::NewProduct;

    use super::*;

    fn product(name: &str, category: &str, active: bool) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            description: format!("{name} rice"),
            category: category.to_owned(),
            image_file_id: None,
            image_url: None,
            base_price: Price::from_rupees(250),
            stock_quantity: 10,
            is_active: active,
        }
    }

    async fn catalog() -> (Backend, Catalog) {
        let backend = Backend::in_memory(MemoryStore::new());
        for p in [
            product("Super Kernel", "Basmati", true),
            product("Golden Sella", "Sella", true),
            product("Brown Basmati", "Basmati", true),
            product("Discontinued", "Broken", false),
        ] {
            backend.products().create(&p).await.unwrap();
        }
        let catalog = Catalog::new(backend.products(), Duration::from_secs(60));
        (backend, catalog)
    }

    #[tokio::test]
    async fn test_search_by_category_and_query() {
        let (_backend, catalog) = catalog().await;

        let basmati = catalog
            .search(&CatalogFilter {
                category: Some("basmati"),
                query: None,
            })
            .await
            .unwrap();
        assert_eq!(basmati.len(), 2);

        let golden = catalog
            .search(&CatalogFilter {
                category: None,
                query: Some("GOLDEN"),
            })
            .await
            .unwrap();
        assert_eq!(golden.len(), 1);
        assert_eq!(golden[0].name, "Golden Sella");
    }

    #[tokio::test]
    async fn test_categories_first_seen_order() {
        let (_backend, catalog) = catalog().await;
        // Active list is ordered by name: Brown Basmati, Golden Sella, Super Kernel
        assert_eq!(catalog.categories().await.unwrap(), ["Basmati", "Sella"]);
    }

    #[tokio::test]
    async fn test_product_lookup_skips_inactive_and_sees_new() {
        let (backend, catalog) = catalog().await;
        let all = backend.products().list_all().await.unwrap();
        let inactive = all.iter().find(|p| !p.is_active).unwrap();
        assert!(catalog.product(&inactive.id).await.unwrap().is_none());

        // Warm the cache, then add a product behind its back
        catalog.active_products().await.unwrap();
        let fresh = backend
            .products()
            .create(&product("New Crop", "Basmati", true))
            .await
            .unwrap();
        assert_eq!(catalog.active_products().await.unwrap().len(), 3);
        assert!(catalog.product(&fresh.id).await.unwrap().is_some());

        catalog.invalidate().await;
        assert_eq!(catalog.active_products().await.unwrap().len(), 4);
    }
}
