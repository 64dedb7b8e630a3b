//! Application state shared across handlers.

use std::sync::Arc;

use yousuf_rice_backend::Backend;

use crate::services::{AnalyticsReader, ProductManager};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    backend: Backend,
    analytics: AnalyticsReader,
    products: ProductManager,
}

impl AppState {
    #[must_use]
    pub fn new(backend: Backend) -> Self {
        let analytics = AnalyticsReader::new(backend.analytics());
        let products = ProductManager::new(backend.clone());
        Self {
            inner: Arc::new(AppStateInner {
                backend,
                analytics,
                products,
            }),
        }
    }

    #[must_use]
    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    #[must_use]
    pub fn analytics(&self) -> &AnalyticsReader {
        &self.inner.analytics
    }

    #[must_use]
    pub fn products(&self) -> &ProductManager {
        &self.inner.products
    }
}
