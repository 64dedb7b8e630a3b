//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use yousuf_rice_backend::Backend;
use yousuf_rice_core::checkout::{DeliveryPolicy, ServiceArea};

use crate::config::StorefrontConfig;
use crate::services::analytics::AnalyticsTracker;
use crate::services::catalog::Catalog;
use crate::services::checkout::OrderComposer;

/// Shop rules that vary per deployment.
#[derive(Debug, Clone)]
pub struct ShopSettings {
    pub service_area: ServiceArea,
    pub delivery: DeliveryPolicy,
    pub catalog_ttl: Duration,
}

impl ShopSettings {
    #[must_use]
    pub fn from_config(config: &StorefrontConfig) -> Self {
        Self {
            service_area: ServiceArea::with_city(&config.service_city),
            delivery: DeliveryPolicy::default(),
            catalog_ttl: config.catalog_ttl,
        }
    }
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self {
            service_area: ServiceArea::karachi(),
            delivery: DeliveryPolicy::default(),
            catalog_ttl: Duration::from_secs(60),
        }
    }
}

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    backend: Backend,
    settings: ShopSettings,
    catalog: Catalog,
    tracker: AnalyticsTracker,
    composer: OrderComposer,
}

impl AppState {
    /// Wire the services on top of `backend`.
    #[must_use]
    pub fn new(backend: Backend, settings: ShopSettings) -> Self {
        let catalog = Catalog::new(backend.products(), settings.catalog_ttl);
        let tracker = AnalyticsTracker::new(backend.analytics());
        let composer = OrderComposer::new(
            backend.clone(),
            settings.service_area.clone(),
            settings.delivery,
            tracker.clone(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                backend,
                settings,
                catalog,
                tracker,
                composer,
            }),
        }
    }

    #[must_use]
    pub fn backend(&self) -> &Backend {
        &self.inner.backend
    }

    #[must_use]
    pub fn settings(&self) -> &ShopSettings {
        &self.inner.settings
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn tracker(&self) -> &AnalyticsTracker {
        &self.inner.tracker
    }

    #[must_use]
    pub fn composer(&self) -> &OrderComposer {
        &self.inner.composer
    }
}
