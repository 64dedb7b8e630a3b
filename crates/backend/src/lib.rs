//! Yousuf Rice Backend - storage access for every binary.
//!
//! Products, customers, orders, admin users and analytics all live in one
//! Appwrite database, with product images in a storage bucket. This crate
//! hides the REST details behind two traits, [`DocumentStore`] and
//! [`FileStore`], and offers typed repositories on top.
//!
//! [`MemoryStore`] implements both traits in-process for tests and local
//! development.
//!
//! # Example
//!
//! ```rust
//! # async fn demo() -> yousuf_rice_backend::Result<()> {
//! use yousuf_rice_backend::{Backend, MemoryStore};
//!
//! let backend = Backend::in_memory(MemoryStore::new());
//! let products = backend.products().list_active().await?;
//! assert!(products.is_empty());
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod appwrite;
pub mod config;
pub mod error;
pub mod memory;
pub mod repos;
pub mod store;

use std::sync::Arc;

pub use appwrite::AppwriteClient;
pub use config::{BackendConfig, ConfigError};
pub use error::{BackendError, Result};
pub use memory::MemoryStore;
pub use repos::{
    AdminUserRepository, AnalyticsRepository, CustomerRepository, OrderRepository,
    ProductRepository,
};
pub use store::{Collection, Document, DocumentStore, FileStore, ListQuery, Upload};

/// Handle to the document and file stores. Cheap to clone.
#[derive(Clone)]
pub struct Backend {
    documents: Arc<dyn DocumentStore>,
    files: Arc<dyn FileStore>,
}

impl Backend {
    #[must_use]
    pub fn new(documents: Arc<dyn DocumentStore>, files: Arc<dyn FileStore>) -> Self {
        Self { documents, files }
    }

    /// Connect to Appwrite.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the HTTP client cannot be built.
    pub fn appwrite(config: BackendConfig) -> Result<Self> {
        let client = AppwriteClient::new(config)?;
        Ok(Self::new(Arc::new(client.clone()), Arc::new(client)))
    }

    /// Use an in-memory store for both documents and files.
    #[must_use]
    pub fn in_memory(store: MemoryStore) -> Self {
        Self::new(Arc::new(store.clone()), Arc::new(store))
    }

    #[must_use]
    pub fn files(&self) -> &Arc<dyn FileStore> {
        &self.files
    }

    #[must_use]
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(Arc::clone(&self.documents))
    }

    #[must_use]
    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(Arc::clone(&self.documents))
    }

    #[must_use]
    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(Arc::clone(&self.documents))
    }

    #[must_use]
    pub fn admin_users(&self) -> AdminUserRepository {
        AdminUserRepository::new(Arc::clone(&self.documents))
    }

    #[must_use]
    pub fn analytics(&self) -> AnalyticsRepository {
        AnalyticsRepository::new(Arc::clone(&self.documents))
    }
}
