//! Admin users table.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;
use yousuf_rice_core::models::AdminUser;
use yousuf_rice_core::{AdminRole, AdminUserId};

use super::to_attributes;
use crate::error::Result;
use crate::store::{Collection, Document, DocumentStore, ListQuery};

const COLLECTION: Collection = Collection::AdminUsers;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AdminUserRecord {
    username: String,
    email: String,
    #[serde(default)]
    role: AdminRole,
    #[serde(default = "default_active")]
    is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_login: Option<DateTime<Utc>>,
}

const fn default_active() -> bool {
    true
}

fn to_admin(doc: &Document) -> Result<AdminUser> {
    let record: AdminUserRecord = doc.decode(COLLECTION)?;
    Ok(AdminUser {
        id: AdminUserId::new(doc.id.clone()),
        username: record.username,
        email: record.email,
        role: record.role,
        is_active: record.is_active,
        created_at: doc.created_at,
        last_login: record.last_login,
    })
}

#[derive(Clone)]
pub struct AdminUserRepository {
    store: Arc<dyn DocumentStore>,
}

impl AdminUserRepository {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Find an active admin by exact username.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the read fails.
    #[instrument(skip(self))]
    pub async fn find_active_by_username(&self, username: &str) -> Result<Option<AdminUser>> {
        let docs = self
            .store
            .list(
                COLLECTION,
                &ListQuery::new()
                    .equal("username", username)
                    .equal("is_active", true)
                    .limit(1),
            )
            .await?;
        docs.first().map(to_admin).transpose()
    }

    /// # Errors
    ///
    /// Returns `BackendError` if the read fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<AdminUser>> {
        let docs = self
            .store
            .list(COLLECTION, &ListQuery::new().order_asc("username"))
            .await?;
        docs.iter().map(to_admin).collect()
    }

    /// # Errors
    ///
    /// Returns `BackendError` if the write fails.
    #[instrument(skip(self, email))]
    pub async fn create(&self, username: &str, email: &str, role: AdminRole) -> Result<AdminUser> {
        let record = AdminUserRecord {
            username: username.to_owned(),
            email: email.to_owned(),
            role,
            is_active: true,
            last_login: None,
        };
        let doc = self
            .store
            .create(COLLECTION, to_attributes(COLLECTION, &record)?)
            .await?;
        to_admin(&doc)
    }

    /// # Errors
    ///
    /// Returns `BackendError` if the write fails or the admin is missing.
    #[instrument(skip(self), fields(admin_id = %id))]
    pub async fn record_login(&self, id: &AdminUserId, at: DateTime<Utc>) -> Result<AdminUser> {
        let mut data = Map::new();
        data.insert("last_login".to_owned(), Value::String(at.to_rfc3339()));
        let doc = self.store.update(COLLECTION, id.as_str(), data).await?;
        to_admin(&doc)
    }
}
