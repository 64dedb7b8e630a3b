//! Storage interfaces.
//!
//! The application never talks to Appwrite directly: it goes through
//! [`DocumentStore`] and [`FileStore`], which have a REST implementation
//! ([`crate::appwrite::AppwriteClient`]) and an in-memory one
//! ([`crate::memory::MemoryStore`]) used by tests and local development.

use core::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use yousuf_rice_core::FileId;

use crate::error::{BackendError, Result};

/// The tables the application uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Customers,
    Orders,
    OrderItems,
    AdminUsers,
    AnalyticsEvents,
    Sessions,
}

impl Collection {
    pub const ALL: [Self; 7] = [
        Self::Products,
        Self::Customers,
        Self::Orders,
        Self::OrderItems,
        Self::AdminUsers,
        Self::AnalyticsEvents,
        Self::Sessions,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Customers => "customers",
            Self::Orders => "orders",
            Self::OrderItems => "order_items",
            Self::AdminUsers => "admin_users",
            Self::AnalyticsEvents => "analytics_events",
            Self::Sessions => "sessions",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored document: system fields plus the attribute map.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub data: Map<String, Value>,
}

impl Document {
    /// Split a raw JSON document into system fields and attributes.
    ///
    /// System fields start with `$`; everything else is an attribute.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Decode`] if the value is not an object or has
    /// no `$id`.
    pub fn from_json(collection: Collection, value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(BackendError::Decode {
                collection,
                id: String::new(),
                message: "document is not a JSON object".to_owned(),
            });
        };

        let id = match map.remove("$id") {
            Some(Value::String(id)) => id,
            _ => {
                return Err(BackendError::Decode {
                    collection,
                    id: String::new(),
                    message: "document has no $id".to_owned(),
                });
            }
        };
        let created_at = take_timestamp(&mut map, "$createdAt");
        let updated_at = take_timestamp(&mut map, "$updatedAt");
        map.retain(|key, _| !key.starts_with('$'));

        Ok(Self {
            id,
            created_at,
            updated_at,
            data: map,
        })
    }

    /// Deserialize the attributes into a record type.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Decode`] naming the document if the attributes
    /// do not fit `T`.
    pub fn decode<T: serde::de::DeserializeOwned>(&self, collection: Collection) -> Result<T> {
        serde_json::from_value(Value::Object(self.data.clone())).map_err(|e| {
            BackendError::Decode {
                collection,
                id: self.id.clone(),
                message: e.to_string(),
            }
        })
    }

    /// Attribute or system field by name, for filtering and sorting.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Value> {
        match name {
            "$id" => Some(Value::String(self.id.clone())),
            "$createdAt" => self.created_at.map(|t| Value::String(t.to_rfc3339())),
            "$updatedAt" => self.updated_at.map(|t| Value::String(t.to_rfc3339())),
            _ => self.data.get(name).cloned(),
        }
    }
}

fn take_timestamp(map: &mut Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    map.remove(key)
        .and_then(|v| v.as_str().map(str::to_owned))
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|t| t.with_timezone(&Utc))
}

/// One condition in a [`ListQuery`].
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Equal(String, Value),
    GreaterThanEqual(String, Value),
    LessThanEqual(String, Value),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortOrder {
    Asc(String),
    Desc(String),
}

/// Server-side list parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub filters: Vec<Filter>,
    pub order: Option<SortOrder>,
    pub limit: Option<u32>,
}

impl ListQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn equal(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters
            .push(Filter::Equal(field.to_owned(), value.into()));
        self
    }

    #[must_use]
    pub fn greater_than_equal(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters
            .push(Filter::GreaterThanEqual(field.to_owned(), value.into()));
        self
    }

    #[must_use]
    pub fn less_than_equal(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters
            .push(Filter::LessThanEqual(field.to_owned(), value.into()));
        self
    }

    #[must_use]
    pub fn order_asc(mut self, field: &str) -> Self {
        self.order = Some(SortOrder::Asc(field.to_owned()));
        self
    }

    #[must_use]
    pub fn order_desc(mut self, field: &str) -> Self {
        self.order = Some(SortOrder::Desc(field.to_owned()));
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// CRUD access to document tables.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List documents matching `query`.
    async fn list(&self, collection: Collection, query: &ListQuery) -> Result<Vec<Document>>;

    /// Fetch one document by id.
    async fn get(&self, collection: Collection, id: &str) -> Result<Document>;

    /// Create a document with a backend-issued id.
    async fn create(&self, collection: Collection, data: Map<String, Value>) -> Result<Document>;

    /// Update some attributes of a document.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<()>;
}

/// A file to upload.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Binary file storage (product images).
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store a file and return its id.
    async fn upload(&self, file: Upload) -> Result<FileId>;

    async fn delete(&self, id: &FileId) -> Result<()>;

    /// Public URL serving the original file.
    fn view_url(&self, id: &FileId) -> String;

    /// Public URL serving a resized preview.
    fn preview_url(&self, id: &FileId, width: u32, height: u32) -> String;
}
