//! Typed access to each table.
//!
//! Each repository owns the record shape stored in its table and converts it
//! to and from the domain types in `yousuf_rice_core::models`.

pub mod admin_users;
pub mod analytics;
pub mod customers;
pub mod orders;
pub mod products;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{BackendError, Result};
use crate::store::Collection;

pub use admin_users::AdminUserRepository;
pub use analytics::AnalyticsRepository;
pub use customers::CustomerRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;

/// Serialize a record into a document attribute map.
pub(crate) fn to_attributes<T: Serialize>(collection: Collection, record: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(BackendError::Decode {
            collection,
            id: String::new(),
            message: format!("record serialized to {other} instead of an object"),
        }),
    }
}
