//! In-memory document and file store.
//!
//! Behaves like the Appwrite tables closely enough for tests and local
//! development: ids are issued on create, `$createdAt`/`$updatedAt` are
//! maintained, and [`ListQuery`] filters, ordering and limits are applied.
//! Failures can be injected per table to exercise error paths.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use yousuf_rice_core::FileId;

use crate::error::{BackendError, Result};
use crate::store::{Collection, Document, DocumentStore, FileStore, Filter, ListQuery, SortOrder, Upload};

/// Base URL used for file links served by the in-memory store.
const MEMORY_FILE_BASE: &str = "http://localhost/v1/storage/buckets/memory/files";

#[derive(Default)]
struct Tables {
    documents: HashMap<Collection, Vec<Document>>,
    files: HashMap<String, Upload>,
}

#[derive(Default)]
struct Faults {
    /// Remaining successful creates per table before every create fails.
    creates_before_failure: HashMap<Collection, usize>,
    /// Tables whose reads fail.
    failing_reads: Vec<Collection>,
}

/// Shared in-memory store. Clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    faults: Arc<RwLock<Faults>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `successes` more creates into `collection` succeed, then fail the rest.
    pub async fn fail_creates_after(&self, collection: Collection, successes: usize) {
        self.faults
            .write()
            .await
            .creates_before_failure
            .insert(collection, successes);
    }

    /// Make every list/get on `collection` fail.
    pub async fn fail_reads(&self, collection: Collection) {
        self.faults.write().await.failing_reads.push(collection);
    }

    /// Remove injected failures.
    pub async fn clear_faults(&self) {
        *self.faults.write().await = Faults::default();
    }

    /// Number of documents in a table.
    pub async fn count(&self, collection: Collection) -> usize {
        self.tables
            .read()
            .await
            .documents
            .get(&collection)
            .map_or(0, Vec::len)
    }

    /// Number of stored files.
    pub async fn file_count(&self) -> usize {
        self.tables.read().await.files.len()
    }

    async fn check_read(&self, collection: Collection) -> Result<()> {
        if self.faults.read().await.failing_reads.contains(&collection) {
            return Err(BackendError::Simulated(format!("read from {collection}")));
        }
        Ok(())
    }

    async fn check_create(&self, collection: Collection) -> Result<()> {
        let mut faults = self.faults.write().await;
        if let Some(remaining) = faults.creates_before_failure.get_mut(&collection) {
            if *remaining == 0 {
                return Err(BackendError::Simulated(format!("create in {collection}")));
            }
            *remaining -= 1;
        }
        Ok(())
    }
}

fn new_id() -> String {
    // Appwrite ids are 20 hex-ish characters
    uuid::Uuid::new_v4().simple().to_string().chars().take(20).collect()
}

/// Compare two field values: timestamps chronologically, numbers numerically,
/// everything else by string form.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn matches(doc: &Document, filter: &Filter) -> bool {
    let (field, expected, accept): (&str, &Value, fn(Ordering) -> bool) = match filter {
        Filter::Equal(field, value) => (field, value, Ordering::is_eq),
        Filter::GreaterThanEqual(field, value) => (field, value, Ordering::is_ge),
        Filter::LessThanEqual(field, value) => (field, value, Ordering::is_le),
    };
    doc.field(field)
        .is_some_and(|actual| accept(compare_values(&actual, expected)))
}

fn apply_query(docs: &[Document], query: &ListQuery) -> Vec<Document> {
    let mut selected: Vec<Document> = docs
        .iter()
        .filter(|doc| query.filters.iter().all(|f| matches(doc, f)))
        .cloned()
        .collect();

    if let Some(order) = &query.order {
        let (field, descending) = match order {
            SortOrder::Asc(field) => (field.as_str(), false),
            SortOrder::Desc(field) => (field.as_str(), true),
        };
        selected.sort_by(|a, b| {
            let ord = match (a.field(field), b.field(field)) {
                (Some(x), Some(y)) => compare_values(&x, &y),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            };
            if descending { ord.reverse() } else { ord }
        });
    }

    if let Some(limit) = query.limit {
        selected.truncate(limit as usize);
    }
    selected
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: Collection, query: &ListQuery) -> Result<Vec<Document>> {
        self.check_read(collection).await?;
        let tables = self.tables.read().await;
        Ok(tables
            .documents
            .get(&collection)
            .map(|docs| apply_query(docs, query))
            .unwrap_or_default())
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Document> {
        self.check_read(collection).await?;
        let tables = self.tables.read().await;
        tables
            .documents
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .cloned()
            .ok_or_else(|| BackendError::NotFound {
                collection,
                id: id.to_owned(),
            })
    }

    async fn create(&self, collection: Collection, data: Map<String, Value>) -> Result<Document> {
        self.check_create(collection).await?;
        let now = Utc::now();
        let doc = Document {
            id: new_id(),
            created_at: Some(now),
            updated_at: Some(now),
            data,
        };
        self.tables
            .write()
            .await
            .documents
            .entry(collection)
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document> {
        let mut tables = self.tables.write().await;
        let doc = tables
            .documents
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| BackendError::NotFound {
                collection,
                id: id.to_owned(),
            })?;
        doc.data.extend(data);
        doc.updated_at = Some(Utc::now());
        Ok(doc.clone())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        let docs = tables.documents.entry(collection).or_default();
        let before = docs.len();
        docs.retain(|d| d.id != id);
        if docs.len() == before {
            return Err(BackendError::NotFound {
                collection,
                id: id.to_owned(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn upload(&self, file: Upload) -> Result<FileId> {
        let id = new_id();
        self.tables.write().await.files.insert(id.clone(), file);
        Ok(FileId::new(id))
    }

    async fn delete(&self, id: &FileId) -> Result<()> {
        self.tables
            .write()
            .await
            .files
            .remove(id.as_str())
            .map(|_| ())
            .ok_or_else(|| BackendError::Api {
                status: 404,
                message: format!("file {id} not found"),
                kind: Some("storage_file_not_found".to_owned()),
            })
    }

    fn view_url(&self, id: &FileId) -> String {
        format!("{MEMORY_FILE_BASE}/{id}/view?project=memory")
    }

    fn preview_url(&self, id: &FileId, width: u32, height: u32) -> String {
        format!("{MEMORY_FILE_BASE}/{id}/preview?project=memory&width={width}&height={height}")
    }
}
