//! Appwrite REST client.
//!
//! Implements [`DocumentStore`] and [`FileStore`] against the Appwrite HTTP
//! API using a server API key.
//!
//! # Request shape
//!
//! - Documents: `{endpoint}/databases/{db}/collections/{table}/documents[/{id}]`
//! - Files: `{endpoint}/storage/buckets/{bucket}/files[/{id}]`
//! - Every request carries `X-Appwrite-Project` and `X-Appwrite-Key`.
//! - List filters are sent as JSON-encoded `queries[]` parameters.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::instrument;
use url::Url;
use yousuf_rice_core::FileId;

use crate::config::BackendConfig;
use crate::error::{BackendError, Result};
use crate::store::{Collection, Document, DocumentStore, FileStore, Filter, ListQuery, SortOrder, Upload};

/// Page size used when a list call does not set its own limit.
pub const DEFAULT_LIST_LIMIT: u32 = 5000;

/// Appwrite API client.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct AppwriteClient {
    inner: Arc<AppwriteClientInner>,
}

struct AppwriteClientInner {
    client: reqwest::Client,
    config: BackendConfig,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    documents: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct FileCreated {
    #[serde(rename = "$id")]
    id: String,
}

impl AppwriteClient {
    /// Create a client for the configured project.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the HTTP client cannot be built.
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("yousuf-rice/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(AppwriteClientInner { client, config }),
        })
    }

    fn base(&self) -> &str {
        self.inner.config.endpoint.as_str().trim_end_matches('/')
    }

    fn documents_url(&self, collection: Collection, id: Option<&str>) -> Result<Url> {
        let config = &self.inner.config;
        let mut url = format!(
            "{}/databases/{}/collections/{}/documents",
            self.base(),
            config.database_id,
            config.collections.id(collection)
        );
        if let Some(id) = id {
            url.push('/');
            url.push_str(id);
        }
        Ok(Url::parse(&url)?)
    }

    fn files_url(&self, id: Option<&FileId>) -> Result<Url> {
        let mut url = format!(
            "{}/storage/buckets/{}/files",
            self.base(),
            self.inner.config.bucket_id
        );
        if let Some(id) = id {
            url.push('/');
            url.push_str(id.as_str());
        }
        Ok(Url::parse(&url)?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.inner
            .client
            .request(method, url)
            .header("X-Appwrite-Project", &self.inner.config.project_id)
            .header("X-Appwrite-Key", self.inner.config.api_key.expose_secret())
    }

    /// Send a request and decode the JSON body, mapping error statuses.
    async fn send(&self, request: RequestBuilder) -> Result<Option<Value>> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let (message, kind) = serde_json::from_str::<ErrorBody>(&text)
                .map_or_else(|_| (text.clone(), None), |body| (body.message, body.kind));
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
                kind,
            });
        }

        Ok(Some(response.json().await?))
    }

    async fn send_document(&self, collection: Collection, request: RequestBuilder) -> Result<Document> {
        let body = self.send(request).await?.unwrap_or(Value::Null);
        Document::from_json(collection, body)
    }
}

/// Encode a [`ListQuery`] as Appwrite JSON query strings.
#[must_use]
pub fn encode_queries(query: &ListQuery) -> Vec<String> {
    let mut encoded: Vec<String> = query
        .filters
        .iter()
        .map(|filter| {
            let (method, attribute, value) = match filter {
                Filter::Equal(field, value) => ("equal", field, value),
                Filter::GreaterThanEqual(field, value) => ("greaterThanEqual", field, value),
                Filter::LessThanEqual(field, value) => ("lessThanEqual", field, value),
            };
            json!({ "method": method, "attribute": attribute, "values": [value] }).to_string()
        })
        .collect();

    if let Some(order) = &query.order {
        let (method, attribute) = match order {
            SortOrder::Asc(field) => ("orderAsc", field),
            SortOrder::Desc(field) => ("orderDesc", field),
        };
        encoded.push(json!({ "method": method, "attribute": attribute }).to_string());
    }

    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    encoded.push(json!({ "method": "limit", "values": [limit] }).to_string());
    encoded
}

#[async_trait]
impl DocumentStore for AppwriteClient {
    #[instrument(skip(self, query), fields(collection = %collection))]
    async fn list(&self, collection: Collection, query: &ListQuery) -> Result<Vec<Document>> {
        let mut url = self.documents_url(collection, None)?;
        {
            let mut pairs = url.query_pairs_mut();
            for q in encode_queries(query) {
                pairs.append_pair("queries[]", &q);
            }
        }

        let body = self
            .send(self.request(Method::GET, url))
            .await?
            .unwrap_or(Value::Null);
        let list: DocumentList = serde_json::from_value(body)?;

        list.documents
            .into_iter()
            .map(|doc| Document::from_json(collection, doc))
            .collect()
    }

    #[instrument(skip(self), fields(collection = %collection))]
    async fn get(&self, collection: Collection, id: &str) -> Result<Document> {
        let url = self.documents_url(collection, Some(id))?;
        match self
            .send_document(collection, self.request(Method::GET, url))
            .await
        {
            Err(e) if e.is_not_found() => Err(BackendError::NotFound {
                collection,
                id: id.to_owned(),
            }),
            other => other,
        }
    }

    #[instrument(skip(self, data), fields(collection = %collection))]
    async fn create(&self, collection: Collection, data: Map<String, Value>) -> Result<Document> {
        let url = self.documents_url(collection, None)?;
        let body = json!({ "documentId": "unique()", "data": data });
        self.send_document(collection, self.request(Method::POST, url).json(&body))
            .await
    }

    #[instrument(skip(self, data), fields(collection = %collection))]
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document> {
        let url = self.documents_url(collection, Some(id))?;
        let body = json!({ "data": data });
        self.send_document(collection, self.request(Method::PATCH, url).json(&body))
            .await
    }

    #[instrument(skip(self), fields(collection = %collection))]
    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        let url = self.documents_url(collection, Some(id))?;
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}

#[async_trait]
impl FileStore for AppwriteClient {
    #[instrument(skip(self, file), fields(file_name = %file.file_name, size = file.bytes.len()))]
    async fn upload(&self, file: Upload) -> Result<FileId> {
        let url = self.files_url(None)?;
        let part = reqwest::multipart::Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.content_type)?;
        let form = reqwest::multipart::Form::new()
            .text("fileId", "unique()")
            .part("file", part);

        let body = self
            .send(self.request(Method::POST, url).multipart(form))
            .await?
            .unwrap_or(Value::Null);
        let created: FileCreated = serde_json::from_value(body)?;
        Ok(FileId::new(created.id))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &FileId) -> Result<()> {
        let url = self.files_url(Some(id))?;
        self.send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    fn view_url(&self, id: &FileId) -> String {
        format!(
            "{}/storage/buckets/{}/files/{}/view?project={}",
            self.base(),
            self.inner.config.bucket_id,
            id,
            self.inner.config.project_id
        )
    }

    fn preview_url(&self, id: &FileId, width: u32, height: u32) -> String {
        format!(
            "{}/storage/buckets/{}/files/{}/preview?project={}&width={width}&height={height}",
            self.base(),
            self.inner.config.bucket_id,
            id,
            self.inner.config.project_id
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::config::CollectionIds;

    fn client() -> AppwriteClient {
        AppwriteClient::new(BackendConfig {
            endpoint: Url::parse("https://cloud.appwrite.io/v1").unwrap(),
            project_id: "yr-project".to_string(),
            api_key: SecretString::from("k3y"),
            database_id: "main".to_string(),
            bucket_id: "images".to_string(),
            collections: CollectionIds {
                products: "prod".to_string(),
                customers: "cust".to_string(),
                orders: "ord".to_string(),
                order_items: "items".to_string(),
                admin_users: "admins".to_string(),
                analytics_events: "events".to_string(),
                sessions: "sessions".to_string(),
            },
        })
        .unwrap()
    }

    #[test]
    fn test_documents_url() {
        let url = client().documents_url(Collection::Orders, Some("abc")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://cloud.appwrite.io/v1/databases/main/collections/ord/documents/abc"
        );
    }

    #[test]
    fn test_file_urls() {
        let client = client();
        let id = FileId::new("f1");
        assert_eq!(
            client.view_url(&id),
            "https://cloud.appwrite.io/v1/storage/buckets/images/files/f1/view?project=yr-project"
        );
        assert_eq!(
            client.preview_url(&id, 400, 300),
            "https://cloud.appwrite.io/v1/storage/buckets/images/files/f1/preview?project=yr-project&width=400&height=300"
        );
    }

    #[test]
    fn test_encode_queries() {
        let query = ListQuery::new()
            .greater_than_equal("timestamp", "2025-01-01T00:00:00Z")
            .order_desc("timestamp")
            .limit(10_000);
        let encoded = encode_queries(&query);
        assert_eq!(encoded.len(), 3);

        let first: Value = serde_json::from_str(&encoded[0]).unwrap();
        assert_eq!(first["method"], "greaterThanEqual");
        assert_eq!(first["values"][0], "2025-01-01T00:00:00Z");

        let order: Value = serde_json::from_str(&encoded[1]).unwrap();
        assert_eq!(order["method"], "orderDesc");

        let limit: Value = serde_json::from_str(&encoded[2]).unwrap();
        assert_eq!(limit["values"][0], 10_000);
    }

    #[test]
    fn test_encode_queries_default_limit() {
        let encoded = encode_queries(&ListQuery::new());
        let limit: Value = serde_json::from_str(&encoded[0]).unwrap();
        assert_eq!(limit["values"][0], DEFAULT_LIST_LIMIT);
    }
}
