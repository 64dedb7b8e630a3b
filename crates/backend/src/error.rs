//! Errors from the document and file stores.

use thiserror::Error;

use crate::store::Collection;

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an error status.
    #[error("backend returned {status}: {message}")]
    Api {
        status: u16,
        message: String,
        kind: Option<String>,
    },

    /// The document does not exist.
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: Collection, id: String },

    /// A stored document could not be mapped to its record type.
    #[error("malformed {collection} document {id}: {message}")]
    Decode {
        collection: Collection,
        id: String,
        message: String,
    },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A request URL could not be built.
    #[error("invalid backend URL: {0}")]
    Url(#[from] url::ParseError),

    /// A failure injected by the in-memory store.
    #[error("simulated backend failure: {0}")]
    Simulated(String),
}

impl BackendError {
    /// Whether this error means "no such document".
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Api { status: 404, .. })
    }
}
