//! Integration tests for Yousuf Rice.
//!
//! The storefront and admin routers are driven in-process with
//! `tower::ServiceExt::oneshot`, both on top of one in-memory backend and an
//! in-memory session store, so no database or Appwrite project is needed.
//!
//! ```bash
//! cargo test -p yousuf-rice-integration-tests
//! ```
//!
//! This library holds the shared fixtures; the tests live in `tests/`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::{MemoryStore as SessionMemoryStore, SessionManagerLayer};
use yousuf_rice_backend::{Backend, Collection, MemoryStore};
use yousuf_rice_core::models::{AdminUser, NewProduct, Product};
use yousuf_rice_core::{AdminRole, Price};

/// Address every test request claims to come from. Rate limiters key on it.
pub const CLIENT_IP: &str = "203.0.113.7";

/// Password accepted for every admin account.
pub const ADMIN_PASSWORD: &str = "admin123";

/// One shared in-memory backend.
#[derive(Clone, Default)]
pub struct TestBackend {
    pub store: MemoryStore,
}

impl TestBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn backend(&self) -> Backend {
        Backend::in_memory(self.store.clone())
    }

    /// Storefront router with an in-memory session layer.
    #[must_use]
    pub fn storefront(&self) -> TestClient {
        let state = yousuf_rice_storefront::state::AppState::new(
            self.backend(),
            yousuf_rice_storefront::state::ShopSettings::default(),
        );
        TestClient::new(
            yousuf_rice_storefront::app(state)
                .layer(SessionManagerLayer::new(SessionMemoryStore::default())),
        )
    }

    /// Admin router with an in-memory session layer.
    #[must_use]
    pub fn admin(&self) -> TestClient {
        let state = yousuf_rice_admin::state::AppState::new(self.backend());
        TestClient::new(
            yousuf_rice_admin::app(state)
                .layer(SessionManagerLayer::new(SessionMemoryStore::default())),
        )
    }

    /// # Panics
    ///
    /// Panics if the product cannot be created.
    pub async fn seed_product(&self, name: &str, category: &str, base_price: i64) -> Product {
        self.backend()
            .products()
            .create(&NewProduct {
                name: name.to_owned(),
                description: format!("{name} rice"),
                category: category.to_owned(),
                image_file_id: None,
                image_url: None,
                base_price: Price::from_rupees(base_price),
                stock_quantity: 100,
                is_active: true,
            })
            .await
            .expect("seed product")
    }

    /// # Panics
    ///
    /// Panics if the admin user cannot be created.
    pub async fn seed_admin(&self, username: &str) -> AdminUser {
        self.backend()
            .admin_users()
            .create(
                username,
                &format!("{username}@yousufrice.com"),
                AdminRole::Admin,
            )
            .await
            .expect("seed admin")
    }

    /// Wait for the spawned analytics writes to land.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `expected` events exist after two seconds.
    pub async fn wait_for_events(&self, expected: usize) {
        for _ in 0..100 {
            if self.store.count(Collection::AnalyticsEvents).await >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("expected at least {expected} analytics events");
    }
}

/// A parsed response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The `error` message of a JSON error body.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }

    /// A price field at `pointer`.
    ///
    /// # Panics
    ///
    /// Panics if the field is missing or not a price.
    #[must_use]
    pub fn price(&self, pointer: &str) -> Price {
        let value = self
            .body
            .pointer(pointer)
            .unwrap_or_else(|| panic!("missing {pointer} in {}", self.body));
        serde_json::from_value(value.clone()).expect("price")
    }
}

/// A browser: one router plus the session cookie it was given.
pub struct TestClient {
    router: Router,
    cookie: Option<String>,
}

impl TestClient {
    #[must_use]
    pub const fn new(router: Router) -> Self {
        Self {
            router,
            cookie: None,
        }
    }

    /// Forget the session cookie.
    pub fn clear_cookie(&mut self) {
        self.cookie = None;
    }

    /// # Panics
    ///
    /// Panics if the router fails or the body cannot be read.
    pub async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        let headers = request.headers_mut();
        headers.insert("x-forwarded-for", CLIENT_IP.parse().expect("ip header"));
        if let Some(cookie) = &self.cookie {
            headers.insert(header::COOKIE, cookie.parse().expect("cookie header"));
        }

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            self.cookie = set_cookie.split(';').next().map(str::to_owned);
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(empty(Method::GET, uri)).await
    }

    pub async fn delete(&mut self, uri: &str) -> TestResponse {
        self.send(empty(Method::DELETE, uri)).await
    }

    pub async fn post_json(&mut self, uri: &str, body: &Value) -> TestResponse {
        self.send(json(Method::POST, uri, body)).await
    }

    pub async fn patch_json(&mut self, uri: &str, body: &Value) -> TestResponse {
        self.send(json(Method::PATCH, uri, body)).await
    }

    pub async fn send_multipart(
        &mut self,
        method: Method,
        uri: &str,
        form: MultipartForm,
    ) -> TestResponse {
        let (content_type, body) = form.finish();
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .expect("request");
        self.send(request).await
    }

    /// Sign in to the admin panel.
    ///
    /// # Panics
    ///
    /// Panics if the login is rejected.
    pub async fn login(&mut self, username: &str) -> TestResponse {
        let response = self
            .post_json(
                "/auth/login",
                &serde_json::json!({ "username": username, "password": ADMIN_PASSWORD }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
        response
    }
}

fn empty(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn json(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

/// Hand-built `multipart/form-data` body.
pub struct MultipartForm {
    boundary: &'static str,
    body: Vec<u8>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self {
            boundary: "yr-test-boundary",
            body: Vec::new(),
        }
    }
}

impl MultipartForm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    #[must_use]
    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}
