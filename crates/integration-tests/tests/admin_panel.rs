//! Admin panel: session guard, orders, products and analytics.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode, header};
use serde_json::json;
use yousuf_rice_backend::Collection;
use yousuf_rice_core::Price;
use yousuf_rice_integration_tests::{MultipartForm, TestBackend, TestClient};

/// Place one order through the storefront and return its id.
async fn place_order(env: &TestBackend, base_price: i64) -> String {
    let product = env.seed_product("Super Kernel", "Basmati", base_price).await;
    let mut shop = env.storefront();
    shop.get(&format!("/products/{}", product.id)).await;
    shop.post_json(
        "/cart/items",
        &json!({ "product_id": product.id, "tier": "1kg", "quantity": 3 }),
    )
    .await;
    let placed = shop
        .post_json(
            "/checkout",
            &json!({
                "name": "Sana Tariq",
                "phone": "+923211234567",
                "address": "Flat 4, Tariq Road",
                "area": "Tariq Road",
            }),
        )
        .await;
    assert_eq!(placed.status, StatusCode::CREATED, "{}", placed.body);
    placed.body["order_id"].as_str().unwrap().to_owned()
}

async fn signed_in(env: &TestBackend) -> TestClient {
    env.seed_admin("admin").await;
    let mut admin = env.admin();
    admin.login("admin").await;
    admin
}

#[tokio::test]
async fn test_guard_blocks_signed_out_requests() {
    let env = TestBackend::new();
    let mut admin = env.admin();

    let api = admin.get("/api/dashboard").await;
    assert_eq!(api.status, StatusCode::UNAUTHORIZED);

    let page = admin.get("/auth/me").await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.headers[header::LOCATION], "/auth/login");

    let login_page = admin.get("/auth/login").await;
    assert_eq!(login_page.status, StatusCode::OK);
    assert_eq!(login_page.body["authenticated"], false);
}

#[tokio::test]
async fn test_login_and_logout() {
    let env = TestBackend::new();
    let user = env.seed_admin("admin").await;
    let mut admin = env.admin();

    let wrong = admin
        .post_json(
            "/auth/login",
            &json!({ "username": "admin", "password": "hunter2" }),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.error(), Some("Invalid credentials"));

    let unknown = admin
        .post_json(
            "/auth/login",
            &json!({ "username": "nobody", "password": "admin123" }),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);

    let ok = admin.login("admin").await;
    assert_eq!(ok.body["username"], "admin");

    let me = admin.get("/auth/me").await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["id"], user.id.as_str());

    let stored = env
        .backend()
        .admin_users()
        .find_active_by_username("admin")
        .await
        .unwrap()
        .unwrap();
    assert!(stored.last_login.is_some());

    let out = admin.post_json("/auth/logout", &json!({})).await;
    assert_eq!(out.status, StatusCode::OK);
    assert_eq!(
        admin.get("/api/dashboard").await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_order_management() {
    let env = TestBackend::new();
    let order_id = place_order(&env, 400).await;
    let mut admin = signed_in(&env).await;

    let list = admin.get("/api/orders?q=sana").await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body.as_array().unwrap().len(), 1);
    assert_eq!(
        admin
            .get("/api/orders?status=delivered")
            .await
            .body
            .as_array()
            .unwrap()
            .len(),
        0
    );

    let detail = admin.get(&format!("/api/orders/{order_id}")).await;
    assert_eq!(detail.body["status"], "pending");
    assert_eq!(detail.body["items"].as_array().unwrap().len(), 1);

    let status_uri = format!("/api/orders/{order_id}/status");
    let skipped = admin
        .post_json(&status_uri, &json!({ "status": "delivered" }))
        .await;
    assert_eq!(skipped.status, StatusCode::CONFLICT);

    for next in ["confirmed", "preparing", "out_for_delivery", "delivered"] {
        let moved = admin.post_json(&status_uri, &json!({ "status": next })).await;
        assert_eq!(moved.status, StatusCode::OK, "{next}: {}", moved.body);
        assert_eq!(moved.body["status"], next);
    }

    let terminal = admin
        .post_json(&status_uri, &json!({ "status": "cancelled" }))
        .await;
    assert_eq!(terminal.status, StatusCode::CONFLICT);

    let missing = admin.get("/api/orders/nope").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let dashboard = admin.get("/api/dashboard").await;
    assert_eq!(dashboard.body["stats"]["total_orders"], 1);
    assert_eq!(dashboard.body["stats"]["pending_orders"], 0);
    // 3 kg at 400 plus the 150 delivery fee
    assert_eq!(
        dashboard.price("/stats/total_revenue"),
        Price::from_rupees(1350)
    );
}

#[tokio::test]
async fn test_product_management() {
    let env = TestBackend::new();
    let mut admin = signed_in(&env).await;

    let form = MultipartForm::new()
        .text("name", "Super Kernel")
        .text("description", "Aged basmati")
        .text("category", "Basmati")
        .text("base_price", "380")
        .text("stock_quantity", "50")
        .text("is_active", "true")
        .file("image", "kernel.jpg", "image/jpeg", &[0xFF, 0xD8, 0xFF]);
    let created = admin
        .send_multipart(Method::POST, "/api/products", form)
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    assert!(created.body["image_url"].is_string());
    assert_eq!(env.store.file_count().await, 1);
    let id = created.body["id"].as_str().unwrap().to_owned();

    let bad_price = MultipartForm::new()
        .text("name", "Sella")
        .text("category", "Sella")
        .text("base_price", "0");
    let rejected = admin
        .send_multipart(Method::POST, "/api/products", bad_price)
        .await;
    assert_eq!(rejected.status, StatusCode::UNPROCESSABLE_ENTITY);

    let update = MultipartForm::new()
        .text("name", "Super Kernel")
        .text("category", "Basmati")
        .text("base_price", "400")
        .text("stock_quantity", "20")
        .text("is_active", "true");
    let updated = admin
        .send_multipart(Method::PUT, &format!("/api/products/{id}"), update)
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.price("/base_price"), Price::from_rupees(400));
    assert_eq!(updated.body["image_file_id"], created.body["image_file_id"]);

    assert_eq!(
        admin
            .get("/api/products?q=kernel")
            .await
            .body
            .as_array()
            .unwrap()
            .len(),
        1
    );

    let deleted = admin.delete(&format!("/api/products/{id}")).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(env.store.count(Collection::Products).await, 0);
    assert_eq!(env.store.file_count().await, 0);
}

#[tokio::test]
async fn test_analytics_reflect_storefront_activity() {
    let env = TestBackend::new();
    place_order(&env, 400).await;
    // product view, add to cart, order placed
    env.wait_for_events(3).await;
    let mut admin = signed_in(&env).await;

    let summary = admin.get("/api/analytics/summary").await;
    assert_eq!(summary.status, StatusCode::OK);
    assert_eq!(summary.body["unique_visitors"], 1);
    assert_eq!(summary.body["total_product_views"], 1);
    assert_eq!(summary.body["total_orders"], 1);
    assert_eq!(summary.price("/total_revenue"), Price::from_rupees(1350));
    assert_eq!(summary.body["top_products"][0]["name"], "Super Kernel");

    let overview = admin.get("/api/analytics").await;
    assert_eq!(overview.body["recent_events"].as_array().unwrap().len(), 3);

    let recent = admin.get("/api/analytics/events/recent?limit=2").await;
    assert_eq!(recent.body.as_array().unwrap().len(), 2);

    let backwards = admin
        .get("/api/analytics/summary?start=2025-03-05&end=2025-03-01")
        .await;
    assert_eq!(backwards.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analytics_read_failure_shows_zeros() {
    let env = TestBackend::new();
    let mut admin = signed_in(&env).await;
    env.store.fail_reads(Collection::AnalyticsEvents).await;

    let summary = admin.get("/api/analytics/summary").await;
    assert_eq!(summary.status, StatusCode::OK);
    assert_eq!(summary.body["total_orders"], 0);
    assert!(
        admin
            .get("/api/analytics/events/recent")
            .await
            .body
            .as_array()
            .unwrap()
            .is_empty()
    );
}
