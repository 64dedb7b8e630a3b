//! Storefront flow: browse, fill the cart, check out.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use serde_json::json;
use yousuf_rice_backend::Collection;
use yousuf_rice_core::Price;
use yousuf_rice_integration_tests::TestBackend;

fn checkout_form() -> serde_json::Value {
    json!({
        "name": "Ali Raza",
        "phone": "0300-1234567",
        "address": "House 12, Block 5",
        "area": "clifton",
    })
}

#[tokio::test]
async fn test_catalog_lists_active_products() {
    let env = TestBackend::new();
    let kernel = env.seed_product("Super Kernel", "Basmati", 400).await;
    env.seed_product("Sella", "Sella", 300).await;
    let mut shop = env.storefront();

    let all = shop.get("/products").await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body.as_array().unwrap().len(), 2);

    let filtered = shop.get("/products?category=Basmati").await;
    assert_eq!(filtered.body.as_array().unwrap().len(), 1);

    let detail = shop.get(&format!("/products/{}", kernel.id)).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["tier_prices"].as_array().unwrap().len(), 4);

    let missing = shop.get("/products/nope").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cart_to_order() {
    let env = TestBackend::new();
    let kernel = env.seed_product("Super Kernel", "Basmati", 400).await;
    let mut shop = env.storefront();

    let added = shop
        .post_json(
            "/cart/items",
            &json!({ "product_id": kernel.id, "tier": "1kg", "quantity": 2 }),
        )
        .await;
    assert_eq!(added.status, StatusCode::CREATED);
    assert_eq!(added.body["item_count"], 2);

    // Same product and tier merges into one line
    let merged = shop
        .post_json("/cart/items", &json!({ "product_id": kernel.id, "tier": "1kg" }))
        .await;
    assert_eq!(merged.body["lines"].as_array().unwrap().len(), 1);
    assert_eq!(merged.body["item_count"], 3);

    let line_id = merged.body["lines"][0]["id"].as_str().unwrap().to_owned();
    let updated = shop
        .patch_json(&format!("/cart/items/{line_id}"), &json!({ "quantity": 2 }))
        .await;
    assert_eq!(updated.price("/total"), Price::from_rupees(800));

    let summary = shop.get("/checkout/summary").await;
    assert_eq!(summary.price("/subtotal"), Price::from_rupees(800));
    assert_eq!(summary.price("/delivery_fee"), Price::from_rupees(150));
    assert_eq!(summary.price("/total"), Price::from_rupees(950));

    let placed = shop.post_json("/checkout", &checkout_form()).await;
    assert_eq!(placed.status, StatusCode::CREATED, "{}", placed.body);
    assert_eq!(placed.price("/total"), Price::from_rupees(950));
    assert!(placed.body["order_number"].as_str().unwrap().starts_with("YR"));

    assert_eq!(env.store.count(Collection::Orders).await, 1);
    assert_eq!(env.store.count(Collection::OrderItems).await, 1);
    assert_eq!(env.store.count(Collection::Customers).await, 1);

    let cart = shop.get("/cart").await;
    assert_eq!(cart.body["item_count"], 0);
}

#[tokio::test]
async fn test_bulk_tier_gets_free_delivery() {
    let env = TestBackend::new();
    let kernel = env.seed_product("Super Kernel", "Basmati", 400).await;
    let mut shop = env.storefront();

    shop.post_json(
        "/cart/items",
        &json!({ "product_id": kernel.id, "tier": "10+kg", "quantity": 10 }),
    )
    .await;

    let summary = shop.get("/checkout/summary").await;
    assert_eq!(summary.price("/subtotal"), Price::from_rupees(3400));
    assert_eq!(summary.price("/delivery_fee"), Price::ZERO);
}

#[tokio::test]
async fn test_checkout_rejections_keep_cart() {
    let env = TestBackend::new();
    let kernel = env.seed_product("Super Kernel", "Basmati", 400).await;
    let mut shop = env.storefront();

    let empty = shop.post_json("/checkout", &checkout_form()).await;
    assert_eq!(empty.status, StatusCode::UNPROCESSABLE_ENTITY);

    shop.post_json(
        "/cart/items",
        &json!({ "product_id": kernel.id, "tier": "1kg" }),
    )
    .await;

    let mut bad_phone = checkout_form();
    bad_phone["phone"] = json!("12345");
    let rejected = shop.post_json("/checkout", &bad_phone).await;
    assert_eq!(rejected.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(rejected.error().is_some());

    assert_eq!(shop.get("/cart").await.body["item_count"], 1);
    assert_eq!(env.store.count(Collection::Orders).await, 0);
}

#[tokio::test]
async fn test_failed_item_write_leaves_no_order() {
    let env = TestBackend::new();
    let kernel = env.seed_product("Super Kernel", "Basmati", 400).await;
    let sella = env.seed_product("Sella", "Sella", 300).await;
    let mut shop = env.storefront();

    for id in [&kernel.id, &sella.id] {
        shop.post_json("/cart/items", &json!({ "product_id": id, "tier": "1kg" }))
            .await;
    }
    env.store.fail_creates_after(Collection::OrderItems, 1).await;

    let failed = shop.post_json("/checkout", &checkout_form()).await;
    assert_eq!(failed.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(env.store.count(Collection::Orders).await, 0);
    assert_eq!(env.store.count(Collection::OrderItems).await, 0);
    assert_eq!(shop.get("/cart").await.body["item_count"], 2);
}

#[tokio::test]
async fn test_sessions_do_not_share_carts() {
    let env = TestBackend::new();
    let kernel = env.seed_product("Super Kernel", "Basmati", 400).await;
    let mut shop = env.storefront();

    shop.post_json("/cart/items", &json!({ "product_id": kernel.id, "tier": "1kg" }))
        .await;
    assert_eq!(shop.get("/cart/count").await.body["count"], 1);

    shop.clear_cookie();
    assert_eq!(shop.get("/cart/count").await.body["count"], 0);
}
