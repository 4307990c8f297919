//! Integration tests for orders and customers.

use serde_json::json;

use clove_integration_tests::TestContext;

#[tokio::test]
async fn test_order_snapshots_unit_price_at_placement() {
    let ctx = TestContext::new().await;
    let collection_id = ctx.create_collection("Teas").await;
    let product_id = ctx
        .create_product(collection_id, "Sencha", "sencha", "7.99")
        .await;
    let customer_id = ctx.create_customer("Ada", "Byron").await;

    let order = ctx
        .post_json(
            "/orders",
            &json!({
                "customer_id": customer_id,
                "items": [{ "product_id": product_id, "quantity": 3 }],
            }),
            201,
        )
        .await;
    let order_id = order["id"].as_i64().unwrap();
    assert_eq!(order["payment_status"], "pending");
    assert_eq!(order["items"][0]["unit_price"], "7.99");

    // Reprice the product; the placed order must not move
    let resp = ctx
        .client
        .put(ctx.url(&format!("/products/{product_id}")))
        .json(&json!({
            "title": "Sencha",
            "slug": "sencha",
            "unit_price": "9.49",
            "inventory": 10,
            "collection_id": collection_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let order = ctx.get_json(&format!("/orders/{order_id}")).await;
    assert_eq!(order["items"][0]["unit_price"], "7.99");
    assert_eq!(order["items"][0]["quantity"].as_i64(), Some(3));
}

#[tokio::test]
async fn test_order_validation() {
    let ctx = TestContext::new().await;
    let collection_id = ctx.create_collection("Teas").await;
    let product_id = ctx
        .create_product(collection_id, "Sencha", "sencha", "7.99")
        .await;
    let customer_id = ctx.create_customer("Ada", "Byron").await;

    // No items
    ctx.post_json(
        "/orders",
        &json!({ "customer_id": customer_id, "items": [] }),
        400,
    )
    .await;

    // Unknown customer
    ctx.post_json(
        "/orders",
        &json!({
            "customer_id": 999_999,
            "items": [{ "product_id": product_id, "quantity": 1 }],
        }),
        400,
    )
    .await;

    // Unknown product
    ctx.post_json(
        "/orders",
        &json!({
            "customer_id": customer_id,
            "items": [{ "product_id": 999_999, "quantity": 1 }],
        }),
        400,
    )
    .await;

    // Quantity below 1
    ctx.post_json(
        "/orders",
        &json!({
            "customer_id": customer_id,
            "items": [{ "product_id": product_id, "quantity": 0 }],
        }),
        400,
    )
    .await;
}

#[tokio::test]
async fn test_payment_status_update() {
    let ctx = TestContext::new().await;
    let collection_id = ctx.create_collection("Teas").await;
    let product_id = ctx
        .create_product(collection_id, "Sencha", "sencha", "7.99")
        .await;
    let customer_id = ctx.create_customer("Ada", "Byron").await;

    let order = ctx
        .post_json(
            "/orders",
            &json!({
                "customer_id": customer_id,
                "items": [{ "product_id": product_id, "quantity": 1 }],
            }),
            201,
        )
        .await;
    let order_id = order["id"].as_i64().unwrap();

    let resp = ctx
        .client
        .patch(ctx.url(&format!("/orders/{order_id}")))
        .json(&json!({ "payment_status": "complete" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let updated: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(updated["payment_status"], "complete");

    // Items are untouched by status updates
    assert_eq!(updated["items"][0]["quantity"].as_i64(), Some(1));

    // An unknown status value is rejected at deserialization
    let resp = ctx
        .client
        .patch(ctx.url(&format!("/orders/{order_id}")))
        .json(&json!({ "payment_status": "paid" }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn test_customer_delete_guarded_by_orders() {
    let ctx = TestContext::new().await;
    let collection_id = ctx.create_collection("Teas").await;
    let product_id = ctx
        .create_product(collection_id, "Sencha", "sencha", "7.99")
        .await;
    let customer_id = ctx.create_customer("Ada", "Byron").await;

    let order = ctx
        .post_json(
            "/orders",
            &json!({
                "customer_id": customer_id,
                "items": [{ "product_id": product_id, "quantity": 1 }],
            }),
            201,
        )
        .await;
    let order_id = order["id"].as_i64().unwrap();

    // Guarded while the order exists
    let resp = ctx
        .client
        .delete(ctx.url(&format!("/customers/{customer_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    // Deleting the order unblocks the customer
    let resp = ctx
        .client
        .delete(ctx.url(&format!("/orders/{order_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let resp = ctx
        .client
        .delete(ctx.url(&format!("/customers/{customer_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);
}

#[tokio::test]
async fn test_customer_crud_with_address() {
    let ctx = TestContext::new().await;

    let created = ctx
        .post_json(
            "/customers",
            &json!({
                "first_name": "Ada",
                "last_name": "Byron",
                "membership": "gold",
                "address": { "street": "12 St James Square", "city": "London" },
            }),
            201,
        )
        .await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["membership"], "gold");
    assert_eq!(created["address"]["city"], "London");

    // Replace without an address removes the stored one
    let resp = ctx
        .client
        .put(ctx.url(&format!("/customers/{id}")))
        .json(&json!({ "first_name": "Ada", "last_name": "Lovelace" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let fetched = ctx.get_json(&format!("/customers/{id}")).await;
    assert_eq!(fetched["last_name"], "Lovelace");
    // Membership defaults to the bronze tier when omitted
    assert_eq!(fetched["membership"], "bronze");
    assert_eq!(fetched["address"], serde_json::Value::Null);
}
