//! Integration tests for carts: lifecycle, merge semantics, totals.

use serde_json::json;

use clove_integration_tests::TestContext;

async fn seeded_product(ctx: &TestContext, slug: &str, price: &str) -> i64 {
    let collection_id = ctx.create_collection(&format!("c-{slug}")).await;
    ctx.create_product(collection_id, slug, slug, price).await
}

#[tokio::test]
async fn test_cart_lifecycle() {
    let ctx = TestContext::new().await;

    let cart = ctx.post_json("/carts", &json!({}), 201).await;
    let cart_id = cart["id"].as_str().unwrap().to_owned();
    assert_eq!(cart["items"], json!([]));
    assert_eq!(cart["total_price"], "0.00");

    // Retrieve
    let fetched = ctx.get_json(&format!("/carts/{cart_id}")).await;
    assert_eq!(fetched["id"].as_str(), Some(cart_id.as_str()));

    // Delete, then the cart is gone
    let resp = ctx
        .client
        .delete(ctx.url(&format!("/carts/{cart_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let resp = ctx
        .client
        .get(ctx.url(&format!("/carts/{cart_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn test_adding_same_product_twice_merges_quantities() {
    let ctx = TestContext::new().await;
    let product_id = seeded_product(&ctx, "sencha", "7.99").await;
    let cart_id = ctx.create_cart().await;
    let items_path = format!("/carts/{cart_id}/items");

    ctx.post_json(
        &items_path,
        &json!({ "product_id": product_id, "quantity": 2 }),
        201,
    )
    .await;
    let merged = ctx
        .post_json(
            &items_path,
            &json!({ "product_id": product_id, "quantity": 3 }),
            201,
        )
        .await;
    assert_eq!(merged["quantity"].as_i64(), Some(5));

    // One row, never two
    let items = ctx.get_json(&items_path).await;
    assert_eq!(items.as_array().unwrap().len(), 1);
    assert_eq!(items[0]["quantity"].as_i64(), Some(5));
}

#[tokio::test]
async fn test_concurrent_adds_never_duplicate_the_pair() {
    let ctx = TestContext::new().await;
    let product_id = seeded_product(&ctx, "sencha", "7.99").await;
    let cart_id = ctx.create_cart().await;
    let items_path = format!("/carts/{cart_id}/items");

    let add = || {
        ctx.client
            .post(ctx.url(&items_path))
            .json(&json!({ "product_id": product_id, "quantity": 1 }))
            .send()
    };

    let (a, b, c, d) = tokio::join!(add(), add(), add(), add());
    for resp in [a, b, c, d] {
        assert_eq!(resp.unwrap().status().as_u16(), 201);
    }

    let items = ctx.get_json(&items_path).await;
    assert_eq!(items.as_array().unwrap().len(), 1);
    assert_eq!(items[0]["quantity"].as_i64(), Some(4));
}

#[tokio::test]
async fn test_cart_totals_are_computed_at_read_time() {
    let ctx = TestContext::new().await;
    let tea = seeded_product(&ctx, "sencha", "5.49").await;
    let spice = seeded_product(&ctx, "cloves", "4.25").await;
    let cart_id = ctx.create_cart().await;
    let items_path = format!("/carts/{cart_id}/items");

    ctx.post_json(&items_path, &json!({ "product_id": tea, "quantity": 2 }), 201)
        .await;
    ctx.post_json(
        &items_path,
        &json!({ "product_id": spice, "quantity": 1 }),
        201,
    )
    .await;

    let cart = ctx.get_json(&format!("/carts/{cart_id}")).await;
    let items = cart["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);

    let line = items
        .iter()
        .find(|i| i["product"]["id"].as_i64() == Some(tea))
        .unwrap();
    assert_eq!(line["product"]["unit_price"], "5.49");
    assert_eq!(line["total_price"], "10.98");

    // 2 * 5.49 + 1 * 4.25
    assert_eq!(cart["total_price"], "15.23");
}

#[tokio::test]
async fn test_item_update_and_removal() {
    let ctx = TestContext::new().await;
    let product_id = seeded_product(&ctx, "sencha", "7.99").await;
    let cart_id = ctx.create_cart().await;
    let items_path = format!("/carts/{cart_id}/items");

    let item = ctx
        .post_json(
            &items_path,
            &json!({ "product_id": product_id, "quantity": 2 }),
            201,
        )
        .await;
    let item_id = item["id"].as_i64().unwrap();
    let item_path = format!("{items_path}/{item_id}");

    // Replace quantity
    let resp = ctx
        .client
        .patch(ctx.url(&item_path))
        .json(&json!({ "quantity": 7 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let updated: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(updated["quantity"].as_i64(), Some(7));

    // Quantity below 1 is rejected
    let resp = ctx
        .client
        .patch(ctx.url(&item_path))
        .json(&json!({ "quantity": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    // Remove the line
    let resp = ctx.client.delete(ctx.url(&item_path)).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 204);
    let items = ctx.get_json(&items_path).await;
    assert_eq!(items.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_add_item_validation() {
    let ctx = TestContext::new().await;
    let product_id = seeded_product(&ctx, "sencha", "7.99").await;
    let cart_id = ctx.create_cart().await;
    let items_path = format!("/carts/{cart_id}/items");

    // Unknown product id is a validation error, not a 404
    ctx.post_json(
        &items_path,
        &json!({ "product_id": 999_999, "quantity": 1 }),
        400,
    )
    .await;

    // Quantity must be at least 1
    ctx.post_json(
        &items_path,
        &json!({ "product_id": product_id, "quantity": 0 }),
        400,
    )
    .await;

    // Unknown cart is a 404
    let missing = uuid::Uuid::new_v4();
    ctx.post_json(
        &format!("/carts/{missing}/items"),
        &json!({ "product_id": product_id, "quantity": 1 }),
        404,
    )
    .await;
}

#[tokio::test]
async fn test_deleting_cart_cascades_items() {
    let ctx = TestContext::new().await;
    let product_id = seeded_product(&ctx, "sencha", "7.99").await;
    let cart_id = ctx.create_cart().await;

    ctx.post_json(
        &format!("/carts/{cart_id}/items"),
        &json!({ "product_id": product_id, "quantity": 1 }),
        201,
    )
    .await;

    let resp = ctx
        .client
        .delete(ctx.url(&format!("/carts/{cart_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    // Items are gone with the cart
    let resp = ctx
        .client
        .get(ctx.url(&format!("/carts/{cart_id}/items")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}
