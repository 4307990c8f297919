//! Integration tests for the catalog: products, collections, deletion guards.

use serde_json::json;

use clove_integration_tests::TestContext;

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new().await;

    let resp = ctx.client.get(ctx.url("/health")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = ctx
        .client
        .get(ctx.url("/health/ready"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn test_product_crud_roundtrip() {
    let ctx = TestContext::new().await;
    let collection_id = ctx.create_collection("Teas").await;

    let created = ctx
        .post_json(
            "/products",
            &json!({
                "title": "Earl Grey",
                "slug": "earl-grey",
                "description": "Black tea with bergamot",
                "unit_price": "5.49",
                "inventory": 20,
                "collection_id": collection_id,
            }),
            201,
        )
        .await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["unit_price"], "5.49");
    assert_eq!(created["collection_id"].as_i64(), Some(collection_id));

    let fetched = ctx.get_json(&format!("/products/{id}")).await;
    assert_eq!(fetched["title"], "Earl Grey");
    assert_eq!(fetched["description"], "Black tea with bergamot");

    // Full replace
    let resp = ctx
        .client
        .put(ctx.url(&format!("/products/{id}")))
        .json(&json!({
            "title": "Earl Grey Supreme",
            "slug": "earl-grey",
            "unit_price": "6.99",
            "inventory": 15,
            "collection_id": collection_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let fetched = ctx.get_json(&format!("/products/{id}")).await;
    assert_eq!(fetched["title"], "Earl Grey Supreme");
    assert_eq!(fetched["unit_price"], "6.99");
    assert_eq!(fetched["description"], serde_json::Value::Null);

    // Delete (no order references yet)
    let resp = ctx
        .client
        .delete(ctx.url(&format!("/products/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let resp = ctx
        .client
        .get(ctx.url(&format!("/products/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn test_price_with_tax_is_computed() {
    let ctx = TestContext::new().await;
    let collection_id = ctx.create_collection("Teas").await;
    let id = ctx
        .create_product(collection_id, "Sencha", "sencha", "19.99")
        .await;

    let product = ctx.get_json(&format!("/products/{id}")).await;
    assert_eq!(product["unit_price"], "19.99");
    // 19.99 * 1.1 = 21.989, rounded to cents
    assert_eq!(product["price_with_tax"], "21.99");
}

#[tokio::test]
async fn test_product_validation_errors() {
    let ctx = TestContext::new().await;
    let collection_id = ctx.create_collection("Teas").await;

    // Empty title
    ctx.post_json(
        "/products",
        &json!({
            "title": "  ",
            "slug": "x",
            "unit_price": "1.00",
            "collection_id": collection_id,
        }),
        400,
    )
    .await;

    // Negative price
    ctx.post_json(
        "/products",
        &json!({
            "title": "Tea",
            "slug": "tea",
            "unit_price": "-1.00",
            "collection_id": collection_id,
        }),
        400,
    )
    .await;

    // Negative inventory
    ctx.post_json(
        "/products",
        &json!({
            "title": "Tea",
            "slug": "tea",
            "unit_price": "1.00",
            "inventory": -5,
            "collection_id": collection_id,
        }),
        400,
    )
    .await;

    // Unknown collection
    ctx.post_json(
        "/products",
        &json!({
            "title": "Tea",
            "slug": "tea",
            "unit_price": "1.00",
            "collection_id": 999_999,
        }),
        400,
    )
    .await;
}

#[tokio::test]
async fn test_duplicate_slug_conflicts() {
    let ctx = TestContext::new().await;
    let collection_id = ctx.create_collection("Teas").await;
    ctx.create_product(collection_id, "Sencha", "sencha", "7.99")
        .await;

    ctx.post_json(
        "/products",
        &json!({
            "title": "Other Sencha",
            "slug": "sencha",
            "unit_price": "8.99",
            "collection_id": collection_id,
        }),
        409,
    )
    .await;
}

#[tokio::test]
async fn test_product_list_filters_and_pagination() {
    let ctx = TestContext::new().await;
    let teas = ctx.create_collection("Teas").await;
    let spices = ctx.create_collection("Spices").await;

    ctx.create_product(teas, "Earl Grey", "earl-grey", "5.49").await;
    ctx.create_product(teas, "Green Tea", "green-tea", "7.99").await;
    ctx.create_product(spices, "Whole Cloves", "whole-cloves", "4.25")
        .await;

    // Filter by collection
    let body = ctx.get_json(&format!("/products?collection_id={teas}")).await;
    assert_eq!(body["count"].as_i64(), Some(2));

    // Price range
    let body = ctx
        .get_json("/products?min_price=5.00&max_price=6.00")
        .await;
    assert_eq!(body["count"].as_i64(), Some(1));
    assert_eq!(body["results"][0]["slug"], "earl-grey");

    // Free-text search over title/description, case-insensitive
    let body = ctx.get_json("/products?search=GREY").await;
    assert_eq!(body["count"].as_i64(), Some(1));
    assert_eq!(body["results"][0]["title"], "Earl Grey");

    // Ordering by price descending
    let body = ctx.get_json("/products?ordering=-unit_price").await;
    assert_eq!(body["results"][0]["slug"], "green-tea");

    // Pagination
    let body = ctx.get_json("/products?page=1&page_size=2").await;
    assert_eq!(body["count"].as_i64(), Some(3));
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    let body = ctx.get_json("/products?page=2&page_size=2").await;
    assert_eq!(body["results"].as_array().unwrap().len(), 1);

    // Unknown ordering value is a validation error
    let resp = ctx
        .client
        .get(ctx.url("/products?ordering=title"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn test_product_delete_guarded_by_order_reference() {
    let ctx = TestContext::new().await;
    let collection_id = ctx.create_collection("Teas").await;
    let product_id = ctx
        .create_product(collection_id, "Sencha", "sencha", "7.99")
        .await;
    let customer_id = ctx.create_customer("Ada", "Byron").await;

    ctx.post_json(
        "/orders",
        &json!({
            "customer_id": customer_id,
            "items": [{ "product_id": product_id, "quantity": 1 }],
        }),
        201,
    )
    .await;

    // Deleting an order-referenced product must conflict and leave it intact
    let resp = ctx
        .client
        .delete(ctx.url(&format!("/products/{product_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("order"));

    let still_there = ctx.get_json(&format!("/products/{product_id}")).await;
    assert_eq!(still_there["id"].as_i64(), Some(product_id));
}

#[tokio::test]
async fn test_collection_delete_guarded_while_non_empty() {
    let ctx = TestContext::new().await;
    let collection_id = ctx.create_collection("Teas").await;
    let product_id = ctx
        .create_product(collection_id, "Sencha", "sencha", "7.99")
        .await;

    let resp = ctx
        .client
        .delete(ctx.url(&format!("/collections/{collection_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    // The collection is intact, and empties once its product is gone
    let body = ctx.get_json(&format!("/collections/{collection_id}")).await;
    assert_eq!(body["products_count"].as_i64(), Some(1));

    let resp = ctx
        .client
        .delete(ctx.url(&format!("/products/{product_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let resp = ctx
        .client
        .delete(ctx.url(&format!("/collections/{collection_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);
}

#[tokio::test]
async fn test_collection_list_annotates_product_count() {
    let ctx = TestContext::new().await;
    let teas = ctx.create_collection("Teas").await;
    let spices = ctx.create_collection("Spices").await;
    ctx.create_product(teas, "Earl Grey", "earl-grey", "5.49").await;
    ctx.create_product(teas, "Green Tea", "green-tea", "7.99").await;

    let body = ctx.get_json("/collections").await;
    let collections = body.as_array().unwrap();
    let count_of = |id: i64| {
        collections
            .iter()
            .find(|c| c["id"].as_i64() == Some(id))
            .and_then(|c| c["products_count"].as_i64())
    };
    assert_eq!(count_of(teas), Some(2));
    assert_eq!(count_of(spices), Some(0));
}

#[tokio::test]
async fn test_promotions_attach_to_products() {
    let ctx = TestContext::new().await;
    let collection_id = ctx.create_collection("Teas").await;

    let promotion = ctx
        .post_json(
            "/promotions",
            &json!({ "description": "Autumn sale", "discount": 0.15 }),
            201,
        )
        .await;
    let promotion_id = promotion["id"].as_i64().unwrap();

    let product = ctx
        .post_json(
            "/products",
            &json!({
                "title": "Sencha",
                "slug": "sencha",
                "unit_price": "7.99",
                "collection_id": collection_id,
                "promotion_ids": [promotion_id],
            }),
            201,
        )
        .await;
    assert_eq!(product["promotion_ids"], json!([promotion_id]));

    // Unknown promotion ids are rejected up front
    ctx.post_json(
        "/products",
        &json!({
            "title": "Other",
            "slug": "other",
            "unit_price": "1.00",
            "collection_id": collection_id,
            "promotion_ids": [999_999],
        }),
        400,
    )
    .await;
}
