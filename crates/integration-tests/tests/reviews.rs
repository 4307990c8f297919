//! Integration tests for reviews nested under products.

use serde_json::json;

use clove_integration_tests::TestContext;

#[tokio::test]
async fn test_review_product_id_comes_from_the_path() {
    let ctx = TestContext::new().await;
    let collection_id = ctx.create_collection("Teas").await;
    let sencha = ctx
        .create_product(collection_id, "Sencha", "sencha", "7.99")
        .await;
    let earl_grey = ctx
        .create_product(collection_id, "Earl Grey", "earl-grey", "5.49")
        .await;

    // The body claims a different product; the path wins
    let review = ctx
        .post_json(
            &format!("/products/{sencha}/reviews"),
            &json!({
                "name": "Ada",
                "description": "Lovely and grassy",
                "product_id": earl_grey,
            }),
            201,
        )
        .await;
    assert_eq!(review["product_id"].as_i64(), Some(sencha));

    // The review lists under its own product and nowhere else
    let body = ctx.get_json(&format!("/products/{sencha}/reviews")).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    let body = ctx
        .get_json(&format!("/products/{earl_grey}/reviews"))
        .await;
    assert_eq!(body.as_array().unwrap().len(), 0);

    // Addressing it through the wrong product is a 404
    let review_id = review["id"].as_i64().unwrap();
    let resp = ctx
        .client
        .get(ctx.url(&format!("/products/{earl_grey}/reviews/{review_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn test_review_crud() {
    let ctx = TestContext::new().await;
    let collection_id = ctx.create_collection("Teas").await;
    let product_id = ctx
        .create_product(collection_id, "Sencha", "sencha", "7.99")
        .await;
    let reviews_path = format!("/products/{product_id}/reviews");

    let review = ctx
        .post_json(
            &reviews_path,
            &json!({ "name": "Ada", "description": "Lovely" }),
            201,
        )
        .await;
    let review_id = review["id"].as_i64().unwrap();

    let fetched = ctx
        .get_json(&format!("{reviews_path}/{review_id}"))
        .await;
    assert_eq!(fetched["name"], "Ada");

    let resp = ctx
        .client
        .put(ctx.url(&format!("{reviews_path}/{review_id}")))
        .json(&json!({ "name": "Ada", "description": "Even better on second brew" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = ctx
        .client
        .delete(ctx.url(&format!("{reviews_path}/{review_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let body = ctx.get_json(&reviews_path).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_review_validation_and_missing_product() {
    let ctx = TestContext::new().await;
    let collection_id = ctx.create_collection("Teas").await;
    let product_id = ctx
        .create_product(collection_id, "Sencha", "sencha", "7.99")
        .await;

    // Blank fields are rejected
    ctx.post_json(
        &format!("/products/{product_id}/reviews"),
        &json!({ "name": " ", "description": "x" }),
        400,
    )
    .await;

    // Reviews under an unknown product are a 404
    ctx.post_json(
        "/products/999999/reviews",
        &json!({ "name": "Ada", "description": "x" }),
        404,
    )
    .await;
}

#[tokio::test]
async fn test_deleting_product_cascades_reviews() {
    let ctx = TestContext::new().await;
    let collection_id = ctx.create_collection("Teas").await;
    let product_id = ctx
        .create_product(collection_id, "Sencha", "sencha", "7.99")
        .await;

    ctx.post_json(
        &format!("/products/{product_id}/reviews"),
        &json!({ "name": "Ada", "description": "Lovely" }),
        201,
    )
    .await;

    let resp = ctx
        .client
        .delete(ctx.url(&format!("/products/{product_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    // The product is gone, so its review subtree is too
    let resp = ctx
        .client
        .get(ctx.url(&format!("/products/{product_id}/reviews")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}
