//! HTTP route handlers for the resource API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (probes the store)
//!
//! # Catalog
//! GET    /products                      - Product list (filter/search/order/paginate)
//! POST   /products                      - Create product
//! GET    /products/{id}                 - Product detail
//! PUT    /products/{id}                 - Replace product
//! DELETE /products/{id}                 - Delete product (409 if order-referenced)
//! GET    /collections                   - Collection list (with products_count)
//! POST   /collections                   - Create collection
//! GET    /collections/{id}              - Collection detail
//! PUT    /collections/{id}              - Replace collection
//! DELETE /collections/{id}              - Delete collection (409 if non-empty)
//! GET    /promotions                    - Promotion list
//! POST   /promotions                    - Create promotion
//! GET/PUT/DELETE /promotions/{id}       - Promotion detail/replace/delete
//!
//! # Reviews (nested under their product)
//! GET    /products/{product_id}/reviews        - List reviews
//! POST   /products/{product_id}/reviews        - Create review
//! GET/PUT/DELETE /products/{product_id}/reviews/{id}
//!
//! # Carts
//! POST   /carts                         - Create cart
//! GET    /carts/{cart_id}               - Cart with items and totals
//! DELETE /carts/{cart_id}               - Delete cart
//! GET    /carts/{cart_id}/items         - List items
//! POST   /carts/{cart_id}/items         - Add item (merges with existing line)
//! GET    /carts/{cart_id}/items/{item_id}      - Item detail
//! PATCH  /carts/{cart_id}/items/{item_id}      - Replace quantity
//! DELETE /carts/{cart_id}/items/{item_id}      - Remove item
//!
//! # Orders & customers
//! GET    /orders                        - Order list
//! POST   /orders                        - Place order (items inline)
//! GET    /orders/{id}                   - Order detail
//! PATCH  /orders/{id}                   - Update payment status
//! DELETE /orders/{id}                   - Delete order
//! GET    /customers                     - Customer list
//! POST   /customers                     - Create customer
//! GET/PUT/DELETE /customers/{id}        - Customer detail/replace/delete (409 with orders)
//! ```

pub mod carts;
pub mod collections;
pub mod customers;
pub mod orders;
pub mod products;
pub mod promotions;
pub mod reviews;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Serialize;

use crate::state::AppState;

/// Envelope for paginated list responses.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    /// Total number of matches across all pages.
    pub count: i64,
    pub page: i64,
    pub page_size: i64,
    pub results: Vec<T>,
}

/// Create the product routes router, including nested reviews.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{product_id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
        .route(
            "/{product_id}/reviews",
            get(reviews::index).post(reviews::create),
        )
        .route(
            "/{product_id}/reviews/{id}",
            get(reviews::show)
                .put(reviews::update)
                .delete(reviews::destroy),
        )
}

/// Create the collection routes router.
pub fn collection_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(collections::index).post(collections::create))
        .route(
            "/{id}",
            get(collections::show)
                .put(collections::update)
                .delete(collections::destroy),
        )
}

/// Create the promotion routes router.
pub fn promotion_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(promotions::index).post(promotions::create))
        .route(
            "/{id}",
            get(promotions::show)
                .put(promotions::update)
                .delete(promotions::destroy),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(carts::create))
        .route("/{cart_id}", get(carts::show).delete(carts::destroy))
        .route(
            "/{cart_id}/items",
            get(carts::index_items).post(carts::add_item),
        )
        .route(
            "/{cart_id}/items/{item_id}",
            get(carts::show_item)
                .patch(carts::update_item)
                .delete(carts::destroy_item),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route(
            "/{id}",
            get(orders::show)
                .patch(orders::update)
                .delete(orders::destroy),
        )
}

/// Create the customer routes router.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(customers::index).post(customers::create))
        .route(
            "/{id}",
            get(customers::show)
                .put(customers::update)
                .delete(customers::destroy),
        )
}

/// Create all routes for the resource API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .nest("/collections", collection_routes())
        .nest("/promotions", promotion_routes())
        .nest("/carts", cart_routes())
        .nest("/orders", order_routes())
        .nest("/customers", customer_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_paginated_envelope_shape() {
        let page = Paginated {
            count: 3,
            page: 1,
            page_size: 2,
            results: vec!["a", "b"],
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["count"], 3);
        assert_eq!(json["results"].as_array().unwrap().len(), 2);
    }
}
