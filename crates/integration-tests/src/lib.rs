//! Integration tests for Clove.
//!
//! Each test boots the full application router on an ephemeral port with a
//! fresh in-memory `SQLite` store, then drives it over real HTTP with
//! reqwest. No external services are required.
//!
//! ```bash
//! cargo test -p clove-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

use reqwest::Client;
use secrecy::SecretString;
use serde_json::{Value, json};

use clove_api::config::ApiConfig;
use clove_api::state::AppState;
use clove_api::{app, db};

/// A running test instance of the API with its own store.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    /// Boot the app on an ephemeral port against a fresh in-memory store.
    ///
    /// # Panics
    ///
    /// Panics if the store, migrations or listener cannot be set up; tests
    /// cannot run without them.
    pub async fn new() -> Self {
        let database_url = SecretString::from("sqlite::memory:");
        let pool = db::create_pool(&database_url)
            .await
            .expect("Failed to create database pool");
        db::MIGRATOR
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        let config = ApiConfig {
            database_url,
            host: "127.0.0.1".parse().expect("valid host"),
            port: 0,
            sentry_dsn: None,
            sentry_environment: None,
        };

        let router = app(AppState::new(config, pool));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("listener has a local addr");

        tokio::spawn(async move {
            axum::serve(listener, router)
                .await
                .expect("test server error");
        });

        Self {
            client: Client::new(),
            base_url: format!("http://{addr}"),
        }
    }

    /// Absolute URL for an API path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// POST a JSON body and return the parsed response body.
    ///
    /// Panics if the response status differs from `expected_status`.
    pub async fn post_json(&self, path: &str, body: &Value, expected_status: u16) -> Value {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("request failed");
        let status = resp.status().as_u16();
        let body = resp.json::<Value>().await.unwrap_or(Value::Null);
        assert_eq!(status, expected_status, "unexpected status, body: {body}");
        body
    }

    /// GET a path and return the parsed response body, asserting 200.
    pub async fn get_json(&self, path: &str) -> Value {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("request failed");
        assert_eq!(resp.status().as_u16(), 200);
        resp.json().await.expect("invalid JSON body")
    }

    /// Create a collection and return its id.
    pub async fn create_collection(&self, title: &str) -> i64 {
        let body = self
            .post_json("/collections", &json!({ "title": title }), 201)
            .await;
        body["id"].as_i64().expect("collection id")
    }

    /// Create a product and return its id.
    pub async fn create_product(
        &self,
        collection_id: i64,
        title: &str,
        slug: &str,
        unit_price: &str,
    ) -> i64 {
        let body = self
            .post_json(
                "/products",
                &json!({
                    "title": title,
                    "slug": slug,
                    "unit_price": unit_price,
                    "inventory": 10,
                    "collection_id": collection_id,
                }),
                201,
            )
            .await;
        body["id"].as_i64().expect("product id")
    }

    /// Create a customer and return its id.
    pub async fn create_customer(&self, first_name: &str, last_name: &str) -> i64 {
        let body = self
            .post_json(
                "/customers",
                &json!({ "first_name": first_name, "last_name": last_name }),
                201,
            )
            .await;
        body["id"].as_i64().expect("customer id")
    }

    /// Create a cart and return its opaque id.
    pub async fn create_cart(&self) -> String {
        let body = self.post_json("/carts", &json!({}), 201).await;
        body["id"].as_str().expect("cart id").to_owned()
    }
}
