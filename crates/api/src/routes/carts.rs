//! Cart route handlers.
//!
//! Carts are keyed by opaque UUIDs allocated at creation. Adding a product
//! that is already in the cart merges into the existing line instead of
//! duplicating it; the merge is atomic per (cart, product) so concurrent adds
//! cannot produce a second row.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use clove_core::{CartId, CartItemId, Money, ProductId};

use crate::db::{CartRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::models::{Cart, CartLine};
use crate::state::AppState;

/// The product summary embedded in a cart line.
#[derive(Debug, Serialize)]
pub struct CartProductResponse {
    pub id: ProductId,
    pub title: String,
    pub unit_price: Decimal,
}

/// One cart line: product summary, quantity and computed line total.
#[derive(Debug, Serialize)]
pub struct CartItemResponse {
    pub id: CartItemId,
    pub product: CartProductResponse,
    pub quantity: i64,
    pub total_price: Decimal,
}

impl From<CartLine> for CartItemResponse {
    fn from(line: CartLine) -> Self {
        let total_price = line.total_price().as_decimal();
        Self {
            id: line.item.id,
            product: CartProductResponse {
                id: line.product.id,
                title: line.product.title,
                unit_price: line.product.unit_price.as_decimal(),
            },
            quantity: line.item.quantity,
            total_price,
        }
    }
}

/// A cart with its lines and computed total.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub id: CartId,
    pub created_at: DateTime<Utc>,
    pub items: Vec<CartItemResponse>,
    pub total_price: Decimal,
}

impl CartResponse {
    fn new(cart: Cart, lines: Vec<CartLine>) -> Self {
        let total_price = Money::sum(lines.iter().map(CartLine::total_price)).as_decimal();
        Self {
            id: cart.id,
            created_at: cart.created_at,
            items: lines.into_iter().map(CartItemResponse::from).collect(),
            total_price,
        }
    }
}

/// Payload for adding a product to a cart.
#[derive(Debug, Deserialize)]
pub struct AddItemPayload {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Payload for replacing a cart line's quantity.
#[derive(Debug, Deserialize)]
pub struct UpdateItemPayload {
    pub quantity: i64,
}

/// Create an empty cart with a fresh opaque id.
#[instrument(skip(state))]
pub async fn create(State(state): State<AppState>) -> Result<(StatusCode, Json<CartResponse>)> {
    let cart = CartRepository::new(state.pool()).create().await?;
    Ok((StatusCode::CREATED, Json(CartResponse::new(cart, Vec::new()))))
}

/// Retrieve a cart with its lines and totals.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(cart_id): Path<CartId>,
) -> Result<Json<CartResponse>> {
    let repo = CartRepository::new(state.pool());
    let cart = require_cart(&repo, cart_id).await?;
    let lines = repo.lines(cart_id).await?;
    Ok(Json(CartResponse::new(cart, lines)))
}

/// Delete a cart. Its lines cascade away.
#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    Path(cart_id): Path<CartId>,
) -> Result<StatusCode> {
    CartRepository::new(state.pool()).delete(cart_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the lines of a cart.
#[instrument(skip(state))]
pub async fn index_items(
    State(state): State<AppState>,
    Path(cart_id): Path<CartId>,
) -> Result<Json<Vec<CartItemResponse>>> {
    let repo = CartRepository::new(state.pool());
    require_cart(&repo, cart_id).await?;
    let lines = repo.lines(cart_id).await?;
    Ok(Json(lines.into_iter().map(CartItemResponse::from).collect()))
}

/// Add a product to a cart (idempotent merge on the product).
#[instrument(skip(state))]
pub async fn add_item(
    State(state): State<AppState>,
    Path(cart_id): Path<CartId>,
    Json(payload): Json<AddItemPayload>,
) -> Result<(StatusCode, Json<CartItemResponse>)> {
    if payload.quantity < 1 {
        return Err(AppError::Validation(
            "quantity must be at least 1".to_owned(),
        ));
    }

    let repo = CartRepository::new(state.pool());
    require_cart(&repo, cart_id).await?;

    // Unknown products are a client error, not a missing resource.
    if ProductRepository::new(state.pool())
        .summary(payload.product_id)
        .await?
        .is_none()
    {
        return Err(AppError::Validation(format!(
            "product {} does not exist",
            payload.product_id
        )));
    }

    let item = repo
        .add_item(cart_id, payload.product_id, payload.quantity)
        .await?;
    let line = repo
        .line(cart_id, item.id)
        .await?
        .ok_or_else(|| AppError::Internal("cart line vanished after upsert".to_owned()))?;

    Ok((StatusCode::CREATED, Json(line.into())))
}

/// Retrieve one line of a cart.
#[instrument(skip(state))]
pub async fn show_item(
    State(state): State<AppState>,
    Path((cart_id, item_id)): Path<(CartId, CartItemId)>,
) -> Result<Json<CartItemResponse>> {
    let repo = CartRepository::new(state.pool());
    require_cart(&repo, cart_id).await?;
    let line = repo
        .line(cart_id, item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cart item {item_id} not found")))?;
    Ok(Json(line.into()))
}

/// Replace the quantity of a cart line.
#[instrument(skip(state))]
pub async fn update_item(
    State(state): State<AppState>,
    Path((cart_id, item_id)): Path<(CartId, CartItemId)>,
    Json(payload): Json<UpdateItemPayload>,
) -> Result<Json<CartItemResponse>> {
    if payload.quantity < 1 {
        return Err(AppError::Validation(
            "quantity must be at least 1".to_owned(),
        ));
    }

    let repo = CartRepository::new(state.pool());
    require_cart(&repo, cart_id).await?;
    let item = repo.update_item(cart_id, item_id, payload.quantity).await?;
    let line = repo
        .line(cart_id, item.id)
        .await?
        .ok_or_else(|| AppError::Internal("cart line vanished after update".to_owned()))?;

    Ok(Json(line.into()))
}

/// Remove one line from a cart.
#[instrument(skip(state))]
pub async fn destroy_item(
    State(state): State<AppState>,
    Path((cart_id, item_id)): Path<(CartId, CartItemId)>,
) -> Result<StatusCode> {
    let repo = CartRepository::new(state.pool());
    require_cart(&repo, cart_id).await?;
    repo.delete_item(cart_id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn require_cart(repo: &CartRepository<'_>, cart_id: CartId) -> Result<Cart> {
    repo.get(cart_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cart {cart_id} not found")))
}
