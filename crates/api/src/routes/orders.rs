//! Order route handlers.
//!
//! Orders are created with their items inline and snapshot each product's
//! unit price at placement. After placement only the payment status can
//! change.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use clove_core::{CustomerId, OrderId, OrderItemId, PaymentStatus, ProductId};

use crate::db::{CustomerRepository, OrderRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::models::{NewOrder, NewOrderItem, Order, OrderItem};
use crate::state::AppState;

/// One line of an order as returned to clients.
#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub quantity: i64,
    /// Unit price captured at placement time, not the current catalog price.
    pub unit_price: Decimal,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price.as_decimal(),
        }
    }
}

/// Order representation returned to clients.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub placed_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub items: Vec<OrderItemResponse>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id,
            placed_at: order.placed_at,
            payment_status: order.payment_status,
            items: order.items.into_iter().map(OrderItemResponse::from).collect(),
        }
    }
}

/// One requested line of a new order. Unit prices are never accepted from
/// the client.
#[derive(Debug, Deserialize)]
pub struct OrderItemPayload {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Payload for placing an order.
#[derive(Debug, Deserialize)]
pub struct CreateOrderPayload {
    pub customer_id: CustomerId,
    pub items: Vec<OrderItemPayload>,
}

/// Payload for updating an order's payment status.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderPayload {
    pub payment_status: PaymentStatus,
}

/// List orders with their items.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<OrderResponse>>> {
    let orders = OrderRepository::new(state.pool()).list().await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// Place an order.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    let new = validate_payload(&state, payload).await?;
    let order = OrderRepository::new(state.pool()).create(&new).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// Retrieve an order by id.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderResponse>> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;
    Ok(Json(order.into()))
}

/// Update an order's payment status. Item quantities are immutable once
/// placed.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(payload): Json<UpdateOrderPayload>,
) -> Result<Json<OrderResponse>> {
    let order = OrderRepository::new(state.pool())
        .update_status(id, payload.payment_status)
        .await?;
    Ok(Json(order.into()))
}

/// Delete an order. Its items cascade away.
#[instrument(skip(state))]
pub async fn destroy(State(state): State<AppState>, Path(id): Path<OrderId>) -> Result<StatusCode> {
    OrderRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn validate_payload(state: &AppState, payload: CreateOrderPayload) -> Result<NewOrder> {
    if payload.items.is_empty() {
        return Err(AppError::Validation(
            "an order must contain at least one item".to_owned(),
        ));
    }

    if CustomerRepository::new(state.pool())
        .get(payload.customer_id)
        .await?
        .is_none()
    {
        return Err(AppError::Validation(format!(
            "customer {} does not exist",
            payload.customer_id
        )));
    }

    let products = ProductRepository::new(state.pool());
    let mut items = Vec::with_capacity(payload.items.len());
    for item in payload.items {
        if item.quantity < 1 {
            return Err(AppError::Validation(
                "quantity must be at least 1".to_owned(),
            ));
        }
        if products.summary(item.product_id).await?.is_none() {
            return Err(AppError::Validation(format!(
                "product {} does not exist",
                item.product_id
            )));
        }
        items.push(NewOrderItem {
            product_id: item.product_id,
            quantity: item.quantity,
        });
    }

    Ok(NewOrder {
        customer_id: payload.customer_id,
        items,
    })
}
