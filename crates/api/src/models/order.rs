//! Order domain types.

use chrono::{DateTime, Utc};

use clove_core::{CustomerId, Money, OrderId, OrderItemId, PaymentStatus, ProductId};

/// A finalized record of purchased items tied to a customer.
///
/// Item quantities and unit prices are immutable once placed; only the
/// payment status may change.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub placed_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub items: Vec<OrderItem>,
}

/// One line of an order.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub quantity: i64,
    /// The product's unit price captured at placement time.
    pub unit_price: Money,
}

/// Input for placing an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub items: Vec<NewOrderItem>,
}

/// One requested line of a new order. The unit price is never taken from the
/// client; it is snapshotted from the product at placement.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i64,
}
