//! Cart domain types.

use chrono::{DateTime, Utc};

use clove_core::{CartId, CartItemId, Money, ProductId};

/// An ephemeral, identifier-keyed bag of product selections.
#[derive(Debug, Clone)]
pub struct Cart {
    pub id: CartId,
    pub created_at: DateTime<Utc>,
}

/// One product selection inside a cart.
///
/// At most one row exists per (cart, product); adding the same product again
/// increments `quantity` instead of inserting a second row.
#[derive(Debug, Clone)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: i64,
}

/// The subset of product fields shown inside a cart.
#[derive(Debug, Clone)]
pub struct ProductSummary {
    pub id: ProductId,
    pub title: String,
    pub unit_price: Money,
}

/// A cart item joined with its product summary.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub item: CartItem,
    pub product: ProductSummary,
}

impl CartLine {
    /// unit price × quantity for this line.
    #[must_use]
    pub fn total_price(&self) -> Money {
        self.product.unit_price.line_total(self.item.quantity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let line = CartLine {
            item: CartItem {
                id: CartItemId::new(1),
                cart_id: CartId::random(),
                product_id: ProductId::new(1),
                quantity: 4,
            },
            product: ProductSummary {
                id: ProductId::new(1),
                title: "Tea".to_owned(),
                unit_price: Money::from_cents(325).unwrap(),
            },
        };
        assert_eq!(line.total_price().cents(), 1300);
    }
}
