//! Review domain types.

use chrono::{DateTime, Utc};

use clove_core::{ProductId, ReviewId};

/// Free-text feedback attached to a product.
#[derive(Debug, Clone)]
pub struct Review {
    pub id: ReviewId,
    /// Always taken from the URL path the review was created under.
    pub product_id: ProductId,
    pub name: String,
    pub description: String,
    pub date: DateTime<Utc>,
}

/// Input for creating or replacing a review. Carries no product id; the
/// handler scopes the review to the product in the path.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub name: String,
    pub description: String,
}
