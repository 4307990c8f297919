//! Review route handlers.
//!
//! Reviews live under `/products/{product_id}/reviews`. The product id is
//! always taken from the URL path, never from the request body, so a client
//! cannot file a review under a different product than the one it addressed.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use clove_core::{ProductId, ReviewId};

use crate::db::{ProductRepository, ReviewRepository};
use crate::error::{AppError, Result};
use crate::models::{NewReview, Review};
use crate::state::AppState;

/// Review representation returned to clients.
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub name: String,
    pub description: String,
    pub date: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            product_id: review.product_id,
            name: review.name,
            description: review.description,
            date: review.date,
        }
    }
}

/// Create/replace payload for a review. Any product id in the body is
/// ignored; the path decides which product the review belongs to.
#[derive(Debug, Deserialize)]
pub struct ReviewPayload {
    pub name: String,
    pub description: String,
}

/// List reviews of a product.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Vec<ReviewResponse>>> {
    require_product(&state, product_id).await?;
    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(product_id)
        .await?;
    Ok(Json(reviews.into_iter().map(ReviewResponse::from).collect()))
}

/// Create a review under the product in the path.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    Json(payload): Json<ReviewPayload>,
) -> Result<(StatusCode, Json<ReviewResponse>)> {
    require_product(&state, product_id).await?;
    let new = validate_payload(payload)?;
    let review = ReviewRepository::new(state.pool())
        .create(product_id, &new)
        .await?;
    Ok((StatusCode::CREATED, Json(review.into())))
}

/// Retrieve one review of a product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path((product_id, id)): Path<(ProductId, ReviewId)>,
) -> Result<Json<ReviewResponse>> {
    let review = ReviewRepository::new(state.pool())
        .get(product_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("review {id} not found")))?;
    Ok(Json(review.into()))
}

/// Replace a review.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path((product_id, id)): Path<(ProductId, ReviewId)>,
    Json(payload): Json<ReviewPayload>,
) -> Result<Json<ReviewResponse>> {
    let new = validate_payload(payload)?;
    let review = ReviewRepository::new(state.pool())
        .update(product_id, id, &new)
        .await?;
    Ok(Json(review.into()))
}

/// Delete a review.
#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    Path((product_id, id)): Path<(ProductId, ReviewId)>,
) -> Result<StatusCode> {
    ReviewRepository::new(state.pool())
        .delete(product_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn require_product(state: &AppState, product_id: ProductId) -> Result<()> {
    if ProductRepository::new(state.pool())
        .summary(product_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(format!(
            "product {product_id} not found"
        )));
    }
    Ok(())
}

fn validate_payload(payload: ReviewPayload) -> Result<NewReview> {
    let name = payload.name.trim().to_owned();
    if name.is_empty() {
        return Err(AppError::Validation("name must not be empty".to_owned()));
    }

    if payload.description.trim().is_empty() {
        return Err(AppError::Validation(
            "description must not be empty".to_owned(),
        ));
    }

    Ok(NewReview {
        name,
        description: payload.description,
    })
}
