//! Promotion route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use clove_core::PromotionId;

use crate::db::PromotionRepository;
use crate::error::{AppError, Result};
use crate::models::{NewPromotion, Promotion};
use crate::state::AppState;

/// Promotion representation returned to clients.
#[derive(Debug, Serialize)]
pub struct PromotionResponse {
    pub id: PromotionId,
    pub description: String,
    pub discount: f64,
}

impl From<Promotion> for PromotionResponse {
    fn from(promotion: Promotion) -> Self {
        Self {
            id: promotion.id,
            description: promotion.description,
            discount: promotion.discount,
        }
    }
}

/// Create/replace payload for a promotion.
#[derive(Debug, Deserialize)]
pub struct PromotionPayload {
    pub description: String,
    pub discount: f64,
}

/// List promotions.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<PromotionResponse>>> {
    let promotions = PromotionRepository::new(state.pool()).list().await?;
    Ok(Json(
        promotions.into_iter().map(PromotionResponse::from).collect(),
    ))
}

/// Create a promotion.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<PromotionPayload>,
) -> Result<(StatusCode, Json<PromotionResponse>)> {
    let new = validate_payload(payload)?;
    let promotion = PromotionRepository::new(state.pool()).create(&new).await?;
    Ok((StatusCode::CREATED, Json(promotion.into())))
}

/// Retrieve a promotion by id.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<PromotionId>,
) -> Result<Json<PromotionResponse>> {
    let promotion = PromotionRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("promotion {id} not found")))?;
    Ok(Json(promotion.into()))
}

/// Replace a promotion.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<PromotionId>,
    Json(payload): Json<PromotionPayload>,
) -> Result<Json<PromotionResponse>> {
    let new = validate_payload(payload)?;
    let promotion = PromotionRepository::new(state.pool()).update(id, &new).await?;
    Ok(Json(promotion.into()))
}

/// Delete a promotion. Product associations cascade away.
#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<PromotionId>,
) -> Result<StatusCode> {
    PromotionRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate_payload(payload: PromotionPayload) -> Result<NewPromotion> {
    let description = payload.description.trim().to_owned();
    if description.is_empty() {
        return Err(AppError::Validation(
            "description must not be empty".to_owned(),
        ));
    }
    if !payload.discount.is_finite() || payload.discount < 0.0 {
        return Err(AppError::Validation(
            "discount must be a non-negative number".to_owned(),
        ));
    }

    Ok(NewPromotion {
        description,
        discount: payload.discount,
    })
}
