//! Collection route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use clove_core::{CollectionId, ProductId};

use crate::db::{CollectionRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::models::{Collection, NewCollection};
use crate::state::AppState;

/// Collection representation returned to clients.
///
/// `products_count` is computed at read time, never stored.
#[derive(Debug, Serialize)]
pub struct CollectionResponse {
    pub id: CollectionId,
    pub title: String,
    pub featured_product_id: Option<ProductId>,
    pub products_count: i64,
}

impl From<Collection> for CollectionResponse {
    fn from(collection: Collection) -> Self {
        Self {
            id: collection.id,
            title: collection.title,
            featured_product_id: collection.featured_product_id,
            products_count: collection.products_count,
        }
    }
}

/// Create/replace payload for a collection.
#[derive(Debug, Deserialize)]
pub struct CollectionPayload {
    pub title: String,
    #[serde(default)]
    pub featured_product_id: Option<ProductId>,
}

/// List collections, each annotated with its product count.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<CollectionResponse>>> {
    let collections = CollectionRepository::new(state.pool()).list().await?;
    Ok(Json(
        collections.into_iter().map(CollectionResponse::from).collect(),
    ))
}

/// Create a collection.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CollectionPayload>,
) -> Result<(StatusCode, Json<CollectionResponse>)> {
    let new = validate_payload(&state, payload).await?;
    let collection = CollectionRepository::new(state.pool()).create(&new).await?;
    Ok((StatusCode::CREATED, Json(collection.into())))
}

/// Retrieve a collection by id.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<CollectionId>,
) -> Result<Json<CollectionResponse>> {
    let collection = CollectionRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("collection {id} not found")))?;
    Ok(Json(collection.into()))
}

/// Replace a collection.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<CollectionId>,
    Json(payload): Json<CollectionPayload>,
) -> Result<Json<CollectionResponse>> {
    let new = validate_payload(&state, payload).await?;
    let collection = CollectionRepository::new(state.pool()).update(id, &new).await?;
    Ok(Json(collection.into()))
}

/// Delete a collection.
///
/// Returns Conflict while the collection still owns products.
#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<CollectionId>,
) -> Result<StatusCode> {
    CollectionRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn validate_payload(state: &AppState, payload: CollectionPayload) -> Result<NewCollection> {
    let title = payload.title.trim().to_owned();
    if title.is_empty() {
        return Err(AppError::Validation("title must not be empty".to_owned()));
    }

    if let Some(product_id) = payload.featured_product_id
        && ProductRepository::new(state.pool())
            .get(product_id)
            .await?
            .is_none()
    {
        return Err(AppError::Validation(format!(
            "featured product {product_id} does not exist"
        )));
    }

    Ok(NewCollection {
        title,
        featured_product_id: payload.featured_product_id,
    })
}
