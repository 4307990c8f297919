//! Product route handlers.
//!
//! The list endpoint supports the catalog's filter surface: price range,
//! collection, free-text search over title/description, ordering by price or
//! last update, and page-number pagination.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use clove_core::{CollectionId, Money, ProductId, PromotionId};

use crate::db::{CollectionRepository, ProductRepository, PromotionRepository};
use crate::error::{AppError, Result};
use crate::models::{NewProduct, Page, Product, ProductFilter, ProductOrdering};
use crate::routes::Paginated;
use crate::state::AppState;

/// Product representation returned to clients.
///
/// `price_with_tax` is computed, never stored.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub price_with_tax: Decimal,
    pub inventory: i64,
    pub collection_id: CollectionId,
    pub promotion_ids: Vec<PromotionId>,
    pub last_update: DateTime<Utc>,
}

impl ProductResponse {
    fn new(product: Product, promotion_ids: Vec<PromotionId>) -> Self {
        Self {
            id: product.id,
            title: product.title,
            slug: product.slug,
            description: product.description,
            unit_price: product.unit_price.as_decimal(),
            price_with_tax: product.unit_price.with_tax(),
            inventory: product.inventory,
            collection_id: product.collection_id,
            promotion_ids,
            last_update: product.last_update,
        }
    }
}

/// Query parameters for the product list.
#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub collection_id: Option<CollectionId>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub search: Option<String>,
    /// `unit_price`, `-unit_price`, `last_update` or `-last_update`.
    pub ordering: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Create/replace payload for a product.
#[derive(Debug, Deserialize)]
pub struct ProductPayload {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub unit_price: Decimal,
    #[serde(default)]
    pub inventory: i64,
    pub collection_id: CollectionId,
    #[serde(default)]
    pub promotion_ids: Vec<PromotionId>,
}

/// List products.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Paginated<ProductResponse>>> {
    let filter = parse_filter(&query)?;
    let page = Page::new(query.page, query.page_size);

    let repo = ProductRepository::new(state.pool());
    let (products, count) = repo.list(&filter, page).await?;

    let ids: Vec<ProductId> = products.iter().map(|p| p.id).collect();
    let mut promotions: HashMap<ProductId, Vec<PromotionId>> = HashMap::new();
    for (product_id, promotion_id) in repo.promotions_for(&ids).await? {
        promotions.entry(product_id).or_default().push(promotion_id);
    }

    let results = products
        .into_iter()
        .map(|product| {
            let promotion_ids = promotions.remove(&product.id).unwrap_or_default();
            ProductResponse::new(product, promotion_ids)
        })
        .collect();

    Ok(Json(Paginated {
        count,
        page: page.number,
        page_size: page.size,
        results,
    }))
}

/// Create a product.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<ProductPayload>,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    let new = validate_payload(&state, payload).await?;

    let repo = ProductRepository::new(state.pool());
    let product = repo.create(&new).await?;
    let promotion_ids = promotion_ids_of(&repo, product.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse::new(product, promotion_ids)),
    ))
}

/// Retrieve a product by id.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductResponse>> {
    let repo = ProductRepository::new(state.pool());
    let product = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id} not found")))?;
    let promotion_ids = promotion_ids_of(&repo, id).await?;

    Ok(Json(ProductResponse::new(product, promotion_ids)))
}

/// Replace a product.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(payload): Json<ProductPayload>,
) -> Result<Json<ProductResponse>> {
    let new = validate_payload(&state, payload).await?;

    let repo = ProductRepository::new(state.pool());
    let product = repo.update(id, &new).await?;
    let promotion_ids = promotion_ids_of(&repo, id).await?;

    Ok(Json(ProductResponse::new(product, promotion_ids)))
}

/// Delete a product.
///
/// Returns Conflict while any order item references the product; order
/// history must not lose the products it points at.
#[instrument(skip(state))]
pub async fn destroy(State(state): State<AppState>, Path(id): Path<ProductId>) -> Result<StatusCode> {
    ProductRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn promotion_ids_of(
    repo: &ProductRepository<'_>,
    id: ProductId,
) -> Result<Vec<PromotionId>> {
    Ok(repo
        .promotions_for(&[id])
        .await?
        .into_iter()
        .map(|(_, promotion_id)| promotion_id)
        .collect())
}

fn parse_filter(query: &ProductListQuery) -> Result<ProductFilter> {
    let min_price = query
        .min_price
        .map(Money::from_decimal)
        .transpose()
        .map_err(|e| AppError::Validation(format!("min_price: {e}")))?;
    let max_price = query
        .max_price
        .map(Money::from_decimal)
        .transpose()
        .map_err(|e| AppError::Validation(format!("max_price: {e}")))?;

    let ordering = match query.ordering.as_deref() {
        None => ProductOrdering::default(),
        Some(value) => ProductOrdering::parse(value).ok_or_else(|| {
            AppError::Validation(format!(
                "unknown ordering '{value}' (expected unit_price, -unit_price, last_update or -last_update)"
            ))
        })?,
    };

    Ok(ProductFilter {
        collection_id: query.collection_id,
        min_price,
        max_price,
        search: query.search.clone().filter(|s| !s.is_empty()),
        ordering,
    })
}

/// Validate a product payload against its cross-entity references.
async fn validate_payload(state: &AppState, payload: ProductPayload) -> Result<NewProduct> {
    let title = payload.title.trim().to_owned();
    if title.is_empty() {
        return Err(AppError::Validation("title must not be empty".to_owned()));
    }

    let slug = payload.slug.trim().to_owned();
    if slug.is_empty() {
        return Err(AppError::Validation("slug must not be empty".to_owned()));
    }

    let unit_price = Money::from_decimal(payload.unit_price)
        .map_err(|e| AppError::Validation(format!("unit_price: {e}")))?;

    if payload.inventory < 0 {
        return Err(AppError::Validation(
            "inventory must not be negative".to_owned(),
        ));
    }

    if CollectionRepository::new(state.pool())
        .get(payload.collection_id)
        .await?
        .is_none()
    {
        return Err(AppError::Validation(format!(
            "collection {} does not exist",
            payload.collection_id
        )));
    }

    let mut promotion_ids = payload.promotion_ids;
    promotion_ids.sort_unstable();
    promotion_ids.dedup();
    if !PromotionRepository::new(state.pool())
        .all_exist(&promotion_ids)
        .await?
    {
        return Err(AppError::Validation(
            "one or more promotion ids do not exist".to_owned(),
        ));
    }

    Ok(NewProduct {
        title,
        slug,
        description: payload.description,
        unit_price,
        inventory: payload.inventory,
        collection_id: payload.collection_id,
        promotion_ids,
    })
}
