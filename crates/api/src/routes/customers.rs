//! Customer route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use clove_core::{CustomerId, Membership};

use crate::db::CustomerRepository;
use crate::error::{AppError, Result};
use crate::models::{Address, Customer, NewCustomer};
use crate::state::AppState;

/// A customer's address as it appears on the wire.
#[derive(Debug, Serialize, Deserialize)]
pub struct AddressPayload {
    pub street: String,
    pub city: String,
}

/// Customer representation returned to clients.
#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub membership: Membership,
    pub address: Option<AddressPayload>,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            first_name: customer.first_name,
            last_name: customer.last_name,
            membership: customer.membership,
            address: customer.address.map(|a| AddressPayload {
                street: a.street,
                city: a.city,
            }),
        }
    }
}

/// Create/replace payload for a customer.
#[derive(Debug, Deserialize)]
pub struct CustomerPayload {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub membership: Membership,
    #[serde(default)]
    pub address: Option<AddressPayload>,
}

/// List customers.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<CustomerResponse>>> {
    let customers = CustomerRepository::new(state.pool()).list().await?;
    Ok(Json(
        customers.into_iter().map(CustomerResponse::from).collect(),
    ))
}

/// Create a customer.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CustomerPayload>,
) -> Result<(StatusCode, Json<CustomerResponse>)> {
    let new = validate_payload(payload)?;
    let customer = CustomerRepository::new(state.pool()).create(&new).await?;
    Ok((StatusCode::CREATED, Json(customer.into())))
}

/// Retrieve a customer by id.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<CustomerId>,
) -> Result<Json<CustomerResponse>> {
    let customer = CustomerRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("customer {id} not found")))?;
    Ok(Json(customer.into()))
}

/// Replace a customer, including the address.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<CustomerId>,
    Json(payload): Json<CustomerPayload>,
) -> Result<Json<CustomerResponse>> {
    let new = validate_payload(payload)?;
    let customer = CustomerRepository::new(state.pool()).update(id, &new).await?;
    Ok(Json(customer.into()))
}

/// Delete a customer.
///
/// Returns Conflict while orders reference the customer.
#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<CustomerId>,
) -> Result<StatusCode> {
    CustomerRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate_payload(payload: CustomerPayload) -> Result<NewCustomer> {
    let first_name = payload.first_name.trim().to_owned();
    if first_name.is_empty() {
        return Err(AppError::Validation(
            "first_name must not be empty".to_owned(),
        ));
    }

    let last_name = payload.last_name.trim().to_owned();
    if last_name.is_empty() {
        return Err(AppError::Validation(
            "last_name must not be empty".to_owned(),
        ));
    }

    Ok(NewCustomer {
        first_name,
        last_name,
        membership: payload.membership,
        address: payload.address.map(|a| Address {
            street: a.street,
            city: a.city,
        }),
    })
}
