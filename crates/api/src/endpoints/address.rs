//! Address endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use tienda_common::AppResult;
use tienda_core::{CreateAddressInput, UpdateAddressInput};
use tienda_db::entities::address;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Address response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressResponse {
    pub id: String,
    pub address_name: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zipcode: String,
    pub is_default: bool,
    pub created_at: String,
}

impl From<address::Model> for AddressResponse {
    fn from(address: address::Model) -> Self {
        Self {
            id: address.id,
            address_name: address.address_name,
            address_line1: address.address_line1,
            address_line2: address.address_line2,
            city: address.city,
            state: address.state,
            country: address.country,
            zipcode: address.zipcode,
            is_default: address.is_default,
            created_at: address.created_at.to_rfc3339(),
        }
    }
}

/// Create address request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddressRequest {
    pub address_name: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zipcode: String,
}

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateAddressRequest>,
) -> AppResult<ApiResponse<AddressResponse>> {
    let address = state
        .address_service
        .create(
            &user.id,
            CreateAddressInput {
                address_name: req.address_name,
                address_line1: req.address_line1,
                address_line2: req.address_line2,
                city: req.city,
                state: req.state,
                country: req.country,
                zipcode: req.zipcode,
            },
        )
        .await?;

    Ok(ApiResponse::ok(address.into()))
}

async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<AddressResponse>>> {
    let addresses = state.address_service.list(&user.id).await?;
    Ok(ApiResponse::ok(
        addresses.into_iter().map(Into::into).collect(),
    ))
}

async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<AddressResponse>> {
    let address = state.address_service.get(&user.id, &id).await?;
    Ok(ApiResponse::ok(address.into()))
}

/// Update address request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddressRequest {
    pub address_name: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub zipcode: Option<String>,
}

async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAddressRequest>,
) -> AppResult<ApiResponse<AddressResponse>> {
    let address = state
        .address_service
        .update(
            &user.id,
            &id,
            UpdateAddressInput {
                address_name: req.address_name,
                address_line1: req.address_line1,
                address_line2: req.address_line2,
                city: req.city,
                state: req.state,
                country: req.country,
                zipcode: req.zipcode,
            },
        )
        .await?;

    Ok(ApiResponse::ok(address.into()))
}

async fn set_default(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<AddressResponse>> {
    let address = state.address_service.set_default(&user.id, &id).await?;
    Ok(ApiResponse::ok(address.into()))
}

async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.address_service.delete(&user.id, &id).await?;
    Ok(ApiResponse::ok(()))
}

/// Create the address router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list))
        .route("/{id}", get(show).patch(update).delete(delete))
        .route("/default/{id}", patch(set_default))
}
