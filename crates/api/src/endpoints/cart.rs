//! Cart endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tienda_common::AppResult;
use tienda_core::{AddItemInput, CartNameInput, CartView};
use tienda_db::entities::{cart, cart_item};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Cart response (without items).
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub id: String,
    pub name: String,
    pub total: Decimal,
    pub created_at: String,
}

impl From<cart::Model> for CartResponse {
    fn from(cart: cart::Model) -> Self {
        Self {
            id: cart.id,
            name: cart.name,
            total: cart.total,
            created_at: cart.created_at.to_rfc3339(),
        }
    }
}

/// Cart line item response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub id: String,
    pub product_id: String,
    pub price: Decimal,
    pub color: String,
    pub quantity: i32,
    pub selected: bool,
    pub subtotal: Decimal,
}

impl From<cart_item::Model> for CartItemResponse {
    fn from(item: cart_item::Model) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            price: item.price,
            color: item.color,
            quantity: item.quantity,
            selected: item.selected,
            subtotal: item.subtotal,
        }
    }
}

/// Cart with its items.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDetailResponse {
    #[serde(flatten)]
    pub cart: CartResponse,
    pub items: Vec<CartItemResponse>,
}

impl From<CartView> for CartDetailResponse {
    fn from(view: CartView) -> Self {
        Self {
            cart: view.cart.into(),
            items: view.items.into_iter().map(Into::into).collect(),
        }
    }
}

/// Named cart create/rename request.
#[derive(Debug, Deserialize)]
pub struct CartNameRequest {
    pub name: String,
}

async fn create_named(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CartNameRequest>,
) -> AppResult<ApiResponse<CartResponse>> {
    let cart = state
        .cart_service
        .create_named(&user.id, CartNameInput { name: req.name })
        .await?;
    Ok(ApiResponse::ok(cart.into()))
}

async fn show_shopping_cart(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<CartDetailResponse>> {
    let view = state.cart_service.get(&user.id).await?;
    Ok(ApiResponse::ok(view.into()))
}

async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<CartDetailResponse>> {
    let view = state.cart_service.get_by_id(&user.id, &id).await?;
    Ok(ApiResponse::ok(view.into()))
}

async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<CartResponse>>> {
    let carts = state.cart_service.list(&user.id).await?;
    Ok(ApiResponse::ok(carts.into_iter().map(Into::into).collect()))
}

async fn rename(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CartNameRequest>,
) -> AppResult<ApiResponse<CartResponse>> {
    let cart = state
        .cart_service
        .rename(&user.id, &id, CartNameInput { name: req.name })
        .await?;
    Ok(ApiResponse::ok(cart.into()))
}

async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.cart_service.delete(&user.id, &id).await?;
    Ok(ApiResponse::ok(()))
}

/// Add-to-cart request. `{id}` in the path is the product ID.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub color: String,
    pub quantity: Option<i32>,
}

async fn add_item(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AddItemRequest>,
) -> AppResult<ApiResponse<CartDetailResponse>> {
    let view = state
        .cart_service
        .add_item(
            &user,
            AddItemInput {
                product_id: id,
                color: req.color,
                quantity: req.quantity.unwrap_or(1),
            },
        )
        .await?;
    Ok(ApiResponse::ok(view.into()))
}

async fn remove_item(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<CartDetailResponse>> {
    let view = state.cart_service.remove_item(&user.id, &id).await?;
    Ok(ApiResponse::ok(view.into()))
}

/// Quantity change request. `{id}` in the path is the cart ID.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetQuantityRequest {
    pub product_id: String,
    pub color: String,
    pub quantity: i32,
}

async fn set_quantity(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetQuantityRequest>,
) -> AppResult<ApiResponse<CartDetailResponse>> {
    let view = state
        .cart_service
        .set_quantity(&user.id, &id, &req.product_id, &req.color, req.quantity)
        .await?;
    Ok(ApiResponse::ok(view.into()))
}

/// Selection toggle request. `{id}` in the path is the product ID.
#[derive(Debug, Deserialize)]
pub struct ToggleSelectedRequest {
    pub color: String,
}

async fn toggle_selected(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ToggleSelectedRequest>,
) -> AppResult<ApiResponse<CartDetailResponse>> {
    let view = state
        .cart_service
        .toggle_selected(&user.id, &id, &req.color)
        .await?;
    Ok(ApiResponse::ok(view.into()))
}

/// Create the cart router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_named).get(show_shopping_cart))
        .route("/all", get(list))
        .route("/{id}", get(show).patch(rename).delete(delete))
        .route("/product/{id}", post(add_item).delete(remove_item))
        .route("/product/quantity/{id}", patch(set_quantity))
        .route("/product/select/{id}", patch(toggle_selected))
}
