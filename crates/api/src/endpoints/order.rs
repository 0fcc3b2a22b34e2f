//! Order endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tienda_common::{AppError, AppResult};
use tienda_core::OrderView;
use tienda_db::entities::{
    order::{self, OrderStatus},
    order_item,
};

use crate::{
    extractors::{AdminUser, AuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Order response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub shipping_address: serde_json::Value,
    pub total: Decimal,
    pub payment_id: Option<String>,
    pub status: OrderStatus,
    pub created_at: String,
}

impl From<order::Model> for OrderResponse {
    fn from(order: order::Model) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            shipping_address: order.shipping_address,
            total: order.total,
            payment_id: order.payment_id,
            status: order.status,
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

/// Order line item response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: String,
    pub product_id: String,
    pub price: Decimal,
    pub color: String,
    pub quantity: i32,
    pub subtotal: Decimal,
}

impl From<order_item::Model> for OrderItemResponse {
    fn from(item: order_item::Model) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            price: item.price,
            color: item.color,
            quantity: item.quantity,
            subtotal: item.subtotal,
        }
    }
}

/// Order with its snapshot line items.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderView> for OrderDetailResponse {
    fn from(view: OrderView) -> Self {
        Self {
            order: view.order.into(),
            items: view.items.into_iter().map(Into::into).collect(),
        }
    }
}

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<OrderDetailResponse>> {
    let view = state.order_service.create(&user.id).await?;
    Ok(ApiResponse::ok(view.into()))
}

/// Gateway token query, as sent back by the payment approval redirect.
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

impl TokenQuery {
    fn require(self) -> AppResult<String> {
        self.token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::BadRequest("Missing token query parameter".to_string()))
    }
}

async fn capture(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> AppResult<ApiResponse<OrderResponse>> {
    let token = query.require()?;
    let order = state.order_service.capture(&user.id, &token).await?;
    Ok(ApiResponse::ok(order.into()))
}

async fn cancel(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> AppResult<ApiResponse<OrderResponse>> {
    let token = query.require()?;
    let order = state.order_service.cancel(&user.id, &token).await?;
    Ok(ApiResponse::ok(order.into()))
}

async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<OrderResponse>>> {
    let orders = state.order_service.list_for_user(&user.id).await?;
    Ok(ApiResponse::ok(orders.into_iter().map(Into::into).collect()))
}

async fn list_all(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<OrderResponse>>> {
    let orders = state.order_service.list_all().await?;
    Ok(ApiResponse::ok(orders.into_iter().map(Into::into).collect()))
}

async fn list_by_user(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<OrderResponse>>> {
    let orders = state.order_service.list_by_user_id(&id).await?;
    Ok(ApiResponse::ok(orders.into_iter().map(Into::into).collect()))
}

/// Admin status update request. `{id}` in the path is the target user ID; the
/// order is addressed by its gateway token.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

async fn update_status(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TokenQuery>,
    Json(req): Json<UpdateStatusRequest>,
) -> AppResult<ApiResponse<OrderResponse>> {
    let token = query.require()?;
    let order = state
        .order_service
        .update_status(&id, &token, req.status)
        .await?;
    Ok(ApiResponse::ok(order.into()))
}

/// Create the order router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list))
        .route("/capture", get(capture).post(capture))
        .route("/cancel", post(cancel))
        .route("/all", get(list_all))
        .route("/user/{id}", get(list_by_user))
        .route("/{id}", patch(update_status))
}
