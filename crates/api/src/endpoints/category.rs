//! Category endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tienda_common::AppResult;
use tienda_core::CategoryInput;
use tienda_db::entities::category;

use crate::{extractors::AdminUser, middleware::AppState, response::ApiResponse};

/// Category response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

impl From<category::Model> for CategoryResponse {
    fn from(category: category::Model) -> Self {
        Self {
            id: category.id,
            name: category.name,
            created_at: category.created_at.to_rfc3339(),
        }
    }
}

/// Category create/rename request.
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

async fn create(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<CategoryRequest>,
) -> AppResult<ApiResponse<CategoryResponse>> {
    let category = state
        .category_service
        .create(CategoryInput { name: req.name })
        .await?;
    Ok(ApiResponse::ok(category.into()))
}

async fn list(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<CategoryResponse>>> {
    let categories = state.category_service.list().await?;
    Ok(ApiResponse::ok(
        categories.into_iter().map(Into::into).collect(),
    ))
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<CategoryResponse>> {
    let category = state.category_service.get(&id).await?;
    Ok(ApiResponse::ok(category.into()))
}

async fn rename(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CategoryRequest>,
) -> AppResult<ApiResponse<CategoryResponse>> {
    let category = state
        .category_service
        .rename(&id, CategoryInput { name: req.name })
        .await?;
    Ok(ApiResponse::ok(category.into()))
}

async fn delete(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.category_service.delete(&id).await?;
    Ok(ApiResponse::ok(()))
}

/// Create the category router. Reads are public; writes are admin.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list))
        .route("/{id}", get(show).patch(rename).delete(delete))
}
