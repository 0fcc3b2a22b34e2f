//! Rating endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tienda_common::AppResult;
use tienda_core::{CreateRatingInput, UpdateRatingInput};
use tienda_db::entities::rating;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Rating response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    pub score: i16,
    pub comment: Option<String>,
    pub created_at: String,
}

impl From<rating::Model> for RatingResponse {
    fn from(rating: rating::Model) -> Self {
        Self {
            id: rating.id,
            user_id: rating.user_id,
            product_id: rating.product_id,
            score: rating.score,
            comment: rating.comment,
            created_at: rating.created_at.to_rfc3339(),
        }
    }
}

/// Create rating request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRatingRequest {
    pub product_id: String,
    pub score: i16,
    pub comment: Option<String>,
}

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateRatingRequest>,
) -> AppResult<ApiResponse<RatingResponse>> {
    let rating = state
        .rating_service
        .create(
            &user.id,
            CreateRatingInput {
                product_id: req.product_id,
                score: req.score,
                comment: req.comment,
            },
        )
        .await?;

    Ok(ApiResponse::ok(rating.into()))
}

async fn list(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<RatingResponse>>> {
    let ratings = state.rating_service.list().await?;
    Ok(ApiResponse::ok(
        ratings.into_iter().map(Into::into).collect(),
    ))
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<RatingResponse>> {
    let rating = state.rating_service.get(&id).await?;
    Ok(ApiResponse::ok(rating.into()))
}

async fn list_for_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<RatingResponse>>> {
    let ratings = state.rating_service.list_for_product(&id).await?;
    Ok(ApiResponse::ok(
        ratings.into_iter().map(Into::into).collect(),
    ))
}

async fn list_for_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<RatingResponse>>> {
    let ratings = state.rating_service.list_for_user(&id).await?;
    Ok(ApiResponse::ok(
        ratings.into_iter().map(Into::into).collect(),
    ))
}

/// Update rating request.
#[derive(Debug, Deserialize)]
pub struct UpdateRatingRequest {
    pub score: Option<i16>,
    pub comment: Option<String>,
}

async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRatingRequest>,
) -> AppResult<ApiResponse<RatingResponse>> {
    let rating = state
        .rating_service
        .update(
            &user.id,
            &id,
            UpdateRatingInput {
                score: req.score,
                comment: req.comment,
            },
        )
        .await?;

    Ok(ApiResponse::ok(rating.into()))
}

async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.rating_service.delete(&user.id, &id).await?;
    Ok(ApiResponse::ok(()))
}

/// Create the rating router. Reads are public; writes need the caller's
/// session.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list))
        .route("/{id}", get(show).patch(update).delete(delete))
        .route("/product/{id}", get(list_for_product))
        .route("/user/{id}", get(list_for_user))
}
