//! User endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use tienda_common::{AppError, AppResult};
use tienda_core::{LoginInput, SignupInput, UpdateUserInput};
use tienda_db::entities::user::{self, UserRole};

use crate::{
    extractors::{AdminUser, AuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// User response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub created_at: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub mobile: Option<String>,
    pub role: UserRole,
    pub is_blocked: bool,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at.to_rfc3339(),
            firstname: user.firstname,
            lastname: user.lastname,
            email: user.email,
            mobile: user.mobile,
            role: user.role,
            is_blocked: user.is_blocked,
        }
    }
}

/// Session response returned by signup and login.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Signup request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub mobile: Option<String>,
    pub password: String,
}

async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let (user, token) = state
        .user_service
        .signup(SignupInput {
            firstname: req.firstname,
            lastname: req.lastname,
            email: req.email,
            mobile: req.mobile,
            password: req.password,
        })
        .await?;

    Ok(ApiResponse::ok(SessionResponse {
        user: user.into(),
        token,
    }))
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let (user, token) = state
        .user_service
        .login(LoginInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(ApiResponse::ok(SessionResponse {
        user: user.into(),
        token,
    }))
}

async fn logout(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> AppResult<ApiResponse<()>> {
    let token = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    state.user_service.logout(token).await?;
    Ok(ApiResponse::ok(()))
}

async fn logout_all(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let revoked = state.user_service.logout_all(&user.id).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "revoked": revoked })))
}

async fn show(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.get(&id).await?;
    Ok(ApiResponse::ok(user.into()))
}

async fn list_all(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    let users = state.user_service.list_all().await?;
    Ok(ApiResponse::ok(users.into_iter().map(Into::into).collect()))
}

/// Forgot-password request.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> AppResult<ApiResponse<()>> {
    state.user_service.forgot_password(&req.email).await?;
    Ok(ApiResponse::ok(()))
}

/// Reset-password request.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(req): Json<ResetPasswordRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state
        .user_service
        .reset_password(&token, &req.password)
        .await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Update user request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub password: Option<String>,
}

async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let updated = state
        .user_service
        .update(
            &user,
            &id,
            UpdateUserInput {
                firstname: req.firstname,
                lastname: req.lastname,
                email: req.email,
                mobile: req.mobile,
                password: req.password,
            },
        )
        .await?;

    Ok(ApiResponse::ok(updated.into()))
}

async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state.user_service.delete(&user, &id).await?;
    Ok(ApiResponse::ok(()))
}

async fn block(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.block(&id).await?;
    Ok(ApiResponse::ok(user.into()))
}

async fn unblock(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.unblock(&id).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Create the user router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/logout-all", post(logout_all))
        .route("/forgot-password-token", post(forgot_password))
        .route("/reset-password/{token}", patch(reset_password))
        .route("/all-users", get(list_all))
        .route("/{id}", get(show).patch(update).delete(delete))
        .route("/block/{id}", patch(block))
        .route("/unblock/{id}", patch(unblock))
}
