//! API endpoints.

mod address;
mod cart;
mod category;
mod order;
mod product;
mod rating;
mod user;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/user", user::router())
        .nest("/address", address::router())
        .nest("/category", category::router())
        .nest("/product", product::router())
        .nest("/rating", rating::router())
        .nest("/cart", cart::router())
        .nest("/order", order::router())
}
