//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use tienda_core::{
    AddressService, CartService, CategoryService, OrderService, ProductService, RatingService,
    SessionService, UserService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub session_service: SessionService,
    pub user_service: UserService,
    pub address_service: AddressService,
    pub category_service: CategoryService,
    pub product_service: ProductService,
    pub rating_service: RatingService,
    pub cart_service: CartService,
    pub order_service: OrderService,
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` through the session service and
/// stores the user in request extensions. Invalid tokens are ignored here;
/// the `AuthUser`/`AdminUser` extractors reject where auth is required.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(user) = state.session_service.validate(token).await
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}
