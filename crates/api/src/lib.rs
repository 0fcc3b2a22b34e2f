//! HTTP API layer for tienda-rs.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: accounts, addresses, catalog, ratings, carts, checkout
//! - **Extractors**: authentication (user and admin)
//! - **Middleware**: bearer-token session resolution
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
