//! Core business logic for tienda-rs.

pub mod services;

pub use services::*;
