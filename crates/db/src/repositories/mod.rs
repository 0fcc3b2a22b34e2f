//! Database repositories.

pub mod address;
pub mod cart;
pub mod category;
pub mod order;
pub mod product;
pub mod rating;
pub mod session_token;
pub mod user;

pub use address::AddressRepository;
pub use cart::CartRepository;
pub use category::CategoryRepository;
pub use order::OrderRepository;
pub use product::{ProductFilter, ProductRepository, StockDelta};
pub use rating::RatingRepository;
pub use session_token::SessionTokenRepository;
pub use user::UserRepository;
