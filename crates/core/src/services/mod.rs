//! Business logic services.

#![allow(missing_docs)]

pub mod address;
pub mod cart;
pub mod category;
pub mod email;
pub mod order;
pub mod payment;
pub mod product;
pub mod rating;
pub mod session;
pub mod user;

pub use address::{AddressService, CreateAddressInput, UpdateAddressInput};
pub use cart::{
    AddItemInput, CartNameInput, CartService, CartView, MAX_LINE_QUANTITY, selected_total,
};
pub use category::{CategoryInput, CategoryService};
pub use email::{EmailMessage, EmailService};
pub use order::{OrderService, OrderView};
pub use payment::{
    CaptureResult, NoOpGateway, PaymentGateway, PaymentIntent, PaymentService, PaypalGateway,
};
pub use product::{CreateProductInput, ProductService, UpdateProductInput};
pub use rating::{CreateRatingInput, RatingService, UpdateRatingInput};
pub use session::{SessionClaims, SessionService, decode_token, sign_token};
pub use user::{LoginInput, SignupInput, UpdateUserInput, UserService};
