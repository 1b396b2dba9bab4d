//! Domain models for the storefront.
//!
//! Models serialize with `camelCase` field names, which is the shape the
//! browser client expects.

pub mod address;
pub mod cart;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use address::Address;
pub use cart::{CartItem, CartLine};
pub use order::{NewOrder, NewOrderItem, Order, OrderDetails, OrderItem, PaymentReference};
pub use product::Product;
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
