//! Domain models.
//!
//! These types represent validated domain objects separate from database row
//! types; repositories convert rows into them and handlers map them onto
//! response bodies.

pub mod cart;
pub mod catalog;
pub mod customer;
pub mod order;
pub mod review;

pub use cart::{Cart, CartItem, CartLine, ProductSummary};
pub use catalog::{
    Collection, NewCollection, NewProduct, NewPromotion, Page, Product, ProductFilter,
    ProductOrdering, Promotion,
};
pub use customer::{Address, Customer, NewCustomer};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem};
pub use review::{NewReview, Review};
