//! Repositories, one per aggregate.
//!
//! Repositories borrow the pool (`Repo::new(&pool)`). Operations that must
//! share a transaction with other work take `&mut PgConnection` instead.

pub mod carts;
pub mod categories;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod shop;
pub mod users;

pub use carts::CartRepository;
pub use categories::{Category, CategoryInput, CategoryRepository};
pub use dashboard::{DashboardRepository, DashboardStats};
pub use orders::{
    AdminOrder, AdminOrderDetail, CheckoutError, Order, OrderItem, OrderRepository,
};
pub use products::{Product, ProductDetail, ProductInput, ProductRepository, ProductSummary};
pub use reviews::{Review, ReviewRepository};
pub use shop::{CategoryFacet, PriceRange, ShopFilters, ShopListing, ShopProduct, ShopRepository};
pub use users::{NewUser, User, UserRepository};
