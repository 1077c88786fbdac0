//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;

pub use product::{slug_candidate, slugify, Product};
pub use order::{Address, Order, OrderError, OrderItem, OrderStatus, OrderWithItems, PaymentStatus};
pub use cart::{collapse_sync_items, Cart, CartLine, SyncItem};
