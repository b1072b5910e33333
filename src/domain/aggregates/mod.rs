//! Aggregates module
pub mod custom_order;
pub mod order;
pub mod promotion;

pub use custom_order::{base_price, quote_price, CustomOrderStatus};
pub use order::OrderStatus;
pub use promotion::{discounted_price, Discount};
