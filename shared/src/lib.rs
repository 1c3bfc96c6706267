//! Shared types for the order service
//!
//! The order aggregate, its validation rules, and the error/response
//! envelope used by the HTTP surface.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use models::{Delivery, Item, Order, Payment, ValidationError};
pub use serde::{Deserialize, Serialize};
