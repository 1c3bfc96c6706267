//! In-memory order cache

mod lru;

pub use lru::{CacheSnapshot, LruCache};

use shared::models::Order;

/// Cache of fully assembled orders keyed by `order_uid`
pub type OrderCache = LruCache<String, Order>;
