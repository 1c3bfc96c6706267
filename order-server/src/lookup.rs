//! Cache-aside order lookup
//!
//! Cache first; on a miss the store is queried under a timeout and a found
//! order is written back to the cache.

use crate::cache::OrderCache;
use crate::db::{OrderStore, StoreError};
use shared::error::{AppError, ErrorCode};
use shared::models::Order;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("missing order id")]
    EmptyId,

    #[error("order not found: {0}")]
    NotFound(String),

    #[error("store lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Store(StoreError),
}

impl From<LookupError> for AppError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::EmptyId => {
                AppError::invalid_request("missing order id").with_detail("field", "id")
            }
            LookupError::NotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, format!("Order {id} not found"))
                    .with_detail("order_uid", id)
            }
            LookupError::Timeout(after) => AppError::timeout(format!(
                "Order lookup timed out after {}ms",
                after.as_millis()
            )),
            LookupError::Store(e) => AppError::database(e.to_string()),
        }
    }
}

/// Read path shared by every lookup request
#[derive(Clone)]
pub struct OrderLookup {
    cache: Arc<OrderCache>,
    store: OrderStore,
    timeout: Duration,
}

impl OrderLookup {
    pub fn new(cache: Arc<OrderCache>, store: OrderStore, timeout: Duration) -> Self {
        Self {
            cache,
            store,
            timeout,
        }
    }

    pub async fn lookup(&self, id: &str) -> Result<Order, LookupError> {
        if id.is_empty() {
            return Err(LookupError::EmptyId);
        }

        let key = id.to_string();
        if let Some(order) = self.cache.get(&key) {
            tracing::debug!(order_id = %id, cache_len = self.cache.len(), "cache hit");
            return Ok(order);
        }
        tracing::debug!(order_id = %id, "cache miss");

        let order = tokio::time::timeout(self.timeout, self.store.get_order_by_id(id))
            .await
            .map_err(|_| LookupError::Timeout(self.timeout))?
            .map_err(|e| match e {
                StoreError::NotFound(id) => LookupError::NotFound(id),
                other => LookupError::Store(other),
            })?;

        self.cache.set(key, order.clone());
        Ok(order)
    }
}
