//! Ingestion pipeline
//!
//! Single sequential worker: read → decode → validate → persist → cache.
//! Bad messages are logged and skipped; only a stream failure stops the loop.

use super::source::{MessageSource, SourceError, StreamMessage};
use crate::cache::OrderCache;
use crate::db::OrderStore;
use serde::Serialize;
use shared::models::{Order, ValidationError};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("read message: {0}")]
    Source(#[from] SourceError),
}

/// What happened to a single message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Stored { order_uid: String, items: usize },
    /// Payload is not a JSON order
    Malformed,
    Invalid(ValidationError),
    /// Store write failed; the message is not retried
    StoreFailed { order_uid: String },
}

/// Cumulative per-outcome counters
#[derive(Debug, Default)]
pub struct PipelineStats {
    received: AtomicU64,
    stored: AtomicU64,
    malformed: AtomicU64,
    invalid: AtomicU64,
    store_failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PipelineStatsSnapshot {
    pub received: u64,
    pub stored: u64,
    pub malformed: u64,
    pub invalid: u64,
    pub store_failed: u64,
}

impl PipelineStats {
    fn record(&self, outcome: &IngestOutcome) {
        self.received.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            IngestOutcome::Stored { .. } => &self.stored,
            IngestOutcome::Malformed => &self.malformed,
            IngestOutcome::Invalid(_) => &self.invalid,
            IngestOutcome::StoreFailed { .. } => &self.store_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PipelineStatsSnapshot {
        PipelineStatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            stored: self.stored.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
            store_failed: self.store_failed.load(Ordering::Relaxed),
        }
    }
}

/// Couples a message source to the order store and cache
pub struct IngestPipeline<S> {
    source: S,
    store: OrderStore,
    cache: Arc<OrderCache>,
    stats: Arc<PipelineStats>,
}

impl<S: MessageSource> IngestPipeline<S> {
    pub fn new(
        source: S,
        store: OrderStore,
        cache: Arc<OrderCache>,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            source,
            store,
            cache,
            stats,
        }
    }

    /// Process messages until `cancel` fires (`Ok`) or the stream fails (`Err`)
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), PipelineError> {
        tracing::info!("Ingestion pipeline started");
        loop {
            let msg = match self.source.next(&cancel).await {
                Ok(msg) => msg,
                Err(SourceError::Canceled) => {
                    tracing::info!("Ingestion pipeline canceled");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            let outcome = self.handle(&msg).await;
            self.stats.record(&outcome);
            self.source.mark_handled(msg.offset);
        }
    }

    /// Decode, validate, persist and cache one message
    pub async fn handle(&self, msg: &StreamMessage) -> IngestOutcome {
        let mut order: Order = match serde_json::from_slice(&msg.payload) {
            Ok(order) => order,
            Err(e) => {
                tracing::warn!(offset = msg.offset, error = %e, "skip: bad json");
                return IngestOutcome::Malformed;
            }
        };

        if let Err(e) = order.validate() {
            tracing::warn!(offset = msg.offset, error = %e, "skip: invalid order");
            return IngestOutcome::Invalid(e);
        }

        // Cached value must equal what the store reads back (items by chrt_id)
        order.items.sort_by_key(|item| item.chrt_id);

        if let Err(e) = self.store.upsert_order(&order).await {
            tracing::error!(
                offset = msg.offset,
                order_id = %order.order_uid,
                error = %e,
                "store error"
            );
            return IngestOutcome::StoreFailed {
                order_uid: order.order_uid,
            };
        }

        let order_uid = order.order_uid.clone();
        let items = order.items.len();
        self.cache.set(order_uid.clone(), order);

        tracing::info!(
            order_id = %order_uid,
            items,
            offset = msg.offset,
            "stored order"
        );
        IngestOutcome::Stored { order_uid, items }
    }

    /// Release the underlying stream
    pub async fn close(&mut self) -> Result<(), PipelineError> {
        self.source.close().await?;
        tracing::info!("Ingestion pipeline closed");
        Ok(())
    }
}
