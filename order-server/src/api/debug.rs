//! Diagnostics endpoint: cache counters, ingestion progress and store size

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::cache::CacheSnapshot;
use crate::core::ServerState;
use crate::ingest::PipelineStatsSnapshot;

pub fn router() -> Router<ServerState> {
    Router::new().route("/debug/cache", get(cache_stats))
}

#[derive(Debug, Serialize)]
pub struct StreamPosition {
    pub handled: u64,
    pub committed: u64,
}

#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    #[serde(flatten)]
    pub cache: CacheSnapshot,
    pub pipeline: PipelineStatsSnapshot,
    pub stream: StreamPosition,
    /// `None` when the store could not be queried
    pub persisted_orders: Option<i64>,
}

pub async fn cache_stats(State(state): State<ServerState>) -> Json<CacheStatsResponse> {
    let persisted_orders = match state.store.count().await {
        Ok(n) => Some(n),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to count persisted orders");
            None
        }
    };

    Json(CacheStatsResponse {
        cache: state.cache.snapshot(),
        pipeline: state.pipeline_stats.snapshot(),
        stream: StreamPosition {
            handled: state.offsets.handled(),
            committed: state.offsets.committed(),
        },
        persisted_orders,
    })
}
