//! Order API Module
//!
//! Point lookup through the cache-aside read path, and raw order intake
//! onto the ingestion stream.

mod handler;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::core::ServerState;

/// Largest accepted order document
const MAX_ORDER_BYTES: usize = 10 * 1024 * 1024;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(
            "/api/orders/ingest",
            post(handler::ingest).layer(DefaultBodyLimit::max(MAX_ORDER_BYTES)),
        )
        // Trailing slash with no id: rejected by the lookup itself
        .route("/api/orders/", get(handler::get_without_id))
        .route("/api/orders/{id}", get(handler::get_by_id))
}
