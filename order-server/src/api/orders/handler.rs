//! Order API Handlers

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};
use http::StatusCode;
use serde::Serialize;
use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::Order;

use crate::core::ServerState;
use crate::ingest::SourceError;

/// Get order by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Order>> {
    let order = state.lookup.lookup(&id).await?;
    Ok(ApiResponse::success(order))
}

pub async fn get_without_id(State(state): State<ServerState>) -> AppResult<ApiResponse<Order>> {
    let order = state.lookup.lookup("").await?;
    Ok(ApiResponse::success(order))
}

#[derive(Debug, Serialize)]
pub struct IngestAccepted {
    pub offset: u64,
}

/// Publish a raw order document to the ingestion stream
///
/// The document is decoded and validated asynchronously by the pipeline.
pub async fn ingest(
    State(state): State<ServerState>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<ApiResponse<IngestAccepted>>)> {
    if body.is_empty() {
        return Err(AppError::with_message(
            ErrorCode::OrderMalformed,
            "empty order document",
        ));
    }

    let offset = state
        .publisher
        .publish(body.to_vec())
        .map_err(|e| match e {
            SourceError::Full => AppError::with_message(
                ErrorCode::IngestUnavailable,
                "ingestion queue is full, retry later",
            ),
            other => {
                AppError::new(ErrorCode::IngestUnavailable).with_detail("reason", other.to_string())
            }
        })?;

    tracing::debug!(offset, bytes = body.len(), "order document queued");
    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::success_with_message("Accepted", IngestAccepted { offset })),
    ))
}
