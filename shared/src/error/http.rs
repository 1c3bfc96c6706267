//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            Self::OrderNotFound => StatusCode::NOT_FOUND,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::TimeoutError | Self::IngestUnavailable => StatusCode::SERVICE_UNAVAILABLE,

            Self::Unknown | Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,

            Self::InvalidRequest | Self::OrderMalformed => StatusCode::BAD_REQUEST,
        }
    }
}
