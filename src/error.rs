//! Error types for the recipe service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Service Error Enum ==
/// Unified error type for request handlers and recipe producers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Caller exhausted its attempts
    #[error("Too many requests, retry in {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    /// The upstream producer (LLM, search provider, content host) failed
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let message = self.to_string();

        match self {
            ServiceError::RateLimited { retry_after } => {
                let body = Json(ErrorResponse::rate_limited(message, retry_after));
                let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
                response
            }
            other => {
                let status = match other {
                    ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                    ServiceError::Upstream(_) => StatusCode::BAD_GATEWAY,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, Json(ErrorResponse::new(message))).into_response()
            }
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the recipe service.
pub type Result<T> = std::result::Result<T, ServiceError>;
