//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Errors raised by backing stores and by value serialization.
///
/// Backing stores return these from every operation. The facade maps every
/// variant except `Serialization` to the degraded result of the operation.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Redis command or connection failure
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Backing store cannot serve the request
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Stored value has the wrong shape for the operation (e.g. INCR on text)
    #[error("Invalid stored value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// Value could not be serialized before writing
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    /// Returns true for errors caused by the caller rather than the environment.
    pub fn is_programmer_error(&self) -> bool {
        matches!(self, CacheError::Serialization(_))
    }
}

// == Api Error Enum ==
/// Errors returned by the admin HTTP API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Key not found in the addressed instance
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The cache did not confirm a write
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Serialization(e) => ApiError::InvalidRequest(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Aliases ==
/// Convenience Result type for backing stores.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Convenience Result type for HTTP handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_is_programmer_error() {
        let err: CacheError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(err.is_programmer_error());
        assert!(!CacheError::Unavailable("down".into()).is_programmer_error());
    }

    #[test]
    fn test_api_error_status_codes() {
        let cases = [
            (ApiError::NotFound("k".into()), StatusCode::NOT_FOUND),
            (ApiError::InvalidRequest("k".into()), StatusCode::BAD_REQUEST),
            (ApiError::Unavailable("k".into()), StatusCode::SERVICE_UNAVAILABLE),
            (ApiError::Internal("k".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
